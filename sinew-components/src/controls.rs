//! Control functions of time and the tables they are sampled from.

mod function;
mod spline;
mod table;

pub use function::{ControlFunction, FunctionError, InterpolationOrder};
pub use table::{ControlsTable, TableError};
