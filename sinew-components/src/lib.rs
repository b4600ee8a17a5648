//! Concrete actuators, control functions and controllers for Sinew models.
//!
//! Everything here plugs into the [`sinew_core`] evaluation contract.
//! Models can be assembled in code or described with the serializable
//! types in [`config`].

mod actuators;
pub mod config;
mod controllers;
mod controls;

pub use actuators::{CoordinateActuator, create_coordinate_actuator_set};
pub use config::{ConfigError, ModelConfig};
pub use controllers::{ExcitationController, PrescribedController, SynergyController};
pub use controls::{ControlFunction, ControlsTable, FunctionError, InterpolationOrder, TableError};
