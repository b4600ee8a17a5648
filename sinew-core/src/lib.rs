//! The actuation and control evaluation contract for musculoskeletal models.
//!
//! This crate defines how scalar control signals become generalized forces on
//! the coordinates of a simulated body:
//!
//! - [`Actuator`]: converts a control (or an override) into a force
//! - [`Controller`]: produces the controls of a set of actuators
//! - [`Model`]: owns the tree of [`Coordinate`]s, actuators and controllers,
//!   resolves labels across it, and runs the evaluation pipeline
//! - [`State`]: one evaluation context, holding the inputs and caching the
//!   results of an evaluation
//!
//! Per-evaluation results live in a [`State`], never on an actuator or
//! controller, so one model can evaluate many contexts concurrently.
//! Concrete actuators and controllers live in `sinew-components`.

mod actuator;
mod controller;
mod coordinate;
mod error;
mod model;
mod path;
mod report;
mod state;
mod topology;

pub use actuator::{Actuator, ActuatorIndex};
pub use controller::{ActuatorSet, Controller, ControllerIndex};
pub use coordinate::{Coordinate, CoordinateIndex};
pub use error::{ConnectErrors, ConnectionError, ModelError, ResolveError};
pub use model::{CONTROLLER_SET, COORDINATE_SET, Dynamics, FORCE_SET, Lifecycle, Model};
pub use path::{ComponentPath, Label, PathError, validate_name};
pub use report::{Degradation, DegradedEvaluation, EvaluationReport};
pub use state::{Stage, State};
pub use topology::{ComponentKind, ComponentRef, Topology};
