//! Serializable model descriptions.
//!
//! A [`ModelConfig`] stores the properties of a model's coordinates,
//! actuators and controllers, and builds a configured [`Model`] from them.
//! The document format is up to the caller; any serde format works.

use serde::{Deserialize, Serialize};
use sinew_core::{CONTROLLER_SET, COORDINATE_SET, Coordinate, FORCE_SET, Model, ModelError};
use thiserror::Error;
use tracing::debug;

use crate::{
    ControlFunction, ControlsTable, CoordinateActuator, ExcitationController, FunctionError,
    InterpolationOrder, PrescribedController, SynergyController,
    create_coordinate_actuator_set,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("`{component}` has optimal force {value}; it must be finite and non-zero")]
    InvalidOptimalForce { component: String, value: f64 },

    #[error("invalid control function for `{actuator}` in controller `{controller}`")]
    Function {
        controller: String,
        actuator: String,
        #[source]
        source: FunctionError,
    },

    #[error("invalid controls table in controller `{controller}`")]
    Table {
        controller: String,
        #[source]
        source: FunctionError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A complete model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,

    #[serde(default)]
    pub coordinates: Vec<CoordinateConfig>,

    /// Reserve actuators, created before the explicit actuators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserves: Option<ReservesConfig>,

    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,

    #[serde(default)]
    pub controllers: Vec<ControllerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateConfig {
    pub name: String,

    #[serde(default = "default_coordinate_parent")]
    pub parent: String,

    #[serde(default)]
    pub default_value: f64,

    #[serde(default)]
    pub default_speed: f64,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub constrained: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub name: String,

    #[serde(default = "default_force_parent")]
    pub parent: String,

    /// Name or absolute path of the driven coordinate.
    pub coordinate: String,

    #[serde(default = "default_optimal_force")]
    pub optimal_force: f64,
}

/// Settings for [`create_coordinate_actuator_set`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservesConfig {
    #[serde(default = "default_optimal_force")]
    pub optimal_force: f64,

    #[serde(default)]
    pub include_locked_and_constrained: bool,
}

/// A controller description, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    Prescribed {
        name: String,
        #[serde(default = "default_controller_parent")]
        parent: String,
        #[serde(default)]
        actuators: Vec<String>,
        #[serde(default)]
        functions: Vec<FunctionConfig>,
        /// Columns become bindings, interpolated with `interpolation`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<ControlsTable>,
        #[serde(default)]
        interpolation: InterpolationOrder,
    },
    Excitation {
        name: String,
        #[serde(default = "default_controller_parent")]
        parent: String,
        actuators: Vec<String>,
    },
    Synergy {
        name: String,
        #[serde(default = "default_controller_parent")]
        parent: String,
        actuators: Vec<String>,
        synergy_vectors: Vec<Vec<f64>>,
    },
}

/// Samples of one prescribed control function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Name or absolute path of the driven actuator.
    pub actuator: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub interpolation: InterpolationOrder,
}

fn default_optimal_force() -> f64 {
    1.0
}

fn default_coordinate_parent() -> String {
    COORDINATE_SET.to_owned()
}

fn default_force_parent() -> String {
    FORCE_SET.to_owned()
}

fn default_controller_parent() -> String {
    CONTROLLER_SET.to_owned()
}

fn check_optimal_force(component: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value != 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidOptimalForce {
            component: component.to_owned(),
            value,
        })
    }
}

impl ControllerConfig {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Prescribed { name, .. }
            | Self::Excitation { name, .. }
            | Self::Synergy { name, .. } => name,
        }
    }

    fn add_to(&self, model: &mut Model) -> Result<(), ConfigError> {
        match self {
            Self::Prescribed {
                name,
                parent,
                actuators,
                functions,
                table,
                interpolation,
            } => {
                let mut controller = match table {
                    Some(table) => PrescribedController::from_table(name, table, *interpolation)
                        .map_err(|source| ConfigError::Table {
                            controller: name.clone(),
                            source,
                        })?,
                    None => PrescribedController::new(name),
                };
                for actuator in actuators {
                    controller.add_actuator(actuator);
                }
                for function in functions {
                    let built = ControlFunction::new(
                        function.times.clone(),
                        function.values.clone(),
                        function.interpolation,
                    )
                    .map_err(|source| ConfigError::Function {
                        controller: name.clone(),
                        actuator: function.actuator.clone(),
                        source,
                    })?;
                    controller.bind(&function.actuator, built);
                }
                model.add_controller_at(parent, controller)?;
            }
            Self::Excitation {
                name,
                parent,
                actuators,
            } => {
                let controller = actuators
                    .iter()
                    .fold(ExcitationController::new(name), |c, a| c.with_actuator(a));
                model.add_controller_at(parent, controller)?;
            }
            Self::Synergy {
                name,
                parent,
                actuators,
                synergy_vectors,
            } => {
                let mut controller = SynergyController::new(name);
                for actuator in actuators {
                    controller.add_actuator(actuator);
                }
                for vector in synergy_vectors {
                    controller.add_synergy_vector(vector.clone());
                }
                model.add_controller_at(parent, controller)?;
            }
        }
        Ok(())
    }
}

impl ModelConfig {
    /// Checks properties that registration alone would not catch.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOptimalForce`] for a zero or non-finite
    /// optimal force on any actuator or on the reserves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(reserves) = &self.reserves {
            check_optimal_force("reserves", reserves.optimal_force)?;
        }
        for actuator in &self.actuators {
            check_optimal_force(&actuator.name, actuator.optimal_force)?;
        }
        Ok(())
    }

    /// Validates the description and builds a configured, unconnected model.
    ///
    /// Coordinates are added first, then the reserves, then the listed
    /// actuators, then the controllers.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if validation fails, a control function
    /// cannot be built, or an element cannot be registered.
    pub fn build(&self) -> Result<Model, ConfigError> {
        self.validate()?;

        let mut model = Model::new(&self.name);
        for coordinate in &self.coordinates {
            model.add_coordinate_at(
                &coordinate.parent,
                Coordinate::new(&coordinate.name)
                    .with_default_value(coordinate.default_value)
                    .with_default_speed(coordinate.default_speed)
                    .with_locked(coordinate.locked)
                    .with_constrained(coordinate.constrained),
            )?;
        }

        if let Some(reserves) = &self.reserves {
            create_coordinate_actuator_set(
                &mut model,
                reserves.optimal_force,
                reserves.include_locked_and_constrained,
            )?;
        }

        for actuator in &self.actuators {
            model.add_actuator_at(
                &actuator.parent,
                CoordinateActuator::new(&actuator.name, &actuator.coordinate)
                    .with_optimal_force(actuator.optimal_force),
            )?;
        }

        for controller in &self.controllers {
            controller.add_to(&mut model)?;
        }

        debug!(
            model = %self.name,
            coordinates = self.coordinates.len(),
            actuators = model.num_actuators(),
            controllers = model.num_controllers(),
            "built model from configuration"
        );
        Ok(model)
    }
}
