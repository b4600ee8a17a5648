use crate::{ActuatorIndex, ControllerIndex, CoordinateIndex};

/// How far an evaluation context has been realized.
///
/// Stages are ordered: a context realized through [`Stage::Forces`] also holds
/// valid controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Stage {
    /// Only the inputs (time, values, speeds, external inputs) are valid.
    #[default]
    Time,
    /// The global control vector is valid.
    Controls,
    /// Actuator forces and mobility forces are valid.
    Forces,
}

/// Identity of the model layout a context was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Layout {
    pub(crate) model: u64,
    pub(crate) revision: u64,
}

/// An evaluation context: one independent point-in-time evaluation.
///
/// A `State` carries the inputs of an evaluation (time, coordinate values and
/// speeds, per-controller external inputs, per-actuator overrides) and caches
/// its results (controls, actuator forces, mobility forces).
/// Actuators and controllers never store per-evaluation results themselves,
/// so any number of contexts may be evaluated against the same model, from
/// different threads, as long as each context has a single evaluator.
///
/// Changing an input invalidates the cached results that depend on it.
///
/// States are created by [`Model::init_state`](crate::Model::init_state) or
/// [`Model::default_state`](crate::Model::default_state) and can be cloned to
/// seed further contexts.
/// `State::default()` is a detached context that belongs to no model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    layout: Layout,
    time: f64,
    values: Vec<f64>,
    speeds: Vec<f64>,
    inputs: Vec<Vec<f64>>,
    overrides: Vec<Option<f64>>,
    stage: Stage,
    controls: Vec<f64>,
    forces: Vec<f64>,
    mobility_forces: Vec<f64>,
}

impl State {
    pub(crate) fn new(
        layout: Layout,
        values: Vec<f64>,
        speeds: Vec<f64>,
        inputs: Vec<Vec<f64>>,
        num_actuators: usize,
    ) -> Self {
        let num_coordinates = values.len();
        Self {
            layout,
            time: 0.0,
            values,
            speeds,
            inputs,
            overrides: vec![None; num_actuators],
            stage: Stage::Time,
            controls: vec![0.0; num_actuators],
            forces: vec![0.0; num_actuators],
            mobility_forces: vec![0.0; num_coordinates],
        }
    }

    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sets the time of this context, invalidating controls and forces.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
        self.invalidate(Stage::Time);
    }

    /// Returns the stage through which this context has been realized.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the value of a coordinate, or `0.0` if the index is out of range.
    #[must_use]
    pub fn value(&self, coordinate: CoordinateIndex) -> f64 {
        self.values.get(coordinate.0).copied().unwrap_or(0.0)
    }

    /// Sets the value of a coordinate, invalidating controls and forces.
    ///
    /// Out-of-range indices are ignored.
    pub fn set_value(&mut self, coordinate: CoordinateIndex, value: f64) {
        if let Some(slot) = self.values.get_mut(coordinate.0) {
            *slot = value;
            self.invalidate(Stage::Time);
        }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the speed of a coordinate, or `0.0` if the index is out of range.
    #[must_use]
    pub fn speed(&self, coordinate: CoordinateIndex) -> f64 {
        self.speeds.get(coordinate.0).copied().unwrap_or(0.0)
    }

    /// Sets the speed of a coordinate, invalidating controls and forces.
    ///
    /// Out-of-range indices are ignored.
    pub fn set_speed(&mut self, coordinate: CoordinateIndex, speed: f64) {
        if let Some(slot) = self.speeds.get_mut(coordinate.0) {
            *slot = speed;
            self.invalidate(Stage::Time);
        }
    }

    #[must_use]
    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    /// Returns the external inputs supplied to a controller in this context.
    #[must_use]
    pub fn controller_inputs(&self, controller: ControllerIndex) -> &[f64] {
        self.inputs.get(controller.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces the external inputs of a controller, invalidating controls and forces.
    ///
    /// Out-of-range indices are ignored.
    /// The length is not checked here; controllers report a mismatch as a
    /// degraded evaluation.
    pub fn set_controller_inputs(&mut self, controller: ControllerIndex, inputs: Vec<f64>) {
        if let Some(slot) = self.inputs.get_mut(controller.0) {
            *slot = inputs;
            self.invalidate(Stage::Time);
        }
    }

    /// Returns the override force of an actuator, if one is set.
    #[must_use]
    pub fn override_force(&self, actuator: ActuatorIndex) -> Option<f64> {
        self.overrides.get(actuator.0).copied().flatten()
    }

    /// Sets or clears the override force of an actuator, invalidating forces.
    ///
    /// Out-of-range indices are ignored.
    pub fn set_override(&mut self, actuator: ActuatorIndex, force: Option<f64>) {
        if let Some(slot) = self.overrides.get_mut(actuator.0) {
            *slot = force;
            self.invalidate(Stage::Controls);
        }
    }

    /// Returns the cached control of an actuator, or `0.0` if the index is out of range.
    #[must_use]
    pub fn control(&self, actuator: ActuatorIndex) -> f64 {
        self.controls.get(actuator.0).copied().unwrap_or(0.0)
    }

    /// Returns the cached global control vector.
    #[must_use]
    pub fn controls(&self) -> &[f64] {
        &self.controls
    }

    /// Returns the cached force of an actuator, or `0.0` if none was cached.
    #[must_use]
    pub fn force(&self, actuator: ActuatorIndex) -> f64 {
        self.forces.get(actuator.0).copied().unwrap_or(0.0)
    }

    /// Caches the force computed for an actuator in this context.
    ///
    /// Called by actuators from [`Actuator::compute_force`](crate::Actuator::compute_force).
    /// Out-of-range indices are ignored.
    pub fn set_force(&mut self, actuator: ActuatorIndex, force: f64) {
        if let Some(slot) = self.forces.get_mut(actuator.0) {
            *slot = force;
        }
    }

    #[must_use]
    pub fn forces(&self) -> &[f64] {
        &self.forces
    }

    /// Adds a generalized force to a coordinate's mobility-force accumulator.
    ///
    /// Called by actuators from [`Actuator::compute_force`](crate::Actuator::compute_force).
    /// Out-of-range indices are ignored.
    pub fn apply_mobility_force(&mut self, coordinate: CoordinateIndex, force: f64) {
        if let Some(slot) = self.mobility_forces.get_mut(coordinate.0) {
            *slot += force;
        }
    }

    /// Returns the accumulated generalized force on a coordinate.
    #[must_use]
    pub fn mobility_force(&self, coordinate: CoordinateIndex) -> f64 {
        self.mobility_forces.get(coordinate.0).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn mobility_forces(&self) -> &[f64] {
        &self.mobility_forces
    }

    /// Lowers the realized stage to `stage` if it is currently higher.
    fn invalidate(&mut self, stage: Stage) {
        self.stage = self.stage.min(stage);
    }

    /// Takes the control buffer, zeroed, for a controller pass.
    pub(crate) fn take_controls(&mut self) -> Vec<f64> {
        let mut controls = std::mem::take(&mut self.controls);
        controls.fill(0.0);
        controls
    }

    /// Stores the controls of a completed controller pass.
    pub(crate) fn store_controls(&mut self, controls: Vec<f64>) {
        self.controls = controls;
        self.stage = Stage::Controls;
    }

    /// Zeroes forces and mobility forces before an actuator pass.
    pub(crate) fn clear_forces(&mut self) {
        self.forces.fill(0.0);
        self.mobility_forces.fill(0.0);
    }

    pub(crate) fn mark_forces_realized(&mut self) {
        self.stage = Stage::Forces;
    }
}
