use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::{
    Actuator, ActuatorIndex, ComponentKind, ComponentPath, ComponentRef, ConnectErrors,
    ConnectionError, Controller, ControllerIndex, Coordinate, CoordinateIndex, DegradedEvaluation,
    EvaluationReport, Label, ModelError, ResolveError, Stage, State, Topology, state::Layout,
};

/// Default parent of coordinates.
pub const COORDINATE_SET: &str = "/coordinateset";

/// Default parent of actuators.
pub const FORCE_SET: &str = "/forceset";

/// Default parent of controllers.
pub const CONTROLLER_SET: &str = "/controllerset";

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Where a structural element stands between configuration and evaluation.
///
/// Elements only move forward through [`Model::connect`],
/// [`Model::create_system`] and [`Model::init_state`]. Any structural change
/// to the model sends every element back to `Configured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Lifecycle {
    /// Properties and bindings are set; no reference is resolved.
    #[default]
    Configured,
    /// Every label resolved against the model.
    Connected,
    /// Registered with the dynamics engine.
    SystemCreated,
    /// Taking part in evaluation passes.
    Active,
}

/// The dynamics engine receiving the generalized forces of an evaluation.
///
/// The unit type implements `Dynamics` as a no-op, for callers that only
/// read results from the evaluation context.
pub trait Dynamics {
    /// Receives the mobility forces accumulated for one context, indexed by coordinate.
    fn apply_mobility_forces(&mut self, time: f64, forces: &[f64]);
}

impl Dynamics for () {
    fn apply_mobility_forces(&mut self, _time: f64, _forces: &[f64]) {}
}

#[derive(Debug)]
struct Slot<E> {
    element: E,
    lifecycle: Lifecycle,
    error: Option<ConnectionError>,
}

impl<E> Slot<E> {
    fn new(element: E) -> Self {
        Self {
            element,
            lifecycle: Lifecycle::Configured,
            error: None,
        }
    }

    fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    fn advance(&mut self, from: Lifecycle, to: Lifecycle) {
        if self.lifecycle == from {
            self.lifecycle = to;
        }
    }

    fn settle(&mut self, result: Result<(), ConnectionError>) -> Option<ConnectionError> {
        match result {
            Ok(()) => {
                self.lifecycle = Lifecycle::Connected;
                self.error = None;
                None
            }
            Err(error) => {
                self.lifecycle = Lifecycle::Configured;
                self.error = Some(error.clone());
                Some(error)
            }
        }
    }
}

/// The tree of coordinates, actuators and controllers, and the pipeline that evaluates it.
///
/// A model owns its elements. It resolves labels across the whole tree,
/// drives every element through its [`Lifecycle`], and evaluates contexts:
///
/// 1. Each active controller writes controls into the context's control vector.
/// 2. Each active actuator turns its control (or override) into a force, caches
///    it in the context and adds it to the mobility-force accumulator.
/// 3. The accumulated mobility forces are handed to a [`Dynamics`] engine.
///
/// Evaluation takes `&self`, so one connected model can evaluate any number
/// of contexts concurrently. Structural changes take `&mut self` and must be
/// finished before evaluation starts.
///
/// # Examples
///
/// ```
/// use sinew_core::{Coordinate, Model};
///
/// let mut model = Model::new("leg");
/// model.add_coordinate(Coordinate::new("knee_angle_r")).unwrap();
///
/// model.connect().unwrap();
/// model.create_system().unwrap();
/// let mut state = model.init_state().unwrap();
///
/// let report = model.realize_forces(&mut state).unwrap();
/// assert!(report.is_clean());
/// assert_eq!(state.mobility_forces(), &[0.0]);
/// ```
#[derive(Debug)]
pub struct Model {
    name: String,
    id: u64,
    revision: u64,
    phase: Lifecycle,
    topology: Topology,
    actuators: Vec<Slot<Box<dyn Actuator>>>,
    controllers: Vec<Slot<Box<dyn Controller>>>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed),
            revision: 0,
            phase: Lifecycle::Configured,
            topology: Topology::default(),
            actuators: Vec::new(),
            controllers: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lifecycle stage the model as a whole has reached.
    #[must_use]
    pub fn phase(&self) -> Lifecycle {
        self.phase
    }

    /// Returns how many structural changes the model has seen.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        self.topology.coordinates()
    }

    #[must_use]
    pub fn num_actuators(&self) -> usize {
        self.actuators.len()
    }

    #[must_use]
    pub fn num_controllers(&self) -> usize {
        self.controllers.len()
    }

    /// Adds a coordinate under [`COORDINATE_SET`].
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the name is invalid or its path is taken.
    pub fn add_coordinate(&mut self, coordinate: Coordinate) -> Result<CoordinateIndex, ModelError> {
        self.add_coordinate_at(COORDINATE_SET, coordinate)
    }

    /// Adds a coordinate under `parent`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if `parent` or the name is invalid, or the
    /// resulting path is taken.
    pub fn add_coordinate_at(
        &mut self,
        parent: &str,
        coordinate: Coordinate,
    ) -> Result<CoordinateIndex, ModelError> {
        let path = ComponentPath::parse(parent)?.join(coordinate.name())?;
        let index = self.topology.insert_coordinate(path, coordinate)?;
        self.invalidate();
        Ok(index)
    }

    /// Adds an actuator under [`FORCE_SET`].
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the name is invalid or its path is taken.
    pub fn add_actuator<A: Actuator + 'static>(
        &mut self,
        actuator: A,
    ) -> Result<ActuatorIndex, ModelError> {
        self.add_actuator_at(FORCE_SET, actuator)
    }

    /// Adds an actuator under `parent`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if `parent` or the name is invalid, or the
    /// resulting path is taken.
    pub fn add_actuator_at<A: Actuator + 'static>(
        &mut self,
        parent: &str,
        actuator: A,
    ) -> Result<ActuatorIndex, ModelError> {
        let path = ComponentPath::parse(parent)?.join(actuator.name())?;
        let index = self.topology.insert_actuator(path)?;
        self.actuators.push(Slot::new(Box::new(actuator)));
        self.invalidate();
        Ok(index)
    }

    /// Adds a controller under [`CONTROLLER_SET`].
    ///
    /// Controllers registered later win when they drive the same actuator.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the name is invalid or its path is taken.
    pub fn add_controller<C: Controller + 'static>(
        &mut self,
        controller: C,
    ) -> Result<ControllerIndex, ModelError> {
        self.add_controller_at(CONTROLLER_SET, controller)
    }

    /// Adds a controller under `parent`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if `parent` or the name is invalid, or the
    /// resulting path is taken.
    pub fn add_controller_at<C: Controller + 'static>(
        &mut self,
        parent: &str,
        controller: C,
    ) -> Result<ControllerIndex, ModelError> {
        let path = ComponentPath::parse(parent)?.join(controller.name())?;
        let index = self.topology.insert_controller(path)?;
        self.controllers.push(Slot::new(Box::new(controller)));
        self.invalidate();
        Ok(index)
    }

    /// Removes an actuator and returns it, disconnected.
    ///
    /// Actuators registered after it shift down by one index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Resolve`] if `label` does not identify an actuator.
    pub fn remove_actuator(&mut self, label: &str) -> Result<Box<dyn Actuator>, ModelError> {
        let index = self.topology.resolve_actuator(label)?;
        self.topology.remove_actuator(index);
        let mut actuator = self.actuators.remove(index.0).element;
        actuator.disconnect();
        self.invalidate();
        Ok(actuator)
    }

    /// Removes a controller and returns it, disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Resolve`] if `label` does not identify a controller.
    pub fn remove_controller(&mut self, label: &str) -> Result<Box<dyn Controller>, ModelError> {
        let index = self.topology.resolve_controller(label)?;
        self.topology.remove_controller(index);
        let mut controller = self.controllers.remove(index.0).element;
        controller.disconnect();
        self.invalidate();
        Ok(controller)
    }

    /// Removes every actuator.
    pub fn clear_actuators(&mut self) {
        self.topology.clear_actuators();
        self.actuators.clear();
        self.invalidate();
    }

    /// Connects every actuator and controller to the model.
    ///
    /// Every element is attempted. Elements that connect move to
    /// [`Lifecycle::Connected`]; elements that fail stay
    /// [`Lifecycle::Configured`], keep their error for
    /// [`connection_error`](Model::connection_error), and are left out of
    /// evaluation. The model itself counts as connected either way.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectErrors`] holding every failure of this pass.
    pub fn connect(&mut self) -> Result<(), ConnectErrors> {
        let mut errors = Vec::new();

        for (i, slot) in self.actuators.iter_mut().enumerate() {
            slot.element.disconnect();
            let result = slot.element.connect(&self.topology, ActuatorIndex(i));
            errors.extend(slot.settle(result));
        }

        for (i, slot) in self.controllers.iter_mut().enumerate() {
            slot.element.disconnect();
            let result = slot.element.connect(&self.topology, ControllerIndex(i));
            errors.extend(slot.settle(result));
        }

        self.phase = Lifecycle::Connected;

        for error in &errors {
            warn!(model = %self.name, %error, "component failed to connect");
        }
        debug!(
            model = %self.name,
            actuators = self.actuators.len(),
            controllers = self.controllers.len(),
            failed = errors.len(),
            "connected model"
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConnectErrors(errors))
        }
    }

    /// Registers every connected element with the dynamics engine.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotConnected`] if the model changed since its last connect.
    pub fn create_system(&mut self) -> Result<(), ModelError> {
        self.require(Lifecycle::Connected)?;

        for slot in &mut self.actuators {
            slot.advance(Lifecycle::Connected, Lifecycle::SystemCreated);
        }
        for slot in &mut self.controllers {
            slot.advance(Lifecycle::Connected, Lifecycle::SystemCreated);
        }
        self.phase = self.phase.max(Lifecycle::SystemCreated);

        debug!(model = %self.name, "created system");
        Ok(())
    }

    /// Activates the system and returns its default evaluation context.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model is not connected or has no system.
    pub fn init_state(&mut self) -> Result<State, ModelError> {
        self.require(Lifecycle::SystemCreated)?;

        for slot in &mut self.actuators {
            slot.advance(Lifecycle::SystemCreated, Lifecycle::Active);
        }
        for slot in &mut self.controllers {
            slot.advance(Lifecycle::SystemCreated, Lifecycle::Active);
        }
        self.phase = Lifecycle::Active;

        debug!(model = %self.name, revision = self.revision, "initialized state");
        self.default_state()
    }

    /// Returns a fresh context seeded with coordinate defaults and zero inputs.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model is not connected or has no system.
    pub fn default_state(&self) -> Result<State, ModelError> {
        self.require(Lifecycle::SystemCreated)?;

        let coordinates = self.topology.coordinates();
        Ok(State::new(
            self.layout(),
            coordinates.iter().map(Coordinate::default_value).collect(),
            coordinates.iter().map(Coordinate::default_speed).collect(),
            self.controllers
                .iter()
                .map(|slot| vec![0.0; slot.element.num_inputs()])
                .collect(),
            self.actuators.len(),
        ))
    }

    /// Returns the lifecycle stage of the element named by `label`.
    ///
    /// Names are looked up among actuators first, then controllers, then
    /// coordinates. Coordinates follow the model's own phase.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Resolve`] if `label` does not identify an element.
    pub fn lifecycle(&self, label: &str) -> Result<Lifecycle, ModelError> {
        Ok(match self.element(label)? {
            ComponentRef::Coordinate(_) => self.phase,
            ComponentRef::Actuator(index) => self.actuator_slot(index)?.lifecycle,
            ComponentRef::Controller(index) => self.controller_slot(index)?.lifecycle,
        })
    }

    /// Returns the error retained from the element's last failed connect, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Resolve`] if `label` does not identify an element.
    pub fn connection_error(&self, label: &str) -> Result<Option<&ConnectionError>, ModelError> {
        Ok(match self.element(label)? {
            ComponentRef::Coordinate(_) => None,
            ComponentRef::Actuator(index) => self.actuator_slot(index)?.error.as_ref(),
            ComponentRef::Controller(index) => self.controller_slot(index)?.error.as_ref(),
        })
    }

    /// Returns the actuator identified by `label`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Resolve`] if `label` does not identify an actuator.
    pub fn actuator(&self, label: &str) -> Result<&dyn Actuator, ModelError> {
        let index = self.topology.resolve_actuator(label)?;
        Ok(self.actuator_slot(index)?.element.as_ref())
    }

    /// Returns the controller identified by `label`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Resolve`] if `label` does not identify a controller.
    pub fn controller(&self, label: &str) -> Result<&dyn Controller, ModelError> {
        let index = self.topology.resolve_controller(label)?;
        Ok(self.controller_slot(index)?.element.as_ref())
    }

    /// Returns every actuator in registration order.
    pub fn actuators(&self) -> impl Iterator<Item = &dyn Actuator> + '_ {
        self.actuators.iter().map(|slot| slot.element.as_ref())
    }

    /// Realizes the control vector of `state`.
    ///
    /// Controls already realized in `state` are reused.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model is not active or `state` is stale.
    pub fn realize_controls(&self, state: &mut State) -> Result<EvaluationReport, ModelError> {
        self.check(state)?;

        let mut report = EvaluationReport {
            time: state.time(),
            ..EvaluationReport::default()
        };

        if state.stage() >= Stage::Controls {
            report.reused_cache = true;
        } else {
            self.compute_controls(state, &mut report.diagnostics);
        }
        Ok(report)
    }

    /// Realizes controls, actuator forces and mobility forces of `state`.
    ///
    /// A component that degrades never stops the others: its diagnostic is
    /// collected in the report, in pipeline order.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model is not active or `state` is stale.
    pub fn realize_forces(&self, state: &mut State) -> Result<EvaluationReport, ModelError> {
        self.check(state)?;

        let mut report = EvaluationReport {
            time: state.time(),
            ..EvaluationReport::default()
        };

        if state.stage() >= Stage::Forces {
            report.reused_cache = true;
            return Ok(report);
        }

        if state.stage() < Stage::Controls {
            self.compute_controls(state, &mut report.diagnostics);
        }

        state.clear_forces();
        for slot in self.actuators.iter().filter(|slot| slot.is_active()) {
            if let Some(diagnostic) = slot.element.compute_force(state) {
                self.degraded(state, &diagnostic);
                report.diagnostics.push(diagnostic);
            }
        }
        state.mark_forces_realized();

        Ok(report)
    }

    /// Realizes `state` and hands its mobility forces to `dynamics`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model is not active or `state` is stale.
    pub fn evaluate<D: Dynamics + ?Sized>(
        &self,
        state: &mut State,
        dynamics: &mut D,
    ) -> Result<EvaluationReport, ModelError> {
        let report = self.realize_forces(state)?;
        dynamics.apply_mobility_forces(state.time(), state.mobility_forces());
        Ok(report)
    }

    /// Supplies the external inputs of the controller identified by `label`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if `label` does not identify a controller or
    /// `state` does not belong to this model.
    pub fn set_controller_inputs(
        &self,
        state: &mut State,
        label: &str,
        inputs: Vec<f64>,
    ) -> Result<(), ModelError> {
        self.check_layout(state)?;
        let index = self.topology.resolve_controller(label)?;
        state.set_controller_inputs(index, inputs);
        Ok(())
    }

    /// Sets or clears the override force of the actuator identified by `label`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if `label` does not identify an actuator or
    /// `state` does not belong to this model.
    pub fn set_override(
        &self,
        state: &mut State,
        label: &str,
        force: Option<f64>,
    ) -> Result<(), ModelError> {
        self.check_layout(state)?;
        let index = self.topology.resolve_actuator(label)?;
        state.set_override(index, force);
        Ok(())
    }

    /// Returns the record labels of every actuator, in registration order.
    #[must_use]
    pub fn record_labels(&self) -> Vec<String> {
        self.actuators
            .iter()
            .flat_map(|slot| slot.element.record_labels())
            .collect()
    }

    /// Returns the record values of every actuator for `state`, matching
    /// [`record_labels`](Model::record_labels).
    #[must_use]
    pub fn record_values(&self, state: &State) -> Vec<f64> {
        self.actuators
            .iter()
            .flat_map(|slot| slot.element.record_values(state))
            .collect()
    }

    fn compute_controls(&self, state: &mut State, diagnostics: &mut Vec<DegradedEvaluation>) {
        let mut controls = state.take_controls();
        for slot in self.controllers.iter().filter(|slot| slot.is_active()) {
            if let Err(diagnostic) = slot.element.compute_controls(state, &mut controls) {
                self.degraded(state, &diagnostic);
                diagnostics.push(diagnostic);
            }
        }
        state.store_controls(controls);
    }

    fn degraded(&self, state: &State, diagnostic: &DegradedEvaluation) {
        warn!(
            model = %self.name,
            time = state.time(),
            %diagnostic,
            "degraded evaluation"
        );
    }

    /// Sends every element back to `Configured` after a structural change.
    fn invalidate(&mut self) {
        for slot in &mut self.actuators {
            slot.element.disconnect();
            slot.lifecycle = Lifecycle::Configured;
            slot.error = None;
        }
        for slot in &mut self.controllers {
            slot.element.disconnect();
            slot.lifecycle = Lifecycle::Configured;
            slot.error = None;
        }
        self.phase = Lifecycle::Configured;
        self.revision += 1;
    }

    fn layout(&self) -> Layout {
        Layout {
            model: self.id,
            revision: self.revision,
        }
    }

    fn require(&self, stage: Lifecycle) -> Result<(), ModelError> {
        if self.phase >= stage {
            return Ok(());
        }

        let model = self.name.clone();
        Err(match self.phase {
            Lifecycle::Configured => ModelError::NotConnected { model },
            Lifecycle::Connected => ModelError::SystemNotCreated { model },
            Lifecycle::SystemCreated | Lifecycle::Active => ModelError::NotActive { model },
        })
    }

    fn check_layout(&self, state: &State) -> Result<(), ModelError> {
        if state.layout() == self.layout() {
            Ok(())
        } else {
            Err(ModelError::StaleState {
                model: self.name.clone(),
            })
        }
    }

    fn check(&self, state: &State) -> Result<(), ModelError> {
        self.require(Lifecycle::Active)?;
        self.check_layout(state)
    }

    fn element(&self, label: &str) -> Result<ComponentRef, ModelError> {
        let parsed = Label::parse(label).map_err(|source| ResolveError::Malformed {
            label: label.to_owned(),
            source,
        })?;

        if let Label::Path(path) = parsed {
            return self.topology.find(&path).ok_or_else(|| {
                ResolveError::NoElement {
                    label: label.to_owned(),
                }
                .into()
            });
        }

        let missing = |error: &ResolveError| matches!(error, ResolveError::NotFound { .. });
        match self.topology.resolve_actuator(label) {
            Err(error) if missing(&error) => {}
            found => return Ok(ComponentRef::Actuator(found?)),
        }
        match self.topology.resolve_controller(label) {
            Err(error) if missing(&error) => {}
            found => return Ok(ComponentRef::Controller(found?)),
        }
        match self.topology.resolve_coordinate(label) {
            Err(error) if missing(&error) => Err(ResolveError::NoElement {
                label: label.to_owned(),
            }
            .into()),
            found => Ok(ComponentRef::Coordinate(found?)),
        }
    }

    fn actuator_slot(&self, index: ActuatorIndex) -> Result<&Slot<Box<dyn Actuator>>, ModelError> {
        self.actuators.get(index.0).ok_or_else(|| {
            ResolveError::NotFound {
                kind: ComponentKind::Actuator,
                label: index.0.to_string(),
            }
            .into()
        })
    }

    fn controller_slot(
        &self,
        index: ControllerIndex,
    ) -> Result<&Slot<Box<dyn Controller>>, ModelError> {
        self.controllers.get(index.0).ok_or_else(|| {
            ResolveError::NotFound {
                kind: ComponentKind::Controller,
                label: index.0.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{ActuatorSet, Degradation};

    /// Pushes `gain * control` onto one coordinate.
    #[derive(Debug)]
    struct Motor {
        name: String,
        coordinate: String,
        gain: f64,
        slot: Option<ActuatorIndex>,
        bound: Option<CoordinateIndex>,
    }

    impl Motor {
        fn new(name: &str, coordinate: &str, gain: f64) -> Self {
            Self {
                name: name.into(),
                coordinate: coordinate.into(),
                gain,
                slot: None,
                bound: None,
            }
        }
    }

    impl Actuator for Motor {
        fn name(&self) -> &str {
            &self.name
        }

        fn connect(
            &mut self,
            topology: &Topology,
            slot: ActuatorIndex,
        ) -> Result<(), ConnectionError> {
            self.slot = Some(slot);
            let bound = topology.resolve_coordinate(&self.coordinate).map_err(|source| {
                ConnectionError::Coordinate {
                    actuator: self.name.clone(),
                    coordinate: self.coordinate.clone(),
                    source,
                }
            })?;
            self.bound = Some(bound);
            Ok(())
        }

        fn disconnect(&mut self) {
            self.slot = None;
            self.bound = None;
        }

        fn slot(&self) -> Option<ActuatorIndex> {
            self.slot
        }

        fn is_valid(&self) -> bool {
            self.slot.is_some() && self.bound.is_some()
        }

        fn optimal_force(&self) -> f64 {
            self.gain
        }

        fn compute_actuation(&self, state: &State) -> f64 {
            self.control(state) * self.gain
        }

        fn compute_force(&self, state: &mut State) -> Option<DegradedEvaluation> {
            let Some(slot) = self.slot else {
                return Some(DegradedEvaluation::new(&self.name, Degradation::Disconnected));
            };
            let force = self
                .override_force(state)
                .unwrap_or_else(|| self.compute_actuation(state));
            state.set_force(slot, force);
            let coordinate = self.bound?;
            state.apply_mobility_force(coordinate, force);
            None
        }
    }

    /// Drives its actuators with a fixed value, or its first input when `value` is `None`.
    #[derive(Debug)]
    struct Fixed {
        name: String,
        actuators: ActuatorSet,
        value: Option<f64>,
        slot: Option<ControllerIndex>,
    }

    impl Fixed {
        fn new(name: &str, actuators: &[&str], value: Option<f64>) -> Self {
            let mut set = ActuatorSet::new();
            for label in actuators {
                set.add(*label);
            }
            Self {
                name: name.into(),
                actuators: set,
                value,
                slot: None,
            }
        }
    }

    impl Controller for Fixed {
        fn name(&self) -> &str {
            &self.name
        }

        fn connect(
            &mut self,
            topology: &Topology,
            slot: ControllerIndex,
        ) -> Result<(), ConnectionError> {
            self.slot = Some(slot);
            self.actuators.connect(&self.name, topology)
        }

        fn disconnect(&mut self) {
            self.slot = None;
            self.actuators.disconnect();
        }

        fn actuators(&self) -> &[ActuatorIndex] {
            self.actuators.resolved()
        }

        fn compute_controls(
            &self,
            state: &State,
            controls: &mut [f64],
        ) -> Result<(), DegradedEvaluation> {
            let value = match (self.value, self.slot) {
                (Some(value), _) => value,
                (None, Some(slot)) => state.controller_inputs(slot).first().copied().unwrap_or(0.0),
                (None, None) => 0.0,
            };
            for actuator in self.actuators.resolved() {
                controls[actuator.index()] = value;
            }
            Ok(())
        }

        fn num_inputs(&self) -> usize {
            usize::from(self.value.is_none())
        }
    }

    fn leg() -> Model {
        let mut model = Model::new("leg");
        model.add_coordinate(Coordinate::new("hip_flexion_r")).unwrap();
        model
            .add_coordinate(Coordinate::new("knee_angle_r").with_default_value(0.3))
            .unwrap();
        model.add_actuator(Motor::new("hip", "hip_flexion_r", 100.0)).unwrap();
        model.add_actuator(Motor::new("knee", "knee_angle_r", 10.0)).unwrap();
        model
            .add_controller(Fixed::new("gait", &["hip", "knee"], Some(0.5)))
            .unwrap();
        model
    }

    fn activate(model: &mut Model) -> State {
        model.connect().unwrap();
        model.create_system().unwrap();
        model.init_state().unwrap()
    }

    #[test]
    fn elements_advance_through_lifecycle() {
        let mut model = leg();
        assert_eq!(model.lifecycle("hip"), Ok(Lifecycle::Configured));
        assert!(matches!(
            model.create_system(),
            Err(ModelError::NotConnected { .. })
        ));

        model.connect().unwrap();
        assert_eq!(model.lifecycle("hip"), Ok(Lifecycle::Connected));
        assert!(matches!(
            model.init_state(),
            Err(ModelError::SystemNotCreated { .. })
        ));

        model.create_system().unwrap();
        assert_eq!(model.lifecycle("gait"), Ok(Lifecycle::SystemCreated));

        let state = model.init_state().unwrap();
        assert_eq!(model.lifecycle("/forceset/knee"), Ok(Lifecycle::Active));
        assert_eq!(model.lifecycle("/controllerset/gait"), Ok(Lifecycle::Active));
        assert_eq!(state.values(), &[0.0, 0.3]);
        assert_eq!(state.controls().len(), 2);
    }

    #[test]
    fn inspection_finds_every_kind_of_element() {
        let mut model = leg();
        model.connect().unwrap();

        assert_eq!(model.lifecycle("knee_angle_r"), Ok(Lifecycle::Connected));
        assert_eq!(
            model.lifecycle("/coordinateset/knee_angle_r"),
            Ok(Lifecycle::Connected)
        );
        assert_eq!(model.connection_error("knee_angle_r"), Ok(None));

        for label in ["ankle_angle_r", "/controllerset/ankle"] {
            assert!(matches!(
                model.lifecycle(label),
                Err(ModelError::Resolve(ResolveError::NoElement { .. }))
            ));
        }
    }

    #[test]
    fn pipeline_computes_controls_then_forces() {
        let mut model = leg();
        let mut state = activate(&mut model);

        let report = model.realize_forces(&mut state).unwrap();
        assert!(report.is_clean());
        assert!(!report.reused_cache);
        assert_eq!(state.stage(), Stage::Forces);
        assert_eq!(state.controls(), &[0.5, 0.5]);
        assert_relative_eq!(state.forces()[0], 50.0);
        assert_relative_eq!(state.forces()[1], 5.0);
        assert_relative_eq!(state.mobility_force(CoordinateIndex(1)), 5.0);

        let report = model.realize_forces(&mut state).unwrap();
        assert!(report.reused_cache);
        assert_relative_eq!(state.mobility_force(CoordinateIndex(1)), 5.0);
    }

    #[test]
    fn realize_controls_stops_before_forces() {
        let mut model = leg();
        let mut state = activate(&mut model);

        model.realize_controls(&mut state).unwrap();
        assert_eq!(state.stage(), Stage::Controls);
        assert_eq!(state.forces(), &[0.0, 0.0]);

        assert!(model.realize_controls(&mut state).unwrap().reused_cache);
    }

    #[test]
    fn failed_connection_is_isolated() {
        let mut model = leg();
        model
            .add_actuator(Motor::new("ankle", "ankle_angle_r", 1.0))
            .unwrap();

        let errors = model.connect().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(matches!(
            model.connection_error("ankle"),
            Ok(Some(ConnectionError::Coordinate { .. }))
        ));
        assert_eq!(model.connection_error("knee"), Ok(None));

        model.create_system().unwrap();
        let mut state = model.init_state().unwrap();
        assert_eq!(model.lifecycle("ankle"), Ok(Lifecycle::Configured));

        let report = model.realize_forces(&mut state).unwrap();
        assert!(report.is_clean());
        assert_relative_eq!(state.forces()[1], 5.0);
        assert_eq!(state.forces()[2], 0.0);
    }

    #[test]
    fn structural_change_resets_lifecycle_and_stales_states() {
        let mut model = leg();
        let mut state = activate(&mut model);

        model.add_actuator(Motor::new("ankle", "knee_angle_r", 1.0)).unwrap();
        assert_eq!(model.lifecycle("hip"), Ok(Lifecycle::Configured));
        assert_eq!(model.phase(), Lifecycle::Configured);
        assert!(matches!(
            model.realize_forces(&mut state),
            Err(ModelError::NotConnected { .. })
        ));

        activate(&mut model);
        assert!(matches!(
            model.realize_forces(&mut state),
            Err(ModelError::StaleState { .. })
        ));
    }

    #[test]
    fn states_from_other_models_are_rejected() {
        let mut model = leg();
        let mut other = leg();
        activate(&mut model);
        let mut state = activate(&mut other);

        assert!(matches!(
            model.realize_forces(&mut state),
            Err(ModelError::StaleState { .. })
        ));
        assert!(matches!(
            model.realize_forces(&mut State::default()),
            Err(ModelError::StaleState { .. })
        ));
    }

    #[test]
    fn later_controllers_win() {
        let mut model = leg();
        model
            .add_controller(Fixed::new("assist", &["knee"], Some(-1.0)))
            .unwrap();
        let mut state = activate(&mut model);

        model.realize_forces(&mut state).unwrap();
        assert_eq!(state.controls(), &[0.5, -1.0]);
        assert_relative_eq!(state.forces()[1], -10.0);
    }

    #[test]
    fn overrides_replace_actuation_in_one_context() {
        let mut model = leg();
        let mut state = activate(&mut model);
        let mut other = state.clone();

        model.set_override(&mut state, "knee", Some(42.0)).unwrap();
        model.realize_forces(&mut state).unwrap();
        model.realize_forces(&mut other).unwrap();

        assert_relative_eq!(state.forces()[1], 42.0);
        assert_relative_eq!(state.mobility_force(CoordinateIndex(1)), 42.0);
        assert_relative_eq!(other.forces()[1], 5.0);
        assert!(model.actuator("knee").unwrap().is_overridden(&state));

        model.set_override(&mut state, "knee", None).unwrap();
        assert_eq!(state.stage(), Stage::Controls);
        let report = model.realize_forces(&mut state).unwrap();
        assert!(!report.reused_cache);
        assert_relative_eq!(state.forces()[1], 5.0);
    }

    #[test]
    fn controller_inputs_are_read_from_the_context() {
        let mut model = leg();
        model
            .add_controller(Fixed::new("emg", &["hip"], None))
            .unwrap();
        let mut state = activate(&mut model);

        model
            .set_controller_inputs(&mut state, "emg", vec![0.25])
            .unwrap();
        model.realize_forces(&mut state).unwrap();
        assert_relative_eq!(state.forces()[0], 25.0);

        assert!(matches!(
            model.set_controller_inputs(&mut state, "missing", vec![]),
            Err(ModelError::Resolve(ResolveError::NotFound { .. }))
        ));
    }

    #[test]
    fn evaluate_hands_forces_to_dynamics() {
        #[derive(Default)]
        struct Recorder(Vec<(f64, Vec<f64>)>);

        impl Dynamics for Recorder {
            fn apply_mobility_forces(&mut self, time: f64, forces: &[f64]) {
                self.0.push((time, forces.to_vec()));
            }
        }

        let mut model = leg();
        let mut state = activate(&mut model);
        state.set_time(0.75);

        let mut recorder = Recorder::default();
        model.evaluate(&mut state, &mut recorder).unwrap();
        model.evaluate(&mut state, &mut ()).unwrap();

        assert_eq!(recorder.0, vec![(0.75, vec![50.0, 5.0])]);
    }

    #[test]
    fn record_labels_and_values_line_up() {
        let mut model = leg();
        let mut state = activate(&mut model);
        model.realize_forces(&mut state).unwrap();

        assert_eq!(model.record_labels(), vec!["hip", "knee"]);
        assert_eq!(model.record_values(&state), vec![50.0, 5.0]);
    }

    #[test]
    fn removing_an_actuator_shifts_later_ones() {
        let mut model = leg();
        let removed = model.remove_actuator("hip").unwrap();
        assert_eq!(removed.name(), "hip");
        assert_eq!(removed.slot(), None);

        model.remove_controller("gait").unwrap();
        model
            .add_controller(Fixed::new("gait", &["knee"], Some(1.0)))
            .unwrap();
        let mut state = activate(&mut model);

        model.realize_forces(&mut state).unwrap();
        assert_eq!(model.num_actuators(), 1);
        assert_eq!(model.actuator("knee").unwrap().slot(), Some(ActuatorIndex(0)));
        assert_relative_eq!(state.forces()[0], 10.0);
    }

    #[test]
    fn duplicate_paths_are_rejected_without_side_effects() {
        let mut model = leg();
        let revision = model.revision();

        let result = model.add_actuator(Motor::new("knee", "knee_angle_r", 1.0));
        assert!(matches!(result, Err(ModelError::DuplicatePath { .. })));
        assert_eq!(model.num_actuators(), 2);
        assert_eq!(model.revision(), revision);

        model
            .add_actuator_at("/reserves", Motor::new("knee", "knee_angle_r", 1.0))
            .unwrap();
        assert!(matches!(
            model.actuator("knee"),
            Err(ModelError::Resolve(ResolveError::Ambiguous { .. }))
        ));
    }
}
