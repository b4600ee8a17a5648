use sinew_core::{
    Actuator, ActuatorIndex, ConnectionError, CoordinateIndex, Degradation, DegradedEvaluation,
    State, Topology,
};

/// An actuator applying a generalized force to a single coordinate.
///
/// The force is the actuator's control scaled by its optimal force.
///
/// # Examples
///
/// ```
/// use sinew_components::CoordinateActuator;
/// use sinew_core::{Actuator, State};
///
/// let knee = CoordinateActuator::new("knee_actuator", "knee_angle_r").with_optimal_force(10.0);
///
/// // Without a model the actuator is invalid and produces no force.
/// assert!(!knee.is_valid());
/// assert_eq!(knee.compute_actuation(&State::default()), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateActuator {
    name: String,
    coordinate: String,
    optimal_force: f64,
    slot: Option<ActuatorIndex>,
    bound: Option<CoordinateIndex>,
}

impl CoordinateActuator {
    /// Creates an actuator for the coordinate identified by `coordinate`
    /// (a name or an absolute path), with an optimal force of 1.
    pub fn new(name: impl Into<String>, coordinate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinate: coordinate.into(),
            optimal_force: 1.0,
            slot: None,
            bound: None,
        }
    }

    #[must_use]
    pub fn with_optimal_force(self, optimal_force: f64) -> Self {
        Self {
            optimal_force,
            ..self
        }
    }

    pub fn set_optimal_force(&mut self, optimal_force: f64) {
        self.optimal_force = optimal_force;
    }

    /// Rebinds the actuator to another coordinate.
    ///
    /// The new label is resolved at the next connect.
    pub fn set_coordinate(&mut self, coordinate: impl Into<String>) {
        self.coordinate = coordinate.into();
        self.bound = None;
    }

    /// Returns the configured coordinate label.
    #[must_use]
    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    /// Returns the coordinate resolved at the last connect.
    #[must_use]
    pub fn bound_coordinate(&self) -> Option<CoordinateIndex> {
        self.bound
    }

    /// Returns the speed of the bound coordinate in `state`, or `0.0` if unbound.
    #[must_use]
    pub fn speed(&self, state: &State) -> f64 {
        self.bound.map_or(0.0, |coordinate| state.speed(coordinate))
    }

    /// Returns the mechanical power delivered in `state`.
    #[must_use]
    pub fn power(&self, state: &State) -> f64 {
        self.force(state) * self.speed(state)
    }
}

impl Actuator for CoordinateActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self, topology: &Topology, slot: ActuatorIndex) -> Result<(), ConnectionError> {
        self.slot = Some(slot);
        self.bound = None;

        let coordinate = topology
            .resolve_coordinate(&self.coordinate)
            .map_err(|source| ConnectionError::Coordinate {
                actuator: self.name.clone(),
                coordinate: self.coordinate.clone(),
                source,
            })?;

        self.bound = Some(coordinate);
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
        self.optimal_force
    }

    fn compute_actuation(&self, state: &State) -> f64 {
        match self.slot {
            Some(slot) => state.control(slot) * self.optimal_force,
            None => 0.0,
        }
    }

    fn compute_force(&self, state: &mut State) -> Option<DegradedEvaluation> {
        let Some(slot) = self.slot else {
            return Some(DegradedEvaluation::new(&self.name, Degradation::Disconnected));
        };

        let force = self
            .override_force(state)
            .unwrap_or_else(|| self.compute_actuation(state));
        state.set_force(slot, force);

        match self.bound {
            Some(coordinate) => {
                state.apply_mobility_force(coordinate, force);
                None
            }
            None => Some(DegradedEvaluation::new(
                &self.name,
                Degradation::InvalidCoordinate {
                    coordinate: self.coordinate.clone(),
                },
            )),
        }
    }
}
