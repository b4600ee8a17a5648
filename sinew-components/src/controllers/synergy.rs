use ndarray::{Array1, Array2};
use sinew_core::{
    ActuatorIndex, ActuatorSet, ConnectionError, Controller, ControllerIndex, Degradation,
    DegradedEvaluation, State, Topology,
};

/// A controller mapping a few synergy excitations onto many actuators.
///
/// Each synergy vector holds one weight per actuator, in the order the
/// actuators were added. The control of actuator `a` is
/// `sum_j excitation_j * vector_j[a]`.
///
/// Excitations are external inputs labeled `synergy_excitation_<j>`, supplied
/// through [`Model::set_controller_inputs`](sinew_core::Model::set_controller_inputs).
///
/// # Examples
///
/// ```
/// use sinew_components::SynergyController;
/// use sinew_core::Controller;
///
/// let mut controller = SynergyController::new("synergy_controller_right_leg");
/// controller.add_actuator("soleus_r");
/// controller.add_actuator("gasmed_r");
/// controller.add_synergy_vector(vec![0.8, 0.2]);
/// controller.add_synergy_vector(vec![0.1, 0.9]);
///
/// assert_eq!(
///     controller.input_labels(),
///     vec!["synergy_excitation_0", "synergy_excitation_1"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SynergyController {
    name: String,
    actuators: ActuatorSet,
    vectors: Vec<Vec<f64>>,
    slot: Option<ControllerIndex>,
    /// Actuators by synergies, built at connect.
    mixing: Array2<f64>,
    names: Vec<String>,
}

impl SynergyController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an actuator (a model-wide unique name or an absolute path).
    pub fn add_actuator(&mut self, label: impl Into<String>) {
        self.actuators.add(label);
    }

    #[must_use]
    pub fn with_actuator(mut self, label: impl Into<String>) -> Self {
        self.add_actuator(label);
        self
    }

    /// Adds a synergy vector holding one weight per actuator.
    ///
    /// The length is checked when the controller connects.
    pub fn add_synergy_vector(&mut self, weights: Vec<f64>) {
        self.vectors.push(weights);
    }

    #[must_use]
    pub fn with_synergy_vector(mut self, weights: Vec<f64>) -> Self {
        self.add_synergy_vector(weights);
        self
    }

    #[must_use]
    pub fn num_synergies(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn synergy_vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }
}

impl Controller for SynergyController {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self, topology: &Topology, slot: ControllerIndex) -> Result<(), ConnectionError> {
        self.disconnect();
        self.actuators.connect(&self.name, topology)?;

        let num_actuators = self.actuators.resolved().len();
        if num_actuators != self.actuators.labels().len() {
            self.actuators.disconnect();
            return Err(ConnectionError::Invalid {
                controller: self.name.clone(),
                reason: "two actuator labels name the same actuator".into(),
            });
        }
        if let Some((j, vector)) = self
            .vectors
            .iter()
            .enumerate()
            .find(|(_, vector)| vector.len() != num_actuators)
        {
            let reason = format!(
                "synergy vector {j} has {} weights for {num_actuators} actuators",
                vector.len()
            );
            self.actuators.disconnect();
            return Err(ConnectionError::Invalid {
                controller: self.name.clone(),
                reason,
            });
        }

        self.mixing = Array2::from_shape_fn((num_actuators, self.vectors.len()), |(a, j)| {
            self.vectors[j][a]
        });
        self.names = self
            .actuators
            .resolved()
            .iter()
            .map(|&actuator| topology.actuator_name(actuator).unwrap_or_default().to_owned())
            .collect();
        self.slot = Some(slot);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.actuators.disconnect();
        self.mixing = Array2::zeros((0, 0));
        self.names.clear();
        self.slot = None;
    }

    fn actuators(&self) -> &[ActuatorIndex] {
        self.actuators.resolved()
    }

    fn compute_controls(
        &self,
        state: &State,
        controls: &mut [f64],
    ) -> Result<(), DegradedEvaluation> {
        let Some(slot) = self.slot else {
            return Err(DegradedEvaluation::new(&self.name, Degradation::Disconnected));
        };

        let inputs = state.controller_inputs(slot);
        let num_synergies = self.vectors.len();
        let mut degraded = (inputs.len() != num_synergies).then(|| {
            DegradedEvaluation::new(
                &self.name,
                Degradation::InputLength {
                    expected: num_synergies,
                    found: inputs.len(),
                },
            )
        });

        let excitations: Array1<f64> = (0..num_synergies)
            .map(|j| inputs.get(j).copied().unwrap_or(0.0))
            .collect();
        let mixed = self.mixing.dot(&excitations);

        let targets = self.actuators.resolved().iter().zip(&self.names);
        for ((actuator, name), &value) in targets.zip(&mixed) {
            let Some(control) = controls.get_mut(actuator.index()) else {
                continue;
            };
            if value.is_finite() {
                *control = value;
            } else {
                *control = 0.0;
                degraded.get_or_insert_with(|| {
                    DegradedEvaluation::new(
                        &self.name,
                        Degradation::NonFiniteControl {
                            actuator: name.clone(),
                            value,
                        },
                    )
                });
            }
        }

        degraded.map_or(Ok(()), Err)
    }

    fn num_inputs(&self) -> usize {
        self.vectors.len()
    }

    fn input_labels(&self) -> Vec<String> {
        (0..self.vectors.len())
            .map(|j| format!("synergy_excitation_{j}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use sinew_core::{Coordinate, Model};

    use crate::CoordinateActuator;

    fn leg(controller: SynergyController) -> Model {
        let mut model = Model::new("leg");
        model.add_coordinate(Coordinate::new("ankle_angle_r")).unwrap();
        for muscle in ["soleus_r", "gasmed_r", "tibant_r"] {
            model
                .add_actuator(CoordinateActuator::new(muscle, "ankle_angle_r"))
                .unwrap();
        }
        model.add_controller(controller).unwrap();
        model
    }

    fn right_leg() -> SynergyController {
        SynergyController::new("synergy_controller_right_leg")
            .with_actuator("soleus_r")
            .with_actuator("tibant_r")
            .with_synergy_vector(vec![1.0, 0.0])
            .with_synergy_vector(vec![0.5, 2.0])
    }

    #[test]
    fn excitations_mix_through_synergy_vectors() {
        let mut model = leg(right_leg());
        model.connect().unwrap();
        model.create_system().unwrap();
        let mut state = model.init_state().unwrap();

        model
            .set_controller_inputs(&mut state, "synergy_controller_right_leg", vec![0.2, 0.4])
            .unwrap();
        let report = model.realize_forces(&mut state).unwrap();

        assert!(report.is_clean());
        assert_relative_eq!(state.controls()[0], 0.2 + 0.5 * 0.4);
        assert_relative_eq!(state.controls()[2], 2.0 * 0.4);
        assert_eq!(state.controls()[1], 0.0);
        assert_relative_eq!(state.mobility_forces()[0], 0.4 + 0.8);
    }

    #[test]
    fn vector_length_must_match_actuators() {
        let controller = right_leg().with_synergy_vector(vec![1.0, 1.0, 1.0]);
        let mut model = leg(controller);

        let errors = model.connect().unwrap_err();
        assert!(matches!(errors.errors(), [ConnectionError::Invalid { .. }]));
        assert!(model.controller("synergy_controller_right_leg").unwrap().actuators().is_empty());
    }

    #[test]
    fn aliased_actuators_are_rejected() {
        let controller = right_leg().with_actuator("/forceset/soleus_r");
        let mut model = leg(controller);

        let errors = model.connect().unwrap_err();
        assert!(matches!(errors.errors(), [ConnectionError::Invalid { .. }]));
    }

    #[test]
    fn missing_excitations_count_as_zero() {
        let mut model = leg(right_leg());
        model.connect().unwrap();
        model.create_system().unwrap();
        let mut state = model.init_state().unwrap();

        model
            .set_controller_inputs(&mut state, "synergy_controller_right_leg", vec![1.0])
            .unwrap();
        let report = model.realize_forces(&mut state).unwrap();

        assert_eq!(report.diagnostics.len(), 1);
        assert_relative_eq!(state.controls()[0], 1.0);
        assert_eq!(state.controls()[2], 0.0);
    }
}
