use sinew_core::{
    ActuatorIndex, ActuatorSet, ConnectionError, Controller, ControllerIndex, Degradation,
    DegradedEvaluation, State, Topology,
};

/// A controller whose controls are supplied from outside, one input per actuator.
///
/// Inputs live in the evaluation context, so an optimizer or a test harness
/// can drive the same model with different excitations in different contexts.
/// Supply them with
/// [`Model::set_controller_inputs`](sinew_core::Model::set_controller_inputs),
/// in the order the actuators resolved.
#[derive(Debug, Clone, Default)]
pub struct ExcitationController {
    name: String,
    actuators: ActuatorSet,
    slot: Option<ControllerIndex>,
    input_labels: Vec<String>,
}

impl ExcitationController {
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
}

impl Controller for ExcitationController {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self, topology: &Topology, slot: ControllerIndex) -> Result<(), ConnectionError> {
        self.disconnect();
        self.actuators.connect(&self.name, topology)?;

        self.input_labels = self
            .actuators
            .resolved()
            .iter()
            .filter_map(|&actuator| topology.actuator_path(actuator))
            .map(ToString::to_string)
            .collect();
        self.slot = Some(slot);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.actuators.disconnect();
        self.input_labels.clear();
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
        let actuators = self.actuators.resolved();
        let mut degraded = (inputs.len() != actuators.len()).then(|| {
            DegradedEvaluation::new(
                &self.name,
                Degradation::InputLength {
                    expected: actuators.len(),
                    found: inputs.len(),
                },
            )
        });

        for (i, actuator) in actuators.iter().enumerate() {
            let Some(control) = controls.get_mut(actuator.index()) else {
                continue;
            };
            let value = inputs.get(i).copied().unwrap_or(0.0);

            if value.is_finite() {
                *control = value;
            } else {
                *control = 0.0;
                degraded.get_or_insert_with(|| {
                    DegradedEvaluation::new(
                        &self.name,
                        Degradation::NonFiniteControl {
                            actuator: self.input_labels.get(i).cloned().unwrap_or_default(),
                            value,
                        },
                    )
                });
            }
        }

        degraded.map_or(Ok(()), Err)
    }

    fn num_inputs(&self) -> usize {
        self.actuators.resolved().len()
    }

    /// Returns the absolute path of each driven actuator.
    fn input_labels(&self) -> Vec<String> {
        self.input_labels.clone()
    }
}
