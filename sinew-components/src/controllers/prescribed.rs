use sinew_core::{
    ActuatorIndex, ActuatorSet, ConnectionError, Controller, ControllerIndex, Degradation,
    DegradedEvaluation, Label, State, Topology,
};

use crate::{ControlFunction, ControlsTable, FunctionError, InterpolationOrder};

/// How a prescribed function finds its actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// An actuator name or absolute path.
    Label(String),
    /// A position within the controller's own actuator list.
    Position(usize),
}

/// A controller that plays back one function of time per actuator.
///
/// Actuators are listed with [`add_actuator`](Self::add_actuator) and given a
/// function with [`bind`](Self::bind) or [`bind_position`](Self::bind_position).
/// A bound label is looked up among the listed actuators first, by name or
/// path; an absolute path not in the list is then resolved across the model
/// and appended to it.
///
/// # Examples
///
/// ```
/// use sinew_components::{ControlFunction, InterpolationOrder, PrescribedController};
///
/// let mut controller = PrescribedController::new("gait");
/// controller.add_actuator("knee_actuator");
/// controller.bind(
///     "knee_actuator",
///     ControlFunction::new(vec![0.0, 1.0], vec![0.0, 2.0], InterpolationOrder::Linear).unwrap(),
/// );
///
/// assert_eq!(controller.function("knee_actuator").unwrap().evaluate(0.5), 1.0);
/// ```
#[derive(Debug)]
pub struct PrescribedController {
    name: String,
    actuators: ActuatorSet,
    functions: Vec<(Target, ControlFunction)>,
    drives: Vec<Drive>,
}

/// A resolved actuator and the function driving it.
#[derive(Debug, Clone)]
struct Drive {
    actuator: ActuatorIndex,
    function: usize,
    name: String,
}

impl PrescribedController {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actuators: ActuatorSet::new(),
            functions: Vec::new(),
            drives: Vec::new(),
        }
    }

    /// Builds a controller with one function per table column.
    ///
    /// Columns labeled with a bare name are also added to the controller's
    /// actuator list, so they resolve against the whole model by name.
    ///
    /// # Errors
    ///
    /// Returns a [`FunctionError`] if a column cannot be interpolated.
    pub fn from_table(
        name: impl Into<String>,
        table: &ControlsTable,
        order: InterpolationOrder,
    ) -> Result<Self, FunctionError> {
        let mut controller = Self::new(name);
        for (label, column) in table.columns() {
            let function = ControlFunction::new(table.times().to_vec(), column.to_vec(), order)?;
            if matches!(Label::parse(label), Ok(Label::Name(_))) {
                controller.add_actuator(label);
            }
            controller.bind(label, function);
        }
        Ok(controller)
    }

    /// Lists an actuator (a model-wide unique name or an absolute path) as driven by this controller.
    pub fn add_actuator(&mut self, label: impl Into<String>) {
        self.actuators.add(label);
    }

    #[must_use]
    pub fn with_actuator(mut self, label: impl Into<String>) -> Self {
        self.add_actuator(label);
        self
    }

    /// Prescribes `function` for the actuator identified by `label`.
    ///
    /// Binding a label again replaces its function.
    pub fn bind(&mut self, label: impl Into<String>, function: ControlFunction) {
        self.insert(Target::Label(label.into()), function);
    }

    /// Prescribes `function` for the actuator at `position` in this controller's list.
    pub fn bind_position(&mut self, position: usize, function: ControlFunction) {
        self.insert(Target::Position(position), function);
    }

    /// Returns the function bound to `label`.
    #[must_use]
    pub fn function(&self, label: &str) -> Option<&ControlFunction> {
        self.functions.iter().find_map(|(target, function)| match target {
            Target::Label(l) if l == label => Some(function),
            _ => None,
        })
    }

    /// Returns how many functions are bound.
    #[must_use]
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    fn insert(&mut self, target: Target, function: ControlFunction) {
        match self.functions.iter_mut().find(|(t, _)| *t == target) {
            Some(entry) => entry.1 = function,
            None => self.functions.push((target, function)),
        }
    }

    fn resolve(&mut self, topology: &Topology) -> Result<(), ConnectionError> {
        self.actuators.connect(&self.name, topology)?;

        for (i, (target, _)) in self.functions.iter().enumerate() {
            let actuator = match target {
                Target::Label(label) => self.actuators.bind(&self.name, label, topology)?,
                Target::Position(position) => self
                    .actuators
                    .resolved()
                    .get(*position)
                    .copied()
                    .ok_or_else(|| ConnectionError::Invalid {
                        controller: self.name.clone(),
                        reason: format!(
                            "no actuator at position {position} of {}",
                            self.actuators.resolved().len()
                        ),
                    })?,
            };

            match self.drives.iter_mut().find(|d| d.actuator == actuator) {
                Some(drive) => drive.function = i,
                None => self.drives.push(Drive {
                    actuator,
                    function: i,
                    name: topology.actuator_name(actuator).unwrap_or_default().to_owned(),
                }),
            }
        }
        Ok(())
    }
}

impl Controller for PrescribedController {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self, topology: &Topology, _slot: ControllerIndex) -> Result<(), ConnectionError> {
        self.disconnect();
        let result = self.resolve(topology);
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    fn disconnect(&mut self) {
        self.actuators.disconnect();
        self.drives.clear();
    }

    fn actuators(&self) -> &[ActuatorIndex] {
        self.actuators.resolved()
    }

    fn compute_controls(
        &self,
        state: &State,
        controls: &mut [f64],
    ) -> Result<(), DegradedEvaluation> {
        let time = state.time();
        let mut degraded = None;

        for drive in &self.drives {
            let Some(control) = controls.get_mut(drive.actuator.index()) else {
                continue;
            };
            let value = self.functions[drive.function].1.evaluate(time);

            if value.is_finite() {
                *control = value;
            } else {
                *control = 0.0;
                degraded.get_or_insert_with(|| {
                    DegradedEvaluation::new(
                        &self.name,
                        Degradation::NonFiniteControl {
                            actuator: drive.name.clone(),
                            value,
                        },
                    )
                });
            }
        }

        degraded.map_or(Ok(()), Err)
    }
}
