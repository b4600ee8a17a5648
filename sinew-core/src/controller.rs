use std::fmt::Debug;

use crate::{ActuatorIndex, ConnectionError, DegradedEvaluation, State, Topology};

/// Position of a controller in its model's controller enumeration.
///
/// Controller indices address the external-input slots of a [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerIndex(pub(crate) usize);

impl ControllerIndex {
    /// Wraps the position of a controller in its model's enumeration.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A component that produces control values for a set of actuators.
///
/// A controller is bound to actuators by label and resolves those labels when
/// it connects. During evaluation it writes one control per bound actuator
/// into the model's global control vector, at the actuator's slot.
///
/// [`compute_controls`](Controller::compute_controls) must depend only on the
/// evaluation context and the controller's configuration, so the same
/// controller can serve many contexts concurrently.
///
/// When several controllers drive the same actuator, the one registered last
/// wins.
pub trait Controller: Debug + Send + Sync {
    /// Returns the controller's name.
    fn name(&self) -> &str;

    /// Resolves the controller's actuator labels against a model.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if any label is unresolved or the
    /// controller's configuration is inconsistent with what it bound.
    fn connect(&mut self, topology: &Topology, slot: ControllerIndex) -> Result<(), ConnectionError>;

    /// Drops every resolved reference.
    fn disconnect(&mut self);

    /// Returns the actuators this controller drives, as resolved by the last connect.
    fn actuators(&self) -> &[ActuatorIndex];

    /// Writes the controls of this controller's actuators for `state`.
    ///
    /// `controls` is the global control vector, indexed by actuator slot.
    ///
    /// # Errors
    ///
    /// Returns a [`DegradedEvaluation`] if some control could not be computed.
    /// The controller still writes every control it could compute, and zero
    /// for the rest.
    fn compute_controls(&self, state: &State, controls: &mut [f64])
    -> Result<(), DegradedEvaluation>;

    /// Returns how many external inputs this controller reads from a context.
    fn num_inputs(&self) -> usize {
        0
    }

    /// Returns a label for each external input.
    fn input_labels(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The ordered set of actuators a controller drives.
///
/// Holds the labels given at configuration time and the indices they resolved
/// to at the last connect. Controllers embed an `ActuatorSet` rather than
/// sharing a base type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActuatorSet {
    labels: Vec<String>,
    resolved: Vec<ActuatorIndex>,
}

impl ActuatorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actuator label (a model-wide unique name or an absolute path).
    ///
    /// Adding a label that is already present has no effect.
    pub fn add(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.labels.contains(&label) {
            self.labels.push(label);
        }
    }

    /// Returns the configured labels in insertion order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the actuators resolved by the last connect, in order.
    #[must_use]
    pub fn resolved(&self) -> &[ActuatorIndex] {
        &self.resolved
    }

    /// Returns the position of an actuator within this set.
    #[must_use]
    pub fn position(&self, actuator: ActuatorIndex) -> Option<usize> {
        self.resolved.iter().position(|&a| a == actuator)
    }

    /// Resolves every configured label against the model.
    ///
    /// Labels resolving to an actuator already in the set are merged.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Actuator`] for the first unresolved label;
    /// the resolved set is left empty.
    pub fn connect(&mut self, controller: &str, topology: &Topology) -> Result<(), ConnectionError> {
        self.resolved.clear();

        let mut resolved = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            let actuator =
                topology
                    .resolve_actuator(label)
                    .map_err(|source| ConnectionError::Actuator {
                        controller: controller.to_owned(),
                        label: label.clone(),
                        source,
                    })?;
            if !resolved.contains(&actuator) {
                resolved.push(actuator);
            }
        }

        self.resolved = resolved;
        Ok(())
    }

    /// Resolves a binding label: first within this set, then by path across the model.
    ///
    /// An actuator found by path that is not yet in the set is appended to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Actuator`] if the label resolves in neither stage.
    pub fn bind(
        &mut self,
        controller: &str,
        label: &str,
        topology: &Topology,
    ) -> Result<ActuatorIndex, ConnectionError> {
        let actuator = topology
            .resolve_actuator_in(label, &self.resolved)
            .map_err(|source| ConnectionError::Actuator {
                controller: controller.to_owned(),
                label: label.to_owned(),
                source,
            })?;

        if !self.resolved.contains(&actuator) {
            self.resolved.push(actuator);
        }
        Ok(actuator)
    }

    /// Forgets the resolved actuators, keeping the labels.
    pub fn disconnect(&mut self) {
        self.resolved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{ComponentPath, ResolveError};

    fn topology() -> Topology {
        let mut topology = Topology::default();
        for path in ["/forceset/soleus_r", "/forceset/gasmed_r", "/forceset/tibant_r"] {
            topology
                .insert_actuator(ComponentPath::parse(path).unwrap())
                .unwrap();
        }
        topology
    }

    #[test]
    fn connect_resolves_names_and_paths_and_merges_duplicates() {
        let topology = topology();
        let mut set = ActuatorSet::new();
        set.add("soleus_r");
        set.add("/forceset/tibant_r");
        set.add("/forceset/soleus_r");
        set.add("soleus_r");

        assert_eq!(set.labels().len(), 3);
        set.connect("emg", &topology).unwrap();
        assert_eq!(set.resolved(), &[ActuatorIndex(0), ActuatorIndex(2)]);
        assert_eq!(set.position(ActuatorIndex(2)), Some(1));
    }

    #[test]
    fn connect_fails_on_unknown_label() {
        let topology = topology();
        let mut set = ActuatorSet::new();
        set.add("soleus_r");
        set.add("vasint_r");

        let error = set.connect("emg", &topology).unwrap_err();
        assert!(matches!(
            error,
            ConnectionError::Actuator {
                source: ResolveError::NotFound { .. },
                ..
            }
        ));
        assert!(set.resolved().is_empty());
    }

    #[test]
    fn bind_appends_actuators_found_by_path() {
        let topology = topology();
        let mut set = ActuatorSet::new();
        set.add("soleus_r");
        set.connect("emg", &topology).unwrap();

        assert_eq!(set.bind("emg", "soleus_r", &topology), Ok(ActuatorIndex(0)));
        assert_eq!(
            set.bind("emg", "/forceset/gasmed_r", &topology),
            Ok(ActuatorIndex(1))
        );
        assert_eq!(set.resolved(), &[ActuatorIndex(0), ActuatorIndex(1)]);

        // Reachable by name now that it is in the set.
        assert_eq!(set.bind("emg", "gasmed_r", &topology), Ok(ActuatorIndex(1)));
        assert!(set.bind("emg", "tibant_r", &topology).is_err());
    }
}
