use std::fmt::Debug;

use crate::{ConnectionError, DegradedEvaluation, State, Topology};

/// Position of an actuator in its model's actuator enumeration.
///
/// Actuator indices address the control, force, and override slots of a
/// [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorIndex(pub(crate) usize);

impl ActuatorIndex {
    /// Wraps the position of a actuator in its model's enumeration.
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

/// A component that converts a scalar control into generalized force.
///
/// An actuator reads its control from an evaluation context, scales it into a
/// force, caches the force in the same context, and adds it to the
/// mobility-force accumulator of the coordinates it binds.
/// All per-evaluation values live in the [`State`]; an actuator holds only its
/// configuration and the references resolved when it connected.
///
/// ## Validity
///
/// An actuator is valid once it has an owning model (a slot) and has resolved
/// every coordinate it binds. Invalid actuators never fail an evaluation:
/// without a model they contribute zero force, and with an unresolved
/// coordinate they cache their force without applying it. Both cases return a
/// [`DegradedEvaluation`] instead of an error.
///
/// ## Overrides
///
/// An override replaces the computed actuation with a fixed force in one
/// context only, leaving the actuator's configuration untouched.
pub trait Actuator: Debug + Send + Sync {
    /// Returns the actuator's name.
    fn name(&self) -> &str;

    /// Binds the actuator to a model.
    ///
    /// `slot` is the actuator's position in the model's enumeration. The slot
    /// is assigned before any reference is resolved, so an actuator whose
    /// coordinate fails to resolve still owns a slot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if a referenced coordinate is absent.
    fn connect(&mut self, topology: &Topology, slot: ActuatorIndex) -> Result<(), ConnectionError>;

    /// Drops the slot and every resolved reference.
    fn disconnect(&mut self);

    /// Returns the slot assigned by the owning model, if any.
    fn slot(&self) -> Option<ActuatorIndex>;

    /// Returns `true` if the actuator has an owning model and resolved references.
    fn is_valid(&self) -> bool;

    /// Returns the scale converting a unit control into force.
    fn optimal_force(&self) -> f64;

    /// Computes the force implied by the actuator's control in `state`.
    ///
    /// Returns `0.0` if the actuator has no owning model.
    fn compute_actuation(&self, state: &State) -> f64;

    /// Computes the force to apply, caches it, and applies it.
    ///
    /// The applied force is the override when one is set in `state`, and
    /// [`compute_actuation`](Actuator::compute_actuation) otherwise.
    ///
    /// Returns a diagnostic when the force could not be cached or applied.
    #[must_use]
    fn compute_force(&self, state: &mut State) -> Option<DegradedEvaluation>;

    /// Returns this actuator's control in `state`, or `0.0` without a model.
    fn control(&self, state: &State) -> f64 {
        self.slot().map_or(0.0, |slot| state.control(slot))
    }

    /// Returns the force cached for this actuator in `state`.
    fn force(&self, state: &State) -> f64 {
        self.slot().map_or(0.0, |slot| state.force(slot))
    }

    /// Sets or clears this actuator's override force in `state`.
    ///
    /// Has no effect on an actuator without a model, whose force is always zero.
    fn set_override(&self, state: &mut State, force: Option<f64>) {
        match self.slot() {
            Some(slot) => state.set_override(slot, force),
            None => tracing::debug!(actuator = self.name(), "ignoring override without a model"),
        }
    }

    /// Returns this actuator's override force in `state`, if one is set.
    fn override_force(&self, state: &State) -> Option<f64> {
        self.slot().and_then(|slot| state.override_force(slot))
    }

    fn is_overridden(&self, state: &State) -> bool {
        self.override_force(state).is_some()
    }

    /// Returns the unit-free load `|force| / optimal_force`.
    ///
    /// The optimal force must be non-zero; a zero optimal force yields a
    /// non-finite result.
    fn stress(&self, state: &State) -> f64 {
        (self.force(state) / self.optimal_force()).abs()
    }

    /// Returns the labels of the values reported by [`record_values`](Actuator::record_values).
    fn record_labels(&self) -> Vec<String> {
        vec![self.name().to_owned()]
    }

    /// Returns the reported values for `state`, one per record label.
    fn record_values(&self, state: &State) -> Vec<f64> {
        vec![self.force(state)]
    }
}
