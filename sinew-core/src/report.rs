use std::fmt;

use thiserror::Error;

/// Why a component contributed nothing, or less than intended, to an evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Degradation {
    #[error("not connected to a model")]
    Disconnected,

    #[error("bound coordinate `{coordinate}` is invalid; force was not applied")]
    InvalidCoordinate { coordinate: String },

    #[error("expected {expected} external inputs, found {found}")]
    InputLength { expected: usize, found: usize },

    #[error("control for `{actuator}` is not finite ({value}); wrote zero")]
    NonFiniteControl { actuator: String, value: f64 },
}

/// A non-fatal diagnostic produced while evaluating one component.
///
/// Degraded evaluations never abort an evaluation pass. They are collected in
/// an [`EvaluationReport`] and surfaced once every component has contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedEvaluation {
    /// Name of the component that degraded.
    pub component: String,
    /// What went wrong.
    pub reason: Degradation,
}

impl DegradedEvaluation {
    pub fn new(component: impl Into<String>, reason: Degradation) -> Self {
        Self {
            component: component.into(),
            reason,
        }
    }
}

impl fmt::Display for DegradedEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.component, self.reason)
    }
}

/// The outcome of one evaluation pass over a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    /// Time of the evaluated context.
    pub time: f64,

    /// Diagnostics in pipeline order: controllers first, then actuators.
    pub diagnostics: Vec<DegradedEvaluation>,

    /// Whether cached results were reused instead of recomputed.
    pub reused_cache: bool,
}

impl EvaluationReport {
    /// Returns `true` if no component degraded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
