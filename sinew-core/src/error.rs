use thiserror::Error;

use crate::{ComponentKind, ComponentPath, PathError};

/// Errors produced when a label cannot be resolved to a model element.
///
/// `NotFound` and `NoElement` mean the label was well formed but nothing
/// matched; the other variants mean the label itself, or what it matched, is
/// unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed label `{label}`")]
    Malformed {
        label: String,
        #[source]
        source: PathError,
    },

    #[error("no {kind} matches `{label}`")]
    NotFound { kind: ComponentKind, label: String },

    #[error("no element of any kind matches `{label}`")]
    NoElement { label: String },

    #[error("`{label}` matches {} {kind}s; use an absolute path", .matches.len())]
    Ambiguous {
        kind: ComponentKind,
        label: String,
        matches: Vec<ComponentPath>,
    },

    #[error("`{path}` is a {found}, not a {expected}")]
    WrongKind {
        path: ComponentPath,
        expected: ComponentKind,
        found: ComponentKind,
    },
}

/// Errors raised while connecting a component to its model.
///
/// A connection error is fatal to the component that raised it, never to the
/// model: the component stays out of the evaluation pipeline until it is
/// reconnected successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("actuator `{actuator}` cannot bind coordinate `{coordinate}`")]
    Coordinate {
        actuator: String,
        coordinate: String,
        #[source]
        source: ResolveError,
    },

    #[error("controller `{controller}` cannot bind actuator `{label}`")]
    Actuator {
        controller: String,
        label: String,
        #[source]
        source: ResolveError,
    },

    #[error("controller `{controller}` is misconfigured: {reason}")]
    Invalid { controller: String, reason: String },
}

/// Every connection failure from one [`Model::connect`](crate::Model::connect) pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} component(s) failed to connect", .0.len())]
pub struct ConnectErrors(pub Vec<ConnectionError>);

impl ConnectErrors {
    /// Returns the individual failures in registration order.
    #[must_use]
    pub fn errors(&self) -> &[ConnectionError] {
        &self.0
    }
}

/// Errors arising from structural use of a [`Model`](crate::Model).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("a component already exists at `{path}`")]
    DuplicatePath { path: ComponentPath },

    #[error("model `{model}` has not been connected since its last change")]
    NotConnected { model: String },

    #[error("model `{model}` has no system; call `create_system` first")]
    SystemNotCreated { model: String },

    #[error("model `{model}` is not active; call `init_state` first")]
    NotActive { model: String },

    #[error("state belongs to a different model or an outdated layout of `{model}`")]
    StaleState { model: String },
}
