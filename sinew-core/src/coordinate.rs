/// Position of a coordinate in its model's coordinate enumeration.
///
/// Coordinate indices address the value, speed, and mobility-force slots of a
/// [`State`](crate::State).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateIndex(pub(crate) usize);

impl CoordinateIndex {
    /// Wraps the position of a coordinate in its model's enumeration.
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

/// A named scalar generalized degree of freedom of the simulated body.
///
/// Coordinates belong to the dynamics engine. This layer only reads them:
/// actuators bind to them by label and apply generalized forces to their
/// mobility-force slots, and the reserve factory inspects their lock and
/// constraint status.
///
/// The current value and speed of a coordinate live in an evaluation context,
/// see [`State::value`](crate::State::value) and
/// [`State::speed`](crate::State::speed).
/// The defaults stored here seed newly initialized states.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    name: String,
    default_value: f64,
    default_speed: f64,
    locked: bool,
    constrained: bool,
}

impl Coordinate {
    /// Creates a free coordinate with zero default value and speed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: 0.0,
            default_speed: 0.0,
            locked: false,
            constrained: false,
        }
    }

    /// Returns `self` with the given default value.
    #[must_use]
    pub fn with_default_value(self, default_value: f64) -> Self {
        Self {
            default_value,
            ..self
        }
    }

    /// Returns `self` with the given default speed.
    #[must_use]
    pub fn with_default_speed(self, default_speed: f64) -> Self {
        Self {
            default_speed,
            ..self
        }
    }

    /// Returns `self` with the given lock status.
    #[must_use]
    pub fn with_locked(self, locked: bool) -> Self {
        Self { locked, ..self }
    }

    /// Returns `self` with the given kinematic-constraint status.
    ///
    /// A constrained coordinate is driven by a coupler or prescribed motion
    /// rather than being an independent degree of freedom.
    #[must_use]
    pub fn with_constrained(self, constrained: bool) -> Self {
        Self {
            constrained,
            ..self
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    #[must_use]
    pub fn default_speed(&self) -> f64 {
        self.default_speed
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Returns `true` if the coordinate is locked or kinematically constrained.
    #[must_use]
    pub fn is_locked_or_constrained(&self) -> bool {
        self.locked || self.constrained
    }
}
