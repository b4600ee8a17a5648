use std::fmt;

use ndarray::Array1;
use ninterp::{
    error::{InterpolateError, ValidateError},
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::enums::Strategy1DEnum,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::spline::{CubicSpline, QuinticSpline};

#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("interpolation order must be 0, 1, 3 or 5, got {0}")]
    InvalidOrder(u8),

    #[error("a control function needs at least one sample")]
    Empty,

    #[error("{times} sample times but {values} sample values")]
    LengthMismatch { times: usize, values: usize },

    #[error("sample {index} is not finite")]
    NonFinite { index: usize },

    #[error("sample times must be strictly increasing, but sample {index} is not")]
    NotIncreasing { index: usize },

    #[error("cannot evaluate at non-finite time {0}")]
    NonFiniteTime(f64),

    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}

/// Piecewise interpolation order of a [`ControlFunction`].
///
/// Serialized as the integer codes `0`, `1`, `3` and `5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InterpolationOrder {
    /// Piecewise constant, holding each sample until the next one.
    Step,
    /// Piecewise linear.
    #[default]
    Linear,
    /// Natural cubic spline.
    Cubic,
    /// Piecewise quintic with continuous second derivative.
    Quintic,
}

impl InterpolationOrder {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Step => 0,
            Self::Linear => 1,
            Self::Cubic => 3,
            Self::Quintic => 5,
        }
    }
}

impl TryFrom<u8> for InterpolationOrder {
    type Error = FunctionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Step),
            1 => Ok(Self::Linear),
            3 => Ok(Self::Cubic),
            5 => Ok(Self::Quintic),
            other => Err(FunctionError::InvalidOrder(other)),
        }
    }
}

impl From<InterpolationOrder> for u8 {
    fn from(order: InterpolationOrder) -> Self {
        order.code()
    }
}

enum Curve {
    Constant(f64),
    Sampled(Interp1DOwned<f64, Strategy1DEnum>),
    Cubic(CubicSpline),
    Quintic(QuinticSpline),
}

/// A scalar function of time built from sampled control data.
///
/// Outside the sampled range each order follows its own boundary policy:
///
/// | Order     | Before the first / after the last sample   |
/// |-----------|--------------------------------------------|
/// | `Step`    | holds the end value                        |
/// | `Linear`  | extends the end segment                    |
/// | `Cubic`   | extends linearly with the end slope        |
/// | `Quintic` | holds the end value                        |
///
/// A single sample gives a constant function. With two samples, cubic and
/// quintic functions evaluate as linear ones.
///
/// Control functions are immutable once built and may be evaluated from many
/// threads at once.
///
/// # Examples
///
/// ```
/// use sinew_components::{ControlFunction, InterpolationOrder};
///
/// let excitation = ControlFunction::new(
///     vec![0.0, 1.0],
///     vec![0.0, 2.0],
///     InterpolationOrder::Linear,
/// )
/// .unwrap();
///
/// assert_eq!(excitation.evaluate(0.5), 1.0);
/// assert_eq!(excitation.evaluate(2.0), 4.0);
/// ```
pub struct ControlFunction {
    order: InterpolationOrder,
    times: Vec<f64>,
    values: Vec<f64>,
    curve: Curve,
}

impl ControlFunction {
    /// Builds a control function from sample times and values.
    ///
    /// # Errors
    ///
    /// Returns a [`FunctionError`] if there are no samples, the lengths
    /// differ, a sample is not finite, or the times do not strictly increase.
    pub fn new(
        times: Vec<f64>,
        values: Vec<f64>,
        order: InterpolationOrder,
    ) -> Result<Self, FunctionError> {
        validate(&times, &values)?;

        let curve = match (order, times.len()) {
            (_, 1) => Curve::Constant(values[0]),
            (InterpolationOrder::Step, _) => Curve::Sampled(Interp1DOwned::new(
                Array1::from(times.clone()),
                Array1::from(values.clone()),
                ninterp::strategy::LeftNearest.into(),
                Extrapolate::Clamp,
            )?),
            (InterpolationOrder::Linear, _) | (_, 2) => Curve::Sampled(Interp1DOwned::new(
                Array1::from(times.clone()),
                Array1::from(values.clone()),
                ninterp::strategy::Linear.into(),
                Extrapolate::Enable,
            )?),
            (InterpolationOrder::Cubic, _) => Curve::Cubic(CubicSpline::new(&times, &values)),
            (InterpolationOrder::Quintic, _) => {
                Curve::Quintic(QuinticSpline::new(&times, &values))
            }
        };

        Ok(Self {
            order,
            times,
            values,
            curve,
        })
    }

    /// Builds a function that returns `value` at every time.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            order: InterpolationOrder::Step,
            times: vec![0.0],
            values: vec![value],
            curve: Curve::Constant(value),
        }
    }

    /// Returns the value at time `t`.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::NonFiniteTime`] if `t` is NaN or infinite, or
    /// [`FunctionError::Interpolation`] if the underlying interpolator rejects `t`.
    pub fn try_evaluate(&self, t: f64) -> Result<f64, FunctionError> {
        if !t.is_finite() {
            return Err(FunctionError::NonFiniteTime(t));
        }
        match &self.curve {
            Curve::Constant(value) => Ok(*value),
            Curve::Sampled(interp) => interp.interpolate(&[t]).map_err(Into::into),
            Curve::Cubic(spline) => Ok(spline.evaluate(t)),
            Curve::Quintic(spline) => Ok(spline.evaluate(t)),
        }
    }

    /// Returns the value at time `t`, or NaN if it cannot be computed.
    ///
    /// Non-finite times always give NaN, whatever the order.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        self.try_evaluate(t).unwrap_or(f64::NAN)
    }

    #[must_use]
    pub fn order(&self) -> InterpolationOrder {
        self.order
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl fmt::Debug for ControlFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlFunction")
            .field("order", &self.order)
            .field("times", &self.times)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

fn validate(times: &[f64], values: &[f64]) -> Result<(), FunctionError> {
    if times.is_empty() {
        return Err(FunctionError::Empty);
    }
    if times.len() != values.len() {
        return Err(FunctionError::LengthMismatch {
            times: times.len(),
            values: values.len(),
        });
    }
    if let Some(index) = times
        .iter()
        .zip(values)
        .position(|(t, v)| !t.is_finite() || !v.is_finite())
    {
        return Err(FunctionError::NonFinite { index });
    }
    if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
        return Err(FunctionError::NotIncreasing { index: index + 1 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn function(times: &[f64], values: &[f64], order: InterpolationOrder) -> ControlFunction {
        ControlFunction::new(times.to_vec(), values.to_vec(), order).unwrap()
    }

    #[test]
    fn orders_round_trip_through_codes() {
        for code in [0, 1, 3, 5] {
            let order = InterpolationOrder::try_from(code).unwrap();
            assert_eq!(u8::from(order), code);
        }
        assert!(matches!(
            InterpolationOrder::try_from(2),
            Err(FunctionError::InvalidOrder(2))
        ));
    }

    #[test]
    fn step_holds_each_sample() {
        let f = function(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0], InterpolationOrder::Step);

        assert_relative_eq!(f.evaluate(-1.0), 1.0);
        assert_relative_eq!(f.evaluate(0.0), 1.0);
        assert_relative_eq!(f.evaluate(0.99), 1.0);
        assert_relative_eq!(f.evaluate(1.0), 3.0);
        assert_relative_eq!(f.evaluate(1.5), 3.0);
        assert_relative_eq!(f.evaluate(7.0), 5.0);
    }

    #[test]
    fn linear_interpolates_and_extrapolates() {
        let f = function(&[0.0, 1.0, 3.0], &[0.0, 2.0, 0.0], InterpolationOrder::Linear);

        assert_relative_eq!(f.evaluate(0.5), 1.0);
        assert_relative_eq!(f.evaluate(2.0), 1.0);
        assert_relative_eq!(f.evaluate(-1.0), -2.0);
        assert_relative_eq!(f.evaluate(4.0), -1.0);
    }

    #[test]
    fn cubic_and_quintic_follow_their_boundary_policies() {
        let times = [0.0, 1.0, 2.0];
        let values = [0.0, 1.0, 0.0];

        let cubic = function(&times, &values, InterpolationOrder::Cubic);
        assert_relative_eq!(cubic.evaluate(0.5), 0.6875);
        assert_relative_eq!(cubic.evaluate(3.0), -1.5);

        let quintic = function(&times, &values, InterpolationOrder::Quintic);
        assert_relative_eq!(quintic.evaluate(1.0), 1.0);
        assert_relative_eq!(quintic.evaluate(3.0), 0.0);
        assert_relative_eq!(quintic.evaluate(-3.0), 0.0);
    }

    #[test]
    fn few_samples_degrade_gracefully() {
        let single = function(&[0.4], &[7.0], InterpolationOrder::Quintic);
        assert_relative_eq!(single.evaluate(-10.0), 7.0);
        assert_relative_eq!(single.evaluate(10.0), 7.0);

        let pair = function(&[0.0, 1.0], &[0.0, 2.0], InterpolationOrder::Cubic);
        assert_eq!(pair.order(), InterpolationOrder::Cubic);
        assert_relative_eq!(pair.evaluate(0.25), 0.5);
        assert_relative_eq!(pair.evaluate(2.0), 4.0);
    }

    #[test]
    fn invalid_samples_are_rejected() {
        let order = InterpolationOrder::Linear;
        assert!(matches!(
            ControlFunction::new(vec![], vec![], order),
            Err(FunctionError::Empty)
        ));
        assert!(matches!(
            ControlFunction::new(vec![0.0, 1.0], vec![0.0], order),
            Err(FunctionError::LengthMismatch { times: 2, values: 1 })
        ));
        assert!(matches!(
            ControlFunction::new(vec![0.0, 1.0], vec![0.0, f64::NAN], order),
            Err(FunctionError::NonFinite { index: 1 })
        ));
        assert!(matches!(
            ControlFunction::new(vec![0.0, 1.0, 1.0], vec![0.0; 3], order),
            Err(FunctionError::NotIncreasing { index: 2 })
        ));
    }

    #[test]
    fn non_finite_times_evaluate_to_nan() {
        let times = [0.0, 1.0, 2.0, 3.0];
        let values = [1.0, 3.0, 5.0, 4.0];

        for order in [
            InterpolationOrder::Step,
            InterpolationOrder::Linear,
            InterpolationOrder::Cubic,
            InterpolationOrder::Quintic,
        ] {
            let f = function(&times, &values, order);
            for t in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                assert!(f.evaluate(t).is_nan(), "{order:?} at {t}");
                assert!(matches!(
                    f.try_evaluate(t),
                    Err(FunctionError::NonFiniteTime(_))
                ));
            }
        }
        assert!(ControlFunction::constant(2.0).evaluate(f64::NAN).is_nan());
    }

    #[test]
    fn constant_ignores_time() {
        let f = ControlFunction::constant(0.3);
        assert_relative_eq!(f.evaluate(-5.0), 0.3);
        assert_relative_eq!(f.evaluate(1e6), 0.3);
    }

    proptest! {
        #[test]
        fn every_order_passes_through_its_samples(
            steps in prop::collection::vec(0.01f64..1.0, 3..12),
            values in prop::collection::vec(-10.0f64..10.0, 12),
        ) {
            let times: Vec<f64> = steps
                .iter()
                .scan(0.0, |t, dt| {
                    *t += dt;
                    Some(*t)
                })
                .collect();
            let values = &values[..times.len()];

            for order in [
                InterpolationOrder::Step,
                InterpolationOrder::Linear,
                InterpolationOrder::Cubic,
                InterpolationOrder::Quintic,
            ] {
                let f = function(&times, values, order);
                for (t, v) in times.iter().zip(values) {
                    prop_assert!((f.evaluate(*t) - v).abs() < 1e-9);
                }
            }
        }
    }
}
