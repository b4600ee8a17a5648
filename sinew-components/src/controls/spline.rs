//! Piecewise polynomial curves through sampled control data.
//!
//! Both curves assume at least three samples with finite, strictly increasing
//! times. [`ControlFunction`](super::ControlFunction) checks this before
//! building them.

/// A natural cubic spline, extended linearly beyond its end samples.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the samples; zero at both ends.
    m: Vec<f64>,
}

impl CubicSpline {
    pub(crate) fn new(x: &[f64], y: &[f64]) -> Self {
        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m: natural_second_derivatives(x, y),
        }
    }

    pub(crate) fn evaluate(&self, t: f64) -> f64 {
        let n = self.x.len();
        let (x, y, m) = (&self.x, &self.y, &self.m);

        if t < x[0] {
            let h = x[1] - x[0];
            let slope = (y[1] - y[0]) / h - h * (2.0 * m[0] + m[1]) / 6.0;
            return y[0] + slope * (t - x[0]);
        }
        if t > x[n - 1] {
            let h = x[n - 1] - x[n - 2];
            let slope = (y[n - 1] - y[n - 2]) / h + h * (m[n - 2] + 2.0 * m[n - 1]) / 6.0;
            return y[n - 1] + slope * (t - x[n - 1]);
        }

        let i = interval(x, t);
        let h = x[i + 1] - x[i];
        let a = x[i + 1] - t;
        let b = t - x[i];

        m[i] * a.powi(3) / (6.0 * h)
            + m[i + 1] * b.powi(3) / (6.0 * h)
            + (y[i] / h - m[i] * h / 6.0) * a
            + (y[i + 1] / h - m[i + 1] * h / 6.0) * b
    }
}

/// A C2 piecewise quintic Hermite curve that holds its end values.
///
/// First and second derivatives at each sample are estimated from the
/// quadratic through that sample and its neighbours, so data sampled from a
/// quadratic is reproduced exactly.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuinticSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    d: Vec<f64>,
    s: Vec<f64>,
}

impl QuinticSpline {
    pub(crate) fn new(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        let (d, s): (Vec<f64>, Vec<f64>) = (0..n)
            .map(|i| {
                let w = i.saturating_sub(1).min(n - 3);
                quadratic_derivatives(&x[w..w + 3], &y[w..w + 3], x[i])
            })
            .unzip();

        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            d,
            s,
        }
    }

    pub(crate) fn evaluate(&self, t: f64) -> f64 {
        let n = self.x.len();
        if t <= self.x[0] {
            return self.y[0];
        }
        if t >= self.x[n - 1] {
            return self.y[n - 1];
        }

        let i = interval(&self.x, t);
        let h = self.x[i + 1] - self.x[i];
        let u = (t - self.x[i]) / h;
        let (u2, u3, u4, u5) = (u * u, u.powi(3), u.powi(4), u.powi(5));

        let h0 = 1.0 - 10.0 * u3 + 15.0 * u4 - 6.0 * u5;
        let h1 = u - 6.0 * u3 + 8.0 * u4 - 3.0 * u5;
        let h2 = 0.5 * u2 - 1.5 * u3 + 1.5 * u4 - 0.5 * u5;
        let h3 = 0.5 * u3 - u4 + 0.5 * u5;
        let h4 = -4.0 * u3 + 7.0 * u4 - 3.0 * u5;
        let h5 = 10.0 * u3 - 15.0 * u4 + 6.0 * u5;

        h0 * self.y[i]
            + h1 * h * self.d[i]
            + h2 * h * h * self.s[i]
            + h3 * h * h * self.s[i + 1]
            + h4 * h * self.d[i + 1]
            + h5 * self.y[i + 1]
    }
}

/// Returns the index of the sample interval containing `t`, clamped to the end intervals.
fn interval(x: &[f64], t: f64) -> usize {
    x.partition_point(|&xi| xi <= t)
        .saturating_sub(1)
        .min(x.len() - 2)
}

/// Solves the tridiagonal system for the second derivatives of a natural spline.
fn natural_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let k = n - 2;
    let mut c = vec![0.0; k];
    let mut d = vec![0.0; k];

    // Thomas algorithm over the interior samples.
    for j in 0..k {
        let i = j + 1;
        let lower = h[i - 1];
        let diag = 2.0 * (h[i - 1] + h[i]);
        let upper = h[i];
        let rhs = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);

        if j == 0 {
            c[j] = upper / diag;
            d[j] = rhs / diag;
        } else {
            let pivot = diag - lower * c[j - 1];
            c[j] = upper / pivot;
            d[j] = (rhs - lower * d[j - 1]) / pivot;
        }
    }

    for j in (0..k).rev() {
        m[j + 1] = d[j] - c[j] * m[j + 2];
    }
    m
}

/// Returns the first and second derivative at `at` of the quadratic through three samples.
fn quadratic_derivatives(x: &[f64], y: &[f64], at: f64) -> (f64, f64) {
    let f01 = (y[1] - y[0]) / (x[1] - x[0]);
    let f12 = (y[2] - y[1]) / (x[2] - x[1]);
    let f012 = (f12 - f01) / (x[2] - x[0]);
    (f01 + f012 * (2.0 * at - x[0] - x[1]), 2.0 * f012)
}
