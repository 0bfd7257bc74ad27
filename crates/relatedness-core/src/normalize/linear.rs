use super::{check_bounds, finite_points, gold_bounds, NormalizerKind, NormalizerState, ScalarFit, ScalarState};
use serde::{Deserialize, Serialize};

/// Least-squares line, clamped to the observed gold range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub min: f64,
    pub max: f64,
}

/// Ordinary least squares `y = intercept + slope * x`.
///
/// Returns `None` with fewer than two points or when `x` has no variance.
pub(crate) fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for &(x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

impl ScalarFit for LinearFit {
    const KIND: NormalizerKind = NormalizerKind::Linear;

    fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let points = finite_points(points);
        let (slope, intercept) = least_squares(&points)?;
        let (min, max) = gold_bounds(&points)?;
        Some(Self {
            slope,
            intercept,
            min,
            max,
        })
    }

    fn apply(&self, raw: f64) -> f64 {
        (self.intercept + self.slope * raw).max(self.min).min(self.max)
    }

    fn describe(&self) -> String {
        format!(
            "linear: gold = {:.4} + {:.4} * raw, clamped to [{:.4}, {:.4}]",
            self.intercept, self.slope, self.min, self.max
        )
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.slope.is_finite() && self.intercept.is_finite()) {
            return Err("linear: non-finite coefficients".to_string());
        }
        check_bounds(Self::KIND, self.min, self.max)
    }

    fn wrap(state: ScalarState<Self>) -> NormalizerState {
        NormalizerState::Linear(state)
    }
}
