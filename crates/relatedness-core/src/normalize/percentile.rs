use super::{check_bounds, finite_points, gold_bounds, NormalizerKind, NormalizerState, ScalarFit, ScalarState};
use serde::{Deserialize, Serialize};

/// Raw samples kept per fit. Larger samples are thinned to evenly spaced quantiles.
const MAX_KNOTS: usize = 1000;

/// Empirical CDF of the raw scores, scaled into the gold range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileFit {
    /// Sorted raw samples (possibly thinned).
    pub knots: Vec<f64>,
    pub gold_min: f64,
    pub gold_max: f64,
}

impl PercentileFit {
    /// Mid-rank percentile of `raw` among the knots, in `[0, 1]`.
    fn percentile(&self, raw: f64) -> f64 {
        let below = self.knots.partition_point(|&k| k < raw);
        let at_or_below = self.knots.partition_point(|&k| k <= raw);
        (below + at_or_below) as f64 / (2 * self.knots.len()) as f64
    }
}

impl ScalarFit for PercentileFit {
    const KIND: NormalizerKind = NormalizerKind::Percentile;

    fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let points = finite_points(points);
        if points.len() < 2 {
            return None;
        }
        let (gold_min, gold_max) = gold_bounds(&points)?;

        let mut raw: Vec<f64> = points.iter().map(|p| p.0).collect();
        raw.sort_by(f64::total_cmp);
        let knots = if raw.len() > MAX_KNOTS {
            let last = raw.len() - 1;
            (0..MAX_KNOTS)
                .map(|i| raw[i * last / (MAX_KNOTS - 1)])
                .collect()
        } else {
            raw
        };

        Some(Self {
            knots,
            gold_min,
            gold_max,
        })
    }

    fn apply(&self, raw: f64) -> f64 {
        if self.knots.is_empty() {
            return raw;
        }
        self.gold_min + self.percentile(raw) * (self.gold_max - self.gold_min)
    }

    fn describe(&self) -> String {
        format!(
            "percentile: {} knots scaled to [{:.4}, {:.4}]",
            self.knots.len(),
            self.gold_min,
            self.gold_max
        )
    }

    fn validate(&self) -> Result<(), String> {
        if self.knots.is_empty() {
            return Err("percentile: no knots".to_string());
        }
        if !self.knots.iter().all(|k| k.is_finite()) {
            return Err("percentile: non-finite knot".to_string());
        }
        if self.knots.windows(2).any(|w| w[0] > w[1]) {
            return Err("percentile: knots are not sorted".to_string());
        }
        check_bounds(Self::KIND, self.gold_min, self.gold_max)
    }

    fn wrap(state: ScalarState<Self>) -> NormalizerState {
        NormalizerState::Percentile(state)
    }
}
