//! Monotone calibration via the pool-adjacent-violators algorithm.
//!
//! Points are sorted by raw score, tied raw values are pooled, and adjacent
//! blocks whose mean gold value decreases are merged until the sequence is
//! non-decreasing. The fitted function interpolates linearly between block
//! centroids and is flat outside the observed raw range.

use super::{finite_points, NormalizerKind, NormalizerState, ScalarFit, ScalarState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicFit {
    /// Block centroids on the raw axis, strictly increasing.
    pub breakpoints: Vec<f64>,
    /// Mean gold value of each block, non-decreasing.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    x_sum: f64,
    y_sum: f64,
    weight: f64,
}

impl Block {
    fn mean_y(&self) -> f64 {
        self.y_sum / self.weight
    }

    fn absorb(&mut self, other: Block) {
        self.x_sum += other.x_sum;
        self.y_sum += other.y_sum;
        self.weight += other.weight;
    }
}

impl ScalarFit for IsotonicFit {
    const KIND: NormalizerKind = NormalizerKind::Isotonic;

    fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let mut points = finite_points(points);
        if points.len() < 2 {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut stack: Vec<Block> = Vec::with_capacity(points.len());
        let mut i = 0;
        while i < points.len() {
            let x = points[i].0;
            let mut block = Block {
                x_sum: 0.0,
                y_sum: 0.0,
                weight: 0.0,
            };
            while i < points.len() && points[i].0 == x {
                block.absorb(Block {
                    x_sum: x,
                    y_sum: points[i].1,
                    weight: 1.0,
                });
                i += 1;
            }

            stack.push(block);
            while stack.len() >= 2 {
                let n = stack.len();
                let last = stack[n - 1];
                let prev = &mut stack[n - 2];
                if prev.mean_y() <= last.mean_y() {
                    break;
                }
                prev.absorb(last);
                stack.pop();
            }
        }

        Some(Self {
            breakpoints: stack.iter().map(|b| b.x_sum / b.weight).collect(),
            values: stack.iter().map(Block::mean_y).collect(),
        })
    }

    fn apply(&self, raw: f64) -> f64 {
        let (Some(&first_x), Some(&last_x), Some(&first_y), Some(&last_y)) = (
            self.breakpoints.first(),
            self.breakpoints.last(),
            self.values.first(),
            self.values.last(),
        ) else {
            return raw;
        };
        if raw <= first_x {
            return first_y;
        }
        if raw >= last_x {
            return last_y;
        }

        let hi = self.breakpoints.partition_point(|&b| b <= raw);
        let lo = hi.saturating_sub(1);
        match (
            self.breakpoints.get(lo),
            self.breakpoints.get(hi),
            self.values.get(lo),
            self.values.get(hi),
        ) {
            (Some(&x0), Some(&x1), Some(&y0), Some(&y1)) if x1 > x0 => {
                y0 + (raw - x0) / (x1 - x0) * (y1 - y0)
            }
            _ => last_y,
        }
    }

    fn describe(&self) -> String {
        match (
            self.breakpoints.first(),
            self.breakpoints.last(),
            self.values.first(),
            self.values.last(),
        ) {
            (Some(x0), Some(x1), Some(y0), Some(y1)) => format!(
                "isotonic: {} blocks, raw [{:.4}, {:.4}] -> gold [{:.4}, {:.4}]",
                self.breakpoints.len(),
                x0,
                x1,
                y0,
                y1
            ),
            _ => "isotonic: empty".to_string(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.breakpoints.is_empty() || self.breakpoints.len() != self.values.len() {
            return Err(format!(
                "isotonic: {} breakpoints but {} values",
                self.breakpoints.len(),
                self.values.len()
            ));
        }
        if !self.breakpoints.iter().chain(&self.values).all(|v| v.is_finite()) {
            return Err("isotonic: non-finite parameter".to_string());
        }
        if self.breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err("isotonic: breakpoints are not strictly increasing".to_string());
        }
        Ok(())
    }

    fn wrap(state: ScalarState<Self>) -> NormalizerState {
        NormalizerState::Isotonic(state)
    }
}
