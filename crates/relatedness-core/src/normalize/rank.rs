//! Rank-based calibration for most-similar lists.
//!
//! Learns `gold ≈ intercept + slope · ln(1 + rank)` from where gold partners
//! land in most-similar lists. A partner missing from the list counts as
//! rank `len`, one past the last entry. Applied to a list, each entry's score
//! is replaced by the fitted value at its rank, ignoring the raw score.

use super::linear::least_squares;
use super::{check_bounds, Normalizer, NormalizerKind, NormalizerState};
use crate::sr::SrResultList;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankFit {
    pub intercept: f64,
    pub slope: f64,
    pub min: f64,
    pub max: f64,
}

impl RankFit {
    fn fit(observations: &[(usize, f64)]) -> Option<Self> {
        let points: Vec<(f64, f64)> = observations
            .iter()
            .filter(|(_, gold)| gold.is_finite())
            .map(|&(rank, gold)| (log_rank(rank as f64), gold))
            .collect();
        let (slope, intercept) = least_squares(&points)?;
        let (min, max) = super::gold_bounds(&points)?;
        Some(Self {
            intercept,
            slope,
            min,
            max,
        })
    }

    /// Checks the invariants a decoded fit must hold before it is applied.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.slope.is_finite() && self.intercept.is_finite()) {
            return Err("rank: non-finite coefficients".to_string());
        }
        check_bounds(NormalizerKind::Rank, self.min, self.max)
    }

    pub fn at_rank(&self, rank: f64) -> f64 {
        (self.intercept + self.slope * log_rank(rank))
            .max(self.min)
            .min(self.max)
    }
}

fn log_rank(rank: f64) -> f64 {
    (1.0 + rank.max(0.0)).ln()
}

/// Persisted form of a [`RankNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankState {
    pub fit: Option<RankFit>,
}

#[derive(Debug, Default)]
struct RankInner {
    observations: Vec<(usize, f64)>,
    fit: Option<RankFit>,
}

#[derive(Debug, Default)]
pub struct RankNormalizer {
    inner: Mutex<RankInner>,
}

impl RankNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: RankState) -> Self {
        Self {
            inner: Mutex::new(RankInner {
                observations: Vec::new(),
                fit: state.fit,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RankInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Normalizer for RankNormalizer {
    fn kind(&self) -> NormalizerKind {
        NormalizerKind::Rank
    }

    fn reset(&self) {
        *self.lock() = RankInner::default();
    }

    /// Scalar observations carry no rank; ignored.
    fn observe(&self, _raw: f64, _gold: f64) {}

    fn observe_ranked(&self, list: &SrResultList, target: Option<usize>, gold: f64) {
        let rank = target.unwrap_or(list.len());
        self.lock().observations.push((rank, gold));
    }

    fn observations_finished(&self) {
        let mut inner = self.lock();
        inner.fit = RankFit::fit(&inner.observations);
        if inner.fit.is_none() {
            warn!(
                "rank normalizer could not be fit from {} observations; leaving it untrained",
                inner.observations.len()
            );
        }
    }

    fn is_trained(&self) -> bool {
        self.lock().fit.is_some()
    }

    fn observation_count(&self) -> usize {
        self.lock().observations.len()
    }

    /// Treats `raw` as a rank position.
    fn apply(&self, raw: f64) -> f64 {
        match (&self.lock().fit, raw.is_nan()) {
            (Some(fit), false) => fit.at_rank(raw),
            _ => raw,
        }
    }

    fn apply_list(&self, list: &SrResultList) -> SrResultList {
        match &self.lock().fit {
            Some(fit) => list.map_scores(|rank, _| fit.at_rank(rank as f64)),
            None => list.clone(),
        }
    }

    fn dump(&self) -> String {
        match &self.lock().fit {
            Some(fit) => format!(
                "rank: gold = {:.4} + {:.4} * ln(1 + rank), clamped to [{:.4}, {:.4}]",
                fit.intercept, fit.slope, fit.min, fit.max
            ),
            None => "rank: untrained".to_string(),
        }
    }

    fn state(&self) -> NormalizerState {
        NormalizerState::Rank(RankState {
            fit: self.lock().fit.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: i64) -> SrResultList {
        SrResultList::from_ranked((0..n).map(|i| (i, 1.0 - i as f64 / 10.0)).collect())
    }

    #[test]
    fn test_higher_rank_scores_higher() {
        let normalizer = RankNormalizer::new();
        normalizer.observe_ranked(&list(5), Some(0), 9.0);
        normalizer.observe_ranked(&list(5), Some(1), 7.0);
        normalizer.observe_ranked(&list(5), Some(3), 4.0);
        normalizer.observe_ranked(&list(5), None, 1.0);
        normalizer.observations_finished();

        assert!(normalizer.is_trained());
        let applied = normalizer.apply_list(&list(5));
        assert!(applied.score(0).unwrap() > applied.score(4).unwrap());
        assert_eq!(applied.id(2), Some(2));
    }

    #[test]
    fn test_absent_target_counts_as_list_length() {
        let normalizer = RankNormalizer::new();
        normalizer.observe_ranked(&list(3), None, 0.0);
        normalizer.observe_ranked(&list(3), Some(0), 3.0);
        normalizer.observations_finished();

        let fit = match normalizer.state() {
            NormalizerState::Rank(RankState { fit: Some(fit) }) => fit,
            other => panic!("unexpected state {:?}", other),
        };
        assert!((fit.at_rank(3.0) - 0.0).abs() < 1e-9);
        assert!((fit.at_rank(0.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_scalar_observations_ignored() {
        let normalizer = RankNormalizer::new();
        normalizer.observe(0.5, 1.0);
        normalizer.observations_finished();
        assert_eq!(normalizer.observation_count(), 0);
        assert!(!normalizer.is_trained());
        assert_eq!(normalizer.apply(2.0), 2.0);
    }
}
