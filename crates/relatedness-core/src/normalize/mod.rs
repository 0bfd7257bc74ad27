//! Trainable calibration functions for raw relatedness scores.
//!
//! A [`Normalizer`] learns a mapping from a metric's raw output onto the scale
//! of a human-judged gold standard. Two observation shapes feed it:
//!
//! | Shape    | Method                              | Calibrates                     |
//! |----------|-------------------------------------|--------------------------------|
//! | scalar   | [`Normalizer::observe`]             | pairwise `similarity` scores   |
//! | ranked   | [`Normalizer::observe_ranked`]      | `most_similar` result lists    |
//!
//! # Lifecycle
//!
//! ```text
//! new (untrained) → reset → observe* (concurrent) → observations_finished → apply
//!                                                        ↓
//!                                                 encode / decode
//! ```
//!
//! A fit that cannot be computed (no observations, no variance) leaves the
//! normalizer untrained rather than failing. Untrained normalizers apply as
//! the identity.
//!
//! # Implementations
//!
//! | Key          | Type                      | Fit                                        |
//! |--------------|---------------------------|--------------------------------------------|
//! | `identity`   | [`BypassNormalizer`]      | none                                       |
//! | `isotonic`   | [`IsotonicNormalizer`]    | pool-adjacent-violators, interpolated      |
//! | `linear`     | [`LinearNormalizer`]      | least squares, clamped to the gold range   |
//! | `percentile` | [`PercentileNormalizer`]  | empirical CDF scaled into the gold range   |
//! | `rank`       | [`RankNormalizer`]        | least squares on `ln(1 + rank)`            |
//!
//! Implementations are chosen by configuration key through [`NormalizerKind`].

mod bypass;
mod codec;
mod isotonic;
mod linear;
mod percentile;
mod rank;

pub use bypass::BypassNormalizer;
pub use codec::{decode, encode, NormalizerState, ScalarState};
pub use isotonic::IsotonicFit;
pub use linear::LinearFit;
pub use percentile::PercentileFit;
pub use rank::{RankFit, RankNormalizer, RankState};

use crate::error::ConfigError;
use crate::sr::SrResultList;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// A trainable calibration function.
///
/// All methods take `&self`: accumulated observations live behind interior
/// synchronization so that the evaluation harness can call
/// [`observe`](Self::observe) from many workers at once without losing any.
pub trait Normalizer: Send + Sync + fmt::Debug {
    /// Registry kind of this normalizer.
    fn kind(&self) -> NormalizerKind;

    /// Discards accumulated observations and any fitted function.
    fn reset(&self);

    /// Records a scalar observation. `raw` may be `NaN` (metric had no score).
    fn observe(&self, raw: f64, gold: f64);

    /// Records a ranked observation: the list a most-similar query returned,
    /// where the gold partner landed in it (if at all), and the gold value.
    fn observe_ranked(&self, list: &SrResultList, target: Option<usize>, gold: f64);

    /// Fits the calibration function from everything observed since `reset`.
    fn observations_finished(&self);

    fn is_trained(&self) -> bool;

    /// Number of observations accumulated since the last `reset`.
    fn observation_count(&self) -> usize;

    /// Calibrates one raw value.
    fn apply(&self, raw: f64) -> f64;

    /// Calibrates every score of a most-similar list.
    fn apply_list(&self, list: &SrResultList) -> SrResultList {
        list.map_scores(|_, score| self.apply(score))
    }

    /// Short human-readable summary of the fitted function.
    fn dump(&self) -> String;

    /// Fitted parameters, for persistence.
    fn state(&self) -> NormalizerState;

    /// True only for the no-calibration sentinel.
    fn is_bypass(&self) -> bool {
        false
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Compile-time registry of normalizer implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizerKind {
    Bypass,
    Isotonic,
    Linear,
    Percentile,
    Rank,
}

impl NormalizerKind {
    /// Resolves a configuration key. Unknown keys fail fast.
    pub fn from_key(key: &str) -> Result<Self, ConfigError> {
        match key.trim().to_ascii_lowercase().as_str() {
            "identity" | "bypass" | "none" => Ok(Self::Bypass),
            "isotonic" => Ok(Self::Isotonic),
            "linear" | "range" => Ok(Self::Linear),
            "percentile" => Ok(Self::Percentile),
            "rank" => Ok(Self::Rank),
            _ => Err(ConfigError::UnknownNormalizer(key.to_string())),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Bypass => "identity",
            Self::Isotonic => "isotonic",
            Self::Linear => "linear",
            Self::Percentile => "percentile",
            Self::Rank => "rank",
        }
    }

    /// Constructs a fresh, untrained instance.
    pub fn build(&self) -> Arc<dyn Normalizer> {
        match self {
            Self::Bypass => Arc::new(BypassNormalizer::new()),
            Self::Isotonic => Arc::new(IsotonicNormalizer::new()),
            Self::Linear => Arc::new(LinearNormalizer::new()),
            Self::Percentile => Arc::new(PercentileNormalizer::new()),
            Self::Rank => Arc::new(RankNormalizer::new()),
        }
    }
}

impl fmt::Display for NormalizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Scalar Normalizers
// =============================================================================

/// A calibration model fit from `(raw, gold)` points.
pub trait ScalarFit:
    Clone + fmt::Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    const KIND: NormalizerKind;

    /// Fits from finite points. `None` when the points cannot support a fit.
    fn fit(points: &[(f64, f64)]) -> Option<Self>;

    /// Maps a finite raw value.
    fn apply(&self, raw: f64) -> f64;

    fn describe(&self) -> String;

    /// Checks the invariants a decoded fit must hold before it is applied.
    fn validate(&self) -> Result<(), String>;

    fn wrap(state: ScalarState<Self>) -> NormalizerState;
}

/// Gold values observed alongside a missing (`NaN`) raw score.
#[derive(Debug, Default, Clone, Copy)]
struct MissingGold {
    sum: f64,
    count: usize,
}

impl MissingGold {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug)]
struct ScalarInner<F> {
    points: Vec<(f64, f64)>,
    missing: MissingGold,
    fit: Option<F>,
    missing_mean: Option<f64>,
}

impl<F> Default for ScalarInner<F> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            missing: MissingGold::default(),
            fit: None,
            missing_mean: None,
        }
    }
}

/// Generic scalar normalizer over a [`ScalarFit`] model.
///
/// Ranked observations are reduced to the gold partner's score; lists that
/// do not contain the partner contribute nothing.
#[derive(Debug)]
pub struct ScalarNormalizer<F> {
    inner: Mutex<ScalarInner<F>>,
}

pub type IsotonicNormalizer = ScalarNormalizer<IsotonicFit>;
pub type LinearNormalizer = ScalarNormalizer<LinearFit>;
pub type PercentileNormalizer = ScalarNormalizer<PercentileFit>;

impl<F: ScalarFit> ScalarNormalizer<F> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ScalarInner::default()),
        }
    }

    /// Rebuilds a trained (or untrained) normalizer from persisted state.
    pub fn from_state(state: ScalarState<F>) -> Self {
        Self {
            inner: Mutex::new(ScalarInner {
                points: Vec::new(),
                missing: MissingGold::default(),
                fit: state.fit,
                missing_mean: state.missing_mean,
            }),
        }
    }

    // A panicking worker cannot leave a half-written point behind, so the
    // buffer is still consistent after poisoning.
    fn lock(&self) -> MutexGuard<'_, ScalarInner<F>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: ScalarFit> Default for ScalarNormalizer<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ScalarFit> Normalizer for ScalarNormalizer<F> {
    fn kind(&self) -> NormalizerKind {
        F::KIND
    }

    fn reset(&self) {
        *self.lock() = ScalarInner::default();
    }

    fn observe(&self, raw: f64, gold: f64) {
        if !gold.is_finite() {
            return;
        }
        let mut inner = self.lock();
        if raw.is_finite() {
            inner.points.push((raw, gold));
        } else {
            inner.missing.sum += gold;
            inner.missing.count += 1;
        }
    }

    fn observe_ranked(&self, list: &SrResultList, target: Option<usize>, gold: f64) {
        if let Some(score) = target.and_then(|index| list.score(index)) {
            self.observe(score, gold);
        }
    }

    fn observations_finished(&self) {
        let mut inner = self.lock();
        inner.fit = F::fit(&inner.points);
        inner.missing_mean = inner.missing.mean();
        if inner.fit.is_none() {
            warn!(
                "{} normalizer could not be fit from {} observations; leaving it untrained",
                F::KIND,
                inner.points.len()
            );
        }
    }

    fn is_trained(&self) -> bool {
        self.lock().fit.is_some()
    }

    fn observation_count(&self) -> usize {
        let inner = self.lock();
        inner.points.len() + inner.missing.count
    }

    fn apply(&self, raw: f64) -> f64 {
        let inner = self.lock();
        match (&inner.fit, raw.is_finite()) {
            (Some(fit), true) => fit.apply(raw),
            (Some(_), false) => inner.missing_mean.unwrap_or(f64::NAN),
            (None, _) => raw,
        }
    }

    fn dump(&self) -> String {
        let inner = self.lock();
        let fitted = match &inner.fit {
            Some(fit) => fit.describe(),
            None => format!("{}: untrained", F::KIND),
        };
        match inner.missing_mean {
            Some(mean) => format!("{}, missing -> {:.4}", fitted, mean),
            None => fitted,
        }
    }

    fn state(&self) -> NormalizerState {
        let inner = self.lock();
        F::wrap(ScalarState {
            fit: inner.fit.clone(),
            missing_mean: inner.missing_mean,
        })
    }
}

/// Keeps only points whose raw and gold values are both finite.
pub(crate) fn finite_points(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

/// Finite bounds with `min <= max`.
pub(crate) fn check_bounds(kind: NormalizerKind, min: f64, max: f64) -> Result<(), String> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(format!("{}: invalid gold bounds [{}, {}]", kind, min, max));
    }
    Ok(())
}

/// Min and max of the gold values.
pub(crate) fn gold_bounds(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    points.iter().fold(None, |acc, &(_, y)| {
        Some(match acc {
            None => (y, y),
            Some((lo, hi)) => (f64::min(lo, y), f64::max(hi, y)),
        })
    })
}
