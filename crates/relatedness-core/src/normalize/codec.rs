//! Self-describing byte format for trained normalizers.
//!
//! ```json
//! {"format": "sr-normalizer", "version": 1, "state": {"type": "isotonic", ...}}
//! ```
//!
//! The header is checked before the state is parsed, so a blob written by
//! another tool or a newer build fails with a precise error instead of a
//! generic parse failure.

use super::{
    BypassNormalizer, IsotonicFit, LinearFit, Normalizer, PercentileFit, RankFit,
    RankNormalizer, RankState, ScalarFit, ScalarNormalizer,
};
use crate::config::{NORMALIZER_FORMAT, NORMALIZER_FORMAT_VERSION};
use crate::error::NormalizerError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fitted parameters of a scalar normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarState<F> {
    pub fit: Option<F>,
    /// Calibrated value for a missing raw score.
    #[serde(default)]
    pub missing_mean: Option<f64>,
}

impl<F: ScalarFit> ScalarState<F> {
    fn validate(&self) -> Result<(), String> {
        if self.missing_mean.is_some_and(|mean| !mean.is_finite()) {
            return Err(format!("{}: non-finite missing estimate", F::KIND));
        }
        self.fit.as_ref().map_or(Ok(()), |fit| fit.validate())
    }
}

/// Persisted normalizer, tagged by implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizerState {
    Bypass,
    Isotonic(ScalarState<IsotonicFit>),
    Linear(ScalarState<LinearFit>),
    Percentile(ScalarState<PercentileFit>),
    Rank(RankState),
}

impl NormalizerState {
    /// Rejects fitted parameters that would make `apply` misbehave.
    pub fn validate(&self) -> Result<(), NormalizerError> {
        let checked = match self {
            Self::Bypass => Ok(()),
            Self::Isotonic(state) => state.validate(),
            Self::Linear(state) => state.validate(),
            Self::Percentile(state) => state.validate(),
            Self::Rank(state) => state.fit.as_ref().map_or(Ok(()), RankFit::validate),
        };
        checked.map_err(NormalizerError::Decode)
    }

    /// Rebuilds a live normalizer.
    pub fn into_normalizer(self) -> Arc<dyn Normalizer> {
        match self {
            Self::Bypass => Arc::new(BypassNormalizer::new()),
            Self::Isotonic(state) => Arc::new(ScalarNormalizer::from_state(state)),
            Self::Linear(state) => Arc::new(ScalarNormalizer::from_state(state)),
            Self::Percentile(state) => Arc::new(ScalarNormalizer::from_state(state)),
            Self::Rank(state) => Arc::new(RankNormalizer::from_state(state)),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'a str,
    version: u32,
    state: &'a NormalizerState,
}

#[derive(Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Deserialize)]
struct Body {
    state: NormalizerState,
}

/// Serializes a normalizer's fitted state.
pub fn encode(normalizer: &dyn Normalizer) -> Result<Vec<u8>, NormalizerError> {
    let state = normalizer.state();
    serde_json::to_vec_pretty(&Envelope {
        format: NORMALIZER_FORMAT,
        version: NORMALIZER_FORMAT_VERSION,
        state: &state,
    })
    .map_err(|e| NormalizerError::Encode(e.to_string()))
}

/// Parses bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Arc<dyn Normalizer>, NormalizerError> {
    let header: Header =
        serde_json::from_slice(bytes).map_err(|e| NormalizerError::Decode(e.to_string()))?;
    if header.format != NORMALIZER_FORMAT {
        return Err(NormalizerError::UnsupportedFormat(header.format));
    }
    if header.version != NORMALIZER_FORMAT_VERSION {
        return Err(NormalizerError::UnsupportedVersion(header.version));
    }

    let body: Body =
        serde_json::from_slice(bytes).map_err(|e| NormalizerError::Decode(e.to_string()))?;
    body.state.validate()?;
    Ok(body.state.into_normalizer())
}
