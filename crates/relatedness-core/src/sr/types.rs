use serde::{Deserialize, Serialize};

/// Human-readable justification attached to a relatedness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub plaintext: String,
}

impl Explanation {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self {
            plaintext: plaintext.into(),
        }
    }
}

/// One relatedness judgment for a pair of phrases or concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrResult {
    pub score: f64,
    #[serde(default)]
    pub explanations: Vec<Explanation>,
}

impl SrResult {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            explanations: Vec::new(),
        }
    }

    pub fn with_explanations(score: f64, explanations: Vec<Explanation>) -> Self {
        Self {
            score,
            explanations,
        }
    }
}

/// Ranked most-similar concepts as `(concept_id, score)`, highest score first.
///
/// Produced fresh per query and never mutated afterwards; recalibration
/// (see [`crate::normalize::Normalizer::apply_list`]) builds a new list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SrResultList {
    entries: Vec<(i64, f64)>,
}

impl SrResultList {
    /// Builds a list from unordered hits, sorting descending by score.
    ///
    /// Ties are broken by ascending concept id so rankings are deterministic.
    /// `NaN` scores sort last.
    pub fn from_unsorted(mut hits: Vec<(i64, f64)>, max_results: usize) -> Self {
        hits.sort_by(|a, b| {
            let a_score = if a.1.is_nan() { f64::NEG_INFINITY } else { a.1 };
            let b_score = if b.1.is_nan() { f64::NEG_INFINITY } else { b.1 };
            b_score.total_cmp(&a_score).then(a.0.cmp(&b.0))
        });
        hits.truncate(max_results);
        Self { entries: hits }
    }

    /// Wraps entries that are already in rank order.
    pub fn from_ranked(entries: Vec<(i64, f64)>) -> Self {
        Self { entries }
    }

    /// Returns the rank position of a concept, or `None` if it is absent.
    pub fn index_of(&self, concept_id: i64) -> Option<usize> {
        self.entries.iter().position(|(id, _)| *id == concept_id)
    }

    pub fn id(&self, index: usize) -> Option<i64> {
        self.entries.get(index).map(|(id, _)| *id)
    }

    pub fn score(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|(_, score)| *score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(i64, f64)> {
        self.entries.iter()
    }

    /// Returns a new list with each score replaced by `f(rank, score)`.
    ///
    /// Order is preserved; calibrated scores are expected to be monotone.
    pub fn map_scores(&self, mut f: impl FnMut(usize, f64) -> f64) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .enumerate()
                .map(|(rank, (id, score))| (*id, f(rank, *score)))
                .collect(),
        }
    }
}
