//! Traits for the relatedness engines and resolvers training consumes.
//!
//! These collaborators are read-only during training: the evaluation harness
//! invokes them concurrently from several workers, so implementations must be
//! `Send + Sync` and must not rely on call ordering.

use super::types::{SrResult, SrResultList};
use crate::error::MetricError;
use crate::lang::{Language, LocalId, LocalString};
use std::collections::HashSet;

/// Relatedness engine scoped to a single language's concepts.
///
/// # Examples
///
/// ```ignore
/// let metric: Arc<dyn MonolingualMetric> = registry.local_metric("trigram", &lang)?;
///
/// if let Some(result) = metric.similarity("dog", "wolf", &lang, false)? {
///     println!("raw score: {}", result.score);
/// }
/// ```
pub trait MonolingualMetric: Send + Sync {
    /// Returns the language this metric is bound to.
    fn language(&self) -> &Language;

    /// Scores two phrases. `Ok(None)` means the metric has no opinion.
    fn similarity(
        &self,
        phrase1: &str,
        phrase2: &str,
        language: &Language,
        explanations: bool,
    ) -> Result<Option<SrResult>, MetricError>;

    /// Ranks concepts most similar to `concept_id`, at most `max_results` of them.
    ///
    /// When `valid_ids` is given, only those concepts may appear in the list.
    /// `Ok(None)` means no list could be produced for this concept.
    fn most_similar(
        &self,
        concept_id: i64,
        max_results: usize,
        valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError>;
}

/// Relatedness engine over language-independent concept clusters.
pub trait UniversalMetric: Send + Sync {
    /// Scores two language-tagged phrases.
    fn similarity(
        &self,
        phrase1: &LocalString,
        phrase2: &LocalString,
        explanations: bool,
    ) -> Result<SrResult, MetricError>;

    /// Ranks universal concepts most similar to `universal_id`.
    fn most_similar(
        &self,
        universal_id: i64,
        max_results: usize,
        valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError>;
}

/// Maps free-text phrases to best-guess concept identifiers.
pub trait Disambiguator: Send + Sync {
    /// Resolves each phrase to its top candidate, order-preserving.
    ///
    /// Phrases are supplied together so the implementation can use them as
    /// context for each other. The returned vector has one entry per input;
    /// `None` marks a phrase that could not be resolved.
    fn resolve_top(
        &self,
        phrases: &[LocalString],
        context: Option<&[LocalString]>,
    ) -> Result<Vec<Option<LocalId>>, MetricError>;
}

/// Maps language-local concept ids into the cross-lingual concept space.
pub trait ConceptMapper: Send + Sync {
    fn universal_id(&self, local: &LocalId) -> Result<Option<i64>, MetricError>;
}
