//! Test doubles for relatedness-core.
//!
//! Metrics here are deterministic and symmetric so that swapped records score
//! the same as unswapped ones. Only compiled when running tests.

use crate::dataset::{Dataset, KnownSim};
use crate::error::MetricError;
use crate::lang::{Language, LocalId, LocalString};
use crate::sr::{
    ConceptMapper, Disambiguator, MonolingualMetric, SrResult, SrResultList, UniversalMetric,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn en() -> Language {
    Language::new("en").unwrap()
}

/// Builds a dataset from `(phrase1, phrase2, gold)` triples.
pub fn dataset(language: &str, pairs: &[(&str, &str, f64)]) -> Dataset {
    let language = Language::new(language).unwrap();
    let records = pairs
        .iter()
        .map(|(a, b, gold)| KnownSim::new(*a, *b, *gold, language.clone()))
        .collect();
    Dataset::new(format!("{}-fixture", language), language, records)
}

/// Jaccard overlap of the character sets of two phrases.
pub fn char_overlap(a: &str, b: &str) -> f64 {
    let a: HashSet<char> = a.chars().collect();
    let b: HashSet<char> = b.chars().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Ids `1..=10` minus `concept_id` and anything outside `valid_ids`, scored
/// descending.
fn ranked_neighbors(
    concept_id: i64,
    max_results: usize,
    valid_ids: Option<&HashSet<i64>>,
) -> SrResultList {
    let hits = (1..=10)
        .filter(|id| *id != concept_id)
        .filter(|id| valid_ids.map_or(true, |valid| valid.contains(id)))
        .map(|id| (id, 1.0 / id as f64))
        .collect();
    SrResultList::from_unsorted(hits, max_results)
}

/// Single-language metric that counts its calls.
///
/// `most_similar(id)` returns ids `1..=10` (minus `id` and anything outside
/// `valid_ids`), scored descending.
pub struct CountingMetric {
    language: Language,
    similarity_calls: AtomicUsize,
    most_similar_calls: AtomicUsize,
}

impl CountingMetric {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            similarity_calls: AtomicUsize::new(0),
            most_similar_calls: AtomicUsize::new(0),
        }
    }

    /// Score this metric assigns to a pair, without counting a call.
    pub fn raw(&self, a: &str, b: &str) -> f64 {
        char_overlap(a, b)
    }

    pub fn calls(&self) -> usize {
        self.similarity_calls.load(Ordering::SeqCst) + self.most_similar_calls()
    }

    pub fn most_similar_calls(&self) -> usize {
        self.most_similar_calls.load(Ordering::SeqCst)
    }
}

impl MonolingualMetric for CountingMetric {
    fn language(&self) -> &Language {
        &self.language
    }

    fn similarity(
        &self,
        phrase1: &str,
        phrase2: &str,
        _language: &Language,
        _explanations: bool,
    ) -> Result<Option<SrResult>, MetricError> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(SrResult::new(self.raw(phrase1, phrase2))))
    }

    fn most_similar(
        &self,
        concept_id: i64,
        max_results: usize,
        valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError> {
        self.most_similar_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(ranked_neighbors(concept_id, max_results, valid_ids)))
    }
}

/// Cross-lingual counterpart of [`CountingMetric`].
///
/// `most_similar(id)` returns ids `1..=10` (minus `id`) like the
/// single-language metric, treating them as universal ids.
#[derive(Default)]
pub struct CountingUniversalMetric {
    similarity_calls: AtomicUsize,
    most_similar_calls: AtomicUsize,
}

impl CountingUniversalMetric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.similarity_calls.load(Ordering::SeqCst) + self.most_similar_calls()
    }

    pub fn most_similar_calls(&self) -> usize {
        self.most_similar_calls.load(Ordering::SeqCst)
    }
}

impl UniversalMetric for CountingUniversalMetric {
    fn similarity(
        &self,
        phrase1: &LocalString,
        phrase2: &LocalString,
        _explanations: bool,
    ) -> Result<SrResult, MetricError> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SrResult::new(char_overlap(&phrase1.text, &phrase2.text)))
    }

    fn most_similar(
        &self,
        universal_id: i64,
        max_results: usize,
        valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError> {
        self.most_similar_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(ranked_neighbors(universal_id, max_results, valid_ids)))
    }
}

/// Single-language metric whose every call fails.
pub struct FailingMetric {
    language: Language,
}

impl FailingMetric {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl MonolingualMetric for FailingMetric {
    fn language(&self) -> &Language {
        &self.language
    }

    fn similarity(
        &self,
        _phrase1: &str,
        _phrase2: &str,
        _language: &Language,
        _explanations: bool,
    ) -> Result<Option<SrResult>, MetricError> {
        Err(MetricError::Backend("metric offline".to_string()))
    }

    fn most_similar(
        &self,
        _concept_id: i64,
        _max_results: usize,
        _valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError> {
        Err(MetricError::Backend("metric offline".to_string()))
    }
}

/// Cross-lingual metric whose every call fails.
pub struct FailingUniversalMetric;

impl UniversalMetric for FailingUniversalMetric {
    fn similarity(
        &self,
        _phrase1: &LocalString,
        _phrase2: &LocalString,
        _explanations: bool,
    ) -> Result<SrResult, MetricError> {
        Err(MetricError::Backend("universal metric offline".to_string()))
    }

    fn most_similar(
        &self,
        _universal_id: i64,
        _max_results: usize,
        _valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError> {
        Err(MetricError::Backend("universal metric offline".to_string()))
    }
}

/// Maps local ids to universal ids from a fixed table, in any language.
pub struct FixedMapper {
    universal: HashMap<i64, i64>,
}

impl FixedMapper {
    pub fn new(entries: &[(i64, i64)]) -> Self {
        Self {
            universal: entries.iter().copied().collect(),
        }
    }
}

impl ConceptMapper for FixedMapper {
    fn universal_id(&self, local: &LocalId) -> Result<Option<i64>, MetricError> {
        Ok(self.universal.get(&local.id).copied())
    }
}

/// Resolves phrases from a fixed table, in any language.
pub struct FixedDisambiguator {
    ids: HashMap<String, i64>,
}

impl FixedDisambiguator {
    pub fn new(entries: &[(&str, i64)]) -> Self {
        Self {
            ids: entries
                .iter()
                .map(|(phrase, id)| (phrase.to_string(), *id))
                .collect(),
        }
    }
}

impl Disambiguator for FixedDisambiguator {
    fn resolve_top(
        &self,
        phrases: &[LocalString],
        _context: Option<&[LocalString]>,
    ) -> Result<Vec<Option<LocalId>>, MetricError> {
        Ok(phrases
            .iter()
            .map(|p| {
                self.ids
                    .get(&p.text)
                    .map(|id| LocalId::new(p.language.clone(), *id))
            })
            .collect())
    }
}
