//! Character-trigram relatedness over concept titles.
//!
//! Phrases are normalized (see [`normalize_title`]), padded with one space on
//! each side and broken into character trigrams. Relatedness is the Dice
//! coefficient of the two trigram sets, in `[0, 1]`.

use super::catalog::{normalize_title, ConceptCatalog};
use crate::error::MetricError;
use crate::lang::{Language, LocalId, LocalString};
use crate::sr::{Explanation, MonolingualMetric, SrResult, SrResultList, UniversalMetric};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let normalized = normalize_title(text);
    if normalized.is_empty() {
        return HashSet::new();
    }
    let padded: Vec<char> = format!(" {} ", normalized).chars().collect();
    padded.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

/// Dice coefficient of two trigram sets. `None` if either is empty.
pub fn dice(a: &HashSet<[char; 3]>, b: &HashSet<[char; 3]>) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let shared = a.intersection(b).count();
    Some(2.0 * shared as f64 / (a.len() + b.len()) as f64)
}

fn explain(a: &str, b: &str, score: f64) -> Vec<Explanation> {
    vec![Explanation::new(format!(
        "'{}' and '{}' share {:.0}% of their character trigrams",
        a,
        b,
        score * 100.0
    ))]
}

/// Single-language trigram metric.
pub struct TrigramMetric {
    language: Language,
    catalog: Arc<ConceptCatalog>,
    /// Trigrams of every title in `language`, keyed by local id.
    titles: HashMap<i64, HashSet<[char; 3]>>,
}

impl TrigramMetric {
    pub fn new(language: Language, catalog: Arc<ConceptCatalog>) -> Self {
        let titles = catalog
            .in_language(&language)
            .map(|c| (c.local_id, trigrams(&c.title)))
            .collect();
        Self {
            language,
            catalog,
            titles,
        }
    }
}

impl MonolingualMetric for TrigramMetric {
    fn language(&self) -> &Language {
        &self.language
    }

    fn similarity(
        &self,
        phrase1: &str,
        phrase2: &str,
        _language: &Language,
        explanations: bool,
    ) -> Result<Option<SrResult>, MetricError> {
        Ok(dice(&trigrams(phrase1), &trigrams(phrase2)).map(|score| {
            if explanations {
                SrResult::with_explanations(score, explain(phrase1, phrase2, score))
            } else {
                SrResult::new(score)
            }
        }))
    }

    fn most_similar(
        &self,
        concept_id: i64,
        max_results: usize,
        valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError> {
        let anchor = LocalId::new(self.language.clone(), concept_id);
        if self.catalog.local(&anchor).is_none() {
            return Ok(None);
        }
        let Some(anchor_grams) = self.titles.get(&concept_id) else {
            return Ok(None);
        };

        let hits = self
            .titles
            .iter()
            .filter(|(id, _)| **id != concept_id)
            .filter(|(id, _)| valid_ids.map_or(true, |valid| valid.contains(*id)))
            .filter_map(|(id, grams)| dice(anchor_grams, grams).map(|score| (*id, score)))
            .collect();
        Ok(Some(SrResultList::from_unsorted(hits, max_results)))
    }
}

/// Cross-lingual trigram metric.
///
/// Two universal concepts score the best trigram match between any of their
/// titles, across all languages.
pub struct UniversalTrigramMetric {
    titles: HashMap<i64, Vec<HashSet<[char; 3]>>>,
}

impl UniversalTrigramMetric {
    pub fn new(catalog: &ConceptCatalog) -> Self {
        let titles = catalog
            .universal_ids()
            .map(|u| (u, catalog.universal(u).map(|c| trigrams(&c.title)).collect()))
            .collect();
        Self { titles }
    }
}

impl UniversalMetric for UniversalTrigramMetric {
    fn similarity(
        &self,
        phrase1: &LocalString,
        phrase2: &LocalString,
        explanations: bool,
    ) -> Result<SrResult, MetricError> {
        let score = dice(&trigrams(&phrase1.text), &trigrams(&phrase2.text)).unwrap_or(f64::NAN);
        Ok(if explanations && !score.is_nan() {
            SrResult::with_explanations(score, explain(&phrase1.text, &phrase2.text, score))
        } else {
            SrResult::new(score)
        })
    }

    fn most_similar(
        &self,
        universal_id: i64,
        max_results: usize,
        valid_ids: Option<&HashSet<i64>>,
    ) -> Result<Option<SrResultList>, MetricError> {
        let Some(anchor) = self.titles.get(&universal_id) else {
            return Ok(None);
        };

        let hits = self
            .titles
            .iter()
            .filter(|(id, _)| **id != universal_id)
            .filter(|(id, _)| valid_ids.map_or(true, |valid| valid.contains(*id)))
            .filter_map(|(id, candidates)| {
                anchor
                    .iter()
                    .flat_map(|a| candidates.iter().filter_map(move |b| dice(a, b)))
                    .reduce(f64::max)
                    .map(|score| (*id, score))
            })
            .collect();
        Ok(Some(SrResultList::from_unsorted(hits, max_results)))
    }
}
