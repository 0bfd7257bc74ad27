//! The similarity / most-similar normalizer pair of one metric.
//!
//! # Training protocol
//!
//! All four entry points share one shape:
//!
//! 1. If the targeted slot holds the bypass normalizer, return
//!    [`TrainingOutcome::Bypassed`] without touching the metric or dataset.
//! 2. Single-language variants check that the metric and dataset languages
//!    agree before anything is evaluated.
//! 3. The slot's normalizer becomes the trainee and the slot is replaced by a
//!    fresh bypass normalizer. A drop guard puts the trainee back on every
//!    exit path, including errors and panics.
//! 4. The trainee is reset, the harness evaluates every record, and the
//!    trainee is fit with `observations_finished`.
//!
//! Workers only ever see the trainee handle taken in step 3, never the pair.
//!
//! # Persistence
//!
//! Each role is stored under its own key inside a directory scope:
//!
//! ```text
//! <dir>/similarityNormalizer
//! <dir>/mostSimilarNormalizer
//! ```

use super::harness::{EvalOutcome, EvaluationHarness, HarnessStats, SkipReason};
use crate::config::{MOST_SIMILAR_NORMALIZER, SIMILARITY_NORMALIZER};
use crate::dataset::{Dataset, KnownSim};
use crate::error::{ConfigError, NormalizerError, TrainingError};
use crate::lang::{Language, LocalId, LocalString};
use crate::normalize::{decode, encode, BypassNormalizer, Normalizer, NormalizerKind};
use crate::sr::{ConceptMapper, Disambiguator, MonolingualMetric, UniversalMetric};
use crate::storage::{scoped_key, StorageBackend};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which normalizer of the pair a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Similarity,
    MostSimilar,
}

impl Role {
    /// Storage key of this role inside a pair's directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Similarity => SIMILARITY_NORMALIZER,
            Self::MostSimilar => MOST_SIMILAR_NORMALIZER,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Summary of one completed training pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub role: Role,
    pub dataset: String,
    pub kind: String,
    pub trained: bool,
    pub stats: HarnessStats,
    pub dump: String,
}

#[derive(Debug, Clone)]
pub enum TrainingOutcome {
    /// The slot holds the bypass normalizer; nothing was evaluated.
    Bypassed,
    Trained(PassSummary),
}

impl TrainingOutcome {
    pub fn is_bypassed(&self) -> bool {
        matches!(self, Self::Bypassed)
    }
}

/// Holds a slot on bypass for as long as it lives, then restores the trainee.
struct Swapped<'a> {
    slot: &'a mut Arc<dyn Normalizer>,
    trainee: Arc<dyn Normalizer>,
}

impl<'a> Swapped<'a> {
    fn new(slot: &'a mut Arc<dyn Normalizer>) -> Self {
        let trainee = std::mem::replace(slot, Arc::new(BypassNormalizer::new()));
        Self { slot, trainee }
    }
}

impl Drop for Swapped<'_> {
    fn drop(&mut self) {
        *self.slot = Arc::clone(&self.trainee);
    }
}

/// Calibration pair of one metric (optionally scoped to one language).
///
/// The pair does not own its metric; the metric is supplied per call.
pub struct SrNormalizers {
    similarity: Arc<dyn Normalizer>,
    most_similar: Arc<dyn Normalizer>,
}

impl fmt::Debug for SrNormalizers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrNormalizers")
            .field("similarity", &self.similarity.kind())
            .field("most_similar", &self.most_similar.kind())
            .finish()
    }
}

impl Default for SrNormalizers {
    fn default() -> Self {
        Self::bypass()
    }
}

impl SrNormalizers {
    pub fn new(similarity: Arc<dyn Normalizer>, most_similar: Arc<dyn Normalizer>) -> Self {
        Self {
            similarity,
            most_similar,
        }
    }

    /// A pair with calibration disabled for both roles.
    pub fn bypass() -> Self {
        Self::new(
            Arc::new(BypassNormalizer::new()),
            Arc::new(BypassNormalizer::new()),
        )
    }

    /// A pair of fresh, untrained normalizers of the given kinds.
    pub fn from_kinds(similarity: NormalizerKind, most_similar: NormalizerKind) -> Self {
        Self::new(similarity.build(), most_similar.build())
    }

    pub fn similarity_normalizer(&self) -> &Arc<dyn Normalizer> {
        &self.similarity
    }

    pub fn most_similar_normalizer(&self) -> &Arc<dyn Normalizer> {
        &self.most_similar
    }

    pub fn set_similarity_normalizer(&mut self, normalizer: Arc<dyn Normalizer>) {
        self.similarity = normalizer;
    }

    pub fn set_most_similar_normalizer(&mut self, normalizer: Arc<dyn Normalizer>) {
        self.most_similar = normalizer;
    }

    pub fn normalizer(&self, role: Role) -> &Arc<dyn Normalizer> {
        match role {
            Role::Similarity => &self.similarity,
            Role::MostSimilar => &self.most_similar,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Arc<dyn Normalizer> {
        match role {
            Role::Similarity => &mut self.similarity,
            Role::MostSimilar => &mut self.most_similar,
        }
    }

    // =========================================================================
    // Training
    // =========================================================================

    /// Calibrates pairwise scores of a single-language metric.
    pub fn train_similarity(
        &mut self,
        metric: &dyn MonolingualMetric,
        dataset: &mut Dataset,
        harness: &EvaluationHarness,
    ) -> Result<TrainingOutcome, TrainingError> {
        if self.similarity.is_bypass() {
            return Ok(bypassed(Role::Similarity, dataset));
        }
        check_language(metric.language(), dataset.language())?;

        self.train_role(Role::Similarity, dataset, harness, |trainee, record, rng| {
            record.maybe_swap(rng);
            let score = metric
                .similarity(&record.phrase1, &record.phrase2, &record.language, false)?
                .map(|result| result.score)
                .unwrap_or(f64::NAN);
            trainee.observe(score, record.similarity);
            Ok(EvalOutcome::Observed)
        })
    }

    /// Calibrates pairwise scores of a cross-lingual metric.
    pub fn train_universal_similarity(
        &mut self,
        metric: &dyn UniversalMetric,
        dataset: &mut Dataset,
        harness: &EvaluationHarness,
    ) -> Result<TrainingOutcome, TrainingError> {
        if self.similarity.is_bypass() {
            return Ok(bypassed(Role::Similarity, dataset));
        }

        self.train_role(Role::Similarity, dataset, harness, |trainee, record, rng| {
            record.maybe_swap(rng);
            let (phrase1, phrase2) = local_strings(record);
            let result = metric.similarity(&phrase1, &phrase2, false)?;
            trainee.observe(result.score, record.similarity);
            Ok(EvalOutcome::Observed)
        })
    }

    /// Calibrates most-similar lists of a single-language metric.
    pub fn train_most_similar(
        &mut self,
        metric: &dyn MonolingualMetric,
        disambiguator: &dyn Disambiguator,
        dataset: &mut Dataset,
        harness: &EvaluationHarness,
        valid_ids: Option<&HashSet<i64>>,
        max_results: usize,
    ) -> Result<TrainingOutcome, TrainingError> {
        if self.most_similar.is_bypass() {
            return Ok(bypassed(Role::MostSimilar, dataset));
        }
        check_language(metric.language(), dataset.language())?;

        self.train_role(Role::MostSimilar, dataset, harness, |trainee, record, rng| {
            record.maybe_swap(rng);
            let (id1, id2) = match resolve_pair(disambiguator, record)? {
                Ok(ids) => ids,
                Err(reason) => return Ok(EvalOutcome::Skipped(reason)),
            };
            if id1.id == id2.id {
                return Ok(EvalOutcome::Skipped(SkipReason::SameConcept));
            }
            match metric.most_similar(id1.id, max_results, valid_ids)? {
                Some(list) => {
                    trainee.observe_ranked(&list, list.index_of(id2.id), record.similarity);
                    Ok(EvalOutcome::Observed)
                }
                None => Ok(EvalOutcome::Skipped(SkipReason::NoResultList)),
            }
        })
    }

    /// Calibrates most-similar lists of a cross-lingual metric.
    ///
    /// Phrases are disambiguated in the dataset's language and lifted into
    /// universal concept ids through `mapper`.
    #[allow(clippy::too_many_arguments)]
    pub fn train_universal_most_similar(
        &mut self,
        metric: &dyn UniversalMetric,
        disambiguator: &dyn Disambiguator,
        mapper: &dyn ConceptMapper,
        dataset: &mut Dataset,
        harness: &EvaluationHarness,
        valid_ids: Option<&HashSet<i64>>,
        max_results: usize,
    ) -> Result<TrainingOutcome, TrainingError> {
        if self.most_similar.is_bypass() {
            return Ok(bypassed(Role::MostSimilar, dataset));
        }

        self.train_role(Role::MostSimilar, dataset, harness, |trainee, record, rng| {
            record.maybe_swap(rng);
            let (id1, id2) = match resolve_pair(disambiguator, record)? {
                Ok(ids) => ids,
                Err(reason) => return Ok(EvalOutcome::Skipped(reason)),
            };
            let (Some(u1), Some(u2)) = (mapper.universal_id(&id1)?, mapper.universal_id(&id2)?)
            else {
                return Ok(EvalOutcome::Skipped(SkipReason::Unmapped));
            };
            if u1 == u2 {
                return Ok(EvalOutcome::Skipped(SkipReason::SameConcept));
            }
            match metric.most_similar(u1, max_results, valid_ids)? {
                Some(list) => {
                    trainee.observe_ranked(&list, list.index_of(u2), record.similarity);
                    Ok(EvalOutcome::Observed)
                }
                None => Ok(EvalOutcome::Skipped(SkipReason::NoResultList)),
            }
        })
    }

    fn train_role<F>(
        &mut self,
        role: Role,
        dataset: &mut Dataset,
        harness: &EvaluationHarness,
        eval: F,
    ) -> Result<TrainingOutcome, TrainingError>
    where
        F: Fn(&dyn Normalizer, &mut KnownSim, &mut ChaCha8Rng) -> Result<EvalOutcome, TrainingError>
            + Sync,
    {
        let guard = Swapped::new(self.slot_mut(role));
        let trainee = Arc::clone(&guard.trainee);
        trainee.reset();

        let label = format!("{} on {}", role, dataset.name());
        let stats = harness.run(&label, dataset.records_mut(), |record, rng| {
            eval(trainee.as_ref(), record, rng)
        })?;

        trainee.observations_finished();
        let dump = trainee.dump();
        info!(
            "Trained {} on {} ({} of {} records observed): {}",
            role,
            dataset.name(),
            stats.observed,
            stats.records,
            dump
        );
        if !trainee.is_trained() {
            warn!("{} is still untrained after {}", role, dataset.name());
        }

        drop(guard);
        Ok(TrainingOutcome::Trained(PassSummary {
            role,
            dataset: dataset.name().to_string(),
            kind: trainee.kind().to_string(),
            trained: trainee.is_trained(),
            stats,
            dump,
        }))
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes both normalizers under `dir`, most-similar first.
    pub fn write(&self, storage: &dyn StorageBackend, dir: &str) -> Result<(), NormalizerError> {
        for role in [Role::MostSimilar, Role::Similarity] {
            let bytes = encode(self.normalizer(role).as_ref())?;
            storage.save(&scoped_key(dir, role.file_name()), &bytes)?;
        }
        debug!("Wrote normalizers to {}", dir);
        Ok(())
    }

    /// Replaces both normalizers with the ones stored under `dir`.
    ///
    /// Both are decoded before either slot is assigned, so a failure leaves
    /// the pair untouched.
    pub fn read(&mut self, storage: &dyn StorageBackend, dir: &str) -> Result<(), NormalizerError> {
        let most_similar = read_one(storage, dir, Role::MostSimilar)?;
        let similarity = read_one(storage, dir, Role::Similarity)?;
        self.most_similar = most_similar;
        self.similarity = similarity;
        Ok(())
    }

    /// True only if both files exist, decode, and hold trained normalizers.
    pub fn has_readable_normalizers(storage: &dyn StorageBackend, dir: &str) -> bool {
        [Role::MostSimilar, Role::Similarity].into_iter().all(|role| {
            match read_one(storage, dir, role) {
                Ok(normalizer) if normalizer.is_trained() => true,
                Ok(_) => {
                    warn!("{} under {} is not trained", role, dir);
                    false
                }
                Err(NormalizerError::Storage(_)) => {
                    debug!("{} under {} is not readable", role, dir);
                    false
                }
                Err(e) => {
                    warn!("{} under {} is corrupt: {}", role, dir, e);
                    false
                }
            }
        })
    }

    /// Reads the pair if usable; otherwise falls back to bypass for both roles.
    pub fn load_or_bypass(&mut self, storage: &dyn StorageBackend, dir: &str) -> bool {
        if Self::has_readable_normalizers(storage, dir) {
            match self.read(storage, dir) {
                Ok(()) => return true,
                Err(e) => warn!("Failed to read normalizers from {}: {}", dir, e),
            }
        } else {
            warn!("No usable normalizers under {}; calibration disabled", dir);
        }
        *self = Self::bypass();
        false
    }

    /// Removes both files. Missing files are not an error.
    pub fn clear(storage: &dyn StorageBackend, dir: &str) -> Result<(), NormalizerError> {
        for role in [Role::MostSimilar, Role::Similarity] {
            storage.delete(&scoped_key(dir, role.file_name()))?;
        }
        Ok(())
    }
}

fn bypassed(role: Role, dataset: &Dataset) -> TrainingOutcome {
    debug!("{} is bypassed; skipping {}", role, dataset.name());
    TrainingOutcome::Bypassed
}

fn check_language(metric: &Language, dataset: &Language) -> Result<(), ConfigError> {
    if metric != dataset {
        return Err(ConfigError::LanguageMismatch {
            metric: metric.to_string(),
            dataset: dataset.to_string(),
        });
    }
    Ok(())
}

fn local_strings(record: &KnownSim) -> (LocalString, LocalString) {
    (
        LocalString::new(record.language.clone(), record.phrase1.as_str()),
        LocalString::new(record.language.clone(), record.phrase2.as_str()),
    )
}

/// Resolves both phrases together. The inner `Err` is a skip, not a failure.
fn resolve_pair(
    disambiguator: &dyn Disambiguator,
    record: &KnownSim,
) -> Result<Result<(LocalId, LocalId), SkipReason>, TrainingError> {
    let (phrase1, phrase2) = local_strings(record);
    let mut resolved = disambiguator.resolve_top(&[phrase1, phrase2], None)?.into_iter();
    match (resolved.next().flatten(), resolved.next().flatten()) {
        (Some(id1), Some(id2)) => Ok(Ok((id1, id2))),
        _ => Ok(Err(SkipReason::Unresolved)),
    }
}

fn read_one(
    storage: &dyn StorageBackend,
    dir: &str,
    role: Role,
) -> Result<Arc<dyn Normalizer>, NormalizerError> {
    let bytes = storage.load(&scoped_key(dir, role.file_name()))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricError;
    use crate::normalize::IsotonicNormalizer;
    use crate::storage::InMemoryStorage;
    use crate::normalize::{RankFit, RankNormalizer, RankState};
    use crate::test_utils::{
        dataset, en, CountingMetric, CountingUniversalMetric, FailingMetric,
        FailingUniversalMetric, FixedDisambiguator, FixedMapper,
    };

    fn harness() -> EvaluationHarness {
        EvaluationHarness::new(2, 1, 11).unwrap()
    }

    fn dog_dataset() -> Dataset {
        dataset("en", &[("dog", "wolf", 0.8), ("dog", "car", 0.1)])
    }

    #[test]
    fn test_bypass_slot_touches_nothing() {
        let metric = CountingMetric::new(en());
        let mut data = dog_dataset();
        let before = data.clone();
        let mut pair = SrNormalizers::bypass();

        let outcome = pair.train_similarity(&metric, &mut data, &harness()).unwrap();
        assert!(outcome.is_bypassed());
        assert_eq!(metric.calls(), 0);
        assert_eq!(data.records(), before.records());
        assert!(pair.similarity_normalizer().is_bypass());
    }

    #[test]
    fn test_trainee_identity_preserved() {
        let metric = CountingMetric::new(en());
        let trainee: Arc<dyn Normalizer> = Arc::new(IsotonicNormalizer::new());
        let mut pair = SrNormalizers::new(Arc::clone(&trainee), NormalizerKind::Rank.build());
        let mut data = dog_dataset();

        pair.train_similarity(&metric, &mut data, &harness()).unwrap();
        assert!(Arc::ptr_eq(pair.similarity_normalizer(), &trainee));
        assert_eq!(metric.calls(), 2);
    }

    #[test]
    fn test_trainee_restored_after_failure() {
        let metric = FailingMetric::new(en());
        let trainee: Arc<dyn Normalizer> = Arc::new(IsotonicNormalizer::new());
        let mut pair = SrNormalizers::new(Arc::clone(&trainee), NormalizerKind::Rank.build());
        let mut data = dog_dataset();

        let result = pair.train_similarity(&metric, &mut data, &harness());
        assert!(matches!(
            result,
            Err(TrainingError::Metric(MetricError::Backend(_)))
        ));
        assert!(Arc::ptr_eq(pair.similarity_normalizer(), &trainee));
    }

    #[test]
    fn test_universal_bypass_slots_touch_nothing() {
        let metric = CountingUniversalMetric::new();
        let disambiguator = FixedDisambiguator::new(&[("dog", 1), ("wolf", 2)]);
        let mapper = FixedMapper::new(&[(1, 101), (2, 102)]);
        let mut data = dog_dataset();
        let before = data.clone();
        let mut pair = SrNormalizers::bypass();

        let similarity = pair
            .train_universal_similarity(&metric, &mut data, &harness())
            .unwrap();
        let most_similar = pair
            .train_universal_most_similar(
                &metric,
                &disambiguator,
                &mapper,
                &mut data,
                &harness(),
                None,
                10,
            )
            .unwrap();
        assert!(similarity.is_bypassed() && most_similar.is_bypassed());
        assert_eq!(metric.calls(), 0);
        assert_eq!(data.records(), before.records());
        assert!(pair.similarity_normalizer().is_bypass());
        assert!(pair.most_similar_normalizer().is_bypass());
    }

    #[test]
    fn test_universal_similarity_trains_in_place() {
        let metric = CountingUniversalMetric::new();
        let trainee: Arc<dyn Normalizer> = Arc::new(IsotonicNormalizer::new());
        let mut pair = SrNormalizers::new(Arc::clone(&trainee), NormalizerKind::Rank.build());
        let mut data = dog_dataset();

        let outcome = pair
            .train_universal_similarity(&metric, &mut data, &harness())
            .unwrap();
        let TrainingOutcome::Trained(summary) = outcome else {
            panic!("expected a training pass");
        };
        assert_eq!(summary.stats.observed, 2);
        assert_eq!(metric.calls(), 2);
        assert!(Arc::ptr_eq(pair.similarity_normalizer(), &trainee));
        assert!(trainee.is_trained());
    }

    #[test]
    fn test_universal_trainees_restored_after_failure() {
        let metric = FailingUniversalMetric;
        let disambiguator = FixedDisambiguator::new(&[("dog", 1), ("wolf", 2)]);
        let mapper = FixedMapper::new(&[(1, 101), (2, 102)]);
        let similarity: Arc<dyn Normalizer> = Arc::new(IsotonicNormalizer::new());
        let most_similar: Arc<dyn Normalizer> = Arc::new(RankNormalizer::new());
        let mut pair = SrNormalizers::new(Arc::clone(&similarity), Arc::clone(&most_similar));
        let mut data = dog_dataset();

        let result = pair.train_universal_similarity(&metric, &mut data, &harness());
        assert!(matches!(
            result,
            Err(TrainingError::Metric(MetricError::Backend(_)))
        ));
        assert!(Arc::ptr_eq(pair.similarity_normalizer(), &similarity));

        let result = pair.train_universal_most_similar(
            &metric,
            &disambiguator,
            &mapper,
            &mut data,
            &harness(),
            None,
            10,
        );
        assert!(matches!(
            result,
            Err(TrainingError::Metric(MetricError::Backend(_)))
        ));
        assert!(Arc::ptr_eq(pair.most_similar_normalizer(), &most_similar));
    }

    #[test]
    fn test_universal_unresolved_unmapped_and_same_concept_are_skipped() {
        let metric = CountingUniversalMetric::new();
        let disambiguator = FixedDisambiguator::new(&[
            ("dog", 1),
            ("wolf", 2),
            ("car", 3),
            ("automobile", 4),
            ("cat", 5),
        ]);
        // car and automobile share a universal concept; cat has none
        let mapper = FixedMapper::new(&[(1, 1), (2, 2), (3, 3), (4, 3)]);
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        let mut data = dataset(
            "en",
            &[
                ("dog", "wolf", 0.8),
                ("dog", "unknown", 0.1),
                ("car", "automobile", 0.9),
                ("dog", "cat", 0.3),
            ],
        );

        let outcome = pair
            .train_universal_most_similar(
                &metric,
                &disambiguator,
                &mapper,
                &mut data,
                &harness(),
                None,
                10,
            )
            .unwrap();
        let TrainingOutcome::Trained(summary) = outcome else {
            panic!("expected a training pass");
        };
        assert_eq!(summary.stats.observed, 1);
        assert_eq!(summary.stats.skipped, 3);
        assert_eq!(metric.most_similar_calls(), 1);
        assert_eq!(pair.most_similar_normalizer().observation_count(), 1);
    }

    #[test]
    fn test_language_mismatch_fails_before_evaluation() {
        let metric = CountingMetric::new(Language::new("de").unwrap());
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        let mut data = dog_dataset();

        let result = pair.train_similarity(&metric, &mut data, &harness());
        assert!(matches!(
            result,
            Err(TrainingError::Config(ConfigError::LanguageMismatch { .. }))
        ));
        assert_eq!(metric.calls(), 0);
    }

    #[test]
    fn test_dog_wolf_fit_moves_toward_gold() {
        let metric = CountingMetric::new(en());
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        let mut data = dog_dataset();

        let outcome = pair.train_similarity(&metric, &mut data, &harness()).unwrap();
        let TrainingOutcome::Trained(summary) = outcome else {
            panic!("expected a training pass");
        };
        assert_eq!(summary.stats.observed, 2);
        assert!(summary.trained);

        let raw = metric.raw("dog", "wolf");
        let calibrated = pair.similarity_normalizer().apply(raw);
        assert!((calibrated - 0.8).abs() < (calibrated - 0.1).abs());
    }

    #[test]
    fn test_unresolved_records_are_skipped() {
        let metric = CountingMetric::new(en());
        let disambiguator = FixedDisambiguator::new(&[("dog", 1), ("wolf", 2)]);
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        let mut data = dataset("en", &[("dog", "wolf", 0.8), ("dog", "unknown", 0.1)]);

        let outcome = pair
            .train_most_similar(&metric, &disambiguator, &mut data, &harness(), None, 10)
            .unwrap();
        let TrainingOutcome::Trained(summary) = outcome else {
            panic!("expected a training pass");
        };
        assert_eq!(summary.stats.observed, 1);
        assert_eq!(summary.stats.skipped, 1);
        assert_eq!(pair.most_similar_normalizer().observation_count(), 1);
    }

    #[test]
    fn test_same_concept_is_skipped() {
        let metric = CountingMetric::new(en());
        let disambiguator = FixedDisambiguator::new(&[("car", 3), ("automobile", 3)]);
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        let mut data = dataset("en", &[("car", "automobile", 0.9)]);

        pair.train_most_similar(&metric, &disambiguator, &mut data, &harness(), None, 10)
            .unwrap();
        assert_eq!(pair.most_similar_normalizer().observation_count(), 0);
        assert_eq!(metric.most_similar_calls(), 0);
    }

    #[test]
    fn test_write_read_round_trip() {
        let metric = CountingMetric::new(en());
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Linear, NormalizerKind::Bypass);
        let mut data = dataset("en", &[("a", "b", 1.0), ("ab", "abc", 3.0), ("x", "xyz", 2.0)]);
        pair.train_similarity(&metric, &mut data, &harness()).unwrap();

        let storage = InMemoryStorage::new();
        pair.write(&storage, "local/test").unwrap();
        assert!(SrNormalizers::has_readable_normalizers(&storage, "local/test"));

        let mut restored = SrNormalizers::default();
        restored.read(&storage, "local/test").unwrap();
        for raw in [0.0, 0.2, 0.5, 0.9, 1.5] {
            let expected = pair.similarity_normalizer().apply(raw);
            let actual = restored.similarity_normalizer().apply(raw);
            assert!((expected - actual).abs() < 1e-9);
        }
        assert!(restored.most_similar_normalizer().is_bypass());
    }

    #[test]
    fn test_partial_files_are_not_readable() {
        let storage = InMemoryStorage::new();
        let pair = SrNormalizers::bypass();
        pair.write(&storage, "dir").unwrap();
        storage.delete(&scoped_key("dir", SIMILARITY_NORMALIZER)).unwrap();

        assert!(!SrNormalizers::has_readable_normalizers(&storage, "dir"));

        let mut target = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        assert!(target.read(&storage, "dir").is_err());
        // Failed read leaves both slots as they were
        assert_eq!(target.similarity_normalizer().kind(), NormalizerKind::Isotonic);
        assert_eq!(target.most_similar_normalizer().kind(), NormalizerKind::Rank);
    }

    #[test]
    fn test_untrained_files_are_not_readable() {
        let storage = InMemoryStorage::new();
        SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank)
            .write(&storage, "dir")
            .unwrap();
        assert!(!SrNormalizers::has_readable_normalizers(&storage, "dir"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_bypass() {
        let storage = InMemoryStorage::new();
        SrNormalizers::bypass().write(&storage, "dir").unwrap();
        storage
            .save(&scoped_key("dir", MOST_SIMILAR_NORMALIZER), b"garbage")
            .unwrap();

        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        assert!(!pair.load_or_bypass(&storage, "dir"));
        assert!(pair.similarity_normalizer().is_bypass());
        assert!(pair.most_similar_normalizer().is_bypass());
    }

    #[test]
    fn test_malformed_fit_is_not_readable() {
        let storage = InMemoryStorage::new();
        let rank = RankNormalizer::from_state(RankState {
            fit: Some(RankFit {
                intercept: 1.0,
                slope: -0.5,
                min: 0.0,
                max: 1.0,
            }),
        });
        storage
            .save(
                &scoped_key("dir", MOST_SIMILAR_NORMALIZER),
                &encode(&rank).unwrap(),
            )
            .unwrap();
        storage
            .save(
                &scoped_key("dir", SIMILARITY_NORMALIZER),
                br#"{"format": "sr-normalizer", "version": 1,
                     "state": {"type": "isotonic", "fit": {"breakpoints": [0.0, 1.0], "values": []}}}"#,
            )
            .unwrap();
        assert!(read_one(&storage, "dir", Role::MostSimilar)
            .unwrap()
            .is_trained());

        assert!(!SrNormalizers::has_readable_normalizers(&storage, "dir"));
        let mut pair = SrNormalizers::from_kinds(NormalizerKind::Isotonic, NormalizerKind::Rank);
        assert!(!pair.load_or_bypass(&storage, "dir"));
        assert!(pair.similarity_normalizer().is_bypass());
        assert_eq!(pair.similarity_normalizer().apply(0.5), 0.5);
    }

    #[test]
    fn test_clear_removes_both_files() {
        let storage = InMemoryStorage::new();
        SrNormalizers::bypass().write(&storage, "dir").unwrap();
        assert_eq!(storage.len(), 2);

        SrNormalizers::clear(&storage, "dir").unwrap();
        assert!(storage.is_empty());
        // Clearing again is fine
        SrNormalizers::clear(&storage, "dir").unwrap();
    }
}
