use super::normalizers::{PassSummary, Role, SrNormalizers};
use crate::normalize::Normalizer;
use serde::Serialize;

/// What a training run did, for display or JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingReport {
    pub datasets: Vec<DatasetReport>,
    pub passes: Vec<PassSummary>,
    pub pairs: Vec<PairReport>,
}

impl TrainingReport {
    /// Number of passes that actually evaluated records.
    pub fn trained_passes(&self) -> usize {
        self.passes.len()
    }

    pub fn total_observations(&self) -> usize {
        self.passes.iter().map(|p| p.stats.observed).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub name: String,
    pub language: String,
    pub records: usize,
}

/// A persisted and verified normalizer pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub metric: String,
    pub family: String,
    /// `default`, a language code, or `universal`.
    pub scope: String,
    pub directory: String,
    pub similarity: NormalizerReport,
    pub most_similar: NormalizerReport,
}

impl PairReport {
    pub(crate) fn new(
        metric: &str,
        family: &str,
        scope: &str,
        directory: &str,
        pair: &SrNormalizers,
    ) -> Self {
        Self {
            metric: metric.to_string(),
            family: family.to_string(),
            scope: scope.to_string(),
            directory: directory.to_string(),
            similarity: NormalizerReport::new(pair.normalizer(Role::Similarity).as_ref()),
            most_similar: NormalizerReport::new(pair.normalizer(Role::MostSimilar).as_ref()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizerReport {
    pub kind: String,
    pub trained: bool,
    pub observations: usize,
    pub dump: String,
}

impl NormalizerReport {
    fn new(normalizer: &dyn Normalizer) -> Self {
        Self {
            kind: normalizer.kind().to_string(),
            trained: normalizer.is_trained(),
            observations: normalizer.observation_count(),
            dump: normalizer.dump(),
        }
    }
}
