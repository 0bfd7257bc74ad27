//! Production configuration constants and the training configuration file.
//!
//! The constants define defaults used throughout the codebase and in tests to
//! ensure consistency. [`TrainerConfig`] is the TOML file that tells the
//! orchestrator which datasets exist, where normalizers live, and which
//! normalizer each metric wants.
//!
//! # Example
//!
//! ```toml
//! [dataset]
//! path = "data/gold"
//! names = ["en", "wordsim353.txt", "en", "MC.txt"]
//!
//! [normalizer]
//! directory = "data/normalizers"
//! default_max_results = 500
//!
//! [metric.local.trigram]
//! normalizer = "isotonic"
//! most_similar_normalizer = "rank"
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// Training Constants
// =============================================================================

/// Records per scheduled unit of work in the evaluation harness.
///
/// Large enough to amortize scheduling, small enough that one slow metric call
/// does not leave other workers idle at the end of a pass.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default bound on most-similar result lists during rank calibration.
pub const DEFAULT_MAX_RESULTS: usize = 500;

// =============================================================================
// Persistence Constants
// =============================================================================

/// Storage key of the scalar (pairwise similarity) normalizer.
pub const SIMILARITY_NORMALIZER: &str = "similarityNormalizer";

/// Storage key of the ranked (most-similar) normalizer.
pub const MOST_SIMILAR_NORMALIZER: &str = "mostSimilarNormalizer";

/// Format tag written at the head of every persisted normalizer.
pub const NORMALIZER_FORMAT: &str = "sr-normalizer";

/// Current persisted normalizer version. Other versions are rejected on read.
pub const NORMALIZER_FORMAT_VERSION: u32 = 1;

// =============================================================================
// Configuration File
// =============================================================================

/// Root of the training configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainerConfig {
    #[serde(default)]
    pub dataset: DatasetSection,
    #[serde(default)]
    pub normalizer: NormalizerSection,
    #[serde(default)]
    pub concepts: ConceptsSection,
    #[serde(default)]
    pub metric: MetricSection,
}

/// `[dataset]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetSection {
    /// Base directory dataset names are resolved against.
    #[serde(default)]
    pub path: PathBuf,
    /// Flat catalog of `language, name` pairs, in training order.
    #[serde(default)]
    pub names: Vec<String>,
}

/// `[normalizer]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerSection {
    /// Root directory persisted normalizer pairs are written under.
    #[serde(default = "default_normalizer_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Worker count for the evaluation harness (0 = available parallelism).
    #[serde(default)]
    pub threads: usize,
    /// Base seed for per-record swap decisions.
    #[serde(default)]
    pub seed: u64,
}

impl Default for NormalizerSection {
    fn default() -> Self {
        Self {
            directory: default_normalizer_dir(),
            default_max_results: DEFAULT_MAX_RESULTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: 0,
            seed: 0,
        }
    }
}

fn default_normalizer_dir() -> PathBuf {
    PathBuf::from("normalizers")
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// `[concepts]` section, used by the built-in reference collaborators.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConceptsSection {
    pub path: Option<PathBuf>,
}

/// `[metric.local.*]` and `[metric.universal.*]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricSection {
    #[serde(default)]
    pub local: BTreeMap<String, MetricEntry>,
    #[serde(default)]
    pub universal: BTreeMap<String, MetricEntry>,
}

/// Normalizer choice for one metric.
///
/// `normalizer` applies to both roles; the per-role keys override it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricEntry {
    pub normalizer: Option<String>,
    pub similarity_normalizer: Option<String>,
    pub most_similar_normalizer: Option<String>,
}

impl MetricEntry {
    /// Normalizer key for the scalar similarity role.
    pub fn similarity_key(&self) -> Option<&str> {
        self.similarity_normalizer
            .as_deref()
            .or(self.normalizer.as_deref())
    }

    /// Normalizer key for the ranked most-similar role.
    pub fn most_similar_key(&self) -> Option<&str> {
        self.most_similar_normalizer
            .as_deref()
            .or(self.normalizer.as_deref())
    }
}

impl TrainerConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reads and parses a configuration file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        if self.dataset.path.is_relative() {
            self.dataset.path = base.join(&self.dataset.path);
        }
        if self.normalizer.directory.is_relative() {
            self.normalizer.directory = base.join(&self.normalizer.directory);
        }
        if let Some(concepts) = self.concepts.path.as_mut() {
            if concepts.is_relative() {
                *concepts = base.join(&*concepts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [dataset]
        path = "gold"
        names = ["en", "wordsim353.txt", "de", "gur65.txt"]

        [normalizer]
        directory = "out"
        default_max_results = 50
        seed = 7

        [metric.local.trigram]
        normalizer = "isotonic"
        most_similar_normalizer = "rank"

        [metric.universal.trigram]
        normalizer = "percentile"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let config = TrainerConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.dataset.names.len(), 4);
        assert_eq!(config.normalizer.default_max_results, 50);
        assert_eq!(config.normalizer.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.normalizer.seed, 7);

        let local = &config.metric.local["trigram"];
        assert_eq!(local.similarity_key(), Some("isotonic"));
        assert_eq!(local.most_similar_key(), Some("rank"));

        let universal = &config.metric.universal["trigram"];
        assert_eq!(universal.similarity_key(), Some("percentile"));
        assert_eq!(universal.most_similar_key(), Some("percentile"));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = TrainerConfig::from_toml_str("").unwrap();
        assert!(config.dataset.names.is_empty());
        assert_eq!(config.normalizer.default_max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(config.normalizer.directory, PathBuf::from("normalizers"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TrainerConfig::from_toml_str("[dataset\nnames = 3");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_rebases_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sr-train.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = TrainerConfig::load(&path).unwrap();
        assert_eq!(config.dataset.path, dir.path().join("gold"));
        assert_eq!(config.normalizer.directory, dir.path().join("out"));
    }
}
