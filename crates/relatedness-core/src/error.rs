//! Error types for relatedness-core.
//!
//! This module defines error types that are used across the core library,
//! including configuration, metric, dataset, storage, normalizer persistence,
//! and training orchestration errors.
//!
//! Per-record conditions that training tolerates (an unresolved phrase, a
//! most-similar query without a result list) are NOT errors; they surface as
//! [`crate::training::EvalOutcome::Skipped`] instead.

use thiserror::Error;

/// Configuration errors. Always fatal, never retried.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Neither a local nor a universal metric was requested
    #[error("Must specify a metric to train (local and/or universal)")]
    NoMetricSelected,
    /// The flat (language, name) dataset catalog has an odd number of entries
    #[error("Datasets must be paired with a matching language (catalog has {0} entries)")]
    OddDatasetCatalog(usize),
    /// A dataset was requested by name but is not in the catalog
    #[error("Specified dataset {0} is not in the configuration file")]
    UnknownDataset(String),
    /// No metric with this name is configured or registered
    #[error("Unknown {family} metric: {name}")]
    UnknownMetric { family: String, name: String },
    /// No normalizer is registered under this key
    #[error("Unknown normalizer: {0}")]
    UnknownNormalizer(String),
    /// A metric entry does not name a normalizer for one of its roles
    #[error("Metric {metric} has no normalizer configured for {role}")]
    MissingNormalizer { metric: String, role: String },
    /// A single-language metric was trained against another language's dataset
    #[error("SR metric has language {metric} but dataset has language {dataset}")]
    LanguageMismatch { metric: String, dataset: String },
    /// Language code is empty or malformed
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),
    /// Configuration file could not be read or parsed
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by metrics, disambiguators, and concept mappers.
#[derive(Debug, Clone, Error)]
pub enum MetricError {
    /// The backing engine failed
    #[error("Metric backend failed: {0}")]
    Backend(String),
    /// A concept id is not known to the metric
    #[error("Unknown concept: {0}")]
    UnknownConcept(i64),
}

/// Errors that can occur while loading gold datasets or concept catalogs.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// IO error reading files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Missing required file
    #[error("Missing file: {0}")]
    MissingFile(String),
    /// Invalid data format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Gold value outside the range the dataset declares
    #[error("Gold similarity {value} outside declared range [{min}, {max}] at line {line}")]
    OutOfRange {
        value: f64,
        min: f64,
        max: f64,
        line: usize,
    },
}

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
}

/// Errors that can occur while encoding, decoding, or persisting normalizers.
#[derive(Debug, Error)]
pub enum NormalizerError {
    /// Underlying storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Normalizer state could not be encoded
    #[error("Failed to encode normalizer: {0}")]
    Encode(String),
    /// Normalizer bytes could not be decoded
    #[error("Failed to decode normalizer: {0}")]
    Decode(String),
    /// Bytes carry a format tag other than ours
    #[error("Unsupported normalizer format: {0}")]
    UnsupportedFormat(String),
    /// Bytes carry a version this build cannot read
    #[error("Unsupported normalizer version: {0}")]
    UnsupportedVersion(u32),
}

/// Errors that abort a training pass or a whole training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metric(#[from] MetricError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Normalizer(#[from] NormalizerError),
    /// The evaluation worker pool could not be built
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
    /// Freshly written normalizers could not be read back
    #[error("Round-trip verification failed for {dir}: {reason}")]
    RoundTrip { dir: String, reason: String },
}

// Conversion implementations for error chaining

impl From<StorageError> for TrainingError {
    fn from(err: StorageError) -> Self {
        TrainingError::Normalizer(NormalizerError::Storage(err))
    }
}
