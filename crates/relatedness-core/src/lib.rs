//! # Relatedness Core
//!
//! Calibration of semantic-relatedness metrics against human-judged gold
//! standards.
//!
//! A relatedness metric produces raw scores on whatever scale its algorithm
//! happens to use. This crate trains normalizers that map those raw scores
//! (and most-similar rankings) onto the gold standard's scale, persists them,
//! and verifies they can be read back.
//!
//! ## Modules
//!
//! - [`training`] - Normalizer pairs, the parallel evaluation harness, and the orchestrator
//! - [`normalize`] - Normalizer trait, implementations, and persisted format
//! - [`dataset`] - Gold datasets and the TSV loader
//! - [`sr`] - Metric, disambiguator, and concept-mapper contracts
//! - [`reference`] - Built-in trigram collaborators over a concept catalog
//! - [`storage`] - Key-value storage for persisted normalizers
//! - [`config`] - TOML configuration and production constants
//! - [`lang`] - Language tags and language-scoped values
//! - [`error`] - Error types

pub mod config;
pub mod dataset;
pub mod error;
pub mod lang;
pub mod normalize;
pub mod reference;
pub mod sr;
pub mod storage;
pub mod training;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::TrainerConfig;
pub use error::{ConfigError, TrainingError};
pub use training::{MetricSelection, MetricTrainer, SrNormalizers, TrainingReport};
