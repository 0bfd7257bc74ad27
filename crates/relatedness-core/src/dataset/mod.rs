//! Gold standard datasets for normalizer training.
//!
//! A [`Dataset`] is an ordered list of human-judged phrase pairs
//! ([`KnownSim`]) for one language. Datasets are loaded once, before any
//! training pass, and then shared by every metric trained in the run. The
//! only mutation training performs is [`KnownSim::maybe_swap`], which flips
//! the pair's orientation so asymmetric metrics see both directions.
//!
//! # DatasetLoader Trait
//!
//! The [`DatasetLoader`] trait abstracts over where datasets come from;
//! [`TsvDatasetLoader`] reads the tab-separated format:
//!
//! ```text
//! # range 0 10
//! tiger	cat	7.35
//! book	paper	7.46
//! ```

mod tsv;

pub use tsv::TsvDatasetLoader;

use crate::error::DatasetError;
use crate::lang::Language;
use rand::Rng;

/// One human-judged phrase pair.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownSim {
    pub phrase1: String,
    pub phrase2: String,
    pub language: Language,
    /// Gold similarity on the dataset's own scale.
    pub similarity: f64,
}

impl KnownSim {
    pub fn new(
        phrase1: impl Into<String>,
        phrase2: impl Into<String>,
        similarity: f64,
        language: Language,
    ) -> Self {
        Self {
            phrase1: phrase1.into(),
            phrase2: phrase2.into(),
            language,
            similarity,
        }
    }

    /// Swaps the two phrases with probability one half.
    ///
    /// Gold similarity is symmetric and is left untouched. Returns whether a
    /// swap happened.
    pub fn maybe_swap<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let swap = rng.gen_bool(0.5);
        if swap {
            std::mem::swap(&mut self.phrase1, &mut self.phrase2);
        }
        swap
    }
}

/// An ordered collection of gold records for one language.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    language: Language,
    records: Vec<KnownSim>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, language: Language, records: Vec<KnownSim>) -> Self {
        Self {
            name: name.into(),
            language,
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn records(&self) -> &[KnownSim] {
        &self.records
    }

    /// Mutable access for the evaluation harness (in-place swaps only).
    pub fn records_mut(&mut self) -> &mut [KnownSim] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Source of gold datasets.
pub trait DatasetLoader {
    /// Loads the dataset `name` for `language`.
    fn load(&self, language: &Language, name: &str) -> Result<Dataset, DatasetError>;
}
