//! Relatedness results and the collaborator contracts training depends on.
//!
//! ## Core Traits
//!
//! - [`MonolingualMetric`] - Relatedness engine bound to one language
//! - [`UniversalMetric`] - Relatedness engine over cross-lingual concepts
//! - [`Disambiguator`] - Resolves free-text phrases to concept ids
//! - [`ConceptMapper`] - Maps language-local concept ids to universal ids
//!
//! ## Result Types
//!
//! - [`SrResult`] - One pairwise relatedness judgment
//! - [`SrResultList`] - Ranked most-similar concepts

mod traits;
mod types;

pub use traits::{ConceptMapper, Disambiguator, MonolingualMetric, UniversalMetric};
pub use types::{Explanation, SrResult, SrResultList};
