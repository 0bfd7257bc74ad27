//! Built-in collaborators backed by a concept catalog.
//!
//! These give the trainer something runnable without an external relatedness
//! engine: titles are matched exactly for disambiguation, and relatedness is
//! character-trigram overlap of titles.
//!
//! | Contract            | Implementation              | Registry key |
//! |---------------------|-----------------------------|--------------|
//! | `ConceptMapper`     | [`ConceptCatalog`]          |              |
//! | `Disambiguator`     | [`TitleDisambiguator`]      |              |
//! | `MonolingualMetric` | [`TrigramMetric`]           | `trigram`    |
//! | `UniversalMetric`   | [`UniversalTrigramMetric`]  | `trigram`    |

mod catalog;
mod disambig;
mod trigram;

pub use catalog::{normalize_title, Concept, ConceptCatalog};
pub use disambig::TitleDisambiguator;
pub use trigram::{dice, trigrams, TrigramMetric, UniversalTrigramMetric};

use crate::sr::{MonolingualMetric, UniversalMetric};
use crate::training::MetricRegistry;
use std::sync::Arc;

/// Registry key of the built-in trigram metrics.
pub const TRIGRAM: &str = "trigram";

/// A registry holding the built-in metrics over `catalog`.
pub fn builtin_registry(catalog: Arc<ConceptCatalog>) -> MetricRegistry {
    let mut registry = MetricRegistry::new(
        Arc::new(TitleDisambiguator::new(Arc::clone(&catalog))),
        Arc::clone(&catalog) as Arc<dyn crate::sr::ConceptMapper>,
    );

    let local_catalog = Arc::clone(&catalog);
    registry.register_local(TRIGRAM, move |language| {
        Ok(Arc::new(TrigramMetric::new(language.clone(), Arc::clone(&local_catalog)))
            as Arc<dyn MonolingualMetric>)
    });

    let universal = Arc::new(UniversalTrigramMetric::new(&catalog));
    registry.register_universal(TRIGRAM, move || {
        Ok(Arc::clone(&universal) as Arc<dyn UniversalMetric>)
    });

    registry
}
