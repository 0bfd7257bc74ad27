use super::catalog::ConceptCatalog;
use crate::error::MetricError;
use crate::lang::{LocalId, LocalString};
use crate::sr::Disambiguator;
use std::sync::Arc;

/// Resolves a phrase to the concept whose normalized title matches exactly.
///
/// Context is ignored.
pub struct TitleDisambiguator {
    catalog: Arc<ConceptCatalog>,
}

impl TitleDisambiguator {
    pub fn new(catalog: Arc<ConceptCatalog>) -> Self {
        Self { catalog }
    }
}

impl Disambiguator for TitleDisambiguator {
    fn resolve_top(
        &self,
        phrases: &[LocalString],
        _context: Option<&[LocalString]>,
    ) -> Result<Vec<Option<LocalId>>, MetricError> {
        Ok(phrases
            .iter()
            .map(|phrase| {
                self.catalog
                    .by_title(&phrase.language, &phrase.text)
                    .map(|c| LocalId::new(c.language.clone(), c.local_id))
            })
            .collect())
    }
}
