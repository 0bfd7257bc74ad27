//! Concept catalog backing the built-in collaborators.
//!
//! # Data Format
//!
//! One concept title per line, tab-separated:
//!
//! ```text
//! # universal_id  language  local_id  title
//! 100	en	1	Dog
//! 100	de	7	Hund
//! 101	en	2	Wolf
//! ```
//!
//! Several rows may share a universal id (one per language). A `(language,
//! local_id)` pair must be unique.

use crate::error::{DatasetError, MetricError};
use crate::lang::{Language, LocalId};
use crate::sr::ConceptMapper;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub universal_id: i64,
    pub language: Language,
    pub local_id: i64,
    pub title: String,
}

/// Lowercases and collapses non-alphanumeric runs into single spaces.
pub fn normalize_title(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Default)]
pub struct ConceptCatalog {
    concepts: Vec<Concept>,
    by_local: HashMap<(Language, i64), usize>,
    by_title: HashMap<(Language, String), usize>,
    by_universal: BTreeMap<i64, Vec<usize>>,
}

impl ConceptCatalog {
    /// Indexes concepts. Duplicate `(language, local_id)` pairs are rejected;
    /// for duplicate titles the first concept wins.
    pub fn from_concepts(concepts: Vec<Concept>) -> Result<Self, DatasetError> {
        let mut catalog = Self::default();
        for (index, concept) in concepts.iter().enumerate() {
            let local_key = (concept.language.clone(), concept.local_id);
            if catalog.by_local.insert(local_key, index).is_some() {
                return Err(DatasetError::InvalidFormat(format!(
                    "Duplicate concept {}:{}",
                    concept.language, concept.local_id
                )));
            }
            catalog
                .by_title
                .entry((concept.language.clone(), normalize_title(&concept.title)))
                .or_insert(index);
            catalog
                .by_universal
                .entry(concept.universal_id)
                .or_default()
                .push(index);
        }
        catalog.concepts = concepts;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::MissingFile(path.display().to_string()));
        }
        let reader = BufReader::new(File::open(path)?);
        let mut concepts = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 4 {
                return Err(DatasetError::InvalidFormat(format!(
                    "Line {}: expected 4 tab-separated fields, got {}",
                    line_num + 1,
                    parts.len()
                )));
            }
            let parse_id = |field: &str| {
                field.trim().parse::<i64>().map_err(|_| {
                    DatasetError::InvalidFormat(format!(
                        "Line {}: invalid id '{}'",
                        line_num + 1,
                        field
                    ))
                })
            };
            let language = Language::new(parts[1]).map_err(|e| {
                DatasetError::InvalidFormat(format!("Line {}: {}", line_num + 1, e))
            })?;
            concepts.push(Concept {
                universal_id: parse_id(parts[0])?,
                language,
                local_id: parse_id(parts[2])?,
                title: parts[3].trim().to_string(),
            });
        }

        let catalog = Self::from_concepts(concepts)?;
        debug!(
            "Loaded concept catalog {}: {} titles, {} universal concepts",
            path.display(),
            catalog.len(),
            catalog.universal_count()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn universal_count(&self) -> usize {
        self.by_universal.len()
    }

    pub fn local(&self, id: &LocalId) -> Option<&Concept> {
        self.by_local
            .get(&(id.language.clone(), id.id))
            .map(|&i| &self.concepts[i])
    }

    /// Looks up a concept by title, ignoring case and punctuation.
    pub fn by_title(&self, language: &Language, phrase: &str) -> Option<&Concept> {
        self.by_title
            .get(&(language.clone(), normalize_title(phrase)))
            .map(|&i| &self.concepts[i])
    }

    pub fn in_language<'a>(&'a self, language: &'a Language) -> impl Iterator<Item = &'a Concept> {
        self.concepts.iter().filter(move |c| &c.language == language)
    }

    /// Every language's title for one universal concept.
    pub fn universal(&self, universal_id: i64) -> impl Iterator<Item = &Concept> {
        self.by_universal
            .get(&universal_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.concepts[i])
    }

    /// Universal ids in ascending order.
    pub fn universal_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.by_universal.keys().copied()
    }
}

impl ConceptMapper for ConceptCatalog {
    fn universal_id(&self, local: &LocalId) -> Result<Option<i64>, MetricError> {
        Ok(self.local(local).map(|c| c.universal_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join("concepts.tsv");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_load_and_lookup() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(
            &dir,
            &["# header", "100\ten\t1\tDog", "100\tde\t7\tHund", "101\ten\t2\tGrey Wolf"],
        );
        let catalog = ConceptCatalog::load(&path).unwrap();
        let en = Language::new("en").unwrap();
        let de = Language::new("de").unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.universal_count(), 2);
        assert_eq!(catalog.by_title(&en, "grey-wolf").unwrap().local_id, 2);
        assert_eq!(catalog.universal(100).count(), 2);
        assert_eq!(catalog.in_language(&de).count(), 1);
        assert_eq!(
            catalog.universal_id(&LocalId::new(de, 7)).unwrap(),
            Some(100)
        );
        assert_eq!(catalog.universal_id(&LocalId::new(en, 99)).unwrap(), None);
    }

    #[test]
    fn test_duplicate_local_id_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, &["1\ten\t1\tA", "2\ten\t1\tB"]);
        assert!(matches!(
            ConceptCatalog::load(&path),
            Err(DatasetError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  New_York  City!"), "new york city");
        assert_eq!(normalize_title("---"), "");
    }
}
