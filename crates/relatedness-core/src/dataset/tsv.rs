//! Tab-separated gold dataset loader.
//!
//! # Data Format
//!
//! One record per line: `phrase1 \t phrase2 \t similarity`. Blank lines and
//! lines starting with `#` are skipped, except for an optional range
//! directive that declares the dataset's gold scale:
//!
//! ```text
//! # range 0 10
//! ```
//!
//! When a range is declared every gold value after it must fall inside it.

use super::{Dataset, DatasetLoader, KnownSim};
use crate::error::DatasetError;
use crate::lang::Language;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads datasets from `base_dir/<name>`.
#[derive(Debug, Clone)]
pub struct TsvDatasetLoader {
    base_dir: PathBuf,
}

impl TsvDatasetLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl DatasetLoader for TsvDatasetLoader {
    fn load(&self, language: &Language, name: &str) -> Result<Dataset, DatasetError> {
        let path = self.base_dir.join(name);
        if !path.exists() {
            return Err(DatasetError::MissingFile(path.display().to_string()));
        }
        let dataset = load_tsv(&path, name, language)?;
        debug!(
            "Loaded dataset {} ({}): {} records",
            name,
            language,
            dataset.len()
        );
        Ok(dataset)
    }
}

/// Parses one TSV dataset file.
pub fn load_tsv(path: &Path, name: &str, language: &Language) -> Result<Dataset, DatasetError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut declared: Option<(f64, f64)> = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some(range) = parse_range_directive(comment, line_num + 1)? {
                declared = Some(range);
            }
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(DatasetError::InvalidFormat(format!(
                "Line {}: expected 3 tab-separated fields, got {}",
                line_num + 1,
                parts.len()
            )));
        }

        let similarity: f64 = parts[2].trim().parse().map_err(|_| {
            DatasetError::InvalidFormat(format!(
                "Line {}: invalid similarity value '{}'",
                line_num + 1,
                parts[2]
            ))
        })?;
        if !similarity.is_finite() {
            return Err(DatasetError::InvalidFormat(format!(
                "Line {}: similarity must be finite",
                line_num + 1
            )));
        }
        if let Some((min, max)) = declared {
            if similarity < min || similarity > max {
                return Err(DatasetError::OutOfRange {
                    value: similarity,
                    min,
                    max,
                    line: line_num + 1,
                });
            }
        }

        records.push(KnownSim::new(
            parts[0].trim(),
            parts[1].trim(),
            similarity,
            language.clone(),
        ));
    }

    Ok(Dataset::new(name, language.clone(), records))
}

/// Parses `range <min> <max>` from a comment body; other comments yield `None`.
fn parse_range_directive(comment: &str, line: usize) -> Result<Option<(f64, f64)>, DatasetError> {
    let mut words = comment.split_whitespace();
    if words.next() != Some("range") {
        return Ok(None);
    }
    let bounds: Vec<f64> = words
        .map(|w| w.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| DatasetError::InvalidFormat(format!("Line {}: invalid range directive", line)))?;
    match bounds.as_slice() {
        [min, max] if min < max => Ok(Some((*min, *max))),
        _ => Err(DatasetError::InvalidFormat(format!(
            "Line {}: range directive needs <min> <max> with min < max",
            line
        ))),
    }
}
