//! Training orchestrator.
//!
//! # Run order
//!
//! 1. Validate the selection (at least one metric) and the dataset catalog
//!    (even length, every requested name present). Nothing is loaded yet.
//! 2. Resolve metrics and their normalizer kinds from the registry and config.
//! 3. For each selected dataset, in catalog order:
//!    - universal metric: similarity pass, then most-similar pass
//!    - local metric: default pair (both passes), then the dataset
//!      language's pair (both passes)
//! 4. Write every pair, read it back into a fresh pair, and compare. Any
//!    failure here aborts the run.
//!
//! The orchestrator itself is single-threaded; parallelism lives in the
//! [`EvaluationHarness`].

use super::harness::EvaluationHarness;
use super::normalizers::{SrNormalizers, TrainingOutcome};
use super::registry::MetricRegistry;
use super::report::{DatasetReport, PairReport, TrainingReport};
use crate::config::{MetricEntry, TrainerConfig};
use crate::dataset::{DatasetLoader, TsvDatasetLoader};
use crate::error::{ConfigError, TrainingError};
use crate::lang::Language;
use crate::normalize::{Normalizer, NormalizerKind};
use crate::reference::{builtin_registry, ConceptCatalog};
use crate::sr::{MonolingualMetric, UniversalMetric};
use crate::storage::{NativeStorage, StorageBackend};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// What to train in one run.
#[derive(Debug, Clone, Default)]
pub struct MetricSelection {
    /// Single-language metric name.
    pub local: Option<String>,
    /// Cross-lingual metric name.
    pub universal: Option<String>,
    /// Dataset names to train on; empty means the whole catalog.
    pub datasets: Vec<String>,
    /// Bound on most-similar list length; config default when `None`.
    pub max_results: Option<usize>,
}

/// Normalizer kinds for both roles of one metric.
#[derive(Debug, Clone, Copy)]
struct RoleKinds {
    similarity: NormalizerKind,
    most_similar: NormalizerKind,
}

impl RoleKinds {
    fn fresh_pair(&self) -> SrNormalizers {
        SrNormalizers::from_kinds(self.similarity, self.most_similar)
    }
}

struct UniversalBinding {
    name: String,
    metric: Arc<dyn UniversalMetric>,
    pair: SrNormalizers,
}

struct LocalBinding {
    name: String,
    kinds: RoleKinds,
    default_pair: SrNormalizers,
    /// Per-language metric instance and pair, created on first use.
    languages: BTreeMap<Language, (Arc<dyn MonolingualMetric>, SrNormalizers)>,
}

pub struct MetricTrainer {
    config: TrainerConfig,
    registry: MetricRegistry,
    loader: Box<dyn DatasetLoader>,
    storage: Arc<dyn StorageBackend>,
}

impl MetricTrainer {
    pub fn new(
        config: TrainerConfig,
        registry: MetricRegistry,
        loader: Box<dyn DatasetLoader>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            config,
            registry,
            loader,
            storage,
        }
    }

    /// Builds a trainer over the built-in collaborators, TSV datasets under
    /// `dataset.path`, and normalizer files under `normalizer.directory`.
    pub fn from_config(config: TrainerConfig) -> Result<Self, TrainingError> {
        let catalog = match &config.concepts.path {
            Some(path) => ConceptCatalog::load(path)?,
            None => {
                warn!("No concept catalog configured; most-similar training will skip every record");
                ConceptCatalog::default()
            }
        };
        let registry = builtin_registry(Arc::new(catalog));
        let loader = Box::new(TsvDatasetLoader::new(&config.dataset.path));
        let storage = Arc::new(NativeStorage::with_path(&config.normalizer.directory)?);
        Ok(Self::new(config, registry, loader, storage))
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    /// Trains, persists and verifies everything `selection` names.
    pub fn run(&self, selection: &MetricSelection) -> Result<TrainingReport, TrainingError> {
        if selection.local.is_none() && selection.universal.is_none() {
            return Err(ConfigError::NoMetricSelected.into());
        }
        let datasets = self.resolve_datasets(&selection.datasets)?;

        let mut universal = match &selection.universal {
            Some(name) => Some(UniversalBinding {
                name: name.clone(),
                metric: self.registry.universal_metric(name)?,
                pair: self
                    .role_kinds("universal", name, self.config.metric.universal.get(name))?
                    .fresh_pair(),
            }),
            None => None,
        };
        let mut local = match &selection.local {
            Some(name) => {
                if !self.registry.has_local(name) {
                    return Err(ConfigError::UnknownMetric {
                        family: "local".to_string(),
                        name: name.clone(),
                    }
                    .into());
                }
                let kinds = self.role_kinds("local", name, self.config.metric.local.get(name))?;
                Some(LocalBinding {
                    name: name.clone(),
                    kinds,
                    default_pair: kinds.fresh_pair(),
                    languages: BTreeMap::new(),
                })
            }
            None => None,
        };

        let harness = EvaluationHarness::from_config(&self.config.normalizer)?;
        let max_results = selection
            .max_results
            .unwrap_or(self.config.normalizer.default_max_results);
        let mut report = TrainingReport::default();

        for (language, name) in &datasets {
            let mut dataset = self.loader.load(language, name)?;
            info!(
                "Training on {} ({}, {} records)",
                name,
                language,
                dataset.len()
            );
            report.datasets.push(DatasetReport {
                name: name.clone(),
                language: language.to_string(),
                records: dataset.len(),
            });

            if let Some(binding) = universal.as_mut() {
                let metric = binding.metric.as_ref();
                let outcomes = [
                    binding
                        .pair
                        .train_universal_similarity(metric, &mut dataset, &harness)?,
                    binding.pair.train_universal_most_similar(
                        metric,
                        self.registry.disambiguator(),
                        self.registry.mapper(),
                        &mut dataset,
                        &harness,
                        None,
                        max_results,
                    )?,
                ];
                collect_passes(&mut report, outcomes);
            }

            if let Some(binding) = local.as_mut() {
                if !binding.languages.contains_key(language) {
                    let metric = self.registry.local_metric(&binding.name, language)?;
                    binding
                        .languages
                        .insert(language.clone(), (metric, binding.kinds.fresh_pair()));
                }
                let Some((metric, language_pair)) = binding.languages.get_mut(language) else {
                    continue;
                };
                let metric = metric.as_ref();

                for pair in [&mut binding.default_pair, language_pair] {
                    let outcomes = [
                        pair.train_similarity(metric, &mut dataset, &harness)?,
                        pair.train_most_similar(
                            metric,
                            self.registry.disambiguator(),
                            &mut dataset,
                            &harness,
                            None,
                            max_results,
                        )?,
                    ];
                    collect_passes(&mut report, outcomes);
                }
            }
        }

        if let Some(binding) = &universal {
            let dir = format!("universal/{}", binding.name);
            self.persist(&binding.pair, &dir)?;
            report.pairs.push(PairReport::new(
                &binding.name,
                "universal",
                "universal",
                &dir,
                &binding.pair,
            ));
        }
        if let Some(binding) = &local {
            let dir = format!("local/{}/default", binding.name);
            self.persist(&binding.default_pair, &dir)?;
            report.pairs.push(PairReport::new(
                &binding.name,
                "local",
                "default",
                &dir,
                &binding.default_pair,
            ));

            for (language, (_, pair)) in &binding.languages {
                let dir = format!("local/{}/{}", binding.name, language);
                self.persist(pair, &dir)?;
                report.pairs.push(PairReport::new(
                    &binding.name,
                    "local",
                    language.code(),
                    &dir,
                    pair,
                ));
            }
        }

        info!(
            "Training complete: {} datasets, {} passes, {} observations, {} pairs written",
            report.datasets.len(),
            report.trained_passes(),
            report.total_observations(),
            report.pairs.len()
        );
        Ok(report)
    }

    /// Checks the flat `(language, name)` catalog and picks the datasets to
    /// train on, in catalog order.
    fn resolve_datasets(&self, requested: &[String]) -> Result<Vec<(Language, String)>, TrainingError> {
        let names = &self.config.dataset.names;
        if names.len() % 2 != 0 {
            return Err(ConfigError::OddDatasetCatalog(names.len()).into());
        }
        let catalog = names
            .chunks_exact(2)
            .map(|pair| -> Result<(Language, String), ConfigError> {
                Ok((Language::new(&pair[0])?, pair[1].clone()))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if let Some(missing) = requested
            .iter()
            .find(|name| !catalog.iter().any(|(_, known)| known == *name))
        {
            return Err(ConfigError::UnknownDataset(missing.clone()).into());
        }
        if requested.is_empty() {
            return Ok(catalog);
        }
        Ok(catalog
            .into_iter()
            .filter(|(_, name)| requested.contains(name))
            .collect())
    }

    fn role_kinds(
        &self,
        family: &str,
        name: &str,
        entry: Option<&MetricEntry>,
    ) -> Result<RoleKinds, ConfigError> {
        let entry = entry.ok_or_else(|| ConfigError::UnknownMetric {
            family: family.to_string(),
            name: name.to_string(),
        })?;
        let kind = |key: Option<&str>, role: &str| {
            key.ok_or_else(|| ConfigError::MissingNormalizer {
                metric: name.to_string(),
                role: role.to_string(),
            })
            .and_then(NormalizerKind::from_key)
        };
        Ok(RoleKinds {
            similarity: kind(entry.similarity_key(), "similarity")?,
            most_similar: kind(entry.most_similar_key(), "most_similar")?,
        })
    }

    /// Writes a pair, then proves it can be read back unchanged.
    fn persist(&self, pair: &SrNormalizers, dir: &str) -> Result<(), TrainingError> {
        pair.write(self.storage.as_ref(), dir)?;

        let mut reloaded = SrNormalizers::bypass();
        reloaded
            .read(self.storage.as_ref(), dir)
            .map_err(|e| TrainingError::RoundTrip {
                dir: dir.to_string(),
                reason: e.to_string(),
            })?;

        for (name, before, after) in [
            (
                "similarity",
                pair.similarity_normalizer(),
                reloaded.similarity_normalizer(),
            ),
            (
                "most-similar",
                pair.most_similar_normalizer(),
                reloaded.most_similar_normalizer(),
            ),
        ] {
            if !agrees(before.as_ref(), after.as_ref()) {
                return Err(TrainingError::RoundTrip {
                    dir: dir.to_string(),
                    reason: format!("{} normalizer changed after reload", name),
                });
            }
        }
        info!("Wrote and verified normalizers in {}", dir);
        Ok(())
    }
}

fn collect_passes<const N: usize>(report: &mut TrainingReport, outcomes: [TrainingOutcome; N]) {
    for outcome in outcomes {
        if let TrainingOutcome::Trained(summary) = outcome {
            report.passes.push(summary);
        }
    }
}

const SAMPLE_POINTS: [f64; 12] = [
    -1.0,
    0.0,
    0.1,
    0.25,
    0.5,
    0.75,
    0.9,
    1.0,
    2.0,
    10.0,
    100.0,
    f64::NAN,
];

/// Same kind, same trained flag, same outputs on a fixed set of sample points.
fn agrees(before: &dyn Normalizer, after: &dyn Normalizer) -> bool {
    before.kind() == after.kind()
        && before.is_trained() == after.is_trained()
        && SAMPLE_POINTS.iter().all(|&raw| {
            let (a, b) = (before.apply(raw), after.apply(raw));
            (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-9 * (1.0 + a.abs())
        })
}
