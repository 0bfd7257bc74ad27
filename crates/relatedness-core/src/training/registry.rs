use crate::error::{ConfigError, MetricError, TrainingError};
use crate::lang::Language;
use crate::sr::{ConceptMapper, Disambiguator, MonolingualMetric, UniversalMetric};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type LocalMetricFactory =
    Box<dyn Fn(&Language) -> Result<Arc<dyn MonolingualMetric>, MetricError> + Send + Sync>;
pub type UniversalMetricFactory =
    Box<dyn Fn() -> Result<Arc<dyn UniversalMetric>, MetricError> + Send + Sync>;

/// Compile-time map from metric names to constructors, plus the shared
/// collaborators most-similar training needs.
///
/// Local metrics are built once per language because each instance is bound
/// to a single language.
pub struct MetricRegistry {
    local: BTreeMap<String, LocalMetricFactory>,
    universal: BTreeMap<String, UniversalMetricFactory>,
    disambiguator: Arc<dyn Disambiguator>,
    mapper: Arc<dyn ConceptMapper>,
}

impl MetricRegistry {
    pub fn new(disambiguator: Arc<dyn Disambiguator>, mapper: Arc<dyn ConceptMapper>) -> Self {
        Self {
            local: BTreeMap::new(),
            universal: BTreeMap::new(),
            disambiguator,
            mapper,
        }
    }

    pub fn register_local<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Language) -> Result<Arc<dyn MonolingualMetric>, MetricError> + Send + Sync + 'static,
    {
        self.local.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_universal<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Result<Arc<dyn UniversalMetric>, MetricError> + Send + Sync + 'static,
    {
        self.universal.insert(name.to_string(), Box::new(factory));
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.local.contains_key(name)
    }

    pub fn has_universal(&self, name: &str) -> bool {
        self.universal.contains_key(name)
    }

    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.local.keys().map(String::as_str)
    }

    pub fn universal_names(&self) -> impl Iterator<Item = &str> {
        self.universal.keys().map(String::as_str)
    }

    pub fn local_metric(
        &self,
        name: &str,
        language: &Language,
    ) -> Result<Arc<dyn MonolingualMetric>, TrainingError> {
        let factory = self.local.get(name).ok_or_else(|| ConfigError::UnknownMetric {
            family: "local".to_string(),
            name: name.to_string(),
        })?;
        Ok(factory(language)?)
    }

    pub fn universal_metric(&self, name: &str) -> Result<Arc<dyn UniversalMetric>, TrainingError> {
        let factory = self
            .universal
            .get(name)
            .ok_or_else(|| ConfigError::UnknownMetric {
                family: "universal".to_string(),
                name: name.to_string(),
            })?;
        Ok(factory()?)
    }

    pub fn disambiguator(&self) -> &dyn Disambiguator {
        self.disambiguator.as_ref()
    }

    pub fn mapper(&self) -> &dyn ConceptMapper {
        self.mapper.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ConceptCatalog;
    use crate::test_utils::{en, CountingMetric, FixedDisambiguator};

    fn registry() -> MetricRegistry {
        let mut registry = MetricRegistry::new(
            Arc::new(FixedDisambiguator::new(&[])),
            Arc::new(ConceptCatalog::default()),
        );
        registry.register_local("counting", |lang| {
            Ok(Arc::new(CountingMetric::new(lang.clone())) as Arc<dyn MonolingualMetric>)
        });
        registry
    }

    #[test]
    fn test_local_metric_is_bound_to_language() {
        let metric = registry().local_metric("counting", &en()).unwrap();
        assert_eq!(metric.language(), &en());
    }

    #[test]
    fn test_unknown_metric_names_family() {
        let registry = registry();
        assert!(matches!(
            registry.local_metric("esa", &en()),
            Err(TrainingError::Config(ConfigError::UnknownMetric { family, .. })) if family == "local"
        ));
        assert!(matches!(
            registry.universal_metric("counting"),
            Err(TrainingError::Config(ConfigError::UnknownMetric { family, .. })) if family == "universal"
        ));
        assert_eq!(registry.local_names().collect::<Vec<_>>(), vec!["counting"]);
    }
}
