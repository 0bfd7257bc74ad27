use super::{Normalizer, NormalizerKind, NormalizerState};
use crate::sr::SrResultList;

/// The "do not calibrate" sentinel.
///
/// Always trained, ignores observations, applies as the identity. A pair
/// slot holding this normalizer is skipped by training.
#[derive(Debug, Default, Clone, Copy)]
pub struct BypassNormalizer;

impl BypassNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for BypassNormalizer {
    fn kind(&self) -> NormalizerKind {
        NormalizerKind::Bypass
    }

    fn reset(&self) {}

    fn observe(&self, _raw: f64, _gold: f64) {}

    fn observe_ranked(&self, _list: &SrResultList, _target: Option<usize>, _gold: f64) {}

    fn observations_finished(&self) {}

    fn is_trained(&self) -> bool {
        true
    }

    fn observation_count(&self) -> usize {
        0
    }

    fn apply(&self, raw: f64) -> f64 {
        raw
    }

    fn apply_list(&self, list: &SrResultList) -> SrResultList {
        list.clone()
    }

    fn dump(&self) -> String {
        "identity (bypass)".to_string()
    }

    fn state(&self) -> NormalizerState {
        NormalizerState::Bypass
    }

    fn is_bypass(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypass_ignores_observations() {
        let bypass = BypassNormalizer::new();
        bypass.observe(0.3, 9.0);
        bypass.observations_finished();

        assert!(bypass.is_trained());
        assert!(bypass.is_bypass());
        assert_eq!(bypass.observation_count(), 0);
        assert_eq!(bypass.apply(0.3), 0.3);
    }
}
