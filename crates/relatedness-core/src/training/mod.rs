//! Normalizer training: the evaluation harness, the per-metric normalizer
//! pair with its training protocol, and the orchestrator that drives both.

mod harness;
mod normalizers;
mod registry;
mod report;
mod trainer;

pub use harness::{EvalOutcome, EvaluationHarness, HarnessStats, SkipReason};
pub use normalizers::{PassSummary, Role, SrNormalizers, TrainingOutcome};
pub use registry::{LocalMetricFactory, MetricRegistry, UniversalMetricFactory};
pub use report::{DatasetReport, NormalizerReport, PairReport, TrainingReport};
pub use trainer::{MetricSelection, MetricTrainer};
