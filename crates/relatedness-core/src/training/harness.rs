//! Chunked parallel evaluation over gold dataset records.
//!
//! Records are split into fixed-size chunks that are scheduled on a bounded
//! rayon pool. Every record is visited exactly once, in no particular order.
//! The first error returned by an evaluation stops further chunks from being
//! scheduled and is returned once in-flight chunks drain; observations made
//! before that point are not rolled back.
//!
//! There is no per-call timeout. A collaborator that never returns stalls the
//! whole pass.

use crate::config::{NormalizerSection, DEFAULT_CHUNK_SIZE};
use crate::dataset::KnownSim;
use crate::error::TrainingError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Why a record contributed no observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Disambiguation left at least one phrase unresolved.
    Unresolved,
    /// Both phrases resolved to the same concept.
    SameConcept,
    /// A resolved local concept has no cross-lingual counterpart.
    Unmapped,
    /// The most-similar query produced no list.
    NoResultList,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unresolved => "unresolved phrase",
            Self::SameConcept => "phrases resolve to one concept",
            Self::Unmapped => "no universal concept",
            Self::NoResultList => "no most-similar list",
        };
        f.write_str(text)
    }
}

/// Result of evaluating one record. Failures are `Err`, not a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    Observed,
    Skipped(SkipReason),
}

/// Counters for one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HarnessStats {
    pub records: usize,
    pub observed: usize,
    pub skipped: usize,
    pub elapsed_ms: u64,
}

/// Bounded worker pool applying an evaluation to every record of a dataset.
pub struct EvaluationHarness {
    pool: rayon::ThreadPool,
    chunk_size: usize,
    seed: u64,
}

impl EvaluationHarness {
    /// Builds a harness. `threads == 0` uses the available parallelism and
    /// `chunk_size == 0` falls back to [`DEFAULT_CHUNK_SIZE`].
    pub fn new(threads: usize, chunk_size: usize, seed: u64) -> Result<Self, TrainingError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sr-eval-{}", i))
            .build()
            .map_err(|e| TrainingError::WorkerPool(e.to_string()))?;
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            pool,
            chunk_size,
            seed,
        })
    }

    pub fn from_config(section: &NormalizerSection) -> Result<Self, TrainingError> {
        Self::new(section.threads, section.chunk_size, section.seed)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Visits every record once with `eval`.
    ///
    /// Each record gets its own RNG stream keyed by `(seed, index)`, so random
    /// decisions are reproducible no matter which worker picks the record up.
    pub fn run<F>(
        &self,
        label: &str,
        records: &mut [KnownSim],
        eval: F,
    ) -> Result<HarnessStats, TrainingError>
    where
        F: Fn(&mut KnownSim, &mut ChaCha8Rng) -> Result<EvalOutcome, TrainingError> + Sync,
    {
        let start = Instant::now();
        let observed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let chunk_size = self.chunk_size;
        let seed = self.seed;

        self.pool.install(|| {
            records
                .par_chunks_mut(chunk_size)
                .enumerate()
                .try_for_each(|(chunk_index, chunk)| {
                    for (offset, record) in chunk.iter_mut().enumerate() {
                        let index = chunk_index * chunk_size + offset;
                        let mut rng = ChaCha8Rng::seed_from_u64(seed);
                        rng.set_stream(index as u64);

                        match eval(record, &mut rng)? {
                            EvalOutcome::Observed => {
                                observed.fetch_add(1, Ordering::Relaxed);
                            }
                            EvalOutcome::Skipped(reason) => {
                                skipped.fetch_add(1, Ordering::Relaxed);
                                debug!("{}: skipped record {} ({})", label, index, reason);
                            }
                        }
                    }
                    Ok::<(), TrainingError>(())
                })
        })?;

        let stats = HarnessStats {
            records: records.len(),
            observed: observed.into_inner(),
            skipped: skipped.into_inner(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            "{}: {} records, {} observed, {} skipped in {}ms",
            label, stats.records, stats.observed, stats.skipped, stats.elapsed_ms
        );
        Ok(stats)
    }
}
