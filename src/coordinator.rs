//! Parallel fan-out of one search over the second element of the sequence.
//!
//! Fixing `0` as the first element, every solution (or its reflection) has a second element
//! in `1..=alpha / 2`. Each such value seeds an independent sub-search with its own buffer
//! and masks; the only shared state is a found flag plus a single-assignment result slot
//! (fail-fast mode) or the best span (minimize mode).

use crate::backtrack::{Backtracker, BestSpan};
use crate::bounds::LowerBoundTable;
use crate::diffs::{dispatch_width, MAX_SPAN};
use crate::error::SearchError;
use crossbeam::channel;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

// ============================================================================
// Configuration
// ============================================================================

/// How partitions combine their results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinatorMode {
    /// Test one span at a time; the first partition to succeed stops the others.
    #[default]
    FailFast,
    /// Start from a greedy upper bound and lower a shared best span.
    Minimize,
}

/// Search configuration parameters.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// How partitions combine.
    pub mode: CoordinatorMode,
    /// Randomized greedy attempts used to tighten the initial upper bound.
    pub greedy_trials: usize,
    /// Optional deterministic seed for the randomized greedy.
    pub seed: Option<u64>,
    /// Stop minimizing once the best span reaches the table's floor for `k`.
    pub early_exit: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(4);

        Self {
            workers,
            mode: CoordinatorMode::FailFast,
            greedy_trials: 64,
            seed: None,
            early_exit: true,
        }
    }
}

/// Outcome of testing one span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanOutcome {
    /// The witness, if one exists at this span.
    pub witness: Option<Vec<u32>>,
    /// Search nodes visited across all partitions.
    pub nodes: u64,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Runs partitioned searches on a dedicated worker pool.
pub struct Coordinator {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Creates a pool with `workers` threads (at least one).
    ///
    /// # Errors
    /// Returns an error if the thread pool cannot be built.
    pub fn new(workers: usize) -> Result<Self, SearchError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("gamma-span-{i}"))
            .build()
            .map_err(|e| SearchError::ThreadPool(e.to_string()))?;
        Ok(Self { pool, workers })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Decides whether a `k`-element sequence with span exactly `alpha` exists.
    ///
    /// # Errors
    /// Returns an error for `k == 0` or when `alpha` exceeds the supported span.
    pub fn try_span<const G: usize>(
        &self,
        table: &LowerBoundTable,
        k: usize,
        alpha: u32,
    ) -> Result<SpanOutcome, SearchError> {
        if k == 0 {
            return Err(SearchError::InvalidSize { k });
        }
        if alpha > MAX_SPAN {
            return Err(SearchError::DomainOverflow {
                span: alpha,
                capacity: MAX_SPAN,
            });
        }
        // One or two elements never repeat a difference.
        match k {
            1 => {
                return Ok(SpanOutcome {
                    witness: (alpha == 0).then(|| vec![0]),
                    nodes: 0,
                })
            }
            2 => {
                return Ok(SpanOutcome {
                    witness: (alpha >= 1).then(|| vec![0, alpha]),
                    nodes: 0,
                })
            }
            _ => {}
        }
        dispatch_width!(alpha, W => Ok(self.fail_fast::<W, G>(table, k, alpha)))
    }

    fn fail_fast<const W: usize, const G: usize>(
        &self,
        table: &LowerBoundTable,
        k: usize,
        alpha: u32,
    ) -> SpanOutcome {
        let found = AtomicBool::new(false);
        let nodes = AtomicU64::new(0);
        let (tx, rx) = channel::bounded::<Vec<u32>>(1);

        // Second element restricted to the lower half; reflections cover the rest.
        let max_second = (alpha / 2).min(alpha.saturating_sub(table.extra_span(k - 2)));
        debug!(k, alpha, partitions = max_second, "fanning out");

        self.pool.install(|| {
            (1..max_second + 1)
                .into_par_iter()
                .with_max_len(1)
                .for_each(|second| {
                    if found.load(Ordering::Relaxed) {
                        return;
                    }
                    let mut bt = Backtracker::<W, G>::new(table, Some(&found));
                    let result = bt.complete(&[0, second], k, alpha);
                    nodes.fetch_add(bt.nodes(), Ordering::Relaxed);

                    if let Some(witness) = result {
                        if found
                            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                            .is_ok()
                        {
                            debug!(second, "partition found a witness");
                            let _ = tx.try_send(witness);
                        }
                    }
                });
        });

        SpanOutcome {
            witness: rx.try_recv().ok(),
            nodes: nodes.into_inner(),
        }
    }

    /// Finds the minimal span for `k` elements, starting from a valid `upper` witness.
    ///
    /// With `floor = Some(f)`, every partition stops once a span of `f` is reached.
    ///
    /// # Errors
    /// Returns an error for `k == 0` or when the upper witness exceeds the supported span.
    pub fn minimize<const G: usize>(
        &self,
        table: &LowerBoundTable,
        k: usize,
        upper: Vec<u32>,
        floor: Option<u32>,
    ) -> Result<(u32, Vec<u32>, u64), SearchError> {
        if k == 0 {
            return Err(SearchError::InvalidSize { k });
        }
        let span = upper.last().copied().unwrap_or(0);
        if span > MAX_SPAN {
            return Err(SearchError::DomainOverflow {
                span,
                capacity: MAX_SPAN,
            });
        }
        if k <= 2 {
            let witness = if k == 1 { vec![0] } else { vec![0, 1] };
            let span = witness[k - 1];
            return Ok((span, witness, 0));
        }
        dispatch_width!(span, W => Ok(self.minimize_in::<W, G>(table, k, upper, floor)))
    }

    fn minimize_in<const W: usize, const G: usize>(
        &self,
        table: &LowerBoundTable,
        k: usize,
        upper: Vec<u32>,
        floor: Option<u32>,
    ) -> (u32, Vec<u32>, u64) {
        let start = upper.last().copied().unwrap_or(0);
        let best = BestSpan::new(upper, floor.unwrap_or(0));
        let nodes = AtomicU64::new(0);
        debug!(k, upper = start, partitions = start / 2, "minimizing");

        if !best.is_done() {
            self.pool.install(|| {
                (1..start / 2 + 1)
                    .into_par_iter()
                    .with_max_len(1)
                    .for_each(|second| {
                        if best.is_done() || second >= best.span() {
                            return;
                        }
                        let mut bt = Backtracker::<W, G>::new(table, Some(best.done_flag()));
                        bt.minimize(&[0, second], k, &best);
                        nodes.fetch_add(bt.nodes(), Ordering::Relaxed);
                    });
            });
        }

        let (span, witness) = best.into_result();
        (span, witness, nodes.into_inner())
    }
}

// ============================================================================
// Tests
// ============================================================================
