//! Escalation over spans and over sizes.
//!
//! [`Solver::solve`] tests spans `floor(k), floor(k) + 1, ...` until one is feasible; every
//! smaller span was searched exhaustively first, so the first success is the minimum.
//! [`Solver::solve_range`] walks `k` upwards and records each proven minimum in the
//! lower-bound table before the next size starts, so later searches prune harder.

use crate::bounds::LowerBoundTable;
use crate::coordinator::{Coordinator, CoordinatorMode, SearchConfig};
use crate::diffs::{DEFAULT_GAMMA, MAX_SPAN};
use crate::error::SearchError;
use crate::greedy::{best_of, greedy_sequence};
use crate::sequence::format_sequence;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One tested span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanAttempt {
    /// Span tested.
    pub span: u32,
    /// Whether a witness was found.
    pub feasible: bool,
    /// Search nodes visited.
    pub nodes: u64,
    /// Wall-clock time of the attempt.
    pub elapsed: Duration,
}

/// Minimal span for one size, with its certificate.
#[derive(Clone, Debug)]
pub struct SpanRecord {
    /// Number of elements.
    pub k: usize,
    /// Minimal span \(G^-(\gamma, k)\).
    pub span: u32,
    /// A sequence achieving `span`.
    pub witness: Vec<u32>,
    /// Span of the greedy upper bound used to seed the search.
    pub upper_bound: u32,
    /// Every span tested, in order (escalation mode only).
    pub attempts: Vec<SpanAttempt>,
    /// Total wall-clock time.
    pub elapsed: Duration,
}

impl fmt::Display for SpanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = if self.k < 10 { "  " } else { " " };
        write!(
            f,
            "| {}{pad}| {:<7} | {} ({:.2}s)",
            self.k,
            self.span,
            format_sequence(&self.witness),
            self.elapsed.as_secs_f64()
        )
    }
}

// ============================================================================
// Solver
// ============================================================================

/// Computes \(G^-(G, k)\) for increasing `k`, owning the lower-bound table between sizes.
#[derive(Debug)]
pub struct Solver<const G: usize = DEFAULT_GAMMA> {
    config: SearchConfig,
    table: LowerBoundTable,
    coordinator: Coordinator,
    rng: SmallRng,
}

impl<const G: usize> Solver<G> {
    /// Creates a solver starting from the trivial lower-bound table.
    ///
    /// # Errors
    /// Returns an error if the worker pool cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        Self::with_table(config, LowerBoundTable::trivial(G))
    }

    /// Creates a solver with a caller-provided table.
    ///
    /// # Errors
    /// Returns an error if the table was built for a different `gamma` or the worker pool
    /// cannot be built.
    pub fn with_table(config: SearchConfig, table: LowerBoundTable) -> Result<Self, SearchError> {
        if table.gamma() != G {
            return Err(SearchError::GammaMismatch {
                table: table.gamma(),
                expected: G,
            });
        }
        if table.has_unproven_entries() {
            warn!(
                max_known = table.max_known(),
                "using seeded lower bounds; results are only as sound as the seeds"
            );
        }
        let coordinator = Coordinator::new(config.workers)?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Ok(Self {
            config,
            table,
            coordinator,
            rng,
        })
    }

    /// The current lower-bound table.
    pub fn table(&self) -> &LowerBoundTable {
        &self.table
    }

    /// The configuration in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Computes the minimal span for `k` elements without updating the table.
    ///
    /// # Errors
    /// Returns an error for `k == 0`, for spans beyond the representable domain, or when
    /// escalation passes the greedy upper bound (a too-tight table).
    pub fn solve(&mut self, k: usize) -> Result<SpanRecord, SearchError> {
        if k == 0 {
            return Err(SearchError::InvalidSize { k });
        }
        let start = Instant::now();
        let upper = if self.config.greedy_trials > 0 {
            best_of(&mut self.rng, k, G, self.config.greedy_trials)
        } else {
            greedy_sequence(k, G)
        };
        let upper_bound = upper[k - 1];
        info!(k, upper_bound, floor = self.table.floor(k), "solving");

        match self.config.mode {
            CoordinatorMode::FailFast => self.escalate(k, upper_bound, start),
            CoordinatorMode::Minimize => self.minimize(k, upper, start),
        }
    }

    fn escalate(&self, k: usize, upper_bound: u32, start: Instant) -> Result<SpanRecord, SearchError> {
        let floor = self.table.floor(k);
        if floor > MAX_SPAN {
            return Err(SearchError::DomainOverflow {
                span: floor,
                capacity: MAX_SPAN,
            });
        }

        if upper_bound > MAX_SPAN {
            warn!(
                k,
                upper_bound,
                capacity = MAX_SPAN,
                "greedy upper bound exceeds the representable span; escalation fails past the capacity"
            );
        }

        let mut attempts = Vec::new();
        for alpha in floor..=upper_bound {
            let t = Instant::now();
            let outcome = self.coordinator.try_span::<G>(&self.table, k, alpha)?;
            let elapsed = t.elapsed();
            attempts.push(SpanAttempt {
                span: alpha,
                feasible: outcome.witness.is_some(),
                nodes: outcome.nodes,
                elapsed,
            });

            if let Some(witness) = outcome.witness {
                info!(k, span = alpha, elapsed_s = elapsed.as_secs_f64(), "found");
                return Ok(SpanRecord {
                    k,
                    span: alpha,
                    witness,
                    upper_bound,
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            info!(
                k,
                span = alpha,
                nodes = outcome.nodes,
                elapsed_s = elapsed.as_secs_f64(),
                "no solution at this span"
            );
        }
        Err(SearchError::Exhausted {
            k,
            upper: upper_bound,
        })
    }

    fn minimize(&self, k: usize, upper: Vec<u32>, start: Instant) -> Result<SpanRecord, SearchError> {
        let upper_bound = upper[k - 1];
        let floor = self.config.early_exit.then(|| self.table.floor(k));
        let (span, witness, nodes) = self.coordinator.minimize::<G>(&self.table, k, upper, floor)?;
        if span < self.table.floor(k) {
            return Err(SearchError::NonMonotoneTable {
                index: k,
                value: span,
                previous: self.table.floor(k),
            });
        }
        let elapsed = start.elapsed();
        info!(k, span, nodes, elapsed_s = elapsed.as_secs_f64(), "minimized");
        Ok(SpanRecord {
            k,
            span,
            witness,
            upper_bound,
            attempts: vec![SpanAttempt {
                span,
                feasible: true,
                nodes,
                elapsed,
            }],
            elapsed,
        })
    }

    /// Computes the minimal span for `k` and records it in the table.
    ///
    /// # Errors
    /// Returns any error from [`Solver::solve`] or from recording the result.
    pub fn solve_and_learn(&mut self, k: usize) -> Result<SpanRecord, SearchError> {
        let record = self.solve(k)?;
        if k <= self.table.max_known() + 1 {
            self.table.record(k, record.span)?;
        }
        Ok(record)
    }

    /// Solves every size in `1..=k_max` in order, learning each result before the next.
    ///
    /// `on_record` is called as each size completes; records for sizes below `k_min` are
    /// computed (they tighten the table) but not reported.
    ///
    /// # Errors
    /// Stops at the first size that fails.
    pub fn solve_range<F>(
        &mut self,
        k_min: usize,
        k_max: usize,
        mut on_record: F,
    ) -> Result<Vec<SpanRecord>, SearchError>
    where
        F: FnMut(&SpanRecord),
    {
        let mut out = Vec::new();
        for k in 1..=k_max {
            let record = self.solve_and_learn(k)?;
            if k >= k_min {
                on_record(&record);
                out.push(record);
            }
        }
        Ok(out)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_witness;

    fn config(mode: CoordinatorMode) -> SearchConfig {
        SearchConfig {
            workers: 2,
            mode,
            greedy_trials: 8,
            seed: Some(1),
            early_exit: true,
        }
    }

    #[test]
    fn small_sizes_are_runs() {
        let mut solver = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        for k in 1..=4 {
            let r = solver.solve(k).unwrap();
            assert_eq!(r.span, k as u32 - 1);
            assert_eq!(r.witness, (0..k as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut solver = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        assert_eq!(solver.solve(0).unwrap_err(), SearchError::InvalidSize { k: 0 });
    }

    #[test]
    fn escalation_tries_every_span_from_the_floor() {
        let mut solver = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        let r = solver.solve(7).unwrap();
        assert_eq!(r.span, 10);
        let floor = solver.table().floor(7);
        let spans: Vec<u32> = r.attempts.iter().map(|a| a.span).collect();
        assert_eq!(spans, (floor..=10).collect::<Vec<_>>());
        let (last, earlier) = r.attempts.split_last().unwrap();
        assert!(last.feasible);
        assert!(earlier.iter().all(|a| !a.feasible));
        validate_witness(&r.witness, 3, 7, 10).unwrap();
    }

    #[test]
    fn solve_range_learns_the_table() {
        let mut solver = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        let mut seen = Vec::new();
        let records = solver.solve_range(5, 9, |r| seen.push(r.k)).unwrap();
        assert_eq!(seen, vec![5, 6, 7, 8, 9]);
        let spans: Vec<u32> = records.iter().map(|r| r.span).collect();
        assert_eq!(spans, vec![5, 7, 10, 13, 16]);
        for k in 1..=9 {
            assert!(solver.table().is_proven(k));
        }
        assert_eq!(solver.table().span_for(9), 16);
    }

    #[test]
    fn minimize_mode_agrees_with_escalation() {
        let mut a = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        let mut b = Solver::<3>::new(config(CoordinatorMode::Minimize)).unwrap();
        let ra = a.solve_range(1, 9, |_| {}).unwrap();
        let rb = b.solve_range(1, 9, |_| {}).unwrap();
        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.span, y.span, "k={}", x.k);
            validate_witness(&y.witness, 3, y.k, y.span).unwrap();
        }
    }

    #[test]
    fn seeded_table_gives_same_spans() {
        let table = LowerBoundTable::gamma3_seeded();
        let mut solver = Solver::<3>::with_table(config(CoordinatorMode::FailFast), table).unwrap();
        let spans: Vec<u32> = (5..=9).map(|k| solver.solve_and_learn(k).unwrap().span).collect();
        assert_eq!(spans, vec![5, 7, 10, 13, 16]);
    }

    #[test]
    fn overestimating_seed_exhausts_escalation() {
        // G(3, 5) = 5, so a seed of 6 starts escalation above the greedy bound.
        let table = LowerBoundTable::from_seeds(3, &[0, 0, 1, 2, 3, 6]).unwrap();
        let cfg = SearchConfig {
            greedy_trials: 0,
            ..config(CoordinatorMode::FailFast)
        };
        let mut solver = Solver::<3>::with_table(cfg, table).unwrap();
        assert_eq!(
            solver.solve(5).unwrap_err(),
            SearchError::Exhausted { k: 5, upper: 5 }
        );
    }

    #[test]
    fn table_for_another_gamma_is_rejected() {
        let err = Solver::<3>::with_table(config(CoordinatorMode::FailFast), LowerBoundTable::trivial(2))
            .unwrap_err();
        assert_eq!(err, SearchError::GammaMismatch { table: 2, expected: 3 });
    }

    #[test]
    fn minimize_without_early_exit_agrees_with_escalation() {
        let mut a = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        let mut b = Solver::<3>::new(SearchConfig {
            early_exit: false,
            ..config(CoordinatorMode::Minimize)
        })
        .unwrap();
        let ra = a.solve_range(1, 8, |_| {}).unwrap();
        let rb = b.solve_range(1, 8, |_| {}).unwrap();
        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.span, y.span, "k={}", x.k);
            validate_witness(&y.witness, 3, y.k, y.span).unwrap();
        }
    }

    #[test]
    fn record_formats_as_table_row() {
        let mut solver = Solver::<3>::new(config(CoordinatorMode::FailFast)).unwrap();
        let row = solver.solve(5).unwrap().to_string();
        assert!(row.starts_with("| 5  | 5       | [0,"), "{row}");
    }
}
