//! Exact depth-first search for \(\gamma\)-bounded sequences of a given size.
//!
//! The search extends a prefix one element at a time, carrying the layered difference masks
//! by value down the call stack so that backtracking needs no explicit revert. Two bounds
//! from the [`LowerBoundTable`] prune each node:
//! - the current last element plus the extra span needed for the remaining elements must fit, and
//! - each candidate must leave room for the elements after it.
//!
//! [`Backtracker::complete`] answers the threshold question "is there a completion with span
//! exactly `alpha`?", while [`Backtracker::minimize`] lowers a shared best span.

use crate::bounds::LowerBoundTable;
use crate::diffs::{LayeredMasks, DEFAULT_GAMMA};
use crate::sequence::is_normalized;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

// ============================================================================
// Shared best span
// ============================================================================

/// Best span found so far in minimize mode, shared by every partition.
///
/// Reads go through an atomic mirror; writes compare and replace under the mutex so a
/// worse result can never overwrite a better one.
#[derive(Debug)]
pub struct BestSpan {
    span: AtomicU32,
    witness: Mutex<Vec<u32>>,
    floor: u32,
    done: AtomicBool,
}

impl BestSpan {
    /// Starts from a known valid `witness`; search stops early once a span reaches `floor`.
    pub fn new(witness: Vec<u32>, floor: u32) -> Self {
        let span = witness.last().copied().unwrap_or(0);
        Self {
            span: AtomicU32::new(span),
            witness: Mutex::new(witness),
            floor,
            done: AtomicBool::new(span <= floor),
        }
    }

    /// Current best span.
    #[inline(always)]
    pub fn span(&self) -> u32 {
        self.span.load(Ordering::Acquire)
    }

    /// Set once the best span equals the floor.
    pub fn done_flag(&self) -> &AtomicBool {
        &self.done
    }

    /// Returns whether no better span can exist.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    /// Offers a complete sequence; keeps it iff its span beats the current best.
    pub fn offer(&self, sequence: &[u32]) -> bool {
        let Some(&span) = sequence.last() else {
            return false;
        };
        let mut witness = match self.witness.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if span >= self.span.load(Ordering::Acquire) {
            return false;
        }
        witness.clear();
        witness.extend_from_slice(sequence);
        self.span.store(span, Ordering::Release);
        if span <= self.floor {
            self.done.store(true, Ordering::Release);
        }
        true
    }

    /// Consumes the slot and returns `(span, witness)`.
    pub fn into_result(self) -> (u32, Vec<u32>) {
        let witness = match self.witness.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        (self.span.into_inner(), witness)
    }
}

// ============================================================================
// Backtracker
// ============================================================================

/// Depth-first search engine over sequences whose differences fit in `W` words.
///
/// Internally reuses one sequence buffer across calls.
#[derive(Debug)]
pub struct Backtracker<'a, const W: usize, const G: usize = DEFAULT_GAMMA> {
    table: &'a LowerBoundTable,
    abort: Option<&'a AtomicBool>,
    sequence: Vec<u32>,
    nodes: u64,
}

impl<'a, const W: usize, const G: usize> Backtracker<'a, W, G> {
    /// Creates a search engine that prunes with `table` and gives up once `abort` is set.
    pub fn new(table: &'a LowerBoundTable, abort: Option<&'a AtomicBool>) -> Self {
        debug_assert_eq!(table.gamma(), G, "table built for a different gamma");
        Self {
            table,
            abort,
            sequence: Vec::with_capacity(32),
            nodes: 0,
        }
    }

    /// Number of search nodes visited so far.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    #[inline(always)]
    fn aborted(&self) -> bool {
        self.abort.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Validates `prefix` and loads it into the buffer.
    fn load_prefix(&mut self, prefix: &[u32]) -> Option<LayeredMasks<W, G>> {
        if !is_normalized(prefix) {
            return None;
        }
        let masks = LayeredMasks::<W, G>::from_sequence(prefix)?;
        self.sequence.clear();
        self.sequence.extend_from_slice(prefix);
        Some(masks)
    }

    /// Searches for a completion of `prefix` to exactly `k` elements whose last element is `alpha`.
    ///
    /// `prefix` must start at `0`. The search is exhaustive: `None` means no such completion
    /// exists, unless the abort flag was raised during the call.
    pub fn complete(&mut self, prefix: &[u32], k: usize, alpha: u32) -> Option<Vec<u32>> {
        if prefix.is_empty() || prefix.len() > k || alpha as usize >= W * 64 {
            return None;
        }
        let masks = self.load_prefix(prefix)?;
        if prefix.len() == k {
            return (prefix.last() == Some(&alpha)).then(|| prefix.to_vec());
        }
        if self.descend(&masks, k, alpha) {
            Some(self.sequence.clone())
        } else {
            None
        }
    }

    fn descend(&mut self, masks: &LayeredMasks<W, G>, k: usize, alpha: u32) -> bool {
        if self.aborted() {
            return false;
        }
        self.nodes += 1;

        let size = self.sequence.len();
        let last = self.sequence[size - 1];
        let remaining = k - size;

        if last + self.table.extra_span(remaining) > alpha {
            return false;
        }

        // The final element is forced to be `alpha`.
        if remaining == 1 {
            if masks.new_diffs(alpha, &self.sequence).is_some() {
                self.sequence.push(alpha);
                return true;
            }
            return false;
        }

        let max_cand = alpha.saturating_sub(self.table.extra_span(remaining - 1));
        for cand in (last + 1)..=max_cand {
            let Some(new) = masks.new_diffs(cand, &self.sequence) else {
                continue;
            };
            let next = masks.with(&new);
            self.sequence.push(cand);
            if self.descend(&next, k, alpha) {
                return true;
            }
            self.sequence.pop();
        }
        false
    }

    /// Searches completions of `prefix` to `k` elements with a span below `best.span()`,
    /// offering every improvement to `best`.
    ///
    /// Every element must stay below `64 * W`; callers size `W` from the initial best span.
    pub fn minimize(&mut self, prefix: &[u32], k: usize, best: &BestSpan) {
        if prefix.is_empty() || prefix.len() > k {
            return;
        }
        let Some(masks) = self.load_prefix(prefix) else {
            return;
        };
        self.descend_min(&masks, k, best);
    }

    fn descend_min(&mut self, masks: &LayeredMasks<W, G>, k: usize, best: &BestSpan) {
        if self.aborted() {
            return;
        }
        self.nodes += 1;

        let size = self.sequence.len();
        let last = self.sequence[size - 1];
        if size == k {
            best.offer(&self.sequence);
            return;
        }

        let remaining = k - size;
        if last + self.table.extra_span(remaining) >= best.span() {
            return;
        }

        let tail = self.table.extra_span(remaining - 1);
        let mut cand = last + 1;
        // The bound tightens as other partitions improve the best span.
        while cand + tail < best.span() {
            if let Some(new) = masks.new_diffs(cand, &self.sequence) {
                let next = masks.with(&new);
                self.sequence.push(cand);
                self.descend_min(&next, k, best);
                self.sequence.pop();
                if self.aborted() {
                    return;
                }
            }
            cand += 1;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
