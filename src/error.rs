//! Error taxonomy for the search.
//!
//! Infeasibility at a given span is a normal outcome (`Ok(None)`), never an error.

use crate::sequence::SequenceParseError;

/// Errors raised by the search, the lower-bound table, and the driver.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The target size must be at least one.
    #[error("target size must be at least 1 (got k={k})")]
    InvalidSize {
        /// Requested size.
        k: usize,
    },
    /// The span to test does not fit in the difference bitsets.
    #[error("span {span} exceeds the representable difference domain (max {capacity})")]
    DomainOverflow {
        /// Requested span.
        span: u32,
        /// Largest supported span.
        capacity: u32,
    },
    /// A table entry would break strict monotonicity of the lower bounds.
    #[error("lower-bound table is not strictly increasing at k={index}: {value} after {previous}")]
    NonMonotoneTable {
        /// Element count of the offending entry.
        index: usize,
        /// Offending value.
        value: u32,
        /// Value of the preceding entry.
        previous: u32,
    },
    /// A table entry is below the trivial bound `k - 1`.
    #[error("lower-bound table entry for k={index} is {value}, below the trivial bound {floor}")]
    BelowTrivialBound {
        /// Element count of the offending entry.
        index: usize,
        /// Offending value.
        value: u32,
        /// `k - 1`.
        floor: u32,
    },
    /// Learned spans must be recorded for consecutive sizes.
    #[error("cannot record a span for k={k}; the next size to learn is {expected}")]
    OutOfOrderRecord {
        /// Size being recorded.
        k: usize,
        /// Next size the table accepts.
        expected: usize,
    },
    /// Escalation passed a known feasible span without success.
    ///
    /// Only reachable when the lower-bound table overestimates some span.
    #[error("no sequence of size {k} found up to the greedy upper bound {upper}; the lower-bound table is too tight")]
    Exhausted {
        /// Target size.
        k: usize,
        /// Greedy upper bound that should have been feasible.
        upper: u32,
    },
    /// A lower-bound table was built for a different multiplicity bound than the solver.
    #[error("lower-bound table was built for gamma={table}, solver uses gamma={expected}")]
    GammaMismatch {
        /// Bound the table was built for.
        table: usize,
        /// Bound the solver searches with.
        expected: usize,
    },
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    /// Malformed sequence text.
    #[error(transparent)]
    Parse(#[from] SequenceParseError),
}
