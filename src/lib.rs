//! # Gamma-Span Search Engine
//!
//! Exact computation of \(G^-(\gamma, k)\): the smallest span \(\alpha\) of a strictly
//! increasing integer sequence `0 = a_0 < a_1 < ... < a_{k-1} = alpha` in which every positive
//! difference `a_j - a_i` occurs at most \(\gamma\) times.
//!
//! This crate provides:
//! - A layered bitset tracker of difference multiplicities with `O(depth)` incremental updates.
//! - An exhaustive branch-and-bound search for a fixed span, pruned by a learned lower-bound table.
//! - A parallel coordinator that partitions the search by the second element.
//! - An escalation driver that raises the span until a witness exists, proving minimality.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gamma_span::driver::Solver;
//! use gamma_span::coordinator::SearchConfig;
//!
//! let mut solver = Solver::<3>::new(SearchConfig::default()).unwrap();
//! let records = solver.solve_range(5, 12, |r| println!("{r}")).unwrap();
//! assert_eq!(records[0].span, 5);
//! ```
//!
//! ## Validating Witnesses
//!
//! ```
//! use gamma_span::validate::{validate_known_sequences, validate_sequence};
//!
//! validate_known_sequences().expect("bundled example should be valid");
//!
//! let report = validate_sequence(&[0, 1, 2, 3, 4], 3);
//! assert!(!report.is_valid());
//! assert_eq!(report.violations[0].difference, 1);
//! ```
//!
//! ## Testing One Span
//!
//! ```
//! use gamma_span::bounds::LowerBoundTable;
//! use gamma_span::coordinator::Coordinator;
//!
//! let table = LowerBoundTable::trivial(3);
//! let coord = Coordinator::new(2).unwrap();
//!
//! assert!(coord.try_span::<3>(&table, 6, 6).unwrap().witness.is_none());
//! let witness = coord.try_span::<3>(&table, 6, 7).unwrap().witness.unwrap();
//! assert_eq!(witness.len(), 6);
//! ```
//!
//! ## Modules
//!
//! - [`diffs`]: Difference-multiplicity state (layered bitsets and counters).
//! - [`bounds`]: Lower-bound table used for pruning.
//! - [`backtrack`]: Exact depth-first search for one prefix.
//! - [`coordinator`]: Parallel partitioning by second element.
//! - [`driver`]: Span escalation and table learning across sizes.
//! - [`greedy`]: Quick upper bounds.
//! - [`validate`]: Independent witness verification.
//!
//! ## Performance Notes
//!
//! - Difference masks use up to eight `u64` words, limiting spans to 511.
//! - Masks are `Copy` and passed by value down the recursion, so backtracking is free.
//! - For maximum performance, compile with: `RUSTFLAGS="-C target-cpu=native" cargo build --release`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)] // Intentional for hot-path code
#![allow(clippy::many_single_char_names)] // Mathematical variable names
#![allow(clippy::doc_markdown)] // LaTeX-style notation in docs
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod backtrack;
pub mod bounds;
pub mod coordinator;
pub mod diffs;
pub mod driver;
pub mod error;
pub mod greedy;
pub mod sequence;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::bounds::{LowerBoundTable, GAMMA3_SEEDS};
    pub use crate::coordinator::{Coordinator, CoordinatorMode, SearchConfig};
    pub use crate::diffs::{LayeredMasks, MultiplicityTracker, DEFAULT_GAMMA};
    pub use crate::driver::{Solver, SpanRecord};
    pub use crate::error::SearchError;
    pub use crate::validate::{validate_sequence, validate_witness};
}
