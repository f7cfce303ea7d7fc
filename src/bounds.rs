//! Lower bounds on the minimal span, indexed by element count.
//!
//! Entry `j` bounds \(G^-(\gamma, j)\) from below: no valid sequence of `j` elements has a smaller
//! span. The search only ever uses these values to prune, so a loose table costs time while a
//! table that overestimates any entry can hide real solutions. Entries therefore come from
//! either the trivial bound for `j <= gamma + 1`, a span proven minimal by a completed search,
//! or literal seeds the caller vouches for.

use crate::error::SearchError;

/// Literal lower bounds for `gamma = 3`, `k = 0..=19`.
///
/// These are valid but not all tight (e.g. the exact value for `k = 7` is 10).
pub const GAMMA3_SEEDS: [u32; 20] = [
    0, 0, 1, 2, 3, 5, 7, 9, 12, 15, 19, 24, 29, 35, 41, 49, 58, 67, 76, 85,
];

/// Strictly increasing table of span lower bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowerBoundTable {
    gamma: usize,
    /// `spans[j]` bounds the span of any valid `j`-element sequence.
    spans: Vec<u32>,
    /// `proven[j]` is set when `spans[j]` is known to be exact.
    proven: Vec<bool>,
}

impl LowerBoundTable {
    /// Table holding only the trivial values: \(G^-(\gamma, j) = j - 1\) for `j <= gamma + 1`.
    pub fn trivial(gamma: usize) -> Self {
        let spans: Vec<u32> = (0..=gamma + 1).map(|j| j.saturating_sub(1) as u32).collect();
        let proven = vec![true; spans.len()];
        Self {
            gamma,
            spans,
            proven,
        }
    }

    /// Table seeded with literal lower bounds, `seeds[j]` for `j`-element sequences.
    ///
    /// Seeds must be true lower bounds; nothing here can detect an overestimate.
    ///
    /// # Errors
    /// Returns an error if the seeds are below the trivial bound or not strictly increasing
    /// from `j = 1` on.
    pub fn from_seeds(gamma: usize, seeds: &[u32]) -> Result<Self, SearchError> {
        let mut table = Self::trivial(gamma);
        for (j, &value) in seeds.iter().enumerate() {
            let floor = j.saturating_sub(1) as u32;
            if value < floor {
                return Err(SearchError::BelowTrivialBound {
                    index: j,
                    value,
                    floor,
                });
            }
            if j < table.spans.len() {
                // Trivial entries are exact; a seed can only agree with them.
                if value != table.spans[j] {
                    return Err(SearchError::NonMonotoneTable {
                        index: j,
                        value,
                        previous: table.spans[j],
                    });
                }
                continue;
            }
            let previous = table.spans[j - 1];
            if value <= previous {
                return Err(SearchError::NonMonotoneTable {
                    index: j,
                    value,
                    previous,
                });
            }
            table.spans.push(value);
            table.proven.push(false);
        }
        Ok(table)
    }

    /// The literal `gamma = 3` table.
    pub fn gamma3_seeded() -> Self {
        Self::from_seeds(3, &GAMMA3_SEEDS).unwrap_or_else(|_| Self::trivial(3))
    }

    /// Multiplicity bound this table was built for.
    pub fn gamma(&self) -> usize {
        self.gamma
    }

    /// Largest element count with an explicit entry.
    pub fn max_known(&self) -> usize {
        self.spans.len() - 1
    }

    /// Returns whether entry `j` is explicit and exact.
    pub fn is_proven(&self, j: usize) -> bool {
        self.proven.get(j).copied().unwrap_or(false)
    }

    /// Returns whether any explicit entry is a seed rather than a proven value.
    pub fn has_unproven_entries(&self) -> bool {
        self.proven.iter().any(|&p| !p)
    }

    /// Lower bound on the span of any valid `j`-element sequence.
    ///
    /// Past the explicit entries the bound grows by one per element, since dropping the last
    /// element of a valid sequence leaves a valid sequence with a strictly smaller span.
    #[inline]
    pub fn span_for(&self, j: usize) -> u32 {
        match self.spans.get(j) {
            Some(&span) => span,
            None => {
                let last = self.spans.len() - 1;
                self.spans[last] + (j - last) as u32
            }
        }
    }

    /// Extra span needed after the current last element to place `remaining` more elements.
    #[inline(always)]
    pub fn extra_span(&self, remaining: usize) -> u32 {
        self.span_for(remaining + 1)
    }

    /// Smallest span worth testing for `k` elements.
    ///
    /// Combines the entry for `k` with the entry for `k - 1` plus one.
    pub fn floor(&self, k: usize) -> u32 {
        if k <= 1 {
            return 0;
        }
        self.span_for(k).max(self.span_for(k - 1) + 1)
    }

    /// Records the proven minimal span for `k` elements.
    ///
    /// `k` may be the next unknown size, or an already-seeded size whose value is being
    /// confirmed or raised.
    ///
    /// # Errors
    /// Returns an error if `k` skips ahead, or the value would break strict monotonicity.
    pub fn record(&mut self, k: usize, span: u32) -> Result<(), SearchError> {
        let len = self.spans.len();
        if k > len || k == 0 {
            return Err(SearchError::OutOfOrderRecord { k, expected: len });
        }

        let previous = self.spans[k - 1];
        if k > 1 && span <= previous {
            return Err(SearchError::NonMonotoneTable {
                index: k,
                value: span,
                previous,
            });
        }

        if k == len {
            self.spans.push(span);
            self.proven.push(true);
            return Ok(());
        }

        if span < self.spans[k] {
            return Err(SearchError::NonMonotoneTable {
                index: k,
                value: span,
                previous: self.spans[k],
            });
        }
        if let Some(&next) = self.spans.get(k + 1) {
            if next <= span {
                return Err(SearchError::NonMonotoneTable {
                    index: k + 1,
                    value: next,
                    previous: span,
                });
            }
        }
        self.spans[k] = span;
        self.proven[k] = true;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_table_values() {
        let t = LowerBoundTable::trivial(3);
        assert_eq!(t.max_known(), 4);
        assert_eq!((0..=4).map(|j| t.span_for(j)).collect::<Vec<_>>(), vec![0, 0, 1, 2, 3]);
        assert!(t.is_proven(4));
        assert!(!t.is_proven(5));
        assert!(!t.has_unproven_entries());
        assert!(LowerBoundTable::gamma3_seeded().has_unproven_entries());
    }

    #[test]
    fn extrapolation_is_strictly_increasing() {
        let t = LowerBoundTable::trivial(3);
        assert_eq!(t.span_for(5), 4);
        assert_eq!(t.span_for(9), 8);
        for j in 1..40 {
            assert!(t.span_for(j + 1) > t.span_for(j));
        }
    }

    #[test]
    fn extra_span_counts_the_current_element() {
        let t = LowerBoundTable::trivial(3);
        // Placing one more element needs at least one unit of span.
        assert_eq!(t.extra_span(1), 1);
        assert_eq!(t.extra_span(0), 0);
    }

    #[test]
    fn floor_uses_previous_entry() {
        let mut t = LowerBoundTable::trivial(3);
        t.record(5, 5).unwrap();
        t.record(6, 7).unwrap();
        assert_eq!(t.floor(7), 8);
        assert_eq!(t.floor(1), 0);
        assert_eq!(t.floor(2), 1);
    }

    #[test]
    fn record_enforces_order_and_monotonicity() {
        let mut t = LowerBoundTable::trivial(3);
        assert_eq!(
            t.record(7, 10),
            Err(SearchError::OutOfOrderRecord { k: 7, expected: 5 })
        );
        assert!(matches!(
            t.record(5, 3),
            Err(SearchError::NonMonotoneTable { index: 5, .. })
        ));
        t.record(5, 5).unwrap();
        assert_eq!(t.span_for(5), 5);
        assert!(t.is_proven(5));
    }

    #[test]
    fn seeds_are_validated() {
        assert!(LowerBoundTable::from_seeds(3, &GAMMA3_SEEDS).is_ok());
        assert!(matches!(
            LowerBoundTable::from_seeds(3, &[0, 0, 1, 2, 3, 5, 5]),
            Err(SearchError::NonMonotoneTable { index: 6, .. })
        ));
        assert!(matches!(
            LowerBoundTable::from_seeds(3, &[0, 0, 1, 2, 3, 4, 4]),
            Err(SearchError::NonMonotoneTable { .. })
        ));
        assert!(matches!(
            LowerBoundTable::from_seeds(3, &[0, 0, 2]),
            Err(SearchError::NonMonotoneTable { index: 2, .. })
        ));
    }

    #[test]
    fn seeds_below_trivial_bound_are_rejected() {
        assert_eq!(
            LowerBoundTable::from_seeds(3, &[0, 0, 1, 2, 3, 3]).unwrap_err(),
            SearchError::BelowTrivialBound {
                index: 5,
                value: 3,
                floor: 4
            }
        );
        assert_eq!(
            LowerBoundTable::from_seeds(2, &[0, 0, 0]).unwrap_err(),
            SearchError::BelowTrivialBound {
                index: 2,
                value: 0,
                floor: 1
            }
        );
    }

    #[test]
    fn record_raises_a_loose_seed() {
        let mut t = LowerBoundTable::gamma3_seeded();
        assert_eq!(t.span_for(7), 9);
        assert!(!t.is_proven(7));
        t.record(7, 10).unwrap();
        assert_eq!(t.span_for(7), 10);
        assert!(t.is_proven(7));
        // Lowering a bound is never allowed.
        assert!(t.record(8, 11).is_err());
    }
}
