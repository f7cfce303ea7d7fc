//! Difference-multiplicity state for \(\gamma\)-bounded sequences (currently spans \(\le 511\)).
//!
//! Two interchangeable representations are provided:
//! - [`LayeredMasks`]: `G` nested bitsets where layer `l` holds every difference seen at least
//!   `l + 1` times. Conflict checks and updates are `O(depth)` word operations. This is what the
//!   exact search carries down its call stack.
//! - [`DiffCounts`]: one saturating counter per difference, unbounded in width and with a runtime
//!   `gamma`. Used by the greedy seeder and as a reference model in tests.
//!
//! Both satisfy `count(d) == sum over layers of bit_l(d)`.

/// Multiplicity bound used by the binary and by default type parameters.
pub const DEFAULT_GAMMA: usize = 3;

/// Bits per mask word.
pub const WORD_BITS: usize = 64;

/// Largest number of `u64` words a [`DiffMask`] is instantiated with.
pub const MAX_WORDS: usize = 8;

/// Largest span (and therefore largest difference) the bitset search can represent.
pub const MAX_SPAN: u32 = (WORD_BITS * MAX_WORDS - 1) as u32;

/// Returns the number of `u64` words needed to hold every difference in `0..=span`.
#[inline(always)]
pub const fn words_for_span(span: u32) -> usize {
    span as usize / WORD_BITS + 1
}

/// Runs `$body` with `$w` bound to a `const usize` word count wide enough for `$span`.
///
/// Widths are rounded up to 1, 2, 4 or 8 words so only four copies of the search are
/// monomorphized. Spans past [`MAX_SPAN`] evaluate to a `DomainOverflow` error.
macro_rules! dispatch_width {
    ($span:expr, $w:ident => $body:expr) => {{
        let span: u32 = $span;
        match $crate::diffs::words_for_span(span) {
            1 => {
                const $w: usize = 1;
                $body
            }
            2 => {
                const $w: usize = 2;
                $body
            }
            3 | 4 => {
                const $w: usize = 4;
                $body
            }
            5..=8 => {
                const $w: usize = 8;
                $body
            }
            _ => Err($crate::error::SearchError::DomainOverflow {
                span,
                capacity: $crate::diffs::MAX_SPAN,
            }),
        }
    }};
}
pub(crate) use dispatch_width;

// ============================================================================
// DiffMask
// ============================================================================

/// Fixed-width bitset over difference values `0..64 * W`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiffMask<const W: usize> {
    words: [u64; W],
}

impl<const W: usize> Default for DiffMask<W> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const W: usize> DiffMask<W> {
    /// Number of representable differences.
    pub const CAPACITY: usize = W * WORD_BITS;

    /// Creates an empty mask.
    #[inline(always)]
    pub const fn empty() -> Self {
        Self { words: [0u64; W] }
    }

    /// Sets bit `d`.
    #[inline(always)]
    pub fn insert(&mut self, d: u32) {
        let d = d as usize;
        debug_assert!(d < Self::CAPACITY, "difference {d} exceeds mask capacity");
        self.words[d / WORD_BITS] |= 1u64 << (d % WORD_BITS);
    }

    /// Returns whether bit `d` is set.
    #[inline(always)]
    pub fn contains(&self, d: u32) -> bool {
        let d = d as usize;
        debug_assert!(d < Self::CAPACITY, "difference {d} exceeds mask capacity");
        (self.words[d / WORD_BITS] >> (d % WORD_BITS)) & 1 != 0
    }

    /// Returns `self | other`.
    #[inline(always)]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for (w, o) in out.words.iter_mut().zip(other.words.iter()) {
            *w |= *o;
        }
        out
    }

    /// Returns `self & other`.
    #[inline(always)]
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = *self;
        for (w, o) in out.words.iter_mut().zip(other.words.iter()) {
            *w &= *o;
        }
        out
    }

    /// Returns `self & !other`.
    #[inline(always)]
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = *self;
        for (w, o) in out.words.iter_mut().zip(other.words.iter()) {
            *w &= !*o;
        }
        out
    }

    /// Returns whether no bit is set.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates set bits in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut t = word;
            std::iter::from_fn(move || {
                if t == 0 {
                    return None;
                }
                let b = t.trailing_zeros() as usize;
                t &= t - 1;
                Some((i * WORD_BITS + b) as u32)
            })
        })
    }
}

// ============================================================================
// MultiplicityTracker
// ============================================================================

/// Incremental difference bookkeeping for a strictly increasing sequence.
///
/// `sequence` is always the sequence *before* `candidate` is appended, both when applying and
/// when reverting; callers pop the candidate before calling [`MultiplicityTracker::revert`].
pub trait MultiplicityTracker {
    /// Maximum allowed occurrences of any difference.
    fn gamma(&self) -> usize;

    /// Returns how many times difference `d` has been recorded.
    fn count(&self, d: u32) -> usize;

    /// Returns `true` iff appending `candidate` keeps every difference within `gamma`.
    fn can_add(&self, candidate: u32, sequence: &[u32]) -> bool;

    /// Records the differences between `candidate` and every element of `sequence`.
    fn apply(&mut self, candidate: u32, sequence: &[u32]);

    /// Exact inverse of [`MultiplicityTracker::apply`].
    fn revert(&mut self, candidate: u32, sequence: &[u32]);

    /// Applies `candidate` if it is admissible; returns whether it was applied.
    fn try_apply(&mut self, candidate: u32, sequence: &[u32]) -> bool {
        if self.can_add(candidate, sequence) {
            self.apply(candidate, sequence);
            true
        } else {
            false
        }
    }
}

// ============================================================================
// LayeredMasks
// ============================================================================

/// `G` nested difference bitsets: `layers[l]` has bit `d` set iff `d` occurred at least `l + 1` times.
///
/// The top layer is the saturated set: any difference in it may not occur again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayeredMasks<const W: usize, const G: usize = DEFAULT_GAMMA> {
    layers: [DiffMask<W>; G],
}

impl<const W: usize, const G: usize> Default for LayeredMasks<W, G> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const W: usize, const G: usize> LayeredMasks<W, G> {
    /// State for a sequence with no differences yet.
    #[inline(always)]
    pub const fn empty() -> Self {
        Self {
            layers: [DiffMask::empty(); G],
        }
    }

    /// Builds the state for an entire sequence.
    ///
    /// Returns `None` if the sequence is not strictly increasing, exceeds the mask width,
    /// or already violates the bound.
    pub fn from_sequence(sequence: &[u32]) -> Option<Self> {
        let mut masks = Self::empty();
        for (i, &v) in sequence.iter().enumerate() {
            let prefix = &sequence[..i];
            if prefix.last().is_some_and(|&last| v <= last) {
                return None;
            }
            if v as usize >= DiffMask::<W>::CAPACITY {
                return None;
            }
            let new = masks.new_diffs(v, prefix)?;
            masks = masks.with(&new);
        }
        Some(masks)
    }

    /// Returns the layer of differences seen at least `level` times (`1..=G`).
    #[inline(always)]
    pub fn layer(&self, level: usize) -> &DiffMask<W> {
        &self.layers[level - 1]
    }

    /// Differences already at the bound.
    #[inline(always)]
    pub fn saturated(&self) -> &DiffMask<W> {
        &self.layers[G - 1]
    }

    /// Computes the differences `candidate - a` for every `a` in `sequence`.
    ///
    /// Returns `None` as soon as one of them is already saturated. `candidate` must exceed
    /// every element of `sequence` and fit in the mask width.
    #[inline(always)]
    pub fn new_diffs(&self, candidate: u32, sequence: &[u32]) -> Option<DiffMask<W>> {
        let saturated = self.saturated();
        let mut new = DiffMask::empty();
        for &a in sequence {
            debug_assert!(candidate > a);
            let d = candidate - a;
            if saturated.contains(d) {
                return None;
            }
            new.insert(d);
        }
        Some(new)
    }

    /// Returns the state after recording `new`.
    ///
    /// Layers are promoted top-down: `m3' = m3 | (m2 & new)`, `m2' = m2 | (m1 & new)`,
    /// `m1' = m1 | new` for `G = 3`.
    #[inline(always)]
    #[must_use]
    pub fn with(&self, new: &DiffMask<W>) -> Self {
        let mut out = *self;
        out.promote(new);
        out
    }

    #[inline(always)]
    fn promote(&mut self, new: &DiffMask<W>) {
        for l in (1..G).rev() {
            let carried = self.layers[l - 1].intersection(new);
            self.layers[l] = self.layers[l].union(&carried);
        }
        self.layers[0] = self.layers[0].union(new);
    }

    /// Clears the highest layer of each bit in `removed`.
    #[inline(always)]
    fn demote(&mut self, removed: &DiffMask<W>) {
        let mut pending = *removed;
        for l in (0..G).rev() {
            let hit = self.layers[l].intersection(&pending);
            self.layers[l] = self.layers[l].difference(&hit);
            pending = pending.difference(&hit);
        }
        debug_assert!(pending.is_empty(), "revert of a difference that was never recorded");
    }
}

impl<const W: usize, const G: usize> MultiplicityTracker for LayeredMasks<W, G> {
    fn gamma(&self) -> usize {
        G
    }

    fn count(&self, d: u32) -> usize {
        self.layers.iter().filter(|layer| layer.contains(d)).count()
    }

    fn can_add(&self, candidate: u32, sequence: &[u32]) -> bool {
        self.new_diffs(candidate, sequence).is_some()
    }

    fn apply(&mut self, candidate: u32, sequence: &[u32]) {
        let mut new = DiffMask::empty();
        for &a in sequence {
            new.insert(candidate - a);
        }
        self.promote(&new);
    }

    fn revert(&mut self, candidate: u32, sequence: &[u32]) {
        let mut removed = DiffMask::empty();
        for &a in sequence {
            removed.insert(candidate - a);
        }
        self.demote(&removed);
    }
}

// ============================================================================
// DiffCounts
// ============================================================================

/// Explicit per-difference counters with a runtime bound.
///
/// Grows on demand and shrinks on revert, so the last stored counter is never zero and
/// equal counts compare equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffCounts {
    counts: Vec<u8>,
    gamma: usize,
}

impl DiffCounts {
    /// Creates an empty counter table for the given bound.
    ///
    /// # Panics
    /// Panics if `gamma` is zero or does not fit in a `u8` counter.
    pub fn new(gamma: usize) -> Self {
        assert!(gamma >= 1 && gamma < usize::from(u8::MAX), "gamma must be in 1..255");
        Self {
            counts: Vec::new(),
            gamma,
        }
    }

    /// Largest difference with a non-zero count, if any.
    pub fn max_difference(&self) -> Option<u32> {
        self.counts.iter().rposition(|&c| c > 0).map(|d| d as u32)
    }

    #[inline]
    fn slot(&mut self, d: u32) -> &mut u8 {
        let d = d as usize;
        if d >= self.counts.len() {
            self.counts.resize(d + 1, 0);
        }
        &mut self.counts[d]
    }
}

impl MultiplicityTracker for DiffCounts {
    fn gamma(&self) -> usize {
        self.gamma
    }

    fn count(&self, d: u32) -> usize {
        self.counts.get(d as usize).map_or(0, |&c| usize::from(c))
    }

    fn can_add(&self, candidate: u32, sequence: &[u32]) -> bool {
        sequence
            .iter()
            .all(|&a| self.count(candidate - a) < self.gamma)
    }

    fn apply(&mut self, candidate: u32, sequence: &[u32]) {
        for &a in sequence {
            *self.slot(candidate - a) += 1;
        }
    }

    fn revert(&mut self, candidate: u32, sequence: &[u32]) {
        for &a in sequence {
            let c = self.slot(candidate - a);
            debug_assert!(*c > 0);
            *c -= 1;
        }
        let len = self.counts.iter().rposition(|&c| c > 0).map_or(0, |d| d + 1);
        self.counts.truncate(len);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn brute_counts(sequence: &[u32]) -> Vec<usize> {
        let max = sequence.last().copied().unwrap_or(0) as usize;
        let mut counts = vec![0usize; max + 1];
        for i in 0..sequence.len() {
            for j in (i + 1)..sequence.len() {
                counts[(sequence[j] - sequence[i]) as usize] += 1;
            }
        }
        counts
    }

    #[test]
    fn words_for_span_boundaries() {
        assert_eq!(words_for_span(0), 1);
        assert_eq!(words_for_span(63), 1);
        assert_eq!(words_for_span(64), 2);
        assert_eq!(words_for_span(MAX_SPAN), MAX_WORDS);
        assert_eq!(words_for_span(MAX_SPAN + 1), MAX_WORDS + 1);
    }

    #[test]
    fn diff_mask_set_operations() {
        let mut a = DiffMask::<2>::empty();
        let mut b = DiffMask::<2>::empty();
        a.insert(3);
        a.insert(70);
        b.insert(70);
        b.insert(127);

        assert!(a.contains(70) && !a.contains(127));
        assert_eq!(a.union(&b).iter().collect::<Vec<_>>(), vec![3, 70, 127]);
        assert_eq!(a.intersection(&b).iter().collect::<Vec<_>>(), vec![70]);
        assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![3]);
        assert_eq!(a.union(&b).len(), 3);
        assert!(DiffMask::<2>::empty().is_empty());
    }

    #[test]
    fn layered_masks_match_bruteforce_counts() {
        let sequence = [0u32, 1, 2, 3, 5, 8, 13];
        let masks = LayeredMasks::<1, 3>::from_sequence(&sequence).unwrap();
        let counts = brute_counts(&sequence);
        for (d, &c) in counts.iter().enumerate() {
            assert_eq!(masks.count(d as u32), c, "count mismatch for difference {d}");
        }
    }

    #[test]
    fn new_diffs_rejects_saturated_difference() {
        // Difference 1 already occurs three times in 0,1,2,3.
        let masks = LayeredMasks::<1, 3>::from_sequence(&[0, 1, 2, 3]).unwrap();
        assert!(masks.new_diffs(4, &[0, 1, 2, 3]).is_none());
        assert!(masks.new_diffs(5, &[0, 1, 2, 3]).is_some());
    }

    #[test]
    fn from_sequence_rejects_invalid_input() {
        assert!(LayeredMasks::<1, 3>::from_sequence(&[0, 1, 2, 3, 4]).is_none());
        assert!(LayeredMasks::<1, 3>::from_sequence(&[0, 2, 2]).is_none());
        assert!(LayeredMasks::<1, 3>::from_sequence(&[0, 64]).is_none());
        assert!(LayeredMasks::<2, 3>::from_sequence(&[0, 64]).is_some());
    }

    #[test]
    fn gamma_one_is_a_sidon_check() {
        let masks = LayeredMasks::<1, 1>::from_sequence(&[0, 1, 3]).unwrap();
        assert!(!masks.can_add(4, &[0, 1, 3]));
        assert!(masks.can_add(7, &[0, 1, 3]));
    }

    #[test]
    fn apply_then_revert_restores_layered_state() {
        let mut rng = XorShiftRng::seed_from_u64(0x5EED);

        for _ in 0..200 {
            let mut sequence = vec![0u32];
            let mut masks = LayeredMasks::<2, 3>::empty();
            let mut history = Vec::new();

            for _ in 0..12 {
                let last = *sequence.last().unwrap();
                let candidate = last + rng.random_range(1..6);
                if candidate >= 128 {
                    break;
                }
                if masks.can_add(candidate, &sequence) {
                    history.push(masks);
                    masks.apply(candidate, &sequence);
                    sequence.push(candidate);
                }
            }

            while let Some(before) = history.pop() {
                let candidate = sequence.pop().unwrap();
                masks.revert(candidate, &sequence);
                assert_eq!(masks, before, "revert did not restore the prior layers");
            }
            assert_eq!(masks, LayeredMasks::empty());
        }
    }

    #[test]
    fn apply_then_revert_restores_counts() {
        let mut counts = DiffCounts::new(3);
        let sequence = [0u32, 4, 5, 6];
        let mut prefix = Vec::new();
        for &v in &sequence {
            assert!(counts.try_apply(v, &prefix));
            prefix.push(v);
        }
        let before = counts.clone();
        counts.apply(8, &prefix);
        counts.revert(8, &prefix);
        assert_eq!(counts, before);
    }

    #[test]
    fn counts_and_masks_agree_on_random_walks() {
        let mut rng = XorShiftRng::seed_from_u64(0xFACE);

        for _ in 0..100 {
            let mut sequence = vec![0u32];
            let mut masks = LayeredMasks::<4, 3>::empty();
            let mut counts = DiffCounts::new(3);

            for _ in 0..64 {
                if sequence.len() >= 14 {
                    break;
                }
                let candidate = sequence.last().unwrap() + rng.random_range(1..8);
                if candidate > 255 {
                    break;
                }
                let by_mask = masks.can_add(candidate, &sequence);
                let by_count = counts.can_add(candidate, &sequence);
                assert_eq!(by_mask, by_count, "trackers disagree at {candidate}");
                if by_mask {
                    masks.apply(candidate, &sequence);
                    counts.apply(candidate, &sequence);
                    sequence.push(candidate);
                }
            }

            for d in 0..=255 {
                assert_eq!(masks.count(d), counts.count(d));
            }
        }
    }

    #[test]
    fn counts_report_max_difference() {
        let mut counts = DiffCounts::new(2);
        assert_eq!(counts.max_difference(), None);
        counts.apply(9, &[0, 4]);
        assert_eq!(counts.max_difference(), Some(9));
        counts.revert(9, &[0, 4]);
        assert_eq!(counts.max_difference(), None);
    }

    #[test]
    fn revert_drops_grown_slots() {
        let mut counts = DiffCounts::new(3);
        let empty = counts.clone();
        counts.apply(1, &[0]);
        counts.revert(1, &[0]);
        assert_eq!(counts, empty);

        counts.apply(1, &[0]);
        let before = counts.clone();
        counts.apply(7, &[0, 1]);
        counts.revert(7, &[0, 1]);
        assert_eq!(counts, before);
    }
}
