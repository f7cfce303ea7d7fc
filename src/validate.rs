//! Independent verification of witness sequences.
//!
//! Nothing here shares code with the search: differences are tallied from scratch with an
//! ordered map, so a report is ground truth for any sequence the engine produces.

use std::collections::BTreeMap;
use std::fmt;

/// Known valid 18-element sequence for `gamma = 3` with span 76.
pub const BUNDLED_EXAMPLE: [u32; 18] = [
    0, 4, 5, 6, 8, 18, 21, 28, 30, 38, 45, 49, 56, 61, 67, 70, 75, 76,
];

// ============================================================================
// Report
// ============================================================================

/// A difference that occurs more often than allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Violation {
    /// The difference value.
    pub difference: u32,
    /// How many pairs produce it.
    pub count: usize,
}

/// Result of checking one sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    /// Bound the sequence was checked against.
    pub gamma: usize,
    /// Number of elements.
    pub len: usize,
    /// Largest element, `None` for an empty sequence.
    pub max_element: Option<u32>,
    /// Every over-represented difference, in increasing order.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns whether no difference exceeds the bound.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking set for n={}, gamma={}...", self.len, self.gamma)?;
        for v in &self.violations {
            writeln!(
                f,
                "  [!] VIOLATION: Difference {} appears {} times!",
                v.difference, v.count
            )?;
        }
        if self.is_valid() {
            writeln!(
                f,
                "  [+] SUCCESS: Set is valid. No difference appears more than {} times.",
                self.gamma
            )?;
            if let Some(max) = self.max_element {
                write!(f, "  Max element (alpha): {max}")?;
            }
            Ok(())
        } else {
            write!(f, "  [-] FAILED: Set exceeds the gamma limit.")
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Tallies all pairwise absolute differences of `sequence` and reports those above `gamma`.
pub fn validate_sequence(sequence: &[u32], gamma: usize) -> ValidationReport {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for (i, &a) in sequence.iter().enumerate() {
        for &b in &sequence[i + 1..] {
            *counts.entry(a.abs_diff(b)).or_insert(0) += 1;
        }
    }

    let violations = counts
        .into_iter()
        .filter(|&(_, count)| count > gamma)
        .map(|(difference, count)| Violation { difference, count })
        .collect();

    ValidationReport {
        gamma,
        len: sequence.len(),
        max_element: sequence.iter().copied().max(),
        violations,
    }
}

/// Checks that `witness` certifies a span of `span` for `k` elements.
///
/// # Errors
/// Returns an error message naming the first property the witness fails.
pub fn validate_witness(witness: &[u32], gamma: usize, k: usize, span: u32) -> Result<(), String> {
    if witness.len() != k {
        return Err(format!("witness has {} elements, expected {k}", witness.len()));
    }
    if witness.first() != Some(&0) {
        return Err("witness does not start at 0".to_string());
    }
    if let Some(pos) = witness.windows(2).position(|w| w[0] >= w[1]) {
        return Err(format!("witness is not strictly increasing at position {}", pos + 1));
    }
    if witness.last() != Some(&span) {
        return Err(format!(
            "witness ends at {:?}, expected span {span}",
            witness.last()
        ));
    }
    let report = validate_sequence(witness, gamma);
    if let Some(v) = report.violations.first() {
        return Err(format!(
            "difference {} appears {} times (gamma={gamma})",
            v.difference, v.count
        ));
    }
    Ok(())
}

/// Validates the bundled example sequence.
///
/// # Errors
/// Returns an error message if the bundled sequence fails validation.
pub fn validate_known_sequences() -> Result<(), String> {
    let span = BUNDLED_EXAMPLE[BUNDLED_EXAMPLE.len() - 1];
    validate_witness(&BUNDLED_EXAMPLE, 3, BUNDLED_EXAMPLE.len(), span)
        .map_err(|e| format!("bundled example: {e}"))
}

// ============================================================================
// Tests
// ============================================================================
