//! Sequence helpers: reflection, parsing, formatting.

use std::fmt::Write as _;

/// Reflects a sequence through its span: every `x` becomes `span - x`, re-sorted increasingly.
///
/// A valid witness stays valid: reflection maps each difference to itself.
pub fn reflect(sequence: &[u32]) -> Vec<u32> {
    let Some(&span) = sequence.last() else {
        return Vec::new();
    };
    sequence.iter().rev().map(|&x| span - x).collect()
}

/// Returns whether the sequence starts at `0` and is strictly increasing.
pub fn is_normalized(sequence: &[u32]) -> bool {
    sequence.first() == Some(&0) && sequence.windows(2).all(|w| w[0] < w[1])
}

/// Formats a sequence as `[a,b,c]`.
pub fn format_sequence(sequence: &[u32]) -> String {
    let mut out = String::with_capacity(sequence.len() * 4 + 2);
    out.push('[');
    for (i, v) in sequence.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{v}");
    }
    out.push(']');
    out
}

// ============================================================================
// Parsing
// ============================================================================

/// Errors encountered while parsing a sequence.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequenceParseError {
    /// No elements were found.
    #[error("sequence is empty")]
    Empty,
    /// A token is not a non-negative integer.
    #[error("invalid element {token:?} at position {position}")]
    InvalidElement {
        /// Zero-based element position.
        position: usize,
        /// The offending token.
        token: String,
    },
    /// Elements are not strictly increasing.
    #[error("sequence is not strictly increasing at position {position}: {value} after {previous}")]
    NotIncreasing {
        /// Zero-based element position.
        position: usize,
        /// The offending element.
        value: u32,
        /// The element before it.
        previous: u32,
    },
}

/// Parses a sequence like `0, 4, 5, 6` or `[0 4 5 6]`.
///
/// Rules:
/// - Elements are separated by commas and/or whitespace; surrounding brackets or braces are ignored.
/// - Elements must be strictly increasing.
///
/// # Errors
/// Returns an error if the input is empty, contains a non-integer token, or is not increasing.
pub fn parse_sequence(text: &str) -> Result<Vec<u32>, SequenceParseError> {
    let trimmed = text
        .trim()
        .trim_start_matches(['[', '{'])
        .trim_end_matches([']', '}']);

    let mut out: Vec<u32> = Vec::new();
    for (position, token) in trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .enumerate()
    {
        let value: u32 = token
            .parse()
            .map_err(|_| SequenceParseError::InvalidElement {
                position,
                token: token.to_string(),
            })?;
        if let Some(&previous) = out.last() {
            if value <= previous {
                return Err(SequenceParseError::NotIncreasing {
                    position,
                    value,
                    previous,
                });
            }
        }
        out.push(value);
    }

    if out.is_empty() {
        return Err(SequenceParseError::Empty);
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_is_an_involution() {
        let s = [0u32, 1, 2, 4, 5, 8, 10];
        let r = reflect(&s);
        assert_eq!(r, vec![0, 2, 5, 6, 8, 9, 10]);
        assert_eq!(reflect(&r), s.to_vec());
        assert!(reflect(&[]).is_empty());
    }

    #[test]
    fn normalized_sequences() {
        assert!(is_normalized(&[0, 1, 3]));
        assert!(!is_normalized(&[1, 2, 3]));
        assert!(!is_normalized(&[0, 2, 2]));
        assert!(!is_normalized(&[]));
    }

    #[test]
    fn format_and_parse_roundtrip() {
        let s = vec![0u32, 4, 5, 6, 8];
        let text = format_sequence(&s);
        assert_eq!(text, "[0,4,5,6,8]");
        assert_eq!(parse_sequence(&text).unwrap(), s);
    }

    #[test]
    fn parse_accepts_mixed_separators() {
        assert_eq!(parse_sequence("{0, 4  5,\n6}").unwrap(), vec![0, 4, 5, 6]);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_sequence("  "), Err(SequenceParseError::Empty));
        assert_eq!(parse_sequence("[]"), Err(SequenceParseError::Empty));
        assert!(matches!(
            parse_sequence("0,x,3"),
            Err(SequenceParseError::InvalidElement { position: 1, .. })
        ));
        assert!(matches!(
            parse_sequence("0,-1"),
            Err(SequenceParseError::InvalidElement { .. })
        ));
        assert_eq!(
            parse_sequence("0,5,5"),
            Err(SequenceParseError::NotIncreasing {
                position: 2,
                value: 5,
                previous: 5
            })
        );
    }
}
