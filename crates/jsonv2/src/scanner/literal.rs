//! `null` / `true` / `false` literal scanners.

use crate::error::{SyntaxError, SyntaxErrorKind};

use super::{Scan, ScanResult};

fn consume_literal(input: &[u8], text: &'static [u8]) -> ScanResult<()> {
    let n = core::cmp::min(input.len(), text.len());
    if input[..n] != text[..n] {
        for i in 0..n {
            if input[i] != text[i] {
                return Err(SyntaxError::new(SyntaxErrorKind::InvalidCharacter, i as u64));
            }
        }
    }
    if n < text.len() {
        return Ok(Scan::Truncated { consumed: n });
    }
    Ok(Scan::Complete {
        value: (),
        consumed: n,
    })
}

/// Matches a `null` literal, possibly truncated by the window boundary.
pub fn consume_null(input: &[u8]) -> ScanResult<()> {
    consume_literal(input, b"null")
}

/// Matches a `true` literal, possibly truncated by the window boundary.
pub fn consume_true(input: &[u8]) -> ScanResult<()> {
    consume_literal(input, b"true")
}

/// Matches a `false` literal, possibly truncated by the window boundary.
pub fn consume_false(input: &[u8]) -> ScanResult<()> {
    consume_literal(input, b"false")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_complete_null() {
        assert_eq!(
            consume_null(b"null,"),
            Ok(Scan::Complete {
                value: (),
                consumed: 4
            })
        );
    }

    #[test]
    fn truncated_prefix_resumes() {
        assert_eq!(consume_true(b"tr"), Ok(Scan::Truncated { consumed: 2 }));
    }

    #[test]
    fn rejects_mismatch() {
        assert!(consume_false(b"folse").is_err());
    }
}
