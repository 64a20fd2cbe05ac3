//! JSON string scanning: a zero-allocation fast path for unescaped ASCII
//! runs, and a resumable scanner that decodes escapes, surrogate pairs, and
//! arbitrary UTF-8.

use alloc::string::String;

use crate::error::{SyntaxError, SyntaxErrorKind};

use super::number::parse_hex_u16;
use super::{Scan, ScanResult};

/// Matches an opening `"`, a run of unescaped printable ASCII (`>= 0x20`,
/// not `"` or `\`), and a closing `"`. Any escape, control byte, or non-ASCII
/// byte bails out (return `None`) so the caller can fall back to
/// [`consume_string_resumable`] without having consumed anything.
#[must_use]
pub fn consume_simple_string(input: &[u8]) -> Option<usize> {
    if input.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    loop {
        let b = *input.get(i)?;
        if b == b'"' {
            return Some(i + 1);
        }
        if b < 0x20 || b == b'\\' || b >= 0x80 {
            return None;
        }
        i += 1;
    }
}

/// Decode mode controlling invalid-UTF-8 tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Mode {
    Validate,
    AllowInvalid,
}

/// Resumable string scanner. `resume_offset` indexes into `input` (0 means a
/// fresh `"`-prefixed scan); accumulated decoded text goes into `out`. On
/// `Truncated`, the returned offset points at the start of the incomplete
/// escape/sequence so the next call can resume without re-validating
/// already-consumed bytes or re-appending to `out`.
pub fn consume_string_resumable(
    input: &[u8],
    resume_offset: usize,
    out: &mut String,
    mode: Utf8Mode,
) -> ScanResult<()> {
    let mut i = resume_offset;
    if i == 0 {
        if input.first() != Some(&b'"') {
            return Err(SyntaxError::new(SyntaxErrorKind::InvalidCharacter, 0));
        }
        i = 1;
    }

    loop {
        // Fast path: copy a run of unescaped, non-control ASCII directly.
        let start = i;
        while i < input.len() && input[i] >= 0x20 && input[i] != b'"' && input[i] != b'\\' && input[i] < 0x80 {
            i += 1;
        }
        if i > start {
            // Safety: the run above only contains bytes in 0x20..0x80.
            out.push_str(core::str::from_utf8(&input[start..i]).expect("ascii run is valid utf-8"));
        }

        let Some(&b) = input.get(i) else {
            return Ok(Scan::Truncated { consumed: i });
        };

        match b {
            b'"' => return Ok(Scan::Complete { value: (), consumed: i + 1 }),
            b'\\' => {
                let escape_start = i;
                let Some(&esc) = input.get(i + 1) else {
                    return Ok(Scan::Truncated { consumed: escape_start });
                };
                match esc {
                    b'"' => { out.push('"'); i += 2; }
                    b'\\' => { out.push('\\'); i += 2; }
                    b'/' => { out.push('/'); i += 2; }
                    b'b' => { out.push('\u{8}'); i += 2; }
                    b'f' => { out.push('\u{c}'); i += 2; }
                    b'n' => { out.push('\n'); i += 2; }
                    b'r' => { out.push('\r'); i += 2; }
                    b't' => { out.push('\t'); i += 2; }
                    b'u' => {
                        let Some(hex) = input.get(i + 2..i + 6) else {
                            return Ok(Scan::Truncated { consumed: escape_start });
                        };
                        let Some(unit) = parse_hex_u16(hex) else {
                            return Err(SyntaxError::new(SyntaxErrorKind::InvalidEscape, (i + 2) as u64));
                        };
                        if (0xD800..=0xDBFF).contains(&unit) {
                            // High surrogate: require a following low surrogate.
                            if input.len() < i + 8 {
                                return Ok(Scan::Truncated { consumed: escape_start });
                            }
                            if input[i + 6] != b'\\' || input[i + 7] != b'u' {
                                return Err(SyntaxError::new(SyntaxErrorKind::InvalidSurrogatePair, escape_start as u64));
                            }
                            let Some(hex2) = input.get(i + 8..i + 12) else {
                                return Ok(Scan::Truncated { consumed: escape_start });
                            };
                            let Some(low) = parse_hex_u16(hex2) else {
                                return Err(SyntaxError::new(SyntaxErrorKind::InvalidEscape, (i + 8) as u64));
                            };
                            if !(0xDC00..=0xDFFF).contains(&low) {
                                return Err(SyntaxError::new(SyntaxErrorKind::InvalidSurrogatePair, escape_start as u64));
                            }
                            let c =
                                0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                            match char::from_u32(c) {
                                Some(c) => out.push(c),
                                None => return Err(SyntaxError::new(SyntaxErrorKind::InvalidSurrogatePair, escape_start as u64)),
                            }
                            i += 12;
                        } else if (0xDC00..=0xDFFF).contains(&unit) {
                            return Err(SyntaxError::new(SyntaxErrorKind::InvalidSurrogatePair, escape_start as u64));
                        } else {
                            match char::from_u32(u32::from(unit)) {
                                Some(c) => out.push(c),
                                None => return Err(SyntaxError::new(SyntaxErrorKind::InvalidEscape, escape_start as u64)),
                            }
                            i += 6;
                        }
                    }
                    _ => return Err(SyntaxError::new(SyntaxErrorKind::InvalidEscape, escape_start as u64)),
                }
            }
            _ if b < 0x20 => return Err(SyntaxError::new(SyntaxErrorKind::InvalidCharacter, i as u64)),
            _ => {
                // Non-ASCII multi-byte UTF-8 (or, if invalid, handled per mode).
                let tail = &input[i..];
                match core::str::from_utf8(tail) {
                    Ok(s) => {
                        let c = s.chars().next().expect("non-empty tail has a char");
                        out.push(c);
                        i += c.len_utf8();
                    }
                    Err(e) if e.valid_up_to() > 0 => {
                        let s = core::str::from_utf8(&tail[..e.valid_up_to()]).expect("validated prefix");
                        let c = s.chars().next().expect("non-empty prefix has a char");
                        out.push(c);
                        i += c.len_utf8();
                    }
                    Err(e) => {
                        let needed = e.error_len();
                        match needed {
                            None => return Ok(Scan::Truncated { consumed: i }), // incomplete sequence at EOF of window
                            Some(bad_len) => {
                                if mode == Utf8Mode::Validate {
                                    return Err(SyntaxError::new(SyntaxErrorKind::InvalidUtf8, i as u64));
                                }
                                out.push('\u{FFFD}');
                                i += bad_len;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_fast_path() {
        assert_eq!(consume_simple_string(br#""hello""#), Some(7));
    }

    #[test]
    fn simple_fast_path_bails_on_escape() {
        assert_eq!(consume_simple_string(br#""a\"b""#), None);
    }

    #[test]
    fn resumable_decodes_escapes() {
        let mut out = String::new();
        let r = consume_string_resumable(br#""a\nb""#, 0, &mut out, Utf8Mode::Validate).unwrap();
        assert_eq!(r, Scan::Complete { value: (), consumed: 6 });
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn resumable_decodes_surrogate_pair() {
        let mut out = String::new();
        let input = br#""😀""#;
        let r = consume_string_resumable(input, 0, &mut out, Utf8Mode::Validate).unwrap();
        assert_eq!(r, Scan::Complete { value: (), consumed: input.len() });
        assert_eq!(out, "\u{1F600}");
    }

    #[test]
    fn unpaired_surrogate_errors_in_strict_mode() {
        let mut out = String::new();
        let input = br#""\uD800""#;
        assert!(consume_string_resumable(input, 0, &mut out, Utf8Mode::Validate).is_err());
    }

    #[test]
    fn truncated_escape_resumes_at_backslash() {
        let mut out = String::new();
        let r = consume_string_resumable(br#""ab\"#, 0, &mut out, Utf8Mode::Validate).unwrap();
        assert_eq!(r, Scan::Truncated { consumed: 3 });
        assert_eq!(out, "ab");
    }

    #[test]
    fn split_feeding_matches_whole() {
        let whole = r#""hello, éé world""#;
        let mut out_whole = String::new();
        let total = consume_string_resumable(whole.as_bytes(), 0, &mut out_whole, Utf8Mode::Validate)
            .unwrap();
        let Scan::Complete { consumed: total_len, .. } = total else {
            panic!()
        };

        for k in 1..whole.len() {
            let (a, b) = whole.as_bytes().split_at(k);
            let mut out = String::new();
            match consume_string_resumable(a, 0, &mut out, Utf8Mode::Validate) {
                Ok(Scan::Complete { .. }) => continue,
                Ok(Scan::Truncated { consumed }) => {
                    let mut combined = a.to_vec();
                    combined.extend_from_slice(b);
                    let r2 =
                        consume_string_resumable(&combined, consumed, &mut out, Utf8Mode::Validate)
                            .unwrap();
                    assert_eq!(r2, Scan::Complete { value: (), consumed: total_len });
                    assert_eq!(out, out_whole);
                }
                Err(e) => panic!("unexpected error at split {k}: {e:?}"),
            }
        }
    }
}
