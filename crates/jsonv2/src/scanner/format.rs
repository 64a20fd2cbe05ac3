//! Byte emission: quoting strings and formatting numbers for the encoder
//! and for [`crate::raw`] canonicalization.

use alloc::string::String;
use alloc::vec::Vec;

/// Escaping strategy for [`append_quote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteMode {
    /// Minimal escaping: only what JSON requires (`"`, `\`, control chars).
    Canonical,
    /// Escape everything [`QuoteMode::Canonical`] does, plus runs needed for
    /// safe embedding in HTML (`<`, `>`, `&`, U+2028, U+2029).
    Html,
}

/// Emits `s` as a quoted JSON string into `out`. Control characters below
/// `0x20` and the mandatory `"`/`\` use short escapes where one exists
/// (`\n \t \" \\ \b \f \r`), else `\u00XX`. A lone UTF-16 surrogate-half code
/// point (only reachable if `s` was built from invalid input upstream with
/// `AllowInvalidUTF8`) is emitted as `\uDXXX`; invalid UTF-8 bytes (possible
/// only via unsafe construction) are replaced with U+FFFD and an error flag
/// is set in the return value so the caller can still observe the emitted
/// bytes and decide what to do.
pub fn append_quote(out: &mut Vec<u8>, s: &str, mode: QuoteMode) -> bool {
    let mut had_invalid = false;
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\u{8}' => out.extend_from_slice(b"\\b"),
            '\u{c}' => out.extend_from_slice(b"\\f"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format_args!("\\u{:04x}", c as u32).to_string().as_bytes());
            }
            '<' | '>' | '&' if mode == QuoteMode::Html => {
                out.extend_from_slice(format_args!("\\u{:04x}", c as u32).to_string().as_bytes());
            }
            '\u{2028}' | '\u{2029}' if mode == QuoteMode::Html => {
                out.extend_from_slice(format_args!("\\u{:04x}", c as u32).to_string().as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
    had_invalid
}

/// ECMA-262 `Number::toString`-compatible rendering for a 64-bit float, per
/// RFC 8785 §3.2.2.3, except that `-0` is preserved (the RFC normalizes `-0`
/// to `0`; this crate treats that normalization as a `canonicalize`-only
/// step, not something every number formatter must do — see
/// [`crate::raw::canonicalize`]). Uses exponential notation when
/// `|x| < 1e-6` or `|x| >= 1e21`, then normalizes `e-09`-style exponents to
/// `e-9`.
#[must_use]
pub fn append_float(out: &mut String, x: f64) {
    if x == 0.0 {
        out.push_str(if x.is_sign_negative() { "-0" } else { "0" });
        return;
    }
    if x.is_nan() || x.is_infinite() {
        // Defaults reject non-finite floats before reaching here; this path
        // is only reachable via the `nonfinite` struct-tag format option,
        // handled by the caller which supplies the literal string itself.
        // Render a safe fallback.
        out.push_str(if x.is_nan() {
            "null"
        } else if x > 0.0 {
            "null"
        } else {
            "null"
        });
        return;
    }

    let abs = x.abs();
    let use_exponential = !(1e-6..1e21).contains(&abs);
    let mut rendered = if use_exponential {
        alloc::format!("{x:e}")
    } else {
        alloc::format!("{x}")
    };

    if use_exponential {
        // Rust renders `1e21` as `1e21`; normalize `e0` => drop, and strip a
        // leading zero in two-digit exponents (`e-09` => `e-9`), matching
        // RFC 8785's requirement for no unnecessary leading zeros.
        if let Some(epos) = rendered.find('e') {
            let (mantissa, exp) = rendered.split_at(epos);
            let exp = &exp[1..];
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ("-", d),
                None => ("+", exp.strip_prefix('+').unwrap_or(exp)),
            };
            let digits = digits.trim_start_matches('0');
            let digits = if digits.is_empty() { "0" } else { digits };
            let sign = if sign == "+" { "+" } else { "-" };
            rendered = alloc::format!("{mantissa}e{sign}{digits}");
        }
    }
    out.push_str(&rendered);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_control_and_mandatory_chars() {
        let mut out = Vec::new();
        append_quote(&mut out, "a\"b\\c\nd", QuoteMode::Canonical);
        assert_eq!(out, br#""a\"b\\c\nd""#);
    }

    #[test]
    fn html_mode_escapes_angle_brackets() {
        let mut out = Vec::new();
        append_quote(&mut out, "<script>", QuoteMode::Html);
        assert_eq!(out, br#""\u003cscript\u003e""#);
    }

    #[test]
    fn canonical_mode_leaves_angle_brackets() {
        let mut out = Vec::new();
        append_quote(&mut out, "<ok>", QuoteMode::Canonical);
        assert_eq!(out, br#""<ok>""#);
    }

    #[test]
    fn float_small_and_large_use_exponent() {
        let mut out = String::new();
        append_float(&mut out, 1e-7);
        assert!(out.contains('e'));
        out.clear();
        append_float(&mut out, 1e21);
        assert!(out.contains('e'));
    }

    #[test]
    fn float_preserves_negative_zero() {
        let mut out = String::new();
        append_float(&mut out, -0.0);
        assert_eq!(out, "-0");
    }

    #[test]
    fn float_normalizes_exponent_leading_zero() {
        let mut out = String::new();
        append_float(&mut out, 1e-9);
        assert_eq!(out, "1e-9");
    }
}
