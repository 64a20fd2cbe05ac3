//! [`Value`]: the dynamic "any" JSON-native type used by the `any`-typed
//! fast path.
//!
//! Same six-variant shape as a plain streaming JSON value type (`BTreeMap`-
//! backed object, `serde` behind a feature gate for interop/tests), but
//! retargeted: here `Value` is one concrete binding target among many
//! (reached through [`crate::bind`]), not a parser's sole output type.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// A JSON object as an ordered string-keyed map.
pub type Map = BTreeMap<String, Value>;
/// A JSON array.
pub type Array = Vec<Value>;

/// Any valid JSON value, per RFC 8259.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A JSON number, always represented as `f64`.
    Number(f64),
    /// A JSON string.
    String(String),
    /// A JSON array.
    Array(Array),
    /// A JSON object.
    Object(Map),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Object(v)
    }
}

impl Value {
    /// The token [`crate::kind::Kind`] this value would be emitted as.
    #[must_use]
    pub fn kind(&self) -> crate::kind::Kind {
        use crate::kind::Kind;
        match self {
            Value::Null => Kind::Null,
            Value::Bool(true) => Kind::True,
            Value::Bool(false) => Kind::False,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::ArrayStart,
            Value::Object(_) => Kind::ObjectStart,
        }
    }

    /// The inner string, if this is [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The inner number, if this is [`Value::Number`].
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The inner array, if this is [`Value::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The inner object, if this is [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                let mut s = String::new();
                crate::scanner::append_float(&mut s, *n);
                f.write_str(&s)
            }
            Value::String(s) => {
                let mut out = Vec::new();
                crate::scanner::append_quote(&mut out, s, crate::scanner::format::QuoteMode::Canonical);
                f.write_str(&String::from_utf8(out).expect("append_quote emits valid utf-8"))
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let mut out = Vec::new();
                    crate::scanner::append_quote(&mut out, k, crate::scanner::format::QuoteMode::Canonical);
                    f.write_str(&String::from_utf8(out).expect("append_quote emits valid utf-8"))?;
                    f.write_str(":")?;
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_compact_json() {
        let mut m = Map::new();
        m.insert("a".to_string(), Value::Number(1.0));
        let v = Value::Object(m);
        assert_eq!(v.to_string(), r#"{"a":1}"#);
    }
}
