//! Canonical item identifiers.
//!
//! Source data encodes article ids as integers, floats or strings with and without
//! leading zeros. Every id is folded into a single fixed-width form before it is
//! used as a key, compared, or handed back to a caller.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Width of the canonical item identifier.
pub const ITEM_ID_WIDTH: usize = 10;

/// A normalized, zero-padded item identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Normalize a raw textual identifier. Never fails.
    pub fn normalize(raw: &str) -> Self {
        normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Canonicalize a textual identifier.
///
/// Integer-parseable input (surrounding whitespace and a sign allowed) is rendered
/// as its decimal value; anything else keeps its raw text. Either way the result is
/// zero-padded on the left to [`ITEM_ID_WIDTH`] characters.
pub fn normalize(raw: &str) -> ItemId {
    match raw.trim().parse::<i128>() {
        Ok(value) => ItemId(zero_pad(&value.to_string())),
        Err(_) => ItemId(zero_pad(raw)),
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId(zero_pad(&value.to_string()))
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        ItemId(zero_pad(&value.to_string()))
    }
}

impl From<f64> for ItemId {
    /// Integral conversion truncates toward zero; non-finite values fall back to text.
    fn from(value: f64) -> Self {
        if value.is_finite() {
            return ItemId(zero_pad(&(value.trunc() as i128).to_string()));
        }
        let text = if value.is_nan() {
            "nan"
        } else if value.is_sign_negative() {
            "-inf"
        } else {
            "inf"
        };
        ItemId(zero_pad(text))
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        normalize(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        normalize(&value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Any id shape found in artifact files.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl From<RawItemId> for ItemId {
    fn from(raw: RawItemId) -> Self {
        match raw {
            RawItemId::Integer(value) => value.into(),
            RawItemId::Unsigned(value) => value.into(),
            RawItemId::Float(value) => value.into(),
            RawItemId::Text(value) => normalize(&value),
        }
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawItemId::deserialize(deserializer).map(ItemId::from)
    }
}

/// Left-pad with zeros, keeping a leading sign in front of the padding.
fn zero_pad(value: &str) -> String {
    let len = value.chars().count();
    if len >= ITEM_ID_WIDTH {
        return value.to_owned();
    }

    let fill = "0".repeat(ITEM_ID_WIDTH - len);
    match value.strip_prefix(['+', '-']) {
        Some(rest) => {
            let sign = &value[..1];
            format!("{sign}{fill}{rest}")
        }
        None => format!("{fill}{value}"),
    }
}
