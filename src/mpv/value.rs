//! Loosely typed property values exchanged with libmpv
//!
//! libmpv hands out `mpv_node` trees whose shape depends on the property.
//! [`MpvValue`] mirrors that tree and offers the lenient coercions the
//! facade needs to turn it into strongly typed results.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A value as stored in mpv's property system
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum MpvValue {
    /// No value; also what a failed query looks like
    #[default]
    None,
    Flag(bool),
    Int64(i64),
    Double(f64),
    String(String),
    List(Vec<MpvValue>),
    Map(BTreeMap<String, MpvValue>),
}

static NONE: MpvValue = MpvValue::None;

impl MpvValue {
    pub fn is_none(&self) -> bool {
        matches!(self, MpvValue::None)
    }

    /// Coerce to a flag.
    ///
    /// Strings count as true unless they are empty, `0`, `false` or `no`.
    pub fn to_bool(&self) -> bool {
        match self {
            MpvValue::Flag(b) => *b,
            MpvValue::Int64(i) => *i != 0,
            MpvValue::Double(d) => *d != 0.0,
            MpvValue::String(s) => {
                let s = s.trim();
                !(s.is_empty()
                    || s == "0"
                    || s.eq_ignore_ascii_case("false")
                    || s.eq_ignore_ascii_case("no"))
            }
            MpvValue::None | MpvValue::List(_) | MpvValue::Map(_) => false,
        }
    }

    /// Coerce to an integer. Doubles are rounded to the nearest integer.
    pub fn to_i64(&self) -> i64 {
        match self {
            MpvValue::Flag(b) => i64::from(*b),
            MpvValue::Int64(i) => *i,
            MpvValue::Double(d) => round_to_i64(*d),
            MpvValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(round_to_i64))
                    .unwrap_or(0)
            }
            MpvValue::None | MpvValue::List(_) | MpvValue::Map(_) => 0,
        }
    }

    /// Coerce to a double. Non-finite results collapse to zero.
    pub fn to_f64(&self) -> f64 {
        let value = match self {
            MpvValue::Flag(b) => f64::from(u8::from(*b)),
            MpvValue::Int64(i) => *i as f64,
            MpvValue::Double(d) => *d,
            MpvValue::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            MpvValue::None | MpvValue::List(_) | MpvValue::Map(_) => 0.0,
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// Coerce to text. Flags use mpv's own `yes`/`no` spelling.
    pub fn to_text(&self) -> String {
        match self {
            MpvValue::String(s) => s.clone(),
            MpvValue::Flag(b) => String::from(if *b { "yes" } else { "no" }),
            MpvValue::Int64(i) => i.to_string(),
            MpvValue::Double(d) => d.to_string(),
            MpvValue::None | MpvValue::List(_) | MpvValue::Map(_) => String::new(),
        }
    }

    /// The list elements, or nothing when this is not a list
    pub fn as_list(&self) -> &[MpvValue] {
        match self {
            MpvValue::List(items) => items,
            _ => &[],
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MpvValue>> {
        match self {
            MpvValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key of a map value; missing keys yield [`MpvValue::None`]
    pub fn get(&self, key: &str) -> &MpvValue {
        self.as_map().and_then(|map| map.get(key)).unwrap_or(&NONE)
    }

    /// Compare against `other` after coercing to `other`'s type.
    ///
    /// This is how a write is recognised as redundant: mpv may report
    /// `volume` as a double while the caller writes an integer.
    pub fn loosely_equals(&self, other: &MpvValue) -> bool {
        match other {
            MpvValue::None => self.is_none(),
            MpvValue::Flag(b) => !self.is_none() && self.to_bool() == *b,
            MpvValue::Int64(i) => !self.is_none() && self.to_i64() == *i,
            MpvValue::Double(d) => !self.is_none() && self.to_f64() == *d,
            MpvValue::String(s) => !self.is_none() && self.to_text() == *s,
            MpvValue::List(_) | MpvValue::Map(_) => self == other,
        }
    }
}

fn round_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

impl fmt::Display for MpvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpvValue::None => write!(f, "<none>"),
            MpvValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            MpvValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<bool> for MpvValue {
    fn from(value: bool) -> Self {
        MpvValue::Flag(value)
    }
}

impl From<i64> for MpvValue {
    fn from(value: i64) -> Self {
        MpvValue::Int64(value)
    }
}

impl From<i32> for MpvValue {
    fn from(value: i32) -> Self {
        MpvValue::Int64(i64::from(value))
    }
}

impl From<f64> for MpvValue {
    fn from(value: f64) -> Self {
        MpvValue::Double(value)
    }
}

impl From<&str> for MpvValue {
    fn from(value: &str) -> Self {
        MpvValue::String(value.to_string())
    }
}

impl From<String> for MpvValue {
    fn from(value: String) -> Self {
        MpvValue::String(value)
    }
}

impl From<Vec<MpvValue>> for MpvValue {
    fn from(value: Vec<MpvValue>) -> Self {
        MpvValue::List(value)
    }
}

impl From<BTreeMap<String, MpvValue>> for MpvValue {
    fn from(value: BTreeMap<String, MpvValue>) -> Self {
        MpvValue::Map(value)
    }
}

/// Build a [`MpvValue::Map`] from key/value pairs
pub fn map<K, V, I>(entries: I) -> MpvValue
where
    K: Into<String>,
    V: Into<MpvValue>,
    I: IntoIterator<Item = (K, V)>,
{
    MpvValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}
