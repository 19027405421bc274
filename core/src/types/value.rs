use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map of a study, a series, or the options supplied by the caller
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Value of a single study/series attribute
///
/// Mirrors the shapes found in image metadata: numbers (frame counts,
/// indices), strings (descriptions, UIDs) and multi-valued lists
/// (e.g. ModalitiesInStudy).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(untagged))]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns whether this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric view of the value
    ///
    /// Numeric strings are parsed (DICOM IS/DS values arrive as text);
    /// a single-element list yields its element.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok(),
            AttributeValue::List(items) if items.len() == 1 => items[0].as_number(),
            _ => None,
        }
    }

    /// String form used by the substring constraints
    ///
    /// Lists and nulls have no single string form.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            AttributeValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            AttributeValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            AttributeValue::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            AttributeValue::Null | AttributeValue::List(_) => None,
        }
    }

    /// Exact equality, looking through single-element lists
    pub fn matches_exactly(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::List(a), AttributeValue::List(b)) => a == b,
            (AttributeValue::List(items), scalar) | (scalar, AttributeValue::List(items))
                if items.len() == 1 =>
            {
                items[0] == *scalar
            }
            (a, b) => a == b,
        }
    }

    /// Applies a string predicate to the value, or to any element of a list
    pub fn any_text(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.any_text_with(&predicate)
    }

    fn any_text_with(&self, predicate: &dyn Fn(&str) -> bool) -> bool {
        match self {
            AttributeValue::List(items) => items.iter().any(|item| item.any_text_with(predicate)),
            other => other.as_text().map(|s| predicate(&s)).unwrap_or(false),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            other => write!(f, "{}", other.as_text().unwrap_or_default()),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<u32> for AttributeValue {
    fn from(n: u32) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<usize> for AttributeValue {
    fn from(n: usize) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }
}
