//! Scalar cell values.

use std::fmt;

use polars::prelude::AnyValue;

use crate::anyvalue::{any_to_string, format_numeric, parse_f64, parse_i64};

/// A single cell taken out of a planning or ledger frame.
///
/// `Float(NaN)` is kept as read; [`FieldValue::is_null`] treats it as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Dates, datetimes and any other dtype, kept as their display string.
    Other(String),
}

impl FieldValue {
    pub fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Null,
            AnyValue::Boolean(b) => Self::Boolean(b),
            AnyValue::Int8(v) => Self::Integer(i64::from(v)),
            AnyValue::Int16(v) => Self::Integer(i64::from(v)),
            AnyValue::Int32(v) => Self::Integer(i64::from(v)),
            AnyValue::Int64(v) => Self::Integer(v),
            AnyValue::UInt8(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt16(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt32(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt64(v) => match i64::try_from(v) {
                Ok(v) => Self::Integer(v),
                Err(_) => Self::Float(v as f64),
            },
            AnyValue::Float32(v) => Self::Float(f64::from(v)),
            AnyValue::Float64(v) => Self::Float(v),
            AnyValue::String(s) => Self::Text(s.to_string()),
            AnyValue::StringOwned(s) => Self::Text(s.to_string()),
            other => Self::Other(any_to_string(other)),
        }
    }

    /// True for a missing value or a float NaN.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value. Text is parsed; unparsable text is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Self::Null | Self::Other(_) => None,
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => parse_f64(s),
        };
        number.filter(|v| !v.is_nan())
    }

    /// Integer view of the value. Finite floats truncate toward zero; text
    /// must be an integer literal.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Null | Self::Other(_) => None,
            Self::Integer(v) => Some(*v),
            Self::Float(v) if v.is_finite() && v.abs() < i64::MAX as f64 => Some(v.trunc() as i64),
            Self::Float(_) => None,
            Self::Boolean(b) => Some(i64::from(*b)),
            Self::Text(s) => parse_i64(s),
        }
    }

    /// Textual view of the value. `None` for null.
    pub fn as_text(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Value equality as the comparators see it.
    ///
    /// Integers and floats compare numerically with each other; text never
    /// equals a number. No trimming or case folding is applied.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Other(a), Self::Other(b)) => a == b,
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }

    pub fn to_any(&self) -> AnyValue<'_> {
        match self {
            Self::Null => AnyValue::Null,
            Self::Text(s) | Self::Other(s) => AnyValue::String(s.as_str()),
            Self::Integer(v) => AnyValue::Int64(*v),
            Self::Float(v) => AnyValue::Float64(*v),
            Self::Boolean(b) => AnyValue::Boolean(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) | Self::Other(s) => f.write_str(s),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_numeric(*v)),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
