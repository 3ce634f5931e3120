//! Scalar values used by term-level queries, sort cursors and bulk metadata

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single JSON scalar as accepted by `term`, `terms`, `fuzzy` and
/// `search_after`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Long(i64),
    /// Above `i64::MAX`, for `unsigned_long` fields.
    ULong(u64),
    Double(f64),
    String(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Long(n) => write!(f, "{n}"),
            FieldValue::ULong(n) => write!(f, "{n}"),
            FieldValue::Double(n) => write!(f, "{n}"),
            FieldValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// Conversion into a [`FieldValue`] that yields `None` for absent input.
///
/// Blank strings, `None`, [`FieldValue::Null`] and non-finite floats all
/// map to `None`, which makes the enclosing clause disappear.
pub trait IntoFieldValue {
    fn into_field_value(self) -> Option<FieldValue>;
}

/// Free-function form of [`IntoFieldValue::into_field_value`].
pub fn to_field_value_or_none<V: IntoFieldValue>(value: V) -> Option<FieldValue> {
    value.into_field_value()
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self) -> Option<FieldValue> {
        match self {
            FieldValue::Null => None,
            FieldValue::String(s) => s.into_field_value(),
            FieldValue::Double(n) => n.into_field_value(),
            other => Some(other),
        }
    }
}

impl IntoFieldValue for &str {
    fn into_field_value(self) -> Option<FieldValue> {
        crate::util::non_blank(self).map(FieldValue::String)
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self) -> Option<FieldValue> {
        if self.trim().is_empty() {
            None
        } else {
            Some(FieldValue::String(self))
        }
    }
}

impl IntoFieldValue for &String {
    fn into_field_value(self) -> Option<FieldValue> {
        self.as_str().into_field_value()
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::Bool(self))
    }
}

macro_rules! impl_long {
    ($($t:ty),*) => {
        $(
            impl IntoFieldValue for $t {
                fn into_field_value(self) -> Option<FieldValue> {
                    Some(FieldValue::Long(i64::from(self)))
                }
            }
        )*
    };
}

impl_long!(i8, i16, i32, i64, u8, u16, u32);

impl IntoFieldValue for u64 {
    fn into_field_value(self) -> Option<FieldValue> {
        match i64::try_from(self) {
            Ok(n) => Some(FieldValue::Long(n)),
            Err(_) => Some(FieldValue::ULong(self)),
        }
    }
}

impl IntoFieldValue for usize {
    fn into_field_value(self) -> Option<FieldValue> {
        (self as u64).into_field_value()
    }
}

impl IntoFieldValue for f64 {
    fn into_field_value(self) -> Option<FieldValue> {
        self.is_finite().then_some(FieldValue::Double(self))
    }
}

impl IntoFieldValue for f32 {
    fn into_field_value(self) -> Option<FieldValue> {
        f64::from(self).into_field_value()
    }
}

impl<Tz: TimeZone> IntoFieldValue for DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::String(self.to_rfc3339()))
    }
}

impl IntoFieldValue for NaiveDate {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue::String(self.format("%Y-%m-%d").to_string()))
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn into_field_value(self) -> Option<FieldValue> {
        self.and_then(IntoFieldValue::into_field_value)
    }
}

macro_rules! impl_from {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from!(Long: i32, i64, u32);
impl_from!(Double: f32, f64);
impl_from!(Bool: bool);
impl_from!(String: &str, String);
