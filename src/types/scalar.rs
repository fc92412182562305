use chrono::NaiveDateTime;
use serde_derive::Serialize;
use std::collections::BTreeMap;

/// A single value captured from an aggregate query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

/// One result row: column label -> value.
pub type Row = BTreeMap<String, Scalar>;

impl Scalar {
    pub fn is_null(self: &Self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_i64(self: &Self) -> Option<i64> {
        match self {
            Scalar::Integer(value) => Some(*value),
            Scalar::Decimal(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_f64(self: &Self) -> Option<f64> {
        match self {
            Scalar::Integer(value) => Some(*value as f64),
            Scalar::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(self: &Self) -> Option<&str> {
        match self {
            Scalar::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(self: &Self) -> Option<NaiveDateTime> {
        match self {
            Scalar::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Decimal(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.into())
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::Timestamp(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}
