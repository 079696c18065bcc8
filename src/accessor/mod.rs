//! Property lookup used by the exporter.
//!
//! A [`PropertyAccessor`] resolves a dotted path such as `customer.address.city`
//! against a row object and yields a [`FieldValue`]. Accessors are explicit:
//! [`JsonAccessor`] walks `serde_json::Value` trees structurally,
//! [`PropertyMap`] is a per-type registry of getters, [`RecordAccessor`]
//! reads imported [`RowRecord`]s and [`FnAccessor`] adapts a closure.

mod json;
mod registry;

pub use json::JsonAccessor;
pub use registry::PropertyMap;

use crate::csv_processor::RowRecord;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyAccessError {
    #[error("no property {path:?}")]
    Missing { path: String },

    #[error("cannot read {segment:?} of {path:?}: parent is not an object or array")]
    NotTraversable { path: String, segment: String },

    #[error("property {path:?}: {reason}")]
    Failed { path: String, reason: String },
}

impl PropertyAccessError {
    pub fn missing(path: impl Into<String>) -> Self {
        PropertyAccessError::Missing { path: path.into() }
    }
}

/// A resolved property value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Calendar date of a date or date-time value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

pub trait PropertyAccessor<R: ?Sized> {
    fn resolve(&self, row: &R, path: &str) -> Result<FieldValue, PropertyAccessError>;
}

impl<R: ?Sized, A: PropertyAccessor<R> + ?Sized> PropertyAccessor<R> for &A {
    fn resolve(&self, row: &R, path: &str) -> Result<FieldValue, PropertyAccessError> {
        (**self).resolve(row, path)
    }
}

/// Adapts a closure `Fn(&R, &str) -> Result<FieldValue, PropertyAccessError>`.
pub struct FnAccessor<F>(pub F);

impl<R: ?Sized, F> PropertyAccessor<R> for FnAccessor<F>
where
    F: Fn(&R, &str) -> Result<FieldValue, PropertyAccessError>,
{
    fn resolve(&self, row: &R, path: &str) -> Result<FieldValue, PropertyAccessError> {
        (self.0)(row, path)
    }
}

/// Reads imported rows back by key, so parsed data can be re-exported.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAccessor;

impl PropertyAccessor<RowRecord> for RecordAccessor {
    fn resolve(&self, row: &RowRecord, path: &str) -> Result<FieldValue, PropertyAccessError> {
        row.get(path)
            .map(FieldValue::from)
            .ok_or_else(|| PropertyAccessError::missing(path))
    }
}
