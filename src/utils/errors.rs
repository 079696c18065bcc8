use crate::accessor::PropertyAccessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No data parsed yet")]
    NoDataParsed,

    #[error("Invalid format template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid column spec {spec:?}: {reason}")]
    InvalidColumn { spec: String, reason: String },

    #[error("Invalid date locale: {0}")]
    InvalidLocale(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Failure to render a single export field. Never escapes the exporter:
/// the field is logged and written blank.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldRenderError {
    #[error(transparent)]
    Property(#[from] PropertyAccessError),

    #[error("substring requires a text value, found {found}")]
    NotText { found: &'static str },

    #[error("substring [{start:?}, {end:?}) out of range for value of length {len}")]
    SubstringOutOfRange {
        start: Option<usize>,
        end: Option<usize>,
        len: usize,
    },

    #[error("format failed: {0}")]
    Format(String),
}
