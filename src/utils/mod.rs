pub mod config;
pub mod errors;

pub use config::{AppConfig, ExportDefaults, ImportDefaults, LoggingConfig};
pub use errors::{CodecError, FieldRenderError, Result};

/// Neutralizes spreadsheet formula injection by prefixing `'`.
pub fn sanitize_cell(value: &str) -> String {
    if value.starts_with('=')
        || value.starts_with('+')
        || value.starts_with('-')
        || value.starts_with('@')
    {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}
