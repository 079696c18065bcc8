use crate::csv_processor::{ColumnConfig, ColumnSpec, ExportOptions, ImportOptions};
use crate::format::{DateStyle, DEFAULT_DATE_LOCALE, DEFAULT_DATE_PATTERN};
use crate::utils::errors::{CodecError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub import: ImportDefaults,
    pub export: ExportDefaults,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportDefaults {
    pub delimiter: char,
    pub quote: char,
    pub header: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    pub delimiter: char,
    pub quote: char,
    pub use_quotes: bool,
    pub header: bool,
    pub line_ending: String,
    pub sanitize_formulas: bool,
    pub date_locale: String,
    pub date_pattern: String,
    pub detect_dates: bool,
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        let options = ImportOptions::default();
        Self {
            delimiter: options.delimiter,
            quote: options.quote,
            header: options.header,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            use_quotes: true,
            header: false,
            line_ending: "\n".to_string(),
            sanitize_formulas: false,
            date_locale: DEFAULT_DATE_LOCALE.to_string(),
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            detect_dates: false,
            columns: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl ImportDefaults {
    pub fn to_options(&self) -> ImportOptions {
        ImportOptions {
            delimiter: self.delimiter,
            quote: self.quote,
            header: self.header,
        }
    }
}

impl ExportDefaults {
    pub fn to_options(&self) -> Result<ExportOptions> {
        Ok(ExportOptions {
            delimiter: self.delimiter,
            quote: self.quote,
            use_quotes: self.use_quotes,
            header: self.header,
            line_ending: self.line_ending.clone(),
            sanitize_formulas: self.sanitize_formulas,
            date_style: DateStyle::new(&self.date_locale, self.date_pattern.clone())?,
        })
    }

    pub fn column_specs(&self) -> Result<Vec<ColumnSpec>> {
        self.columns.iter().cloned().map(ColumnSpec::try_from).collect()
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CodecError::ConfigError(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CodecError::ConfigError(e.to_string()))
    }

    /// Falls back to defaults when the file is missing; a file that exists
    /// but does not parse is still an error.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) if std::path::Path::new(p).exists() => Self::load_from_file(p),
            _ => Ok(Self::default()),
        }
    }
}
