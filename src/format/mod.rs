//! Single-value formatting for export columns.

mod template;

pub use template::TemplateFormatter;

use crate::accessor::FieldValue;
use crate::utils::{CodecError, FieldRenderError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{Locale, NaiveDate};
use std::fmt::{Debug, Display, Write};

pub const DEFAULT_DATE_LOCALE: &str = "it_IT";
pub const DEFAULT_DATE_PATTERN: &str = "%d %b %Y";

/// Renders one resolved value to text. Attached per column.
pub trait ValueFormatter: Debug + Send + Sync {
    fn format(&self, value: &FieldValue) -> std::result::Result<String, FieldRenderError>;
}

/// Chrono panics when displaying a pattern it cannot parse, so patterns are
/// checked up front.
pub(crate) fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Renders a chrono delayed format. A pattern asking for fields the value
/// lacks (`%H` on a plain date) fails here instead of panicking.
pub(crate) fn render_pattern(formatted: impl Display) -> std::result::Result<String, FieldRenderError> {
    let mut out = String::new();
    write!(out, "{}", formatted)
        .map_err(|_| FieldRenderError::Format("date pattern uses fields the value does not have".to_string()))?;
    Ok(out)
}

/// How date and date-time values are rendered when a column has no formatter.
///
/// Defaults to the Italian medium date style (`07 mar 2010`).
#[derive(Debug, Clone)]
pub struct DateStyle {
    locale: Locale,
    pattern: String,
}

impl DateStyle {
    pub fn new(locale: &str, pattern: impl Into<String>) -> Result<Self> {
        let locale = Locale::try_from(locale)
            .map_err(|_| CodecError::InvalidLocale(locale.to_string()))?;
        let pattern = pattern.into();
        if !is_valid_pattern(&pattern) {
            return Err(CodecError::InvalidTemplate {
                template: pattern,
                reason: "invalid date pattern".to_string(),
            });
        }
        Ok(Self { locale, pattern })
    }

    pub fn format(&self, date: NaiveDate) -> std::result::Result<String, FieldRenderError> {
        render_pattern(date.format_localized(&self.pattern, self.locale))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            locale: Locale::it_IT,
            pattern: DEFAULT_DATE_PATTERN.to_string(),
        }
    }
}
