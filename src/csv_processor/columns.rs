use crate::format::{TemplateFormatter, ValueFormatter};
use crate::utils::{CodecError, FieldRenderError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Half-open `[start, end)` character range. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstringRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl SubstringRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(CodecError::InvalidColumn {
                    spec: format!("{}..{}", s, e),
                    reason: "substring start is after end".to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    pub fn apply(&self, text: &str) -> std::result::Result<String, FieldRenderError> {
        let len = text.chars().count();
        let start = self.start.unwrap_or(0);
        let end = self.end.unwrap_or(len);
        if start > end || end > len {
            return Err(FieldRenderError::SubstringOutOfRange {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(text.chars().skip(start).take(end - start).collect())
    }
}

/// One export column. Order in the exporter is output order.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    path: String,
    title: String,
    formatter: Option<Arc<dyn ValueFormatter>>,
    substring: Option<SubstringRange>,
}

impl ColumnSpec {
    /// Column reading `path`, titled with the path itself.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            title: path.clone(),
            path,
            formatter: None,
            substring: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_format(self, template: &str) -> Result<Self> {
        Ok(self.with_formatter(Arc::new(TemplateFormatter::parse(template)?)))
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Sets the substring range; with both bounds open the column is left unsliced.
    pub fn with_substring(mut self, start: Option<usize>, end: Option<usize>) -> Result<Self> {
        self.substring = if start.is_none() && end.is_none() {
            None
        } else {
            Some(SubstringRange::new(start, end)?)
        };
        Ok(self)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn formatter(&self) -> Option<&dyn ValueFormatter> {
        self.formatter.as_deref()
    }

    pub fn substring(&self) -> Option<SubstringRange> {
        self.substring
    }
}

/// Command-line form: `path[=Title][@start..end]`, e.g. `name=Name@0..3`.
impl FromStr for ColumnSpec {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| CodecError::InvalidColumn {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let (head, range) = match s.rsplit_once('@') {
            Some((head, range)) => (head, Some(range)),
            None => (s, None),
        };
        let (path, title) = match head.split_once('=') {
            Some((path, title)) => (path.trim(), Some(title.trim())),
            None => (head.trim(), None),
        };
        if path.is_empty() {
            return Err(invalid("empty property path"));
        }

        let mut column = ColumnSpec::new(path);
        if let Some(title) = title {
            column = column.with_title(title);
        }
        if let Some(range) = range {
            let (start, end) = range
                .split_once("..")
                .ok_or_else(|| invalid("range must look like start..end"))?;
            let bound = |b: &str| -> Result<Option<usize>> {
                let b = b.trim();
                if b.is_empty() {
                    Ok(None)
                } else {
                    b.parse().map(Some).map_err(|_| invalid("range bounds must be non-negative integers"))
                }
            };
            column = column.with_substring(bound(start)?, bound(end)?)?;
        }
        Ok(column)
    }
}

/// Serialized column definition, as found in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

impl TryFrom<ColumnConfig> for ColumnSpec {
    type Error = CodecError;

    fn try_from(config: ColumnConfig) -> Result<Self> {
        let mut column = ColumnSpec::new(config.path);
        if let Some(title) = config.title {
            column = column.with_title(title);
        }
        if let Some(format) = config.format {
            column = column.with_format(&format)?;
        }
        column.with_substring(config.start, config.end)
    }
}
