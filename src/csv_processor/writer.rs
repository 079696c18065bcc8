use crate::accessor::{FieldValue, PropertyAccessor};
use crate::csv_processor::columns::ColumnSpec;
use crate::format::DateStyle;
use crate::utils::{sanitize_cell, FieldRenderError, Result};
use std::io::Write;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub delimiter: char,
    pub quote: char,
    /// Wrap every header title and rendered field in `quote`.
    pub use_quotes: bool,
    /// Emit a line of column titles first.
    pub header: bool,
    pub line_ending: String,
    pub sanitize_formulas: bool,
    /// Rendering of date values in columns without a formatter.
    pub date_style: DateStyle,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            use_quotes: true,
            header: false,
            line_ending: "\n".to_string(),
            sanitize_formulas: false,
            date_style: DateStyle::default(),
        }
    }
}

/// Column-driven CSV writer.
///
/// Every row gets one field per column, in column order. A field whose
/// property cannot be resolved or rendered is logged and left blank; the
/// rest of the row and the export carry on. Only I/O failures on the
/// output are returned. The output writer belongs to the caller: it is
/// flushed, never closed.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    options: ExportOptions,
    columns: Vec<ColumnSpec>,
    name: Option<String>,
}

impl CsvExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            columns: Vec::new(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn content_type(&self) -> &'static str {
        CSV_CONTENT_TYPE
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn add_column(&mut self, column: ColumnSpec) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn add_property(&mut self, path: &str) -> &mut Self {
        self.add_column(ColumnSpec::new(path))
    }

    pub fn add_titled_property(&mut self, path: &str, title: &str) -> &mut Self {
        self.add_column(ColumnSpec::new(path).with_title(title))
    }

    pub fn add_formatted_property(&mut self, path: &str, title: &str, template: &str) -> Result<&mut Self> {
        let column = ColumnSpec::new(path).with_title(title).with_format(template)?;
        Ok(self.add_column(column))
    }

    pub fn add_substring_property(
        &mut self,
        path: &str,
        start: Option<usize>,
        end: Option<usize>,
    ) -> Result<&mut Self> {
        let column = ColumnSpec::new(path).with_substring(start, end)?;
        Ok(self.add_column(column))
    }

    /// Writes the header (if enabled) and one line per row. Returns the
    /// number of data rows written.
    pub fn write<'r, R, A, W>(
        &self,
        rows: impl IntoIterator<Item = &'r R>,
        accessor: &A,
        out: &mut W,
    ) -> Result<usize>
    where
        R: 'r + ?Sized,
        A: PropertyAccessor<R> + ?Sized,
        W: Write + ?Sized,
    {
        let mut line = String::new();

        if self.options.header {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    line.push(self.options.delimiter);
                }
                self.push_quoted(&mut line, column.title());
            }
            line.push_str(&self.options.line_ending);
            out.write_all(line.as_bytes())?;
        }

        let mut written = 0;
        for (index, row) in rows.into_iter().enumerate() {
            line.clear();
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    line.push(self.options.delimiter);
                }
                match self.render_field(row, column, accessor) {
                    Ok(text) if self.options.sanitize_formulas => {
                        self.push_quoted(&mut line, &sanitize_cell(&text))
                    }
                    Ok(text) => self.push_quoted(&mut line, &text),
                    Err(e) => {
                        tracing::warn!(
                            row = index,
                            column = column.path(),
                            error = %e,
                            "Failed to render field, leaving it blank"
                        );
                    }
                }
            }
            line.push_str(&self.options.line_ending);
            out.write_all(line.as_bytes())?;
            written += 1;
        }

        out.flush()?;
        tracing::debug!(rows = written, columns = self.columns.len(), "CSV export finished");
        Ok(written)
    }

    /// Whole export in memory.
    pub fn to_bytes<'r, R, A>(&self, rows: impl IntoIterator<Item = &'r R>, accessor: &A) -> Vec<u8>
    where
        R: 'r + ?Sized,
        A: PropertyAccessor<R> + ?Sized,
    {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write(rows, accessor, &mut buf);
        buf
    }

    pub fn render<'r, R, A>(&self, rows: impl IntoIterator<Item = &'r R>, accessor: &A) -> String
    where
        R: 'r + ?Sized,
        A: PropertyAccessor<R> + ?Sized,
    {
        String::from_utf8_lossy(&self.to_bytes(rows, accessor)).into_owned()
    }

    fn render_field<R, A>(
        &self,
        row: &R,
        column: &ColumnSpec,
        accessor: &A,
    ) -> std::result::Result<String, FieldRenderError>
    where
        R: ?Sized,
        A: PropertyAccessor<R> + ?Sized,
    {
        let mut value = accessor.resolve(row, column.path())?;

        if let Some(range) = column.substring() {
            let text = value.as_text().ok_or(FieldRenderError::NotText {
                found: value.type_name(),
            })?;
            value = FieldValue::Text(range.apply(text)?);
        }

        if let Some(formatter) = column.formatter() {
            return formatter.format(&value);
        }
        match value.as_date() {
            Some(date) => self.options.date_style.format(date),
            None => Ok(value.to_string()),
        }
    }

    fn push_quoted(&self, line: &mut String, text: &str) {
        if self.options.use_quotes {
            line.push(self.options.quote);
            line.push_str(text);
            line.push(self.options.quote);
        } else {
            line.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{FnAccessor, JsonAccessor, PropertyAccessError};
    use chrono::NaiveDate;
    use serde_json::json;

    fn people() -> Vec<serde_json::Value> {
        vec![
            json!({ "id": 1, "name": "Hello", "city": "Roma" }),
            json!({ "id": 2, "name": "World", "city": "Bari" }),
        ]
    }

    #[test]
    fn test_substring_with_quotes() {
        let mut exporter = CsvExporter::default();
        exporter.add_substring_property("name", Some(0), Some(3)).unwrap();

        let text = exporter.render(&people()[..1], &JsonAccessor::new());
        assert_eq!(text, "\"Hel\"\n");
    }

    #[test]
    fn test_header_and_rows() {
        let mut exporter = CsvExporter::new(ExportOptions {
            header: true,
            ..Default::default()
        });
        exporter.add_titled_property("id", "ID").add_property("name");

        let text = exporter.render(&people(), &JsonAccessor::new());
        assert_eq!(text, "\"ID\",\"name\"\n\"1\",\"Hello\"\n\"2\",\"World\"\n");
    }

    #[test]
    fn test_unquoted_custom_delimiter() {
        let mut exporter = CsvExporter::new(ExportOptions {
            delimiter: ';',
            use_quotes: false,
            header: true,
            ..Default::default()
        });
        exporter.add_property("id").add_property("city");

        let text = exporter.render(&people(), &JsonAccessor::new());
        assert_eq!(text, "id;city\n1;Roma\n2;Bari\n");
    }

    #[test]
    fn test_missing_property_leaves_blank_field() {
        let mut exporter = CsvExporter::default();
        exporter.add_property("id").add_property("email").add_property("city");

        let text = exporter.render(&people(), &JsonAccessor::new());
        assert_eq!(text, "\"1\",,\"Roma\"\n\"2\",,\"Bari\"\n");
    }

    #[test]
    fn test_substring_on_non_text_is_blank() {
        let mut exporter = CsvExporter::default();
        exporter
            .add_substring_property("id", Some(0), Some(1))
            .unwrap()
            .add_property("name");

        let text = exporter.render(&people()[..1], &JsonAccessor::new());
        assert_eq!(text, ",\"Hello\"\n");
    }

    #[test]
    fn test_substring_out_of_range_is_blank() {
        let mut exporter = CsvExporter::new(ExportOptions {
            use_quotes: false,
            ..Default::default()
        });
        exporter
            .add_substring_property("city", Some(1), Some(9))
            .unwrap()
            .add_property("id");

        assert_eq!(exporter.render(&people(), &JsonAccessor::new()), ",1\n,2\n");
    }

    #[test]
    fn test_substring_then_format() {
        let mut exporter = CsvExporter::new(ExportOptions {
            use_quotes: false,
            ..Default::default()
        });
        exporter.add_column(
            ColumnSpec::new("name")
                .with_format("<{0}>")
                .unwrap()
                .with_substring(None, Some(2))
                .unwrap(),
        );

        assert_eq!(exporter.render(&people(), &JsonAccessor::new()), "<He>\n<Wo>\n");
    }

    #[test]
    fn test_dates_use_date_style() {
        let rows = vec![json!({ "born": "2010-03-07" })];
        let accessor = JsonAccessor::new().with_date_detection(true);

        let mut exporter = CsvExporter::new(ExportOptions {
            use_quotes: false,
            ..Default::default()
        });
        exporter.add_property("born");
        assert_eq!(exporter.render(&rows, &accessor), "07 mar 2010\n");

        let mut english = CsvExporter::new(ExportOptions {
            use_quotes: false,
            date_style: DateStyle::new("en_US", "%Y-%b-%d").unwrap(),
            ..Default::default()
        });
        english.add_property("born");
        assert_eq!(english.render(&rows, &accessor), "2010-Mar-07\n");
    }

    #[test]
    fn test_formatter_takes_precedence_over_date_style() {
        let date = NaiveDate::from_ymd_opt(2010, 3, 7).unwrap();
        let accessor = FnAccessor(|d: &NaiveDate, _: &str| Ok::<_, PropertyAccessError>(FieldValue::Date(*d)));

        let mut exporter = CsvExporter::new(ExportOptions {
            use_quotes: false,
            ..Default::default()
        });
        exporter.add_formatted_property("day", "Day", "{0,date,%d/%m}").unwrap();

        assert_eq!(exporter.render([&date], &accessor), "07/03\n");
    }

    #[test]
    fn test_date_pattern_with_time_fields_blanks_field() {
        let date = NaiveDate::from_ymd_opt(2010, 3, 7).unwrap();
        let accessor = FnAccessor(|d: &NaiveDate, _: &str| Ok::<_, PropertyAccessError>(FieldValue::Date(*d)));

        let mut templated = CsvExporter::default();
        templated
            .add_formatted_property("day", "Day", "{0,date,%d %H:%M}")
            .unwrap()
            .add_property("day");
        assert_eq!(templated.render([&date], &accessor), ",\"07 mar 2010\"\n");

        let mut styled = CsvExporter::new(ExportOptions {
            date_style: DateStyle::new("it_IT", "%d/%m/%Y %H:%M").unwrap(),
            ..Default::default()
        });
        styled.add_property("day").add_formatted_property("day", "Day", "{0}").unwrap();
        assert_eq!(styled.render([&date], &accessor), ",\"2010-03-07\"\n");
    }

    #[test]
    fn test_null_renders_empty() {
        let rows = vec![json!({ "a": null, "b": "x" })];
        let mut exporter = CsvExporter::default();
        exporter.add_property("a").add_property("b");
        assert_eq!(exporter.render(&rows, &JsonAccessor::new()), "\"\",\"x\"\n");
    }

    #[test]
    fn test_no_rows_no_header_is_empty() {
        let mut exporter = CsvExporter::default();
        exporter.add_property("id");
        let rows: Vec<serde_json::Value> = Vec::new();
        assert_eq!(exporter.render(&rows, &JsonAccessor::new()), "");
    }

    #[test]
    fn test_sanitize_formulas() {
        let rows = vec![json!({ "f": "=1+1", "g": "ok" })];
        let mut exporter = CsvExporter::new(ExportOptions {
            use_quotes: false,
            sanitize_formulas: true,
            ..Default::default()
        });
        exporter.add_property("f").add_property("g");
        assert_eq!(exporter.render(&rows, &JsonAccessor::new()), "'=1+1,ok\n");
    }

    #[test]
    fn test_line_ending_and_row_count() {
        let mut exporter = CsvExporter::new(ExportOptions {
            use_quotes: false,
            line_ending: "\r\n".to_string(),
            ..Default::default()
        });
        exporter.add_property("id");

        let mut out = Vec::new();
        let written = exporter.write(&people(), &JsonAccessor::new(), &mut out).unwrap();
        assert_eq!(written, 2);
        assert_eq!(out, b"1\r\n2\r\n");
    }

    #[test]
    fn test_data_source_metadata() {
        let exporter = CsvExporter::default().with_name("customers.csv");
        assert_eq!(exporter.content_type(), "text/csv");
        assert_eq!(exporter.name(), Some("customers.csv"));
        assert!(CsvExporter::default().name().is_none());
    }
}
