use crate::csv_processor::tokenizer::tokenize_line;
use crate::utils::{CodecError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub delimiter: char,
    pub quote: char,
    /// Treat the first line as column names.
    pub header: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            header: false,
        }
    }
}

/// Ordered row keys, fixed once per parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    keys: Vec<String>,
}

impl Schema {
    pub fn from_header(fields: Vec<String>) -> Self {
        Self { keys: fields }
    }

    /// `"0"`, `"1"`, ... for files without a header line.
    pub fn positional(width: usize) -> Self {
        Self {
            keys: (0..width).map(|i| i.to_string()).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One parsed line keyed by the schema.
///
/// When the line and the schema differ in width only the first
/// `min(schema, fields)` pairs are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    schema: Arc<Schema>,
    values: Vec<String>,
    index: usize,
    source: Option<Arc<str>>,
}

impl RowRecord {
    fn new(schema: Arc<Schema>, mut values: Vec<String>, index: usize, source: Option<Arc<str>>) -> Self {
        values.truncate(schema.len());
        Self {
            schema,
            values,
            index,
            source,
        }
    }

    /// Zero-based position of the row among the data rows of its parse.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Label of the input the row came from, if the importer was given one.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Field by header name, or by positional key when there is no header.
    /// With repeated header names the rightmost column wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys()
            .zip(&self.values)
            .filter(|(k, _)| *k == key)
            .last()
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema.keys.iter().take(self.values.len()).map(String::as_str)
    }

    pub fn fields(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys().zip(self.values.iter().map(String::as_str))
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    /// JSON object preserving column order.
    pub fn to_json(&self) -> JsonValue {
        let mut map = serde_json::Map::new();
        for (key, value) in self.iter() {
            map.insert(key.to_string(), JsonValue::String(value.to_string()));
        }
        JsonValue::Object(map)
    }
}

pub trait RowListener {
    fn row_parsed(&mut self, row: RowRecord);
}

impl<F: FnMut(RowRecord)> RowListener for F {
    fn row_parsed(&mut self, row: RowRecord) {
        self(row)
    }
}

/// Incremental event-driven CSV reader.
///
/// Each line is tokenized and handed to every registered listener, in
/// registration order, before the next line is read. The input is consumed
/// and dropped (closed) by [`CsvImporter::parse`].
pub struct CsvImporter<'a> {
    options: ImportOptions,
    listeners: Vec<Box<dyn RowListener + 'a>>,
    source: Option<Arc<str>>,
    schema: Option<Arc<Schema>>,
    rows: Option<usize>,
}

impl<'a> CsvImporter<'a> {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            listeners: Vec::new(),
            source: None,
            schema: None,
            rows: None,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source = Some(Arc::from(name.into()));
        self
    }

    pub fn add_row_listener<L: RowListener + 'a>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn parse<R: Read>(&mut self, input: R) -> Result<usize> {
        self.rows = None;
        self.schema = None;

        let mut reader = BufReader::new(input);
        let mut line = String::new();
        let mut schema: Option<Arc<Schema>> = None;
        let mut rows = 0usize;

        if self.options.header && read_line(&mut reader, &mut line)? {
            let fields = tokenize_line(&line, self.options.delimiter, self.options.quote);
            tracing::debug!(columns = fields.len(), "Schema taken from header line");
            schema = Some(Arc::new(Schema::from_header(fields)));
        }

        while read_line(&mut reader, &mut line)? {
            let fields = tokenize_line(&line, self.options.delimiter, self.options.quote);

            let schema = schema.get_or_insert_with(|| {
                tracing::debug!(columns = fields.len(), "Positional schema derived from first row");
                Arc::new(Schema::positional(fields.len()))
            });
            if fields.len() != schema.len() {
                tracing::warn!(
                    row = rows,
                    fields = fields.len(),
                    columns = schema.len(),
                    "Row width differs from schema, pairing the common prefix"
                );
            }

            let record = RowRecord::new(Arc::clone(schema), fields, rows, self.source.clone());
            self.dispatch(record);
            rows += 1;
        }

        tracing::debug!(rows, source = self.source.as_deref(), "CSV import finished");
        self.schema = schema;
        self.rows = Some(rows);
        Ok(rows)
    }

    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if self.source.is_none() {
            self.source = Some(Arc::from(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        self.parse(file)
    }

    fn dispatch(&mut self, record: RowRecord) {
        if let Some((last, rest)) = self.listeners.split_last_mut() {
            for listener in rest {
                listener.row_parsed(record.clone());
            }
            last.row_parsed(record);
        }
    }

    /// Number of data rows seen by the last completed parse.
    pub fn rows(&self) -> Result<usize> {
        self.rows.ok_or(CodecError::NoDataParsed)
    }

    /// Schema of the last completed parse; `None` if the input was empty.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }
}

impl fmt::Debug for CsvImporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvImporter")
            .field("options", &self.options)
            .field("listeners", &self.listeners.len())
            .field("source", &self.source)
            .field("rows", &self.rows)
            .finish()
    }
}

/// Reads the next line without its terminator. `false` at end of input.
fn read_line<R: BufRead>(reader: &mut R, line: &mut String) -> Result<bool> {
    line.clear();
    if reader.read_line(line)? == 0 {
        return Ok(false);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(true)
}

/// Parses a whole input and returns its rows.
pub fn import_rows<R: Read>(input: R, options: ImportOptions) -> Result<Vec<RowRecord>> {
    let mut rows = Vec::new();
    let mut importer = CsvImporter::new(options);
    importer.add_row_listener(|row: RowRecord| rows.push(row));
    importer.parse(input)?;
    drop(importer);
    Ok(rows)
}
