use crate::csv_processor::reader::{CsvImporter, ImportOptions, RowRecord};
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvMetadata {
    pub total_rows: usize,
    pub total_columns: usize,
    pub column_names: Vec<String>,
    pub file_size_bytes: u64,
    pub sample_data: Vec<JsonValue>,
}

/// Imports `file_path` once and summarizes it. Column names come from the
/// header line when `options.header` is set, otherwise they are positional.
pub async fn inspect_csv(file_path: &str, options: ImportOptions, sample_rows: usize) -> Result<CsvMetadata> {
    let file_size_bytes = get_file_size(file_path).await?;

    let mut sample_data = Vec::with_capacity(sample_rows);
    let mut importer = CsvImporter::new(options).with_source_name(file_path);
    importer.add_row_listener(|row: RowRecord| {
        if sample_data.len() < sample_rows {
            sample_data.push(row.to_json());
        }
    });
    let total_rows = importer.parse_file(file_path)?;

    let column_names: Vec<String> = importer
        .schema()
        .map(|schema| schema.keys().to_vec())
        .unwrap_or_default();
    drop(importer);

    Ok(CsvMetadata {
        total_rows,
        total_columns: column_names.len(),
        column_names,
        file_size_bytes,
        sample_data,
    })
}

pub async fn get_file_size(path: &str) -> Result<u64> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata.len())
}

pub fn file_exists(path: &str) -> bool {
    Path::new(path).exists()
}
