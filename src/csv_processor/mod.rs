pub mod analyzer;
pub mod columns;
pub mod reader;
pub mod tokenizer;
pub mod writer;

pub use analyzer::{file_exists, get_file_size, inspect_csv, CsvMetadata};
pub use columns::{ColumnConfig, ColumnSpec, SubstringRange};
pub use reader::{import_rows, CsvImporter, ImportOptions, RowListener, RowRecord, Schema};
pub use tokenizer::tokenize_line;
pub use writer::{CsvExporter, ExportOptions, CSV_CONTENT_TYPE};
