pub mod accessor;
pub mod csv_processor;
pub mod format;
pub mod utils;

pub use accessor::{FieldValue, FnAccessor, JsonAccessor, PropertyAccessError, PropertyAccessor, PropertyMap, RecordAccessor};
pub use csv_processor::{
    import_rows, tokenize_line, ColumnSpec, CsvExporter, CsvImporter, CsvMetadata, ExportOptions, ImportOptions,
    RowListener, RowRecord, Schema,
};
pub use format::{DateStyle, TemplateFormatter, ValueFormatter};
pub use utils::{AppConfig, CodecError, FieldRenderError, Result};
