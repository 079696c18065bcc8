use chrono::NaiveDate;
use csv_codec::{
    import_rows, ColumnSpec, CodecError, CsvExporter, CsvImporter, ExportOptions, FieldValue, ImportOptions,
    PropertyAccessError, PropertyMap, RecordAccessor, RowRecord,
};
use std::io::{Cursor, Write};

struct Invoice {
    number: String,
    customer: String,
    total: f64,
    issued: NaiveDate,
    notes: Option<String>,
}

fn invoices() -> Vec<Invoice> {
    vec![
        Invoice {
            number: "INV-2010-0001".to_string(),
            customer: "Rossi, Mario".to_string(),
            total: 120.5,
            issued: NaiveDate::from_ymd_opt(2010, 3, 7).unwrap(),
            notes: Some("paid".to_string()),
        },
        Invoice {
            number: "INV-2010-0002".to_string(),
            customer: "Bianchi".to_string(),
            total: 80.0,
            issued: NaiveDate::from_ymd_opt(2010, 11, 21).unwrap(),
            notes: None,
        },
    ]
}

fn invoice_properties() -> PropertyMap<Invoice> {
    PropertyMap::new()
        .with("number", |i: &Invoice| i.number.clone())
        .with("customer", |i: &Invoice| i.customer.clone())
        .with("total", |i: &Invoice| i.total)
        .with("issued", |i: &Invoice| i.issued)
        .with_fallible("notes", |i: &Invoice| {
            i.notes.clone().map(FieldValue::Text).ok_or(PropertyAccessError::Failed {
                path: "notes".to_string(),
                reason: "no notes".to_string(),
            })
        })
}

#[test]
fn export_typed_rows_with_registry() {
    let mut exporter = CsvExporter::new(ExportOptions {
        header: true,
        ..Default::default()
    });
    exporter
        .add_substring_property("number", Some(9), None)
        .unwrap()
        .add_titled_property("customer", "Customer")
        .add_formatted_property("total", "Total", "EUR {0}")
        .unwrap()
        .add_titled_property("issued", "Issued")
        .add_property("notes");

    let text = exporter.render(&invoices(), &invoice_properties());

    assert_eq!(
        text,
        concat!(
            "\"number\",\"Customer\",\"Total\",\"Issued\",\"notes\"\n",
            "\"0001\",\"Rossi, Mario\",\"EUR 120.5\",\"07 mar 2010\",\"paid\"\n",
            "\"0002\",\"Bianchi\",\"EUR 80\",\"21 nov 2010\",\n",
        )
    );
}

#[test]
fn exported_text_reads_back_with_an_independent_reader() {
    let mut exporter = CsvExporter::new(ExportOptions {
        header: true,
        ..Default::default()
    });
    exporter.add_property("number").add_property("customer").add_property("issued");

    let bytes = exporter.to_bytes(&invoices(), &invoice_properties());
    let mut reader = csv::Reader::from_reader(bytes.as_slice());

    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["number", "customer", "issued"]);

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][1], "Rossi, Mario");
    assert_eq!(&records[1][2], "21 nov 2010");
}

#[test]
fn import_then_reexport_with_record_accessor() {
    let input = "id,name,city\n1,\"Rossi, Mario\",Milano\n2,Bianchi,\n";
    let rows = import_rows(
        Cursor::new(input),
        ImportOptions {
            header: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 2);
    // trailing empty field dropped by the tokenizer, so "city" is absent
    assert_eq!(rows[1].get("city"), None);

    let mut exporter = CsvExporter::new(ExportOptions {
        delimiter: ';',
        use_quotes: false,
        header: true,
        ..Default::default()
    });
    exporter
        .add_column(ColumnSpec::new("name").with_title("Name"))
        .add_column("city=City".parse().unwrap())
        .add_column("id@0..1".parse().unwrap());

    assert_eq!(
        exporter.render(&rows, &RecordAccessor),
        "Name;City;id\nRossi, Mario;Milano;1\nBianchi;;2\n"
    );
}

#[test]
fn importer_reads_files_and_labels_rows() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "a|'b|c'\r\nd|e\r\n").unwrap();

    let mut seen: Vec<RowRecord> = Vec::new();
    let mut importer = CsvImporter::new(ImportOptions {
        delimiter: '|',
        quote: '\'',
        header: false,
    });
    importer.add_row_listener(|row: RowRecord| seen.push(row));
    let count = importer.parse_file(file.path()).unwrap();
    assert_eq!(importer.rows().unwrap(), count);
    drop(importer);

    assert_eq!(count, 2);
    assert_eq!(seen[0].fields(), ["a", "b|c"]);
    assert_eq!(seen[1].get("1"), Some("e"));
    let label = file.path().display().to_string();
    assert_eq!(seen[0].source(), Some(label.as_str()));
}

#[test]
fn missing_file_is_a_stream_error() {
    let mut importer = CsvImporter::new(ImportOptions::default());
    let result = importer.parse_file("/no/such/dir/input.csv");
    assert!(matches!(result, Err(CodecError::IoError(_))));
    assert!(matches!(importer.rows(), Err(CodecError::NoDataParsed)));
}

#[test]
fn exporter_does_not_close_caller_writer() {
    let mut exporter = CsvExporter::new(ExportOptions {
        use_quotes: false,
        ..Default::default()
    });
    exporter.add_property("number");

    let mut out = Vec::new();
    exporter.write(&invoices()[..1], &invoice_properties(), &mut out).unwrap();
    writeln!(out, "# trailer").unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "INV-2010-0001\n# trailer\n");
}
