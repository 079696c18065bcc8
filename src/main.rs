use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use csv_codec::csv_processor::{file_exists, inspect_csv, ColumnSpec, CsvExporter, CsvImporter, ImportOptions, RowRecord};
use csv_codec::utils::LoggingConfig;
use csv_codec::{AppConfig, JsonAccessor};
use serde_json::Value as JsonValue;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "csv-codec", version, about = "Event-driven CSV import and column-driven CSV export")]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(long, global = true, env = "CSV_CODEC_CONFIG", default_value = "csv-codec.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a CSV file and print every row as a JSON object line.
    Import {
        file: PathBuf,
        #[arg(long)]
        delimiter: Option<char>,
        #[arg(long)]
        quote: Option<char>,
        /// First line holds the column names.
        #[arg(long)]
        header: bool,
    },
    /// Render a JSON array of objects as CSV.
    Export {
        input: PathBuf,
        /// Column as `path[=Title][@start..end]`; repeatable. Overrides configured columns.
        #[arg(long = "column", short = 'c')]
        columns: Vec<ColumnSpec>,
        #[arg(long)]
        delimiter: Option<char>,
        #[arg(long)]
        quote: Option<char>,
        #[arg(long)]
        no_quotes: bool,
        #[arg(long)]
        header: bool,
        /// Treat ISO date strings as dates.
        #[arg(long)]
        detect_dates: bool,
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Summarize a CSV file as JSON.
    Inspect {
        file: PathBuf,
        #[arg(long, default_value_t = 5)]
        sample: usize,
        /// First line holds the column names (overrides config).
        #[arg(long, conflicts_with = "no_header")]
        header: bool,
        /// First line is data (overrides config).
        #[arg(long)]
        no_header: bool,
        #[arg(long)]
        delimiter: Option<char>,
        #[arg(long)]
        quote: Option<char>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(Some(cli.config.as_str()))?;
    init_logging(&config.logging)?;
    tracing::debug!(config = %cli.config, "Configuration loaded");

    match cli.command {
        Command::Import {
            file,
            delimiter,
            quote,
            header,
        } => {
            let mut options = config.import.to_options();
            options.delimiter = delimiter.unwrap_or(options.delimiter);
            options.quote = quote.unwrap_or(options.quote);
            options.header |= header;

            let rows = tokio::task::spawn_blocking(move || run_import(file, options)).await??;
            tracing::info!(rows, "Import complete");
        }
        Command::Export {
            input,
            columns,
            delimiter,
            quote,
            no_quotes,
            header,
            detect_dates,
            output,
        } => {
            let mut options = config.export.to_options()?;
            options.delimiter = delimiter.unwrap_or(options.delimiter);
            options.quote = quote.unwrap_or(options.quote);
            options.use_quotes &= !no_quotes;
            options.header |= header;

            let columns = if columns.is_empty() {
                config.export.column_specs()?
            } else {
                columns
            };
            if columns.is_empty() {
                bail!("no export columns: pass --column or set [[export.columns]] in {}", cli.config);
            }

            let content = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let rows: Vec<JsonValue> =
                serde_json::from_str(&content).with_context(|| format!("{} is not a JSON array", input.display()))?;

            let mut exporter = CsvExporter::new(options);
            for column in columns {
                exporter.add_column(column);
            }
            if let Some(path) = &output {
                exporter = exporter.with_name(path.display().to_string());
            }

            let accessor = JsonAccessor::new().with_date_detection(detect_dates || config.export.detect_dates);
            let written = match &output {
                Some(path) => {
                    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
                    let mut out = BufWriter::new(file);
                    exporter.write(&rows, &accessor, &mut out)?
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut out = stdout.lock();
                    exporter.write(&rows, &accessor, &mut out)?
                }
            };
            tracing::info!(rows = written, output = exporter.name(), "Export complete");
        }
        Command::Inspect {
            file,
            sample,
            header,
            no_header,
            delimiter,
            quote,
        } => {
            let mut options = config.import.to_options();
            options.delimiter = delimiter.unwrap_or(options.delimiter);
            options.quote = quote.unwrap_or(options.quote);
            options.header = resolve_header(options.header, header, no_header);

            let path = file.to_str().context("file path is not valid UTF-8")?;
            if !file_exists(path) {
                bail!("{} does not exist", path);
            }
            let metadata = inspect_csv(path, options, sample).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}

/// Command-line flags win over the configured header setting.
fn resolve_header(configured: bool, header: bool, no_header: bool) -> bool {
    (configured || header) && !no_header
}

fn run_import(file: PathBuf, options: ImportOptions) -> anyhow::Result<usize> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error: Option<std::io::Error> = None;

    let mut importer = CsvImporter::new(options);
    importer.add_row_listener(|row: RowRecord| {
        if write_error.is_none() {
            if let Err(e) = writeln!(out, "{}", row.to_json()) {
                write_error = Some(e);
            }
        }
    });
    let rows = importer
        .parse_file(&file)
        .with_context(|| format!("importing {}", file.display()))?;
    drop(importer);

    if let Some(e) = write_error {
        return Err(e).context("writing rows to stdout");
    }
    out.flush()?;
    Ok(rows)
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("csv_codec={}", logging.level)))?;

    match logging.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        "text" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        other => bail!("unknown logging format {:?}, expected \"text\" or \"json\"", other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_header_keeps_config_without_flags() {
        assert!(resolve_header(true, false, false));
        assert!(!resolve_header(false, false, false));
        assert!(resolve_header(false, true, false));
        assert!(!resolve_header(true, false, true));
    }

    #[test]
    fn test_inspect_header_flags_conflict() {
        let cli = Cli::try_parse_from(["csv-codec", "inspect", "data.csv"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Inspect {
                header: false,
                no_header: false,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["csv-codec", "inspect", "data.csv", "--header", "--no-header"]).is_err());
    }
}
