//! Command-line interface for schema-csv
//!
//! # Usage Examples
//!
//! ## Decode
//! ```bash
//! # CSV file with a header row to JSON on stdout
//! schema-csv decode --schema events.yaml --input events.csv --header --pretty
//!
//! # Semicolon-separated CSV from stdin, NULL as the null token
//! cat events.csv | schema-csv decode --schema events.yaml \
//!   --delimiter ';' --null-string NULL
//! ```
//!
//! ## Encode
//! ```bash
//! # JSON to CSV, nested lists written as JSON columns
//! schema-csv encode --schema events.yaml --input events.json \
//!   --output events.csv --header --defer-json
//!
//! # Dialect settings from a TOML file, overridden by flags
//! schema-csv encode --schema events.yaml --dialect excel.toml --quote-mode all
//! ```
//!
//! ## Header
//! ```bash
//! schema-csv header --schema events.yaml --header-separator _
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use schema_csv::{csv_to_json, json_to_csv, load_schema, DialectOpts};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "schema-csv")]
#[command(about = "Convert between CSV and JSON under a schema")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read CSV and write the decoded values as JSON
    Decode {
        /// YAML schema document
        #[arg(long, value_name = "PATH", env = "SCHEMA_CSV_SCHEMA")]
        schema: PathBuf,

        /// CSV input (default: stdin)
        #[arg(long, value_name = "PATH")]
        input: Option<PathBuf>,

        /// JSON output (default: stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        dialect: DialectOpts,
    },

    /// Read JSON and write it as CSV
    Encode {
        /// YAML schema document
        #[arg(long, value_name = "PATH", env = "SCHEMA_CSV_SCHEMA")]
        schema: PathBuf,

        /// JSON input (default: stdin)
        #[arg(long, value_name = "PATH")]
        input: Option<PathBuf>,

        /// CSV output (default: stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[command(flatten)]
        dialect: DialectOpts,
    },

    /// Print the header row the schema is written with
    Header {
        /// YAML schema document
        #[arg(long, value_name = "PATH", env = "SCHEMA_CSV_SCHEMA")]
        schema: PathBuf,

        #[command(flatten)]
        dialect: DialectOpts,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            schema,
            input,
            output,
            pretty,
            dialect,
        } => {
            let schema = load_schema(&schema)?;
            let csv = dialect.to_codec()?;
            let reader = open_input(input.as_deref())?;
            let json = csv_to_json(&csv, &schema, reader)?;

            let mut writer = open_output(output.as_deref())?;
            if pretty {
                serde_json::to_writer_pretty(&mut writer, &json)?;
            } else {
                serde_json::to_writer(&mut writer, &json)?;
            }
            writeln!(writer)?;
            writer.flush().context("Failed to write JSON output")?;
            info!("Decoded CSV into JSON");
        }
        Commands::Encode {
            schema,
            input,
            output,
            dialect,
        } => {
            let schema = load_schema(&schema)?;
            let csv = dialect.to_codec()?;
            let mut reader = open_input(input.as_deref())?;
            let mut text = String::new();
            reader
                .read_to_string(&mut text)
                .context("Failed to read JSON input")?;
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Input is not valid JSON")?;

            let writer = open_output(output.as_deref())?;
            json_to_csv(&csv, &schema, &json, writer)?;
            info!("Encoded JSON into CSV");
        }
        Commands::Header { schema, dialect } => {
            let schema = load_schema(&schema)?;
            let csv = dialect.to_codec()?;
            let header = csv.header_record(&schema)?;
            println!("{header}");
        }
    }

    Ok(())
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn io::BufRead>> {
    match path {
        Some(path) => {
            debug!("Reading from {:?}", path);
            let file =
                File::open(path).with_context(|| format!("Failed to open input {path:?}"))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            debug!("Writing to {:?}", path);
            let file =
                File::create(path).with_context(|| format!("Failed to create output {path:?}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
