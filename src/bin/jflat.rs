//! jflat: flatten nested JSON into line-delimited flat records.
//!
//! Usage:
//!   # Read from file, output to stdout
//!   jflat data.json
//!
//!   # Read from stdin, output to stdout
//!   echo '{"a": [1, 2], "b": {"c": 3}}' | jflat
//!
//!   # Process NDJSON, skip malformed lines, write to a file
//!   jflat --ndjson --skip-errors events.jsonl -o flat.jsonl
//!
//!   # Join key paths with underscores instead of dots
//!   jflat --separator _ data.json

// Use MiMalloc allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use jflat::{flatten_json, flatten_ndjson, FlattenConfig, OnDocumentError, RowWriter, RunSummary};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "jflat")]
#[command(about = "Flatten nested JSON into line-delimited flat records", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one document per line)
    #[arg(long)]
    ndjson: bool,

    /// Treat a top-level array as one document to fan out, not as a
    /// sequence of documents
    #[arg(long)]
    no_split_array: bool,

    /// Separator joining field names in flat keys
    #[arg(long, default_value = ".")]
    separator: String,

    /// Skip malformed documents instead of aborting the run
    #[arg(long)]
    skip_errors: bool,

    /// Output file (use stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Set loglevel: -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = FlattenConfig {
        separator: args.separator.clone(),
        on_document_error: if args.skip_errors {
            OnDocumentError::Skip
        } else {
            OnDocumentError::Abort
        },
        split_top_level_arrays: !args.no_split_array,
    };

    let reader: Box<dyn BufRead> = if let Some(path) = &args.input {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
        Box::new(BufReader::new(file))
    } else {
        Box::new(BufReader::new(std::io::stdin()))
    };

    let summary = if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
        let mut writer = RowWriter::new(BufWriter::new(file));
        run(reader, &mut writer, args.ndjson, config)?
    } else {
        let stdout = std::io::stdout();
        let mut writer = RowWriter::new(stdout.lock());
        run(reader, &mut writer, args.ndjson, config)?
    };

    info!(
        documents = summary.documents,
        rows = summary.rows,
        failures = summary.failures,
        "run complete"
    );
    Ok(())
}

fn run<W: Write>(
    reader: Box<dyn BufRead>,
    writer: &mut RowWriter<W>,
    ndjson: bool,
    config: FlattenConfig,
) -> Result<RunSummary> {
    if ndjson {
        flatten_ndjson(reader, writer, config)
    } else {
        flatten_json(reader, writer, config)
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
