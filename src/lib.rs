//! # jflat - streaming JSON flattening
//!
//! Converts deeply nested JSON documents into flat, line-delimited records
//! suitable for row-oriented stores and columnar pipelines. Input is
//! consumed incrementally: the engine holds at most one top-level
//! document's parsed structure at a time, so inputs larger than memory are
//! fine as long as each individual document fits.
//!
//! ## Modules
//!
//! - **flatten**: the flattening engine - path building, array fan-out,
//!   streaming normalization, document sequencing
//! - **events**: incremental parse-event source over any `BufRead`
//! - **error**: the error taxonomy
//!
//! ## Quick Start
//!
//! ```rust
//! use jflat::{flatten_json, FlattenConfig, RowWriter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = br#"{"a": [1, 2], "b": {"c": true}}"#;
//!
//! let mut writer = RowWriter::new(Vec::new());
//! let summary = flatten_json(&input[..], &mut writer, FlattenConfig::default())?;
//!
//! // Two rows: {"a":1,"b.c":true} and {"a":2,"b.c":true}
//! assert_eq!(summary.rows, 2);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::warn;

pub mod error;
pub mod events;
pub mod flatten;

// Re-export commonly used types for convenience
pub use error::Error;
pub use events::{Event, JsonEvents};
pub use flatten::{
    DocumentSequencer, FanOut, FlattenConfig, OnDocumentError, PathBuilder, Row, RowWriter,
    RunSummary, StreamingNormalizer,
};

/// Main entry point: flatten a JSON stream into line-delimited rows.
///
/// The input may be one JSON array whose elements are the documents to
/// flatten, or a concatenation of top-level values. See
/// [`flatten::DocumentSequencer`] for the framing rules.
pub fn flatten_json<R: BufRead, W: Write>(
    reader: R,
    writer: &mut RowWriter<W>,
    config: FlattenConfig,
) -> Result<RunSummary> {
    let mut sequencer =
        DocumentSequencer::new(reader, &config).context("Failed to read input")?;
    drive(&mut sequencer, writer, &config)
}

/// Flatten newline-delimited JSON: one document per line.
pub fn flatten_ndjson<R: BufRead, W: Write>(
    reader: R,
    writer: &mut RowWriter<W>,
    config: FlattenConfig,
) -> Result<RunSummary> {
    let mut sequencer = DocumentSequencer::ndjson(reader, &config);
    drive(&mut sequencer, writer, &config)
}

fn drive<R: BufRead, W: Write>(
    sequencer: &mut DocumentSequencer<R>,
    writer: &mut RowWriter<W>,
    config: &FlattenConfig,
) -> Result<RunSummary> {
    let mut failures = 0usize;
    while let Some(item) = sequencer.next() {
        match item {
            Ok(row) => writer.write_row(&row)?,
            Err(err) => match config.on_document_error {
                OnDocumentError::Abort => {
                    return Err(err).context("Failed to flatten document")
                }
                OnDocumentError::Skip => {
                    warn!("Skipping document: {err}");
                    failures += 1;
                }
            },
        }
    }
    writer.flush()?;

    Ok(RunSummary {
        documents: sequencer.documents(),
        rows: writer.rows_written(),
        failures,
    })
}
