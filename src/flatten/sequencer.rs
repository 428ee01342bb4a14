//! Document sequencing: split the input stream into top-level documents and
//! concatenate their row sequences.
//!
//! Three framings cover the supported input shapes:
//!
//! - a single top-level JSON array whose elements are the documents,
//!   streamed element-by-element through the event parser so the outer
//!   array is never materialized;
//! - back-to-back top-level values, optionally whitespace separated,
//!   consumed one document at a time;
//! - newline-delimited JSON, one document per line.
//!
//! Rows from document `i` always precede rows from document `i + 1`; within
//! a document the fan-out order of [`FanOut`] is preserved.

use std::io::BufRead;

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::events::{Event, JsonEvents};
use crate::flatten::assembler::FanOut;
use crate::flatten::normalizer::StreamingNormalizer;
use crate::flatten::types::{FlattenConfig, OnDocumentError, Row};

/// How the byte stream frames its documents.
enum Framing<R: BufRead> {
    /// Elements of one top-level array.
    ArrayElements {
        events: JsonEvents<R>,
        opened: bool,
    },
    /// Concatenated top-level values.
    ValueStream(serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, Value>),
    /// One document per line, blank lines skipped.
    Lines {
        lines: std::io::Lines<R>,
        line_no: usize,
    },
}

/// Iterates the rows of every document in the input, in input order.
///
/// Yields `Err` for a failed document, wrapped in
/// [`Error::Document`] with the document's index. Under
/// [`OnDocumentError::Abort`] the sequencer terminates after the first
/// failure. Under [`OnDocumentError::Skip`] it continues with the next
/// document when the framing permits resynchronization, which is always the
/// case for line-delimited input. For the byte-stream framings a syntax error
/// destroys the framing itself (there is no trustworthy next document
/// boundary), so the sequencer reports the failure and terminates under
/// either policy.
///
/// In the array framing, content after the closing bracket is ignored.
pub struct DocumentSequencer<R: BufRead> {
    framing: Framing<R>,
    normalizer: StreamingNormalizer,
    on_error: OnDocumentError,
    index: usize,
    parsed: usize,
    current: Option<FanOut>,
    finished: bool,
}

impl<R: BufRead> DocumentSequencer<R> {
    /// Auto-detected framing: a top-level `[` splits into element documents
    /// (unless `split_top_level_arrays` is off); anything else is treated
    /// as a stream of concatenated top-level values.
    pub fn new(mut reader: R, config: &FlattenConfig) -> Result<Self, Error> {
        let framing = if config.split_top_level_arrays && starts_with_array(&mut reader)? {
            Framing::ArrayElements {
                events: JsonEvents::new(reader),
                opened: false,
            }
        } else {
            Framing::ValueStream(serde_json::Deserializer::from_reader(reader).into_iter())
        };
        Ok(Self::with_framing(framing, config))
    }

    /// Line-delimited framing: one document per line.
    pub fn ndjson(reader: R, config: &FlattenConfig) -> Self {
        Self::with_framing(
            Framing::Lines {
                lines: reader.lines(),
                line_no: 0,
            },
            config,
        )
    }

    fn with_framing(framing: Framing<R>, config: &FlattenConfig) -> Self {
        DocumentSequencer {
            framing,
            normalizer: StreamingNormalizer::new(config),
            on_error: config.on_document_error,
            index: 0,
            parsed: 0,
            current: None,
            finished: false,
        }
    }

    /// Top-level documents successfully parsed so far.
    pub fn documents(&self) -> usize {
        self.parsed
    }

    /// Whether the framing can find the next document after a failure.
    fn can_resync(&self) -> bool {
        matches!(self.framing, Framing::Lines { .. })
    }

    /// Parse the next document and return its fan-out. `None` ends the run.
    fn next_document(&mut self) -> Option<Result<FanOut, Error>> {
        match &mut self.framing {
            Framing::ArrayElements { events, opened } => {
                if !*opened {
                    match events.next_event() {
                        Ok(Some(Event::StartArray)) => *opened = true,
                        Ok(_) => {
                            return Some(Err(Error::malformed(
                                Some(events.byte_offset()),
                                "expected a top-level array",
                            )))
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                self.normalizer.normalize_array_element(events).transpose()
            }
            Framing::ValueStream(stream) => match stream.next() {
                Some(Ok(value)) => Some(Ok(self.normalizer.normalize_value(value))),
                Some(Err(err)) => Some(Err(Error::malformed(
                    Some(stream.byte_offset() as u64),
                    err.to_string(),
                ))),
                None => None,
            },
            Framing::Lines { lines, line_no } => loop {
                *line_no += 1;
                match lines.next() {
                    Some(Ok(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        return match serde_json::from_str::<Value>(line) {
                            Ok(value) => Some(Ok(self.normalizer.normalize_value(value))),
                            Err(err) => Some(Err(Error::malformed(
                                None,
                                format!("line {line_no}: {err}"),
                            ))),
                        };
                    }
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => return None,
                }
            },
        }
    }
}

impl<R: BufRead> Iterator for DocumentSequencer<R> {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if let Some(rows) = &mut self.current {
                match rows.next() {
                    Some(row) => return Some(Ok(row)),
                    None => {
                        self.current = None;
                        self.index += 1;
                    }
                }
            }
            match self.next_document() {
                Some(Ok(rows)) => {
                    debug!(document = self.index, "parsed top-level document");
                    self.parsed += 1;
                    self.current = Some(rows);
                }
                Some(Err(source)) => {
                    let failed = self.index;
                    self.index += 1;
                    if self.on_error == OnDocumentError::Abort || !self.can_resync() {
                        self.finished = true;
                    }
                    return Some(Err(source.in_document(failed)));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}

/// Consume leading whitespace and report whether the first value byte opens
/// an array, leaving that byte unconsumed.
fn starts_with_array<R: BufRead>(reader: &mut R) -> Result<bool, Error> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(false);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let first = buf[pos];
                reader.consume(pos);
                return Ok(first == b'[');
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
