use serde::Serialize;
use serde_json::{Map, Value};

/// One flattened output record: flat key path to JSON scalar. Rows never
/// contain nested objects or arrays.
pub type Row = Map<String, Value>;

/// What the sequencer does when one top-level document fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDocumentError {
    /// Stop the run at the first failed document.
    Abort,
    /// Report the failure and continue with the next document, where the
    /// input framing still allows one to be found.
    Skip,
}

/// Configuration for the flattening process.
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// String joining field-name path segments in flat keys.
    pub separator: String,

    /// Document-failure policy.
    pub on_document_error: OnDocumentError,

    /// Whether a top-level JSON array is a sequence of documents to process
    /// one by one, rather than a single document to fan out.
    pub split_top_level_arrays: bool,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            separator: String::from("."),
            on_document_error: OnDocumentError::Abort,
            split_top_level_arrays: true,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// Top-level documents successfully flattened.
    pub documents: usize,
    /// Rows written.
    pub rows: usize,
    /// Documents that failed and were skipped.
    pub failures: usize,
}
