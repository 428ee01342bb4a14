use thiserror::Error;

/// Errors surfaced by the flattening engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not well-formed JSON at the point of failure. Not
    /// recoverable for the affected document.
    #[error("malformed JSON input{}: {message}", at_offset(.offset))]
    MalformedInput {
        /// Byte offset into the input stream, when the tokenizer can say.
        offset: Option<u64>,
        message: String,
    },

    /// Structural cases the engine intentionally does not support. Standard
    /// JSON cannot produce these; the variant exists as a guard.
    #[error("unsupported JSON structure: {0}")]
    UnsupportedStructure(String),

    /// A failure attributed to one top-level document of the input.
    #[error("document {index}: {source}")]
    Document {
        /// Zero-based index of the document in input order.
        index: usize,
        source: Box<Error>,
    },

    #[error("i/o error reading input")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn malformed(offset: Option<u64>, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            offset,
            message: message.into(),
        }
    }

    /// Attribute this error to the document it occurred in.
    pub fn in_document(self, index: usize) -> Self {
        Error::Document {
            index,
            source: Box::new(self),
        }
    }
}

fn at_offset(offset: &Option<u64>) -> String {
    match offset {
        Some(offset) => format!(" at byte {offset}"),
        None => String::new(),
    }
}
