//! JSON flattening - expand nested documents into flat rows
//!
//! This module turns nested JSON documents into flat records whose keys are
//! the dot-joined field paths of the input. Arrays fan rows out: each output
//! row holds exactly one element from every array it traverses, with all
//! other fields broadcast alongside.
//!
//! ## Resource caveat
//!
//! Row count is the cartesian product of the traversed array lengths. That
//! growth is a property of the fan-out representation itself and is bounded
//! only by the data.

pub mod assembler;
pub mod normalizer;
pub mod path;
pub mod sequencer;
pub mod types;
pub mod writer;

pub use assembler::FanOut;
pub use normalizer::{StreamingNormalizer, ValueBuilder};
pub use path::{PathBuilder, Segment, SCALAR_KEY};
pub use sequencer::DocumentSequencer;
pub use types::{FlattenConfig, OnDocumentError, Row, RunSummary};
pub use writer::RowWriter;
