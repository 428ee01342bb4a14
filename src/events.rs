//! Parse-event source for the streaming engine.
//!
//! Wraps an incremental JSON tokenizer around any `BufRead` and hands out
//! one owned [`Event`] at a time. A byte counter sits between the tokenizer
//! and the underlying reader so failures can report where in the stream
//! they happened.

use std::io::BufRead;

use crate::error::Error;

/// One primitive JSON parse event, owning its data.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// An object key; the next value event belongs to it.
    Key(String),
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
}

/// Source of JSON parse events, ie the JSON tokenizer.
pub struct JsonEvents<R: BufRead> {
    reader: json_event_parser::JsonReader<countio::Counter<R>>,
    buf: Vec<u8>,
}

impl<R: BufRead> JsonEvents<R> {
    pub fn new(istream: R) -> Self {
        let counter = countio::Counter::new(istream);
        let reader = json_event_parser::JsonReader::from_reader(counter);
        Self { reader, buf: vec![] }
    }

    /// Bytes consumed from the underlying stream so far.
    pub fn byte_offset(&self) -> u64 {
        self.reader.reader.reader_bytes() as u64
    }

    /// Pull the next event. `Ok(None)` means clean end of input.
    pub fn next_event(&mut self) -> Result<Option<Event>, Error> {
        self.buf.clear();
        match self.reader.read_event(&mut self.buf) {
            Ok(json_event_parser::JsonEvent::Eof) => Ok(None),
            Ok(event) => {
                let offset = self.reader.reader.reader_bytes() as u64;
                to_owned_event(event, offset).map(Some)
            }
            Err(err) => {
                let offset = self.reader.reader.reader_bytes() as u64;
                Err(Error::malformed(Some(offset), err.to_string()))
            }
        }
    }
}

/// Detach the tokenizer's borrowed event into an [`Event`] that owns its
/// data. Number literals are validated here; the tokenizer hands them over
/// as raw text.
fn to_owned_event(event: json_event_parser::JsonEvent<'_>, offset: u64) -> Result<Event, Error> {
    use json_event_parser::JsonEvent;

    let event = match event {
        JsonEvent::StartObject => Event::StartObject,
        JsonEvent::EndObject => Event::EndObject,
        JsonEvent::StartArray => Event::StartArray,
        JsonEvent::EndArray => Event::EndArray,
        JsonEvent::ObjectKey(key) => Event::Key(key.to_string()),
        JsonEvent::String(value) => Event::String(value.to_string()),
        JsonEvent::Number(value) => {
            let number: serde_json::Number = serde_json::from_str(value.as_ref())
                .map_err(|err| {
                    Error::malformed(Some(offset), format!("{value} is not a JSON number: {err}"))
                })?;
            Event::Number(number)
        }
        JsonEvent::Boolean(value) => Event::Boolean(value),
        JsonEvent::Null => Event::Null,
        // Eof is filtered by the caller; nothing else remains.
        event => {
            return Err(Error::malformed(
                Some(offset),
                format!("unexpected parse event {event:?}"),
            ));
        }
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn events_for(input: &str) -> JsonEvents<Cursor<Vec<u8>>> {
        JsonEvents::new(Cursor::new(input.as_bytes().to_vec()))
    }

    #[test]
    fn streams_events_for_a_document() {
        let mut events = events_for(r#"{"a": 1}"#);

        assert_eq!(events.next_event().unwrap(), Some(Event::StartObject));
        assert_eq!(events.next_event().unwrap(), Some(Event::Key("a".into())));
        assert_eq!(
            events.next_event().unwrap(),
            Some(Event::Number(serde_json::Number::from(1)))
        );
        assert_eq!(events.next_event().unwrap(), Some(Event::EndObject));
        assert_eq!(events.next_event().unwrap(), None);
    }

    #[test]
    fn scalar_document_is_a_single_event() {
        let mut events = events_for("true");
        assert_eq!(events.next_event().unwrap(), Some(Event::Boolean(true)));
        assert_eq!(events.next_event().unwrap(), None);
    }

    #[test]
    fn malformed_input_reports_an_offset() {
        let mut events = events_for(r#"{"a": nul}"#);

        assert_eq!(events.next_event().unwrap(), Some(Event::StartObject));
        assert_eq!(events.next_event().unwrap(), Some(Event::Key("a".into())));
        match events.next_event() {
            Err(Error::MalformedInput { offset, .. }) => assert!(offset.is_some()),
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn byte_offset_advances_with_consumption() {
        let mut events = events_for(r#"{"key": "value"}"#);
        while events.next_event().unwrap().is_some() {}
        assert!(events.byte_offset() > 0);
    }
}
