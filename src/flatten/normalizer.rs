//! Streaming normalization: parse events in, lazy rows out.
//!
//! The normalizer consumes the event stream for exactly one top-level value,
//! buffering only that value (never the rest of the input) and hands back
//! the lazy [`FanOut`] over it. Emission is all-or-nothing per document: a
//! malformed document produces an error and zero rows.

use std::io::BufRead;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::events::{Event, JsonEvents};
use crate::flatten::assembler::FanOut;
use crate::flatten::types::FlattenConfig;

/// In-progress container on the build stack.
enum Frame {
    Object {
        fields: Map<String, Value>,
        pending_key: Option<String>,
    },
    Array(Vec<Value>),
}

/// Builds one `Value` from a stream of parse events.
///
/// Every structural transition is guarded; behind a well-formed tokenizer
/// the guard errors are unreachable, but they keep the builder total when
/// fed events from elsewhere.
#[derive(Default)]
pub struct ValueBuilder {
    stack: Vec<Frame>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no container is open, ie between top-level values.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Feed one event. Returns the completed value once the outermost
    /// container closes, or immediately for a bare scalar.
    pub fn feed(&mut self, event: Event) -> Result<Option<Value>, Error> {
        match event {
            Event::StartObject => {
                self.stack.push(Frame::Object {
                    fields: Map::new(),
                    pending_key: None,
                });
                Ok(None)
            }
            Event::StartArray => {
                self.stack.push(Frame::Array(Vec::new()));
                Ok(None)
            }
            Event::Key(key) => match self.stack.last_mut() {
                Some(Frame::Object { pending_key, .. }) => {
                    if pending_key.replace(key).is_some() {
                        return Err(Error::malformed(None, "object key where a value was expected"));
                    }
                    Ok(None)
                }
                _ => Err(Error::malformed(None, "object key outside an object")),
            },
            Event::EndObject => match self.stack.pop() {
                Some(Frame::Object {
                    fields,
                    pending_key: None,
                }) => self.complete(Value::Object(fields)),
                Some(Frame::Object { .. }) => Err(Error::malformed(
                    None,
                    "object closed while a key was awaiting its value",
                )),
                _ => Err(Error::malformed(None, "end of object with no open object")),
            },
            Event::EndArray => match self.stack.pop() {
                Some(Frame::Array(elements)) => self.complete(Value::Array(elements)),
                _ => Err(Error::malformed(None, "end of array with no open array")),
            },
            Event::Null => self.value(Value::Null),
            Event::Boolean(value) => self.value(Value::Bool(value)),
            Event::Number(value) => self.value(Value::Number(value)),
            Event::String(value) => self.value(Value::String(value)),
        }
    }

    /// Attach a finished value to the open container, or surface it when
    /// the stack is empty.
    fn value(&mut self, value: Value) -> Result<Option<Value>, Error> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(Frame::Array(elements)) => {
                elements.push(value);
                Ok(None)
            }
            Some(Frame::Object {
                fields,
                pending_key,
            }) => match pending_key.take() {
                // Duplicate keys resolve last-write-wins, matching standard
                // JSON parsing behavior.
                Some(key) => {
                    fields.insert(key, value);
                    Ok(None)
                }
                None => Err(Error::malformed(
                    None,
                    "value inside an object with no preceding key",
                )),
            },
        }
    }

    fn complete(&mut self, value: Value) -> Result<Option<Value>, Error> {
        if self.stack.is_empty() {
            Ok(Some(value))
        } else {
            self.value(value)
        }
    }
}

/// Consumes parse events one top-level value at a time and yields the lazy
/// row sequence for each.
pub struct StreamingNormalizer {
    separator: String,
}

impl StreamingNormalizer {
    pub fn new(config: &FlattenConfig) -> Self {
        StreamingNormalizer {
            separator: config.separator.clone(),
        }
    }

    /// Pull events until one top-level value completes and return its
    /// fan-out. `Ok(None)` means clean end of input.
    pub fn normalize<R: BufRead>(
        &self,
        events: &mut JsonEvents<R>,
    ) -> Result<Option<FanOut>, Error> {
        let mut builder = ValueBuilder::new();
        loop {
            let Some(event) = events.next_event()? else {
                return if builder.is_empty() {
                    Ok(None)
                } else {
                    Err(Error::malformed(
                        Some(events.byte_offset()),
                        "unexpected end of input inside a document",
                    ))
                };
            };
            if let Some(doc) = builder.feed(event)? {
                return Ok(Some(self.normalize_value(doc)));
            }
        }
    }

    /// Consume events for the next element of an already-opened array.
    /// `Ok(None)` means the array closed: no more documents.
    pub fn normalize_array_element<R: BufRead>(
        &self,
        events: &mut JsonEvents<R>,
    ) -> Result<Option<FanOut>, Error> {
        let mut builder = ValueBuilder::new();
        loop {
            let Some(event) = events.next_event()? else {
                return Err(Error::malformed(
                    Some(events.byte_offset()),
                    "unexpected end of input inside a top-level array",
                ));
            };
            if builder.is_empty() && event == Event::EndArray {
                return Ok(None);
            }
            if let Some(doc) = builder.feed(event)? {
                return Ok(Some(self.normalize_value(doc)));
            }
        }
    }

    /// Flatten an already-parsed document.
    pub fn normalize_value(&self, doc: Value) -> FanOut {
        FanOut::new(doc, &self.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn feed_all(events: Vec<Event>) -> Result<Option<Value>, Error> {
        let mut builder = ValueBuilder::new();
        let mut result = None;
        for event in events {
            result = builder.feed(event)?;
        }
        Ok(result)
    }

    fn events_for(input: &str) -> JsonEvents<Cursor<Vec<u8>>> {
        JsonEvents::new(Cursor::new(input.as_bytes().to_vec()))
    }

    #[test]
    fn builds_a_bare_scalar() {
        let value = feed_all(vec![Event::Number(serde_json::Number::from(42))]).unwrap();
        assert_eq!(value, Some(json!(42)));
    }

    #[test]
    fn builds_a_nested_value() {
        let value = feed_all(vec![
            Event::StartObject,
            Event::Key("a".into()),
            Event::StartArray,
            Event::Number(serde_json::Number::from(1)),
            Event::Null,
            Event::EndArray,
            Event::Key("b".into()),
            Event::Boolean(false),
            Event::EndObject,
        ])
        .unwrap();
        assert_eq!(value, Some(json!({"a": [1, null], "b": false})));
    }

    #[test]
    fn duplicate_keys_are_last_write_wins() {
        let value = feed_all(vec![
            Event::StartObject,
            Event::Key("a".into()),
            Event::Number(serde_json::Number::from(1)),
            Event::Key("a".into()),
            Event::Number(serde_json::Number::from(2)),
            Event::EndObject,
        ])
        .unwrap();
        assert_eq!(value, Some(json!({"a": 2})));
    }

    #[test]
    fn structural_guards_reject_impossible_sequences() {
        assert!(feed_all(vec![Event::EndArray]).is_err());
        assert!(feed_all(vec![Event::Key("a".into())]).is_err());
        assert!(feed_all(vec![Event::StartObject, Event::Boolean(true)]).is_err());
        assert!(feed_all(vec![
            Event::StartObject,
            Event::Key("a".into()),
            Event::EndObject,
        ])
        .is_err());
        assert!(feed_all(vec![Event::StartArray, Event::EndObject]).is_err());
    }

    #[test]
    fn normalizes_one_document_from_an_event_stream() {
        let config = FlattenConfig::default();
        let normalizer = StreamingNormalizer::new(&config);
        let mut events = events_for(r#"{"a": [1, 2]}"#);

        let rows: Vec<_> = normalizer.normalize(&mut events).unwrap().unwrap().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({"a": 1}).as_object().unwrap().clone());

        assert!(normalizer.normalize(&mut events).unwrap().is_none());
    }

    #[test]
    fn truncated_input_is_malformed() {
        let config = FlattenConfig::default();
        let normalizer = StreamingNormalizer::new(&config);
        let mut events = events_for(r#"{"a": [1, 2"#);

        match normalizer.normalize(&mut events) {
            Err(Error::MalformedInput { .. }) => {}
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn array_elements_stream_until_the_array_closes() {
        let config = FlattenConfig::default();
        let normalizer = StreamingNormalizer::new(&config);
        let mut events = events_for(r#"[{"x": 1}, 2]"#);

        assert_eq!(events.next_event().unwrap(), Some(Event::StartArray));

        let rows: Vec<_> = normalizer
            .normalize_array_element(&mut events)
            .unwrap()
            .unwrap()
            .collect();
        assert_eq!(rows, vec![json!({"x": 1}).as_object().unwrap().clone()]);

        let rows: Vec<_> = normalizer
            .normalize_array_element(&mut events)
            .unwrap()
            .unwrap()
            .collect();
        assert_eq!(rows, vec![json!({"value": 2}).as_object().unwrap().clone()]);

        assert!(normalizer
            .normalize_array_element(&mut events)
            .unwrap()
            .is_none());
    }
}
