//! Fan-out assembly: expand one document into its flat rows.
//!
//! Every array in a document is a fan-out point. The rows of a document are
//! the cartesian combinations of one element per traversed array, with all
//! non-array fields broadcast into every row. A document with no arrays is
//! the identity case: one row.

use serde_json::Value;

use crate::flatten::path::PathBuilder;
use crate::flatten::types::Row;

/// Element choice for one array encountered during a walk, in first-
/// encounter order.
#[derive(Debug, Clone, Copy)]
struct Choice {
    index: usize,
    len: usize,
}

/// Work item for the explicit walk stack. Arbitrary nesting depth must not
/// overflow the call stack, so the walk never recurses.
enum Task<'a> {
    Visit(&'a Value),
    Field(&'a str),
    Element,
    Ascend,
}

/// Lazy iterator over the fan-out group of one document.
///
/// Pull-based: each `next` call performs one depth-first walk of the
/// document, selecting one element per array from an odometer of choices,
/// and builds exactly one row. Dropping the iterator early stops all work.
/// Rows appear in lexicographic order over the array choices, with the
/// first-encountered array varying slowest; objects are walked in
/// `serde_json::Map` iteration order, so the sequence is deterministic and
/// reproducible for identical input.
///
/// An empty array zeroes every combination that reaches it; a document
/// whose walk always reaches an empty array therefore yields no rows at
/// all.
///
/// Resource caveat: the number of rows is the product of the traversed
/// array lengths. That growth is inherent to row fan-out and bounded only
/// by the data, not by the engine.
#[derive(Debug)]
pub struct FanOut {
    doc: Value,
    path: PathBuilder,
    choices: Vec<Choice>,
    started: bool,
    done: bool,
}

impl FanOut {
    /// Take ownership of one parsed document. The value is dropped with the
    /// iterator once the group is exhausted.
    pub fn new(doc: Value, separator: &str) -> Self {
        FanOut {
            doc,
            path: PathBuilder::new(separator),
            choices: Vec::new(),
            started: false,
            done: false,
        }
    }

    /// Move the odometer to the next combination: bump the last choice,
    /// dropping exhausted trailing digits so the next walk rediscovers
    /// their arrays at index zero. False means every combination has been
    /// produced.
    fn advance(&mut self) -> bool {
        while let Some(last) = self.choices.last_mut() {
            last.index += 1;
            if last.index < last.len {
                return true;
            }
            self.choices.pop();
        }
        false
    }

    /// One depth-first walk of the document under the current choices.
    /// Newly discovered arrays enter the odometer at index zero. `None`
    /// means this combination ran into an empty array and produces no row.
    fn walk(&mut self) -> Option<Row> {
        self.path.clear();
        let mut row = Row::new();
        let mut discovered = 0usize;
        let mut tasks = vec![Task::Visit(&self.doc)];

        while let Some(task) = tasks.pop() {
            match task {
                Task::Field(name) => self.path.push_field(name),
                Task::Element => self.path.push_element(),
                Task::Ascend => self.path.pop(),
                Task::Visit(value) => match value {
                    Value::Object(fields) => {
                        for (name, field) in fields.iter().rev() {
                            tasks.push(Task::Ascend);
                            tasks.push(Task::Visit(field));
                            tasks.push(Task::Field(name.as_str()));
                        }
                    }
                    Value::Array(elements) => {
                        if elements.is_empty() {
                            return None;
                        }
                        let index = match self.choices.get(discovered) {
                            Some(choice) => {
                                debug_assert_eq!(choice.len, elements.len());
                                choice.index
                            }
                            None => {
                                self.choices.push(Choice {
                                    index: 0,
                                    len: elements.len(),
                                });
                                0
                            }
                        };
                        discovered += 1;
                        tasks.push(Task::Ascend);
                        tasks.push(Task::Visit(&elements[index]));
                        tasks.push(Task::Element);
                    }
                    scalar => {
                        // Colliding rendered keys resolve last-write-wins,
                        // the same rule as duplicate input keys.
                        row.insert(self.path.render(), scalar.clone());
                    }
                },
            }
        }

        Some(row)
    }
}

impl Iterator for FanOut {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        while !self.done {
            if self.started {
                if !self.advance() {
                    self.done = true;
                    break;
                }
            } else {
                self.started = true;
            }

            if let Some(row) = self.walk() {
                return Some(row);
            }
            // Dead combination. With no choices on the odometer the empty
            // array is unconditionally reachable and the group is empty.
            if self.choices.is_empty() {
                self.done = true;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows_of(doc: Value) -> Vec<Row> {
        FanOut::new(doc, ".").collect()
    }

    fn row(value: Value) -> Row {
        value.as_object().expect("expected an object").clone()
    }

    #[test]
    fn flattens_a_nested_object() {
        let rows = rows_of(json!({"a": {"b": 1, "c": 2}}));
        assert_eq!(rows, vec![row(json!({"a.b": 1, "a.c": 2}))]);
    }

    #[test]
    fn a_single_array_fans_out_one_row_per_element() {
        let rows = rows_of(json!({"a": [1, 2, 3]}));
        assert_eq!(
            rows,
            vec![
                row(json!({"a": 1})),
                row(json!({"a": 2})),
                row(json!({"a": 3})),
            ]
        );
    }

    #[test]
    fn sibling_arrays_produce_the_cartesian_product_in_order() {
        let rows = rows_of(json!({"a": [1, 2], "b": [10, 20]}));
        assert_eq!(
            rows,
            vec![
                row(json!({"a": 1, "b": 10})),
                row(json!({"a": 1, "b": 20})),
                row(json!({"a": 2, "b": 10})),
                row(json!({"a": 2, "b": 20})),
            ]
        );
    }

    #[test]
    fn an_empty_array_yields_no_rows() {
        assert!(rows_of(json!({"a": []})).is_empty());
        assert!(rows_of(json!({"a": [], "b": 1})).is_empty());
    }

    #[test]
    fn an_empty_array_only_kills_combinations_that_reach_it() {
        let rows = rows_of(json!({"a": [{"b": []}, {"c": 1}]}));
        assert_eq!(rows, vec![row(json!({"a.c": 1}))]);
    }

    #[test]
    fn a_document_without_arrays_is_a_single_row() {
        let rows = rows_of(json!({"x": 1, "y": "two", "z": null}));
        assert_eq!(rows, vec![row(json!({"x": 1, "y": "two", "z": null}))]);
    }

    #[test]
    fn a_bare_scalar_flattens_under_the_value_key() {
        let rows = rows_of(json!(42));
        assert_eq!(rows, vec![row(json!({"value": 42}))]);
    }

    #[test]
    fn an_empty_object_contributes_no_fields() {
        let rows = rows_of(json!({"a": {}, "b": 1}));
        assert_eq!(rows, vec![row(json!({"b": 1}))]);
    }

    #[test]
    fn arrays_of_objects_broadcast_their_siblings() {
        let rows = rows_of(json!({
            "id": 7,
            "items": [{"v": 1}, {"v": 2}]
        }));
        assert_eq!(
            rows,
            vec![
                row(json!({"id": 7, "items.v": 1})),
                row(json!({"id": 7, "items.v": 2})),
            ]
        );
    }

    #[test]
    fn nested_arrays_fan_out_per_branch() {
        let rows = rows_of(json!({"a": [[1, 2], [3]]}));
        assert_eq!(
            rows,
            vec![
                row(json!({"a": 1})),
                row(json!({"a": 2})),
                row(json!({"a": 3})),
            ]
        );
    }

    #[test]
    fn rows_contain_only_scalars() {
        let rows = rows_of(json!({
            "a": {"b": {"c": [1, {"d": [true, null]}]}},
            "e": ["x", {"f": {"g": 2}}]
        }));
        assert!(!rows.is_empty());
        for row in rows {
            for value in row.values() {
                assert!(!value.is_object() && !value.is_array());
            }
        }
    }

    #[test]
    fn key_set_matches_root_to_leaf_paths_on_array_free_trees() {
        let rows = rows_of(json!({
            "a": {"b": 1, "c": {"d": 2}},
            "e": 3
        }));
        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a.b", "a.c.d", "e"]);
    }

    #[test]
    fn early_termination_is_cheap() {
        let mut fan_out = FanOut::new(json!({"a": [1, 2], "b": [1, 2], "c": [1, 2]}), ".");
        assert!(fan_out.next().is_some());
        // Caller stops pulling; remaining combinations are never built.
        drop(fan_out);
    }

    #[test]
    fn deep_nesting_does_not_overflow_the_stack() {
        let mut doc = json!(1);
        for _ in 0..2_000 {
            doc = json!({"k": doc});
        }
        let rows = rows_of(doc);
        assert_eq!(rows.len(), 1);
        let key = rows[0].keys().next().unwrap();
        assert!(key.starts_with("k.k.") && key.ends_with(".k"));
    }

    #[test]
    fn cardinality_is_the_product_of_sibling_array_lengths() {
        let rows = rows_of(json!({
            "a": [1, 2, 3],
            "b": {"c": [1, 2]},
            "d": [1, 2]
        }));
        assert_eq!(rows.len(), 3 * 2 * 2);
    }
}
