//! Flat key paths.
//!
//! A path is an ordered stack of segments mirroring the engine's descent
//! through a document. Only field names show up in the rendered key; array
//! positions are tracked as markers because they decide row fan-out, not
//! naming.

/// One step of the traversal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An object field name.
    Field(String),
    /// Descent into an array element. Contributes nothing to the rendered
    /// key; each element gets its own row instead.
    Element,
}

/// Key used when a scalar sits at a path with no field names: a bare scalar
/// document, or a scalar element of a split top-level array.
pub const SCALAR_KEY: &str = "value";

/// Maintains the current nesting path and renders the flat key for the
/// scalar at the tip of it. Pure bookkeeping; no failure modes.
#[derive(Debug)]
pub struct PathBuilder {
    segments: Vec<Segment>,
    separator: String,
}

impl PathBuilder {
    pub fn new(separator: impl Into<String>) -> Self {
        PathBuilder {
            segments: Vec::new(),
            separator: separator.into(),
        }
    }

    pub fn push_field(&mut self, name: &str) {
        self.segments.push(Segment::Field(name.to_string()));
    }

    pub fn push_element(&mut self) {
        self.segments.push(Segment::Element);
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Render the active stack as a flat key: field names joined by the
    /// separator, element markers skipped. Distinct traversals may render
    /// the same key; each array element occupies its own row, so that is
    /// intentional. With no field name on the stack this renders
    /// [`SCALAR_KEY`].
    pub fn render(&self) -> String {
        let mut key = String::new();
        let mut empty = true;
        for segment in &self.segments {
            if let Segment::Field(name) = segment {
                if !empty {
                    key.push_str(&self.separator);
                }
                key.push_str(name);
                empty = false;
            }
        }
        if empty {
            SCALAR_KEY.to_string()
        } else {
            key
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_fields() {
        let mut path = PathBuilder::new(".");
        path.push_field("a");
        path.push_field("b");
        assert_eq!(path.render(), "a.b");
    }

    #[test]
    fn element_markers_do_not_rename() {
        let mut path = PathBuilder::new(".");
        path.push_field("items");
        path.push_element();
        assert_eq!(path.render(), "items");

        path.push_field("name");
        assert_eq!(path.render(), "items.name");
    }

    #[test]
    fn custom_separator() {
        let mut path = PathBuilder::new("_");
        path.push_field("a");
        path.push_field("b");
        assert_eq!(path.render(), "a_b");
    }

    #[test]
    fn empty_path_renders_scalar_key() {
        let path = PathBuilder::new(".");
        assert_eq!(path.render(), SCALAR_KEY);

        let mut path = PathBuilder::new(".");
        path.push_element();
        assert_eq!(path.render(), SCALAR_KEY);
    }

    #[test]
    fn pop_restores_the_previous_key() {
        let mut path = PathBuilder::new(".");
        path.push_field("a");
        path.push_field("b");
        path.pop();
        path.push_field("c");
        assert_eq!(path.render(), "a.c");
        assert_eq!(path.depth(), 2);
    }
}
