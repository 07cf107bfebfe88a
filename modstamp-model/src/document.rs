use crate::{ValidationError, ValidationErrors};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// An in-flight document as seen by persist hooks.
///
/// Paths are dotted (`"name.first"`). Numeric segments index into arrays.
pub trait Document {
    /// True until the document has been persisted once.
    fn is_new(&self) -> bool;

    /// With `Some(path)`: whether `path`, one of its ancestors, or one of its
    /// descendants was assigned since the last save. With `None`: whether
    /// anything was assigned at all.
    fn is_modified(&self, path: Option<&str>) -> bool;

    fn get(&self, path: &str) -> Option<&Value>;

    fn set(&mut self, path: &str, value: Value);

    /// Marks the pending save as failed with an error keyed by `path`.
    fn invalidate(&mut self, path: &str, message: String);
}

/// A document held entirely in memory as a JSON object.
///
/// [`set`](Document::set) creates missing or `null` intermediate objects and
/// pads arrays with `null` up to a numeric index. A write that would have to
/// pass through a scalar, or through an array by a non-numeric segment, is
/// refused and leaves the document untouched.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    body: Value,
    is_new: bool,
    modified: BTreeSet<String>,
    invalid: ValidationErrors,
    /// Paths whose every assignment counts as a modification.
    assign_marks: Arc<[String]>,
}

impl MemoryDocument {
    /// A new, never-persisted document. Initial values are not tracked as
    /// modifications. A non-object body is replaced by an empty object.
    pub fn new(body: Value) -> Self {
        Self::with_assign_marks(body, Arc::from(Vec::new()))
    }

    /// A document that already exists in storage.
    pub fn existing(body: Value) -> Self {
        let mut doc = Self::new(body);
        doc.is_new = false;
        doc
    }

    pub(crate) fn with_assign_marks(body: Value, assign_marks: Arc<[String]>) -> Self {
        let body = if body.is_object() {
            body
        } else {
            Value::Object(Map::new())
        };
        Self {
            body,
            is_new: true,
            modified: BTreeSet::new(),
            invalid: ValidationErrors::default(),
            assign_marks,
        }
    }

    /// The full document body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    /// Paths assigned since the last save, sorted.
    pub fn modified_paths(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Flags a path as modified without assigning to it.
    pub fn mark_modified(&mut self, path: &str) {
        self.modified.insert(path.to_string());
    }

    pub(crate) fn take_invalidations(&mut self) -> ValidationErrors {
        std::mem::take(&mut self.invalid)
    }

    /// Records a successful persist: the document is no longer new and has
    /// no pending modifications.
    pub(crate) fn commit(&mut self) {
        self.is_new = false;
        self.modified.clear();
        self.invalid = ValidationErrors::default();
    }
}

impl Document for MemoryDocument {
    fn is_new(&self) -> bool {
        self.is_new
    }

    fn is_modified(&self, path: Option<&str>) -> bool {
        match path {
            None => !self.modified.is_empty(),
            Some(path) => self.modified.iter().any(|m| overlaps(m, path)),
        }
    }

    fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.body, path)
    }

    fn set(&mut self, path: &str, value: Value) {
        let changed = lookup(&self.body, path) != Some(&value);
        let Some(slot) = slot_mut(&mut self.body, path) else {
            warn!(path, "write refused: path crosses a non-container value");
            return;
        };
        *slot = value;
        if changed || self.assign_marks.iter().any(|p| p == path) {
            self.modified.insert(path.to_string());
        }
    }

    fn invalidate(&mut self, path: &str, message: String) {
        self.invalid.insert(ValidationError::new(path, message));
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    a == b || is_within(a, b) || is_within(b, a)
}

/// True when `child` is strictly below `parent` (`"a.b"` is within `"a"`).
fn is_within(child: &str, parent: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Walks to the slot for `path`, creating intermediate objects as needed.
///
/// Returns `None` before mutating anything when an existing value blocks the
/// path. Only freshly created nodes lie below the first created one, so a
/// walk that fails never leaves partial writes behind.
fn slot_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(root, child_mut)
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Array(items) => {
            let i = segment.parse::<usize>().ok()?;
            if i >= items.len() {
                items.resize(i + 1, Value::Null);
            }
            items.get_mut(i)
        }
        Value::Object(map) => Some(map.entry(segment).or_insert(Value::Null)),
        Value::Null => {
            *node = Value::Object(Map::new());
            node.as_object_mut()
                .map(|map| map.entry(segment).or_insert(Value::Null))
        }
        _ => None,
    }
}
