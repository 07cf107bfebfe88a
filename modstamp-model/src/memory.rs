//! In-memory schema and model.
//!
//! Enough of a persistence layer to run hooks and field validation against
//! real documents: no storage, no query engine, no global registry. Each
//! [`Model`] owns its schema, so tests can build as many as they like.

use crate::schema::validate_path;
use crate::{Document, FieldSpec, MemoryDocument, PersistHook, SaveError, Schema, SchemaResult};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// An ordered set of path definitions plus registered persist hooks.
#[derive(Default)]
pub struct MemorySchema {
    fields: Vec<(String, FieldSpec)>,
    hooks: Vec<Box<dyn PersistHook>>,
}

impl MemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema from `(path, spec)` pairs, in order.
    pub fn with_fields<'a>(
        fields: impl IntoIterator<Item = (&'a str, FieldSpec)>,
    ) -> SchemaResult<Self> {
        let mut schema = Self::new();
        for (path, spec) in fields {
            schema.define_path(path, spec)?;
        }
        Ok(schema)
    }

    pub fn field(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(p, _)| p == path).map(|(_, spec)| spec)
    }

    pub fn field_mut(&mut self, path: &str) -> Option<&mut FieldSpec> {
        self.fields
            .iter_mut()
            .find(|(p, _)| p == path)
            .map(|(_, spec)| spec)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(p, spec)| (p.as_str(), spec))
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.field(path).is_some()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Applies a plugin function to this schema.
    pub fn plugin<F, T>(&mut self, plugin: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        plugin(self)
    }
}

impl Schema for MemorySchema {
    fn define_path(&mut self, path: &str, spec: FieldSpec) -> SchemaResult<()> {
        validate_path(path)?;
        match self.field_mut(path) {
            Some(existing) => *existing = spec,
            None => self.fields.push((path.to_string(), spec)),
        }
        Ok(())
    }

    fn paths(&self) -> Vec<String> {
        self.fields.iter().map(|(p, _)| p.clone()).collect()
    }

    fn path_options(&self, path: &str) -> Option<&Map<String, Value>> {
        self.field(path).map(|spec| &spec.tags)
    }

    fn on_before_persist(&mut self, hook: Box<dyn PersistHook>) {
        self.hooks.push(hook);
    }
}

impl fmt::Debug for MemorySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySchema")
            .field("fields", &self.fields)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// A named document type bound to a finished schema.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    schema: Arc<MemorySchema>,
    assign_marks: Arc<[String]>,
}

impl Model {
    pub fn new(name: impl Into<String>, schema: MemorySchema) -> Self {
        let assign_marks: Vec<String> = schema
            .fields()
            .filter(|(_, spec)| spec.mark_modified_on_assign)
            .map(|(path, _)| path.to_string())
            .collect();
        Self {
            name: name.into(),
            schema: Arc::new(schema),
            assign_marks: Arc::from(assign_marks),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &MemorySchema {
        &self.schema
    }

    /// Creates a new, unsaved document from initial values.
    pub fn new_document(&self, body: Value) -> MemoryDocument {
        MemoryDocument::with_assign_marks(body, Arc::clone(&self.assign_marks))
    }

    /// Runs persist hooks then field validation, and commits on success.
    ///
    /// Hooks run in registration order; the first hook error aborts the save
    /// before field validation. On any failure the document keeps its
    /// pending modifications.
    pub fn save(&self, doc: &mut MemoryDocument) -> Result<(), SaveError> {
        for hook in &self.schema.hooks {
            if let Err(error) = hook.before_persist(&mut *doc) {
                debug!(model = %self.name, hook = hook.name(), path = %error.path, "persist hook rejected document");
                let mut errors = doc.take_invalidations();
                errors.insert(error);
                return Err(errors.into());
            }
        }

        for (path, spec) in self.schema.fields() {
            if spec.is_required(&*doc) && doc.get(path).is_none_or(Value::is_null) {
                doc.invalidate(path, format!("Path `{path}` is required."));
            }
        }

        let errors = doc.take_invalidations();
        if !errors.is_empty() {
            debug!(model = %self.name, paths = ?errors.paths(), "document failed validation");
            return Err(errors.into());
        }

        trace!(model = %self.name, was_new = doc.is_new(), "document saved");
        doc.commit();
        Ok(())
    }

    /// The document body as returned by a default query: fields with
    /// `select == false` are left out.
    pub fn project(&self, doc: &MemoryDocument) -> Value {
        let mut body = doc.body().clone();
        for (path, spec) in self.schema.fields() {
            if !spec.select {
                remove_path(&mut body, path);
            }
        }
        body
    }
}

fn remove_path(root: &mut Value, path: &str) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };
    let parent = match parents {
        Some(parents) => root.pointer_mut(&format!("/{}", parents.replace('.', "/"))),
        None => Some(root),
    };
    if let Some(Value::Object(map)) = parent {
        map.remove(leaf);
    }
}
