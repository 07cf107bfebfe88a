use crate::{Document, PersistHook, SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The registration surface a document schema exposes to plugins.
pub trait Schema {
    /// Registers (or replaces) the field at a dotted path.
    fn define_path(&mut self, path: &str, spec: FieldSpec) -> SchemaResult<()>;

    /// Every defined path, in definition order.
    fn paths(&self) -> Vec<String>;

    /// Per-path tag metadata set when the path was defined.
    fn path_options(&self, path: &str) -> Option<&Map<String, Value>>;

    /// Registers a hook run before each persist attempt.
    fn on_before_persist(&mut self, hook: Box<dyn PersistHook>);
}

/// Describes a single document path: its value type and the attributes the
/// host layer enforces or passes through to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    #[serde(default)]
    pub required: Requiredness,
    /// Included in the default query projection.
    #[serde(default = "default_select")]
    pub select: bool,
    #[serde(default)]
    pub index: bool,
    /// Storage-side TTL: purge the document this many seconds after the
    /// stored instant. Interpreted by the persistence layer only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_after_secs: Option<u64>,
    /// Treat every assignment as a modification, even when the assigned
    /// value equals the current one.
    #[serde(default)]
    pub mark_modified_on_assign: bool,
    /// Declarative per-path metadata, e.g. `{"modified": true}`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub tags: Map<String, Value>,
    /// Pass-through attributes the host does not interpret.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

fn default_select() -> bool {
    true
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: Requiredness::Optional,
            select: true,
            index: false,
            expires_after_secs: None,
            mark_modified_on_assign: false,
            tags: Map::new(),
            extra: Map::new(),
        }
    }

    /// Shorthand for a string field.
    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// Shorthand for a numeric field.
    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    /// Shorthand for a boolean field.
    pub fn bool() -> Self {
        Self::new(FieldKind::Bool)
    }

    /// Shorthand for an instant-in-time field (epoch milliseconds).
    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// Shorthand for a reference to a document of another model.
    pub fn reference(model: &str) -> Self {
        Self::new(FieldKind::Reference {
            model: model.into(),
        })
    }

    /// Shorthand for an array field.
    pub fn array() -> Self {
        Self::new(FieldKind::Array)
    }

    /// Attaches a tag to this path's metadata.
    #[must_use]
    pub fn tag(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Requiredness::Always;
        self
    }

    #[must_use]
    pub fn required_when(mut self, rule: RequiredRule) -> Self {
        self.required = Requiredness::When(rule);
        self
    }

    /// Excludes the field from the default projection.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.select = false;
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.index = true;
        self
    }

    #[must_use]
    pub fn expires_after(mut self, secs: u64) -> Self {
        self.expires_after_secs = Some(secs);
        self
    }

    /// Whether the field must hold a value for this save of `doc`.
    pub fn is_required(&self, doc: &dyn Document) -> bool {
        match &self.required {
            Requiredness::Optional => false,
            Requiredness::Always => true,
            Requiredness::When(rule) => rule.holds(doc),
        }
    }
}

/// The value type stored at a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Bool,
    Date,
    Reference { model: String },
    Array,
    Object,
}

/// When a field must hold a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requiredness {
    #[default]
    Optional,
    Always,
    /// Required only when the rule holds for the document being saved.
    When(RequiredRule),
}

/// A requiredness condition evaluated per save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredRule {
    /// Required when the document already exists and `path` was modified
    /// in this save. Never fires on creation.
    ModifiedAlongside { path: String },
}

impl RequiredRule {
    pub fn holds(&self, doc: &dyn Document) -> bool {
        match self {
            Self::ModifiedAlongside { path } => !doc.is_new() && doc.is_modified(Some(path)),
        }
    }
}

/// Checks that a dotted path has no empty segments.
pub(crate) fn validate_path(path: &str) -> SchemaResult<()> {
    if path.is_empty() {
        return Err(SchemaError::InvalidPath {
            path: path.into(),
            reason: "path is empty".into(),
        });
    }
    if path.split('.').any(str::is_empty) {
        return Err(SchemaError::InvalidPath {
            path: path.into(),
            reason: "path contains an empty segment".into(),
        });
    }
    Ok(())
}
