//! Plugin configuration.
//!
//! Options can be built in code, or read from JSON or TOML. Keys missing at
//! any depth take their defaults; an explicit JSON `null` (or an empty string)
//! for `by.path` disables the actor field.
//!
//! ```toml
//! option_key = "modified"
//! expires_after_secs = 86400
//!
//! [date]
//! path = "modified.date"
//! options = { select = false }
//!
//! [by]
//! path = "modified.by"
//! ref = "User"
//! options = { required = true }
//! ```

use crate::PluginResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resolved plugin configuration. Immutable once applied to a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginOptions {
    /// Tag key that marks a schema path as watched.
    #[serde(default = "default_option_key")]
    pub option_key: String,
    #[serde(default)]
    pub date: DateOptions,
    #[serde(default)]
    pub by: ActorOptions,
    /// Storage-side expiry for the date field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_after_secs: Option<u64>,
    /// Explicit watch list. Overrides tag discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<WatchList>,
}

fn default_option_key() -> String {
    "modified".to_string()
}

fn default_date_path() -> String {
    "modified.date".to_string()
}

fn default_actor_path() -> Option<String> {
    Some("modified.by".to_string())
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            option_key: default_option_key(),
            date: DateOptions::default(),
            by: ActorOptions::default(),
            expires_after_secs: None,
            paths: None,
        }
    }
}

/// Where and how the modification date is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateOptions {
    #[serde(default = "default_date_path")]
    pub path: String,
    #[serde(default)]
    pub options: FieldOptions,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            path: default_date_path(),
            options: FieldOptions::default(),
        }
    }
}

/// Where and how the modifying actor is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorOptions {
    /// `None` or `""` disables the actor field.
    #[serde(default = "default_actor_path")]
    pub path: Option<String>,
    /// Model the actor references. Without it the actor is a plain string.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub options: FieldOptions,
}

impl Default for ActorOptions {
    fn default() -> Self {
        Self {
            path: default_actor_path(),
            reference: None,
            options: FieldOptions::default(),
        }
    }
}

/// Extra attributes merged onto an injected field. The field type is always
/// chosen by the plugin; a `type` entry in `extra` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOptions {
    /// `false` hides the field from the default projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.select = Some(false);
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.index = Some(true);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One path or a list of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchList {
    One(String),
    Many(Vec<String>),
}

impl WatchList {
    pub fn into_paths(self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path],
            Self::Many(paths) => paths,
        }
    }
}

impl From<&str> for WatchList {
    fn from(path: &str) -> Self {
        Self::One(path.to_string())
    }
}

impl From<Vec<String>> for WatchList {
    fn from(paths: Vec<String>) -> Self {
        Self::Many(paths)
    }
}

impl From<&[&str]> for WatchList {
    fn from(paths: &[&str]) -> Self {
        Self::Many(paths.iter().map(|p| p.to_string()).collect())
    }
}

impl PluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from JSON, filling everything missing with defaults.
    pub fn from_json(value: Value) -> PluginResult<Self> {
        Self::default().merge_json(value)
    }

    /// Reads options from a TOML document. TOML has no null, so the actor
    /// field is disabled with `by.path = ""`.
    pub fn from_toml_str(input: &str) -> PluginResult<Self> {
        let value: toml::Value = toml::from_str(input)?;
        Self::from_json(serde_json::to_value(value)?)
    }

    /// Deep-merges `overrides` over these options: objects merge key by key,
    /// anything else (including `null`) replaces the existing value.
    pub fn merge_json(&self, overrides: Value) -> PluginResult<Self> {
        let mut merged = serde_json::to_value(self)?;
        deep_merge(&mut merged, overrides);
        Ok(serde_json::from_value(merged)?)
    }

    /// The actor path, unless the actor field is disabled.
    pub fn actor_path(&self) -> Option<&str> {
        self.by.path.as_deref().filter(|p| !p.is_empty())
    }

    #[must_use]
    pub fn option_key(mut self, key: &str) -> Self {
        self.option_key = key.into();
        self
    }

    #[must_use]
    pub fn date_path(mut self, path: &str) -> Self {
        self.date.path = path.into();
        self
    }

    #[must_use]
    pub fn date_options(mut self, options: FieldOptions) -> Self {
        self.date.options = options;
        self
    }

    #[must_use]
    pub fn actor_path_at(mut self, path: &str) -> Self {
        self.by.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn without_actor(mut self) -> Self {
        self.by.path = None;
        self
    }

    #[must_use]
    pub fn actor_reference(mut self, model: &str) -> Self {
        self.by.reference = Some(model.into());
        self
    }

    #[must_use]
    pub fn actor_options(mut self, options: FieldOptions) -> Self {
        self.by.options = options;
        self
    }

    /// Requires the actor to be updated whenever the date is stamped.
    #[must_use]
    pub fn require_actor(mut self) -> Self {
        self.by.options.required = Some(true);
        self
    }

    #[must_use]
    pub fn expires_after_secs(mut self, secs: u64) -> Self {
        self.expires_after_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn watch(mut self, paths: impl Into<WatchList>) -> Self {
        self.paths = Some(paths.into());
        self
    }
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                deep_merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}
