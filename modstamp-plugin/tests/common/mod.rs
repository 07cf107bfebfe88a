//! Shared fixtures for plugin tests.

#![allow(dead_code)]

use modstamp_model::{FieldSpec, MemoryDocument, MemorySchema, Model, SaveError};
use modstamp_plugin::{Clock, ManualClock, PluginOptions, Resolved};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Clock reading when a fixture is built.
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Installs a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The user schema used throughout: username, password, name.first,
/// name.last, emails, created. `watch_first` tags `name.first`.
pub fn user_schema(watch_first: bool) -> MemorySchema {
    let first = if watch_first {
        FieldSpec::string().tag("modified", true)
    } else {
        FieldSpec::string()
    };
    MemorySchema::with_fields([
        ("username", FieldSpec::string()),
        ("password", FieldSpec::string()),
        ("name.first", first),
        ("name.last", FieldSpec::string()),
        ("emails", FieldSpec::array()),
        ("created", FieldSpec::date()),
    ])
    .expect("user schema is valid")
}

pub fn user_data(created: i64) -> Value {
    json!({
        "username": "ada",
        "password": "correct horse",
        "name": {"first": "Ada", "last": "Lovelace"},
        "emails": ["ada@example.com"],
        "created": created,
    })
}

/// A model with the plugin applied against a manual clock.
pub struct Fixture {
    pub model: Model,
    pub clock: Arc<ManualClock>,
    pub resolved: Resolved,
}

impl Fixture {
    pub fn new(mut schema: MemorySchema, options: PluginOptions) -> Self {
        init_tracing();
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let resolved = modstamp_plugin::apply_with_clock(&mut schema, options, clock.clone())
            .expect("plugin applies");
        Self {
            model: Model::new("User", schema),
            clock,
            resolved,
        }
    }

    /// A new, unsaved user created at the current clock reading.
    pub fn new_user(&self) -> MemoryDocument {
        self.model.new_document(user_data(self.clock.now_millis()))
    }

    /// A user that has been through its first save.
    pub fn saved_user(&self) -> MemoryDocument {
        let mut user = self.new_user();
        self.save(&mut user).expect("initial save succeeds");
        user
    }

    /// Advances the clock one millisecond, then saves.
    pub fn save(&self, doc: &mut MemoryDocument) -> Result<(), SaveError> {
        self.clock.advance(1);
        self.model.save(doc)
    }
}
