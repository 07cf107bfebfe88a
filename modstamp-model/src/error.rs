//! Error types for the document model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for schema registration.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while registering paths on a schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The path name is empty or contains an empty segment (e.g. `"a..b"`).
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// All validation failures collected for one save attempt, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("document failed validation ({} error(s))", .errors.len())]
pub struct ValidationErrors {
    errors: BTreeMap<String, ValidationError>,
}

impl ValidationErrors {
    /// Records an error. A later error on the same path replaces the earlier one.
    pub fn insert(&mut self, error: ValidationError) {
        self.errors.insert(error.path.clone(), error);
    }

    pub fn get(&self, path: &str) -> Option<&ValidationError> {
        self.errors.get(path)
    }

    /// Paths with errors, in sorted order.
    pub fn paths(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// Errors returned by [`Model::save`](crate::Model::save).
#[derive(Debug, Error)]
pub enum SaveError {
    /// A hook or field rule rejected the document. Nothing was committed.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl SaveError {
    /// Returns the validation errors, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
        }
    }
}
