//! Save-time stamping of the modification date.

use crate::clock::Clock;
use crate::resolver::Resolved;
use modstamp_model::{Document, PersistHook, ValidationError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of evaluating one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First persist of the document: never stamped.
    New,
    /// No watched path changed.
    Unchanged,
    /// A watched path changed but the required actor was not updated.
    ActorNotUpdated,
    /// Write the current instant into the date field.
    Stamp,
}

/// Persist hook that stamps the date field when a watched path changes.
///
/// Holds only the configuration resolved when the plugin was applied, so a
/// single instance serves every document of the schema.
pub struct Stamper {
    resolved: Resolved,
    clock: Arc<dyn Clock>,
}

impl Stamper {
    pub fn new(resolved: Resolved, clock: Arc<dyn Clock>) -> Self {
        Self { resolved, clock }
    }

    pub fn resolved(&self) -> &Resolved {
        &self.resolved
    }

    /// Decides what this save must do, without touching the document.
    ///
    /// The actor check runs against the document as it stands before the
    /// date is written, so a rejected save leaves the date untouched and a
    /// corrected retry is stamped at the moment it succeeds.
    pub fn decide(&self, doc: &dyn Document) -> Decision {
        if doc.is_new() {
            return Decision::New;
        }
        if !self.resolved.watched.any_modified(doc) {
            return Decision::Unchanged;
        }
        match self.resolved.required_actor() {
            Some(actor) if !doc.is_modified(Some(actor)) => Decision::ActorNotUpdated,
            _ => Decision::Stamp,
        }
    }
}

/// Message attached to the actor path when it was not updated.
pub fn actor_not_updated_message(actor_path: &str) -> String {
    format!("{actor_path} must be updated for document modification")
}

impl PersistHook for Stamper {
    fn before_persist(&self, doc: &mut dyn Document) -> Result<(), ValidationError> {
        let decision = self.decide(&*doc);
        trace!(?decision, "evaluated modification stamp");

        match decision {
            Decision::New | Decision::Unchanged => Ok(()),
            Decision::ActorNotUpdated => {
                let path = self.resolved.required_actor().unwrap_or_default();
                let message = actor_not_updated_message(path);
                debug!(path = %path, "rejecting save: actor not updated");
                doc.invalidate(path, message.clone());
                Err(ValidationError::new(path, message))
            }
            Decision::Stamp => {
                let now = self.clock.now_millis();
                debug!(path = %self.resolved.date_path, at = now, "stamping modification date");
                doc.set(&self.resolved.date_path, Value::from(now));
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        "modstamp"
    }
}

impl fmt::Debug for Stamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stamper")
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}
