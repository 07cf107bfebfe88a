//! Last-modified stamping for modstamp document schemas.
//!
//! Applying the plugin to a schema adds a modification date field (default
//! `modified.date`) and, unless disabled, an actor field (default
//! `modified.by`), then registers a persist hook that writes the current
//! instant into the date field whenever a watched path of an existing
//! document changes.
//!
//! - Watched paths come from the `paths` option, or from schema paths tagged
//!   with the option key (default `"modified"`). With neither, any change to
//!   the document counts.
//! - New documents are never stamped.
//! - With `by.options.required = true`, a stamping save that does not also
//!   assign the actor is rejected with an error on the actor path.
//!
//! ```rust,ignore
//! use modstamp_model::{FieldSpec, MemorySchema, Model};
//! use modstamp_plugin::PluginOptions;
//!
//! let mut schema = MemorySchema::with_fields([
//!     ("username", FieldSpec::string()),
//!     ("name.first", FieldSpec::string().tag("modified", true)),
//! ])?;
//! modstamp_plugin::apply(&mut schema, PluginOptions::new().require_actor())?;
//! let users = Model::new("User", schema);
//! ```
//!
//! Arrays of sub-documents are not supported: whether a change inside an
//! array element shows up in the parent's `is_modified` depends entirely on
//! the host layer, so stamping for such changes is not guaranteed.

mod clock;
mod error;
mod options;
mod resolver;
mod stamper;
mod watched;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PluginError, PluginResult};
pub use options::{ActorOptions, DateOptions, FieldOptions, PluginOptions, WatchList};
pub use resolver::{Resolved, apply, apply_default, apply_with_clock};
pub use stamper::{Decision, Stamper, actor_not_updated_message};
pub use watched::WatchedPaths;
