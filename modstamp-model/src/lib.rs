//! Document model contract for modstamp.
//!
//! Defines the capability surface that schema plugins are written against:
//! - [`Schema`] — path registration, per-path metadata lookup, persist hooks
//! - [`Document`] — an in-flight document with change tracking
//! - [`FieldSpec`] — a path's type, requiredness, projection and tag metadata
//! - [`PersistHook`] — a callback run before a document is persisted
//!
//! [`MemorySchema`], [`MemoryDocument`] and [`Model`] are a small in-memory
//! host implementing that contract. Embedders with their own persistence
//! layer implement [`Schema`] and [`Document`] instead.

mod document;
mod error;
mod hook;
mod memory;
mod schema;

pub use document::{Document, MemoryDocument};
pub use error::{SaveError, SchemaError, SchemaResult, ValidationError, ValidationErrors};
pub use hook::PersistHook;
pub use memory::{MemorySchema, Model};
pub use schema::{FieldKind, FieldSpec, RequiredRule, Requiredness, Schema};
