use crate::{Document, ValidationError};

/// A callback registered on a schema and run before each persist attempt.
///
/// Hooks run in registration order. Returning `Ok(())` lets the save
/// continue; returning `Err` aborts this save only. The document keeps its
/// pending changes so a corrected retry can succeed.
///
/// Hooks hold only immutable configuration: the same hook instance is
/// invoked for every document of the schema, possibly from several threads.
pub trait PersistHook: Send + Sync {
    /// Inspect and optionally mutate the in-flight document.
    fn before_persist(&self, doc: &mut dyn Document) -> Result<(), ValidationError>;

    /// Short name used in log output.
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> PersistHook for F
where
    F: Fn(&mut dyn Document) -> Result<(), ValidationError> + Send + Sync,
{
    fn before_persist(&self, doc: &mut dyn Document) -> Result<(), ValidationError> {
        self(doc)
    }
}
