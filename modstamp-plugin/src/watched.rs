//! The set of document paths whose modification triggers stamping.

use crate::PluginOptions;
use modstamp_model::{Document, Schema};
use serde_json::Value;

/// Watched paths for one schema. Never structurally empty: either a
/// non-empty list or the [`WatchedPaths::Any`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchedPaths {
    /// Any modification of the document counts.
    Any,
    Paths(Vec<String>),
}

impl WatchedPaths {
    /// Builds the set from an explicit list, falling back to [`Self::Any`]
    /// when the list is empty.
    pub fn from_list(paths: Vec<String>) -> Self {
        if paths.is_empty() {
            Self::Any
        } else {
            Self::Paths(paths)
        }
    }

    /// Resolves the watched set for `schema`.
    ///
    /// An explicit `paths` option is used verbatim, without checking that
    /// the paths exist. Otherwise every schema path whose tag under
    /// `option_key` is truthy is watched, in schema order.
    pub fn resolve<S>(schema: &S, options: &PluginOptions) -> Self
    where
        S: Schema + ?Sized,
    {
        if let Some(list) = &options.paths {
            return Self::from_list(list.clone().into_paths());
        }

        let tagged = schema
            .paths()
            .into_iter()
            .filter(|path| {
                schema
                    .path_options(path)
                    .and_then(|tags| tags.get(&options.option_key))
                    .is_some_and(is_truthy)
            })
            .collect();
        Self::from_list(tagged)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The explicit paths, or an empty slice for the sentinel.
    pub fn paths(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::Paths(paths) => paths,
        }
    }

    /// True if at least one watched path was modified in `doc`.
    pub fn any_modified(&self, doc: &dyn Document) -> bool {
        match self {
            Self::Any => doc.is_modified(None),
            Self::Paths(paths) => paths.iter().any(|p| doc.is_modified(Some(p))),
        }
    }
}

/// Loose truthiness for tag values: `false`, `null`, `0`, and `""` are off.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
