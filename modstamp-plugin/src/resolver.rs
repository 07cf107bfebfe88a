//! Applies the plugin to a schema: resolves watched paths, injects the date
//! and actor fields, and registers the [`Stamper`].

use crate::clock::{Clock, SystemClock};
use crate::options::FieldOptions;
use crate::{PluginOptions, PluginResult, Stamper, WatchedPaths};
use modstamp_model::{FieldKind, FieldSpec, RequiredRule, Schema};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration derived once per schema and held by the stamper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub watched: WatchedPaths,
    pub date_path: String,
    /// `None` when the actor field is disabled.
    pub actor_path: Option<String>,
    /// The actor must be updated whenever the date is stamped.
    pub actor_required: bool,
}

impl Resolved {
    /// The actor path, if the actor is enabled and required.
    pub fn required_actor(&self) -> Option<&str> {
        self.actor_path.as_deref().filter(|_| self.actor_required)
    }
}

/// Applies the plugin with default options.
pub fn apply_default<S>(schema: &mut S) -> PluginResult<Resolved>
where
    S: Schema + ?Sized,
{
    apply(schema, PluginOptions::default())
}

/// Applies the plugin, stamping with wall-clock time.
pub fn apply<S>(schema: &mut S, options: PluginOptions) -> PluginResult<Resolved>
where
    S: Schema + ?Sized,
{
    apply_with_clock(schema, options, Arc::new(SystemClock))
}

/// Applies the plugin with an explicit time source.
///
/// Watched paths are resolved before any field is injected, so the injected
/// fields never watch themselves. Schema errors from `define_path` are
/// returned unchanged.
pub fn apply_with_clock<S>(
    schema: &mut S,
    options: PluginOptions,
    clock: Arc<dyn Clock>,
) -> PluginResult<Resolved>
where
    S: Schema + ?Sized,
{
    let watched = WatchedPaths::resolve(&*schema, &options);
    match &watched {
        WatchedPaths::Any => debug!(
            option_key = %options.option_key,
            "no watched paths tagged, watching every path"
        ),
        WatchedPaths::Paths(paths) => debug!(paths = ?paths, "resolved watched paths"),
    }

    schema.define_path(&options.date.path, date_field(&options))?;

    let actor_path = match options.actor_path() {
        Some(path) => {
            schema.define_path(path, actor_field(&options))?;
            Some(path.to_string())
        }
        None => None,
    };
    let actor_required = actor_path.is_some() && options.by.options.required == Some(true);

    debug!(
        date_path = %options.date.path,
        actor_path = ?actor_path,
        actor_required,
        "injected modification fields"
    );

    let resolved = Resolved {
        watched,
        date_path: options.date.path.clone(),
        actor_path,
        actor_required,
    };
    schema.on_before_persist(Box::new(Stamper::new(resolved.clone(), clock)));
    Ok(resolved)
}

fn date_field(options: &PluginOptions) -> FieldSpec {
    let field_options = &options.date.options;
    if field_options.required.is_some() {
        warn!(path = %options.date.path, "ignoring `required` on the modification date field");
    }

    let mut spec = with_field_options(FieldSpec::date(), &options.date.path, field_options);
    spec.expires_after_secs = options.expires_after_secs;
    spec
}

fn actor_field(options: &PluginOptions) -> FieldSpec {
    let path = options.actor_path().unwrap_or_default();
    let kind = match &options.by.reference {
        Some(model) => FieldKind::Reference {
            model: model.clone(),
        },
        None => FieldKind::String,
    };

    let mut spec = with_field_options(FieldSpec::new(kind), path, &options.by.options);
    spec.mark_modified_on_assign = true;
    if options.by.options.required == Some(true) {
        // A plain `Always` would also reject the first save of a new document.
        spec = spec.required_when(RequiredRule::ModifiedAlongside {
            path: options.date.path.clone(),
        });
    }
    spec
}

/// Copies caller attributes onto `spec`, keeping the plugin's field type.
fn with_field_options(mut spec: FieldSpec, path: &str, options: &FieldOptions) -> FieldSpec {
    if let Some(select) = options.select {
        spec.select = select;
    }
    if let Some(index) = options.index {
        spec.index = index;
    }
    for (key, value) in &options.extra {
        if key == "type" {
            warn!(path = %path, "ignoring `type` option, the plugin sets the field type");
            continue;
        }
        spec.extra.insert(key.clone(), value.clone());
    }
    spec
}
