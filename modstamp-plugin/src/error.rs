//! Error types for the plugin.

use modstamp_model::SchemaError;
use thiserror::Error;

/// Result type for plugin configuration and registration.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors raised while building options or applying the plugin to a schema.
///
/// Save-time failures are not represented here: the stamper reports them as
/// a [`ValidationError`](modstamp_model::ValidationError) through the host.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The host schema refused a field definition.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Options JSON did not match the expected shape.
    #[error("invalid plugin options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    /// Options TOML could not be parsed.
    #[error("invalid TOML options: {0}")]
    Toml(#[from] toml::de::Error),
}
