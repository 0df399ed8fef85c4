//! Model builder configuration.
//!
//! Defaults suit library use: references are resolved lazily on first
//! access and shadowed imports are logged. Override via environment
//! variables or explicit construction.

use crate::error::{CoreError, CoreResult};

/// Controls how modules are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Resolve every container and constraint set during `Module::build`.
    /// Default: `false`.
    pub eager_resolution: bool,
    /// Log a warning when a module's definition shadows an imported one.
    /// Default: `true`.
    pub warn_on_shadowing: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            eager_resolution: false,
            warn_on_shadowing: true,
        }
    }
}

impl ModelConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `METASCHEMA_EAGER_RESOLUTION` (default: `false`)
    /// - `METASCHEMA_WARN_ON_SHADOWING` (default: `true`)
    ///
    /// Accepted values: `true`/`false`, `yes`/`no`, `1`/`0`.
    pub fn from_env() -> CoreResult<Self> {
        let defaults = Self::default();
        let config = Self {
            eager_resolution: env_flag("METASCHEMA_EAGER_RESOLUTION", defaults.eager_resolution)?,
            warn_on_shadowing: env_flag(
                "METASCHEMA_WARN_ON_SHADOWING",
                defaults.warn_on_shadowing,
            )?,
        };
        tracing::debug!(
            eager_resolution = config.eager_resolution,
            warn_on_shadowing = config.warn_on_shadowing,
            "loaded model config from environment"
        );
        Ok(config)
    }

    /// Configuration that resolves everything at build time.
    pub fn eager() -> Self {
        Self {
            eager_resolution: true,
            ..Self::default()
        }
    }
}

fn env_flag(var: &str, default: bool) -> CoreResult<bool> {
    match std::env::var(var) {
        Ok(raw) => parse_flag(var, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_flag(var: &str, raw: &str) -> CoreResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(CoreError::InvalidConfig {
            var: var.to_string(),
            value: raw.to_string(),
        }),
    }
}
