//! Engine Configuration
//!
//! Loaded from environment variables.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Resolution and caching settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Report every check through the tracing notifier
    pub debug: bool,
    /// Answer for permissions that resolve to `Undefined`
    pub default_permission: bool,
    /// Consult `<defaults_type>:<type>` and `<defaults_type>:default` after a subject's own chain
    pub use_type_defaults: bool,
    /// Subject type holding the default subjects
    pub defaults_type: String,
    /// Maximum number of inheritance levels followed
    pub max_inheritance_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_permission: false,
            use_type_defaults: true,
            defaults_type: "default".into(),
            max_inheritance_depth: 32,
        }
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(None),
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; unparsable values are errors.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(debug) = parse_var("PERM_DEBUG")? {
            config.debug = debug;
        }
        if let Some(default_permission) = parse_var("PERM_DEFAULT_PERMISSION")? {
            config.default_permission = default_permission;
        }
        if let Some(use_type_defaults) = parse_var("PERM_USE_TYPE_DEFAULTS")? {
            config.use_type_defaults = use_type_defaults;
        }
        if let Ok(defaults_type) = env::var("PERM_DEFAULTS_TYPE") {
            let defaults_type = defaults_type.trim();
            if defaults_type.is_empty() {
                bail!("PERM_DEFAULTS_TYPE must not be empty");
            }
            config.defaults_type = defaults_type.to_string();
        }
        if let Some(depth) = parse_var("PERM_MAX_INHERITANCE_DEPTH")? {
            config.max_inheritance_depth = depth;
        }

        Ok(config)
    }

    /// Create a config for tests: debug checks on, otherwise defaults.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }
}
