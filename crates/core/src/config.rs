//! TOML-based configuration for easy-conflict.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. The default location is
//! `<config_dir>/easy-conflict/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

/// Log levels accepted by `[log] level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Resolution workflow settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Which tool produces the diff3 merge view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeBackend {
    /// `git merge-file --diff3 -p`.
    #[default]
    Git,
    /// In-process merge, no `git` binary required.
    Builtin,
}

/// Settings for the resolution workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Undo/redo history depth (default 100).
    #[serde(default = "default_max_undo")]
    pub max_undo: usize,

    /// Keep a copy of MERGED before overwriting it.
    #[serde(default)]
    pub backup: bool,

    /// Suffix appended to MERGED for the backup copy.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Accept merge views whose conflicts lack a base section.
    #[serde(default)]
    pub allow_missing_base: bool,

    #[serde(default)]
    pub merge_backend: MergeBackend,
}

fn default_max_undo() -> usize {
    100
}
fn default_backup_suffix() -> String {
    ".ec.bak".into()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_undo: default_max_undo(),
            backup: false,
            backup_suffix: default_backup_suffix(),
            allow_missing_base: false,
            merge_backend: MergeBackend::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/easy-conflict/config.toml`, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("easy-conflict").join("config.toml"))
    }

    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load and validate.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// tried, and a missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::load_from_file(&p)?,
                _ => {
                    debug!("no configuration file, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_undo == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver.max_undo".into(),
                detail: "undo depth must be >= 1".into(),
            });
        }
        if self.resolver.backup_suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "resolver.backup_suffix".into(),
                detail: "backup suffix must not be empty".into(),
            });
        }
        let level = self.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log.level".into(),
                detail: format!("unknown level '{}' (expected one of {})", self.log.level, LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }

    /// Commented default configuration written by `ec init-config`.
    pub fn template() -> &'static str {
        r#"# easy-conflict configuration

[resolver]
# Undo/redo history depth.
max_undo = 100
# Keep a copy of MERGED before overwriting it.
backup = false
backup_suffix = ".ec.bak"
# Accept merge views whose conflicts have no ||||||| base section.
allow_missing_base = false
# "git" runs `git merge-file --diff3`; "builtin" merges in-process.
merge_backend = "git"

[log]
# trace, debug, info, warn, error
level = "warn"
"#
    }
}
