//! Layered configuration.
//!
//! Defaults are overridden by `~/.mob.toml`, then by `.mob.toml` in the
//! repository root, then by `MOB_*` environment variables. Command-line
//! flags are applied last by the binary.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::git::ConfigScope;

/// Name of the configuration file looked up in the home directory and the
/// repository root.
pub const FILE_NAME: &str = ".mob.toml";

/// Where aliases are remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AliasScope {
    /// The user's global git configuration.
    Global,
    /// The repository's git configuration.
    Local,
}

impl From<AliasScope> for ConfigScope {
    fn from(scope: AliasScope) -> Self {
        match scope {
            AliasScope::Global => ConfigScope::Global,
            AliasScope::Local => ConfigScope::Local,
        }
    }
}

impl fmt::Display for AliasScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Branch the WIP commits were started from.
    pub base_branch: String,
    pub alias_scope: AliasScope,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_branch: "main".to_string(),
            alias_scope: AliasScope::Global,
            debug: false,
        }
    }
}

/// A configuration file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_branch: Option<String>,
    alias_scope: Option<AliasScope>,
    debug: Option<bool>,
}

impl Config {
    /// Load every layer below the command line.
    ///
    /// `env` looks up environment variables; the binary passes
    /// `std::env::var`.
    pub fn load(
        repo_root: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(home) = env("HOME") {
            config.apply_file(&Path::new(&home).join(FILE_NAME))?;
        }
        if let Some(root) = repo_root {
            config.apply_file(&root.join(FILE_NAME))?;
        }
        config.apply_env(env)?;
        Ok(config)
    }

    /// Override with the keys set in the TOML file at `path`, if it exists.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(Error::Read {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        let file: ConfigFile = toml::from_str(&content).map_err(|e| Error::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!(path = %path.display(), "loaded configuration file");

        if let Some(base_branch) = file.base_branch {
            self.base_branch = base_branch;
        }
        if let Some(alias_scope) = file.alias_scope {
            self.alias_scope = alias_scope;
        }
        if let Some(debug) = file.debug {
            self.debug = debug;
        }
        Ok(())
    }

    /// Override with `MOB_BASE_BRANCH`, `MOB_ALIAS_SCOPE` and `MOB_DEBUG`.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
        if let Some(base_branch) = env("MOB_BASE_BRANCH").filter(|v| !v.is_empty()) {
            self.base_branch = base_branch;
        }
        if let Some(value) = env("MOB_ALIAS_SCOPE") {
            self.alias_scope =
                AliasScope::from_str(&value, false).map_err(|_| Error::InvalidValue {
                    key: "MOB_ALIAS_SCOPE",
                    value,
                })?;
        }
        if let Some(value) = env("MOB_DEBUG") {
            self.debug = value.parse().map_err(|_| Error::InvalidValue {
                key: "MOB_DEBUG",
                value,
            })?;
        }
        Ok(())
    }

    /// The configuration as `MOB_*=value` lines.
    pub fn to_env_lines(&self) -> Vec<String> {
        vec![
            format!("MOB_BASE_BRANCH=\"{}\"", self.base_branch),
            format!("MOB_ALIAS_SCOPE=\"{}\"", self.alias_scope),
            format!("MOB_DEBUG={}", self.debug),
        ]
    }
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}
