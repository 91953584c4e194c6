//! Git repository operations.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

/// Which configuration file `git config` reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    /// The user's global configuration (`--global`).
    Global,
    /// The repository's configuration (`--local`).
    Local,
    /// An explicit configuration file (`--file <path>`).
    File(PathBuf),
}

impl ConfigScope {
    fn args(&self) -> Vec<String> {
        match self {
            Self::Global => vec!["--global".to_string()],
            Self::Local => vec!["--local".to_string()],
            Self::File(path) => vec!["--file".to_string(), path.display().to_string()],
        }
    }
}

/// A git repository handle that provides common operations.
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Find the git repository root starting from the given directory.
    pub fn discover(start_dir: &Path) -> Result<Self, Error> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(start_dir)
            .output()
            .map_err(|e| Error::Exec(format!("git rev-parse: {e}")))?;

        if !output.status.success() {
            return Err(Error::NotARepo(start_dir.display().to_string()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self::at(root))
    }

    /// Run git commands in `dir` without checking that it is a repository.
    ///
    /// Enough for `git config --file` and `--global`.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { root: dir.into() }
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the `.git` directory.
    pub fn git_dir(&self) -> Result<PathBuf, Error> {
        let dir = self.run_output(&["rev-parse", "--absolute-git-dir"])?;
        Ok(PathBuf::from(dir.trim()))
    }

    /// The message file git leaves behind after `merge --squash`.
    pub fn squash_message_path(&self) -> Result<PathBuf, Error> {
        Ok(self.git_dir()?.join("SQUASH_MSG"))
    }

    /// The configured identity as `Name <email>`.
    ///
    /// A missing `user.name` is tolerated, a missing `user.email` is not.
    pub fn user_identity(&self) -> Result<String, Error> {
        let name = self.run_lookup(&["config", "--get", "user.name"])?;
        let email = self
            .run_lookup(&["config", "--get", "user.email"])?
            .ok_or_else(|| Error::Failed("git config --get user.email: not set".to_string()))?;
        let name = name.as_deref().map(str::trim).unwrap_or_default();
        Ok(format!("{name} <{}>", email.trim()).trim_start().to_string())
    }

    /// Author lines and message bodies of the commits in `base..HEAD`,
    /// newest first.
    pub fn log_since(&self, base: &str) -> Result<Vec<String>, Error> {
        let range = format!("{base}..HEAD");
        let output = self.run_output(&["log", &range, "--format=Author: %an <%ae>%n%b"])?;
        Ok(output.lines().map(str::to_string).collect())
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Read a single configuration value.
    pub fn config_get(&self, scope: &ConfigScope, key: &str) -> Result<Option<String>, Error> {
        let mut args = vec!["config".to_string()];
        args.extend(scope.args());
        args.extend(["--get".to_string(), key.to_string()]);
        let value = self.run_lookup(&as_strs(&args))?;
        Ok(value.map(|v| v.trim_end_matches('\n').to_string()))
    }

    /// Write a single configuration value.
    pub fn config_set(&self, scope: &ConfigScope, key: &str, value: &str) -> Result<(), Error> {
        let mut args = vec!["config".to_string()];
        args.extend(scope.args());
        args.extend([key.to_string(), value.to_string()]);
        self.run_output(&as_strs(&args)).map(drop)
    }

    /// All `(key, value)` pairs whose key matches `pattern`.
    pub fn config_get_regexp(
        &self,
        scope: &ConfigScope,
        pattern: &str,
    ) -> Result<Vec<(String, String)>, Error> {
        let mut args = vec!["config".to_string()];
        args.extend(scope.args());
        args.extend(["--get-regexp".to_string(), pattern.to_string()]);
        let Some(output) = self.run_lookup(&as_strs(&args))? else {
            return Ok(Vec::new());
        };
        Ok(output
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(' ') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (line.to_string(), String::new()),
            })
            .collect())
    }

    /// Remove every value of `key`.
    pub fn config_unset_all(&self, scope: &ConfigScope, key: &str) -> Result<(), Error> {
        let mut args = vec!["config".to_string()];
        args.extend(scope.args());
        args.extend(["--unset-all".to_string(), key.to_string()]);
        self.run_output(&as_strs(&args)).map(drop)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn command(&self, args: &[&str]) -> Result<Output, Error> {
        debug!(command = %format!("git {}", args.join(" ")), dir = %self.root.display(), "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))
    }

    /// Run a git command and capture its stdout.
    fn run_output(&self, args: &[&str]) -> Result<String, Error> {
        let output = self.command(args)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(failed(args, &output))
        }
    }

    /// Run a lookup command where exit code 1 means "nothing found".
    fn run_lookup(&self, args: &[&str]) -> Result<Option<String>, Error> {
        let output = self.command(args)?;

        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).to_string())),
            Some(1) => Ok(None),
            _ => Err(failed(args, &output)),
        }
    }
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

fn failed(args: &[&str], output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::Failed(format!("git {}: {}", args.join(" "), stderr.trim()))
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("not a git repository (searched from '{0}')")]
    NotARepo(String),

    #[error("{0}")]
    Failed(String),
}
