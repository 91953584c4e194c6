//! Persistent alias store.
//!
//! Aliases live in two zones of a dotted key-value store:
//!
//! - the durable zone, `mob.<alias>`, remembered across sessions;
//! - the staged zone, `mob.staged.<alias>`, holding the co-authors of the
//!   next commit only.

use std::collections::BTreeMap;

use tracing::debug;

use crate::git::{self, ConfigScope, Git};

/// One of the two areas of the alias store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Durable,
    Staged,
}

impl Zone {
    /// Key prefix shared by every entry of the zone.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Durable => "mob.",
            Self::Staged => "mob.staged.",
        }
    }

    pub fn key(self, alias: &str) -> String {
        format!("{}{alias}", self.prefix())
    }

    /// The alias stored under `key`, if `key` belongs to this zone.
    pub fn alias_of(self, key: &str) -> Option<&str> {
        let alias = key.strip_prefix(self.prefix())?;
        match self {
            // `mob.staged.x` shares the durable prefix but is not a durable alias.
            Self::Durable if alias.contains('.') => None,
            _ => Some(alias),
        }
    }
}

/// Check that `alias` can be stored: git config variable names start with
/// an ASCII letter and continue with ASCII letters, digits and hyphens.
pub fn validate_alias(alias: &str) -> Result<(), Error> {
    let mut chars = alias.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidAlias(alias.to_string()))
    }
}

/// Access to the store backing aliases.
pub trait AliasStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove every key starting with `prefix`.
    fn delete_zone(&mut self, prefix: &str) -> Result<(), Error>;

    /// Every `(key, value)` pair whose key starts with `prefix`.
    fn entries(&self, prefix: &str) -> Result<Vec<(String, String)>, Error>;

    /// Aliases of `zone` with their authors.
    fn aliases(&self, zone: Zone) -> Result<Vec<(String, String)>, Error> {
        Ok(self
            .entries(zone.prefix())?
            .into_iter()
            .filter_map(|(key, value)| zone.alias_of(&key).map(|alias| (alias.to_string(), value)))
            .collect())
    }
}

/// Alias store kept in git configuration.
pub struct GitConfigStore {
    git: Git,
    scope: ConfigScope,
}

impl GitConfigStore {
    pub fn new(git: Git, scope: ConfigScope) -> Self {
        Self { git, scope }
    }
}

impl AliasStore for GitConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.git.config_get(&self.scope, key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        debug!(%key, %value, "storing alias");
        Ok(self.git.config_set(&self.scope, key, value)?)
    }

    fn delete_zone(&mut self, prefix: &str) -> Result<(), Error> {
        // Key by key: `mob.staged.j.doe` lives in subsection `staged.j`.
        for (key, _) in self.entries(prefix)? {
            debug!(%key, "removing alias");
            self.git.config_unset_all(&self.scope, &key)?;
        }
        Ok(())
    }

    fn entries(&self, prefix: &str) -> Result<Vec<(String, String)>, Error> {
        let pattern = format!("^{}", regex::escape(prefix));
        let mut entries = self.git.config_get_regexp(&self.scope, &pattern)?;
        entries.retain(|(key, _)| key.starts_with(prefix));
        Ok(entries)
    }
}

/// Alias store held in memory, for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys across both zones.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl AliasStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_zone(&mut self, prefix: &str) -> Result<(), Error> {
        self.values.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    fn entries(&self, prefix: &str) -> Result<Vec<(String, String)>, Error> {
        Ok(self
            .values
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// Errors from alias store access.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("alias store: {0}")]
    Git(#[from] git::Error),

    #[error(
        "invalid alias \"{0}\": aliases must start with a letter and contain only \
         letters, digits and hyphens. Name it explicitly with \"Full Name <email> as alias\""
    )]
    InvalidAlias(String),
}

#[cfg(test)]
mod tests {
    use std::process::Command;

    use super::*;

    #[test]
    fn test_zone_keys() {
        assert_eq!(Zone::Durable.key("jb"), "mob.jb");
        assert_eq!(Zone::Staged.key("t-swizzle"), "mob.staged.t-swizzle");
    }

    #[test]
    fn test_staged_keys_are_not_durable_aliases() {
        assert_eq!(Zone::Durable.alias_of("mob.jb"), Some("jb"));
        assert_eq!(Zone::Durable.alias_of("mob.staged.jb"), None);
        assert_eq!(Zone::Staged.alias_of("mob.staged.jb"), Some("jb"));
        assert_eq!(Zone::Staged.alias_of("mob.jb"), None);
    }

    #[test]
    fn test_memory_store_zones() {
        let mut store: MemoryStore = [
            ("mob.jb", "Bond\\, James <007@example.net>"),
            ("mob.staged.jb", "Bond\\, James <007@example.net>"),
            ("mob.staged.jj", "Janet Jackson <>"),
            ("other.key", "x"),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.entries(Zone::Staged.prefix()).unwrap().len(), 2);
        assert_eq!(
            store.aliases(Zone::Durable).unwrap(),
            vec![("jb".to_string(), "Bond\\, James <007@example.net>".to_string())]
        );

        store.delete_zone(Zone::Staged.prefix()).unwrap();
        assert!(store.entries(Zone::Staged.prefix()).unwrap().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_validate_alias() {
        for alias in ["jb", "t-swizzle", "AS", "r2d2"] {
            assert!(validate_alias(alias).is_ok(), "{alias}");
        }
        for alias in ["", "007", "j.doe", "éz", "a_b", "-x"] {
            assert!(
                matches!(validate_alias(alias), Err(Error::InvalidAlias(ref a)) if a == alias),
                "{alias:?}"
            );
        }
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_git_config_store_roundtrip() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("aliases.gitconfig");
        std::fs::write(&file, "").unwrap();
        let mut store = GitConfigStore::new(Git::at(dir.path()), ConfigScope::File(file));

        assert_eq!(store.get("mob.jb").unwrap(), None);
        assert!(store.entries(Zone::Staged.prefix()).unwrap().is_empty());

        store.set("mob.jb", "Bond\\, James <007@example.net>").unwrap();
        store.set("mob.staged.jb", "Bond\\, James <007@example.net>").unwrap();
        store.set("mob.t-swizzle", "Taylor Swift <>").unwrap();

        assert_eq!(
            store.get("mob.jb").unwrap().as_deref(),
            Some("Bond\\, James <007@example.net>")
        );
        assert_eq!(store.aliases(Zone::Durable).unwrap().len(), 2);
        assert_eq!(store.aliases(Zone::Staged).unwrap().len(), 1);

        store.delete_zone(Zone::Staged.prefix()).unwrap();
        assert!(store.aliases(Zone::Staged).unwrap().is_empty());
        assert_eq!(store.aliases(Zone::Durable).unwrap().len(), 2);

        // Deleting an empty zone is a no-op rather than a git failure.
        store.delete_zone(Zone::Staged.prefix()).unwrap();
    }

    #[test]
    fn test_git_config_store_clears_dotted_staged_keys() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("aliases.gitconfig");
        std::fs::write(&file, "").unwrap();
        let mut store = GitConfigStore::new(Git::at(dir.path()), ConfigScope::File(file));

        store.set("mob.staged.j.doe", "Jane Doe <jane@x>").unwrap();
        store.set("mob.staged.jj", "Janet Jackson <>").unwrap();
        assert_eq!(store.entries(Zone::Staged.prefix()).unwrap().len(), 2);

        store.delete_zone(Zone::Staged.prefix()).unwrap();

        assert!(store.entries(Zone::Staged.prefix()).unwrap().is_empty());
    }
}
