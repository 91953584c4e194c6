//! Reconcile parsed co-authors with the alias store and stage them for the
//! next commit.

use thiserror::Error;
use tracing::{debug, info};

use crate::parser::{Author, CoauthorsMap};
use crate::say::Say;
use crate::store::{self, AliasStore, Zone};

/// Errors from resolving aliases against the store.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "unknown co-author aliases: {}. Use a fully qualified author such as \
         \"Full Name <email> as alias\" for aliases you have not used before",
        .0.join(", ")
    )]
    Unresolved(Vec<String>),

    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Fill in the author of every bare alias from the durable zone.
///
/// Fails, listing every alias at once, when any of them is unknown.
pub fn resolve(
    coauthors: CoauthorsMap,
    store: &impl AliasStore,
) -> Result<CoauthorsMap, ResolveError> {
    let mut resolved = CoauthorsMap::with_capacity(coauthors.len());
    let mut missing = Vec::new();

    for (alias, author) in coauthors {
        if !author.is_empty() {
            resolved.insert(alias, author);
            continue;
        }
        match store.get(&Zone::Durable.key(&alias))? {
            Some(known) => {
                debug!(%alias, author = %known, "resolved alias from store");
                resolved.insert(alias, known);
            }
            None => missing.push(alias),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(ResolveError::Unresolved(missing))
    }
}

/// Stage `coauthors` for the next commit and remember their aliases.
///
/// Every alias is checked before anything is written. Previously staged
/// co-authors are always cleared first, so calling this with an empty map
/// just clears the staged zone.
pub fn persist(
    coauthors: &CoauthorsMap,
    store: &mut impl AliasStore,
    say: &mut impl Say,
) -> Result<(), store::Error> {
    for alias in coauthors.keys() {
        store::validate_alias(alias)?;
    }

    if !store.entries(Zone::Staged.prefix())?.is_empty() {
        store.delete_zone(Zone::Staged.prefix())?;
        say.info("Cleared previously staged co-authors");
    }

    if coauthors.is_empty() {
        return Ok(());
    }

    let mut new_aliases = Vec::new();
    for (alias, author) in coauthors {
        let durable_key = Zone::Durable.key(alias);
        let previous = store.get(&durable_key)?;

        store.set(&Zone::Staged.key(alias), author)?;
        if previous.as_deref() != Some(author.as_str()) {
            store.set(&durable_key, author)?;
        }

        match previous {
            None => new_aliases.push((alias, author)),
            Some(previous) if previous != *author => {
                info!(%alias, %previous, %author, "updated alias");
            }
            Some(_) => {}
        }
    }

    for (alias, author) in new_aliases {
        say.hint(&format!(
            "Next time you can use \"{alias}\" as shorthand for {author}"
        ));
    }
    let authors: Vec<&Author> = coauthors.values().collect();
    say.info(&staged_summary(&authors));

    Ok(())
}

fn staged_summary(authors: &[&Author]) -> String {
    match authors {
        [only] => format!("{only} will be co-author of your next commit"),
        [rest @ .., last] => {
            let rest: Vec<&str> = rest.iter().map(|a| a.as_str()).collect();
            format!(
                "{} and {last} will be co-authors of your next commit",
                rest.join(", ")
            )
        }
        [] => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::say::Transcript;
    use crate::store::MemoryStore;

    /// Fails every write, to check that store errors propagate.
    struct ReadOnlyStore(MemoryStore);

    impl AliasStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, store::Error> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), store::Error> {
            Err(crate::git::Error::Failed(format!("read-only: {key}")).into())
        }

        fn delete_zone(&mut self, prefix: &str) -> Result<(), store::Error> {
            Err(crate::git::Error::Failed(format!("read-only: {prefix}")).into())
        }

        fn entries(&self, prefix: &str) -> Result<Vec<(String, String)>, store::Error> {
            self.0.entries(prefix)
        }
    }

    #[test]
    fn test_resolve_fills_known_aliases() {
        let store: MemoryStore = [("mob.br", "Busta Rhymes <busta@example.com>")]
            .into_iter()
            .collect();
        let coauthors = parse("br, Janet Jackson <>").unwrap();

        let resolved = resolve(coauthors, &store).unwrap();

        assert_eq!(resolved["br"], "Busta Rhymes <busta@example.com>");
        assert_eq!(resolved["jj"], "Janet Jackson <>");
        assert_eq!(
            resolved.keys().collect::<Vec<_>>(),
            vec!["br", "jj"],
            "order of the specification is kept"
        );
    }

    #[test]
    fn test_resolve_does_not_look_in_staged_zone() {
        let store: MemoryStore = [("mob.staged.br", "Busta Rhymes <>")].into_iter().collect();
        let err = resolve(parse("br").unwrap(), &store).unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved(ref missing) if missing == &["br"]));
    }

    #[test]
    fn test_resolve_names_every_missing_alias() {
        let store: MemoryStore = [("mob.dhh", "David <dhh@example.com>")].into_iter().collect();
        let err = resolve(parse("abc, dhh, pencil neck").unwrap(), &store).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("abc, pencil-neck"), "{message}");
        assert!(message.contains("fully qualified author"), "{message}");
    }

    #[test]
    fn test_unresolved_alias_stages_nothing() {
        let mut store = MemoryStore::new();
        let mut say = Transcript::new();

        let result = resolve(parse("br").unwrap(), &store);
        assert!(matches!(result, Err(ResolveError::Unresolved(ref m)) if m == &["br"]));
        if let Ok(coauthors) = result {
            persist(&coauthors, &mut store, &mut say).unwrap();
        }

        assert!(store.is_empty());
        assert!(say.lines.is_empty());
    }

    #[test]
    fn test_persist_new_aliases() {
        let mut store = MemoryStore::new();
        let mut say = Transcript::new();
        let coauthors = parse("Butt Head <notbeavis@mtv.net> as bh, Janet Jackson <>").unwrap();

        persist(&coauthors, &mut store, &mut say).unwrap();

        assert_eq!(
            store.get("mob.bh").unwrap().as_deref(),
            Some("Butt Head <notbeavis@mtv.net>")
        );
        assert_eq!(
            store.get("mob.staged.jj").unwrap().as_deref(),
            Some("Janet Jackson <>")
        );
        assert_eq!(store.len(), 4);
        assert_eq!(
            say.lines,
            vec![
                "👉 Next time you can use \"bh\" as shorthand for Butt Head <notbeavis@mtv.net>",
                "👉 Next time you can use \"jj\" as shorthand for Janet Jackson <>",
                "> Butt Head <notbeavis@mtv.net> and Janet Jackson <> will be co-authors of your next commit",
            ]
        );
    }

    #[test]
    fn test_persist_single_known_alias() {
        let mut store: MemoryStore = [("mob.jj", "Janet Jackson <>")].into_iter().collect();
        let mut say = Transcript::new();
        let coauthors = resolve(parse("jj").unwrap(), &store).unwrap();

        persist(&coauthors, &mut store, &mut say).unwrap();

        assert_eq!(
            say.lines,
            vec!["> Janet Jackson <> will be co-author of your next commit"]
        );
        assert_eq!(
            store.get("mob.staged.jj").unwrap().as_deref(),
            Some("Janet Jackson <>")
        );
    }

    #[test]
    fn test_persist_updates_changed_alias() {
        let mut store: MemoryStore = [("mob.jj", "Janet Jackson <>")].into_iter().collect();
        let mut say = Transcript::new();
        let coauthors = parse("Jimmy Jam <jam@flyte.tyme> as jj").unwrap();

        persist(&coauthors, &mut store, &mut say).unwrap();

        assert_eq!(
            store.get("mob.jj").unwrap().as_deref(),
            Some("Jimmy Jam <jam@flyte.tyme>")
        );
        assert_eq!(
            say.lines,
            vec!["> Jimmy Jam <jam@flyte.tyme> will be co-author of your next commit"]
        );
    }

    #[test]
    fn test_persist_twice_is_idempotent() {
        let mut store = MemoryStore::new();
        let coauthors = parse("Butt Head <notbeavis@mtv.net> as bh, Taylor Swift <> as t swizzle")
            .unwrap();

        persist(&coauthors, &mut store, &mut Transcript::new()).unwrap();
        let keys_after_first = store.len();

        let mut say = Transcript::new();
        persist(&coauthors, &mut store, &mut say).unwrap();

        assert_eq!(store.len(), keys_after_first);
        assert_eq!(store.aliases(Zone::Staged).unwrap().len(), 2);
        assert_eq!(
            store.get("mob.t-swizzle").unwrap().as_deref(),
            Some("Taylor Swift <>")
        );
        assert_eq!(
            say.lines,
            vec![
                "> Cleared previously staged co-authors",
                "> Butt Head <notbeavis@mtv.net> and Taylor Swift <> will be co-authors of your next commit",
            ]
        );
    }

    #[test]
    fn test_persist_replaces_previous_staging() {
        let mut store = MemoryStore::new();
        persist(&parse("Janet Jackson <>").unwrap(), &mut store, &mut Transcript::new()).unwrap();
        persist(
            &parse("Taylor Swift <> as ts").unwrap(),
            &mut store,
            &mut Transcript::new(),
        )
        .unwrap();

        let staged = store.aliases(Zone::Staged).unwrap();
        assert_eq!(staged, vec![("ts".to_string(), "Taylor Swift <>".to_string())]);
        assert_eq!(store.aliases(Zone::Durable).unwrap().len(), 2);
    }

    #[test]
    fn test_persist_empty_map_only_clears() {
        let mut store: MemoryStore = [
            ("mob.jj", "Janet Jackson <>"),
            ("mob.staged.jj", "Janet Jackson <>"),
        ]
        .into_iter()
        .collect();
        let mut say = Transcript::new();

        persist(&CoauthorsMap::new(), &mut store, &mut say).unwrap();

        assert!(store.aliases(Zone::Staged).unwrap().is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(say.lines, vec!["> Cleared previously staged co-authors"]);
    }

    #[test]
    fn test_persist_propagates_store_errors() {
        let mut store = ReadOnlyStore(MemoryStore::new());
        let err = persist(&parse("Janet Jackson <>").unwrap(), &mut store, &mut Transcript::new())
            .unwrap_err();
        assert!(err.to_string().contains("read-only: mob.staged.jj"), "{err}");
    }

    #[test]
    fn test_persist_rejects_unstorable_alias_before_clearing() {
        let mut store: MemoryStore = [
            ("mob.jj", "Janet Jackson <>"),
            ("mob.staged.jj", "Janet Jackson <>"),
        ]
        .into_iter()
        .collect();
        let mut say = Transcript::new();

        for spec in [
            "Émile Zola <ez@x>",
            "Bond <b@x> as 007",
            "<a@b>",
            "Jane Doe <jane@x> as j.doe",
        ] {
            let err = persist(&parse(spec).unwrap(), &mut store, &mut say).unwrap_err();
            assert!(matches!(err, store::Error::InvalidAlias(_)), "{spec}: {err}");
        }

        assert_eq!(store.aliases(Zone::Staged).unwrap().len(), 1);
        assert_eq!(store.len(), 2);
        assert!(say.lines.is_empty());
    }

    #[test]
    fn test_persist_twice_on_git_config() {
        use crate::git::{ConfigScope, Git};
        use crate::store::GitConfigStore;

        let git_available = std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !git_available {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("aliases.gitconfig");
        std::fs::write(&file, "").unwrap();
        let mut store = GitConfigStore::new(Git::at(dir.path()), ConfigScope::File(file));
        // A dotted staged key left behind by an older version.
        store.set("mob.staged.j.doe", "Jane Doe <jane@x>").unwrap();

        let coauthors = parse("Taylor Swift <> as ts, Janet Jackson <>").unwrap();
        persist(&coauthors, &mut store, &mut Transcript::new()).unwrap();
        let mut say = Transcript::new();
        persist(&coauthors, &mut store, &mut say).unwrap();

        assert_eq!(
            store.aliases(Zone::Staged).unwrap(),
            vec![
                ("ts".to_string(), "Taylor Swift <>".to_string()),
                ("jj".to_string(), "Janet Jackson <>".to_string()),
            ]
        );
        assert_eq!(store.aliases(Zone::Durable).unwrap().len(), 2);
        assert_eq!(say.lines[0], "> Cleared previously staged co-authors");
    }

    #[test]
    fn test_staged_summary_three_authors() {
        let a = "A <a@x>".to_string();
        let b = "B <b@x>".to_string();
        let c = "C <c@x>".to_string();
        assert_eq!(
            staged_summary(&[&a, &b, &c]),
            "A <a@x>, B <b@x> and C <c@x> will be co-authors of your next commit"
        );
    }
}
