//! Collect co-authors from WIP commits into `Co-authored-by:` trailers.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::parser::Author;

static AUTHOR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)author.+<.*>").expect("author line pattern is valid")
});

/// Errors from reading or extending the squash message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read squash message '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append co-authors to '{path}'")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The line announcing who performs the squash, to put ahead of the history
/// handed to [`collect_coauthors`].
pub fn committer_line(identity: &str) -> String {
    format!("Author: {identity}")
}

/// Co-authors mentioned in `lines`, shortest first.
///
/// The first author-like line names the committer, who is never a co-author
/// of their own commit. Authors sharing the committer's email are the
/// committer under another name. Every other author is kept once.
pub fn collect_coauthors<S: AsRef<str>>(lines: &[S]) -> Vec<Author> {
    let mut committer: Option<Author> = None;
    let mut coauthors = IndexSet::new();

    for line in lines {
        let line = line.as_ref();
        if !AUTHOR_LINE.is_match(line) {
            continue;
        }
        let author = strip_to_author(line);
        if committer.is_none() {
            debug!(%author, "committer");
            committer = Some(author);
        } else if !committer.as_deref().is_some_and(|c| same_person(c, &author)) {
            coauthors.insert(author);
        }
    }

    let mut coauthors: Vec<Author> = coauthors.into_iter().collect();
    coauthors.sort_by_key(String::len);
    debug!(coauthors = %coauthors.join(","), "collected co-authors");
    coauthors
}

/// Render co-authors as the trailer block appended to a squash message.
pub fn render_trailers(coauthors: &[Author]) -> String {
    let mut message = String::from("\n\n");
    message.push_str("# automatically added all co-authors from WIP commits\n");
    message.push_str("# add missing co-authors manually\n");
    for coauthor in coauthors {
        message.push_str(&format!("Co-authored-by: {coauthor}\n"));
    }
    message
}

/// Append the co-authors found in the squash message at `path` to it.
///
/// `committer` is the identity of the user performing the squash. A missing
/// file means there was nothing to squash and is not an error. Returns the
/// co-authors that were appended.
pub fn append_to_squash_message(path: &Path, committer: &str) -> Result<Vec<Author>, Error> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no squash message, nothing to do");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::Read {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    let header = committer_line(committer);
    let lines: Vec<&str> = std::iter::once(header.as_str())
        .chain(content.lines())
        .collect();
    let coauthors = collect_coauthors(&lines);
    if coauthors.is_empty() {
        return Ok(coauthors);
    }

    let write_err = |e| Error::Write {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(render_trailers(&coauthors).as_bytes())
        .map_err(write_err)?;

    Ok(coauthors)
}

/// Same non-empty email, or the same identity when an email is missing.
fn same_person(a: &str, b: &str) -> bool {
    match (email(a), email(b)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => a == b,
    }
}

fn email(author: &str) -> Option<&str> {
    let (_, rest) = author.split_once('<')?;
    let (email, _) = rest.split_once('>')?;
    Some(email.trim()).filter(|e| !e.is_empty())
}

/// The text after the first colon, with further colons dropped.
fn strip_to_author(line: &str) -> Author {
    line.split(':').skip(1).collect::<String>().trim().to_string()
}
