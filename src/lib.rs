//! Mob co-authors: hand over mob programming sessions with the right
//! `Co-authored-by:` trailers on every commit.
//!
//! # Architecture
//!
//! - **Lexer** and **Parser**: turn `abc, Jane Doe <jane@example.com> as jd`
//!   into an ordered alias → author map
//! - **Reconcile**: resolve bare aliases from the store and stage co-authors
//!   for the next commit
//! - **Trailers**: collect co-authors from WIP commits for the squash message
//! - **Store**, **Git**, **Config**, **Say**: the alias store, the git
//!   wrapper, layered configuration and console output

pub mod config;
pub mod git;
pub mod lexer;
pub mod parser;
pub mod reconcile;
pub mod say;
pub mod store;
pub mod trailers;

pub use config::{AliasScope, Config};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{Alias, Author, CoauthorsMap, ParseError, parse, parse_coauthors};
pub use reconcile::{ResolveError, persist, resolve};
pub use say::{Say, Terminal};
pub use store::{AliasStore, GitConfigStore, MemoryStore, Zone};
pub use trailers::{append_to_squash_message, collect_coauthors, render_trailers};
