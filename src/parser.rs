//! Recursive-descent parser for co-author specifications.
//!
//! ```text
//! coauthors := [entry (Comma entry)* [Comma]] EndOfInput
//! entry     := Author [Assign Alias] | Alias
//! ```

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::lexer::{Token, TokenKind, tokenize};

/// A co-author, `"Full Name <email>"`.
pub type Author = String;

/// A short name for an [`Author`], already normalized.
pub type Alias = String;

/// Aliases mapped to authors in the order they were given.
///
/// An empty author means the alias still has to be looked up in the store.
pub type CoauthorsMap = IndexMap<Alias, Author>;

/// The token sequence could not be reduced by the grammar.
#[derive(Debug, Error)]
#[error("invalid co-author specification: {message}")]
pub struct ParseError {
    pub message: String,
    /// Entries parsed before the error was hit.
    pub partial: CoauthorsMap,
}

/// Lex and parse a specification string.
pub fn parse(input: &str) -> Result<CoauthorsMap, ParseError> {
    parse_coauthors(&tokenize(input))
}

/// Parse a token sequence produced by [`tokenize`].
pub fn parse_coauthors(tokens: &[Token]) -> Result<CoauthorsMap, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        coauthors: CoauthorsMap::new(),
    };
    match parser.coauthors() {
        Ok(()) => {
            debug!(count = parser.coauthors.len(), "parsed co-authors");
            Ok(parser.coauthors)
        }
        Err(message) => Err(ParseError {
            message,
            partial: parser.coauthors,
        }),
    }
}

/// Replace every run of whitespace inside an alias with a single hyphen.
pub fn normalize_alias(alias: &str) -> Alias {
    alias.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Derive an alias from the initials of the author's display name.
///
/// `"Janet Jackson <>"` becomes `"jj"`.
pub fn default_alias(author: &str) -> Alias {
    let name = author.split('<').next().unwrap_or_default();
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_lowercase)
        .collect()
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    coauthors: CoauthorsMap,
}

impl<'t> Parser<'t> {
    fn coauthors(&mut self) -> Result<(), String> {
        if self.peek() == TokenKind::EndOfInput {
            return Ok(());
        }
        loop {
            self.entry()?;
            match self.peek() {
                TokenKind::EndOfInput => return Ok(()),
                TokenKind::Comma => {
                    self.advance();
                    if self.peek() == TokenKind::EndOfInput {
                        return Ok(());
                    }
                }
                _ => {
                    return Err(format!(
                        "expected ',' before '{}'",
                        self.current().map(|t| t.literal.as_str()).unwrap_or_default()
                    ));
                }
            }
        }
    }

    fn entry(&mut self) -> Result<(), String> {
        let Some(token) = self.current() else {
            return Err("unexpected end of input".to_string());
        };
        match token.kind {
            TokenKind::Alias => {
                let alias = normalize_alias(&token.literal);
                self.advance();
                self.insert(alias, String::new());
                Ok(())
            }
            TokenKind::Author => {
                let author = token.literal.clone();
                self.advance();
                if self.peek() != TokenKind::Assign {
                    self.insert(default_alias(&author), author);
                    return Ok(());
                }
                self.advance();
                match self.current() {
                    Some(alias) if alias.kind == TokenKind::Alias => {
                        let alias = normalize_alias(&alias.literal);
                        self.advance();
                        self.insert(alias, author);
                        Ok(())
                    }
                    _ => Err(format!("expected an alias after '{author} as'")),
                }
            }
            TokenKind::Assign => Err("'as' must follow a fully qualified author".to_string()),
            TokenKind::Comma => Err("expected an author or alias before ','".to_string()),
            TokenKind::EndOfInput => Err("unexpected end of input".to_string()),
        }
    }

    fn insert(&mut self, alias: Alias, author: Author) {
        if let Some(previous) = self.coauthors.insert(alias.clone(), author) {
            debug!(%alias, %previous, "co-author alias given more than once, keeping the last");
        }
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> TokenKind {
        self.current().map_or(TokenKind::EndOfInput, |t| t.kind)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}
