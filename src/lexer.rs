//! Tokenizer for co-author specifications.
//!
//! A specification is a comma-separated list such as
//! `abc, Butt Head <notbeavis@mtv.net> as bh, Janet Jackson <>`. The lexer
//! never fails: anything that does not look like an author is an alias, and
//! the parser decides whether the token sequence makes sense.

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A fully qualified author, `Display Name <email>`.
    Author,
    /// A short name for an author, possibly several words.
    Alias,
    /// The `as` keyword between an author and its alias.
    Assign,
    /// Entry separator.
    Comma,
    /// End of input. Always the last token, with an empty literal.
    EndOfInput,
}

/// A token together with the text it was lexed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }
}

/// Streaming lexer over a specification string.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    previous: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            previous: None,
        }
    }

    /// Produce the next token. Once the input is exhausted this keeps
    /// returning [`TokenKind::EndOfInput`].
    pub fn next_token(&mut self) -> Token {
        let skipped_whitespace = self.skip_whitespace();
        let rest = &self.input[self.pos..];

        let token = if rest.is_empty() {
            Token::new(TokenKind::EndOfInput, "")
        } else if rest.starts_with(',') {
            self.pos += 1;
            Token::new(TokenKind::Comma, ",")
        } else if self.previous == Some(TokenKind::Author)
            && skipped_whitespace
            && starts_with_word(rest, "as")
        {
            self.pos += 2;
            Token::new(TokenKind::Assign, "as")
        } else {
            self.segment_token()
        };

        self.previous = Some(token.kind);
        token
    }

    /// Lex an author or an alias out of the text up to the next unescaped comma.
    fn segment_token(&mut self) -> Token {
        let rest = &self.input[self.pos..];
        let end = unescaped_comma(rest).unwrap_or(rest.len());
        let segment = &rest[..end];

        if self.previous != Some(TokenKind::Assign) {
            if let Some(close) = author_end(segment) {
                self.pos += close;
                return Token::new(TokenKind::Author, segment[..close].trim());
            }
        }

        self.pos += end;
        Token::new(TokenKind::Alias, segment.trim())
    }

    /// Advance past whitespace, reporting whether any was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }
}

/// Tokenize a whole specification. The result always ends with
/// [`TokenKind::EndOfInput`].
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::EndOfInput;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

/// Byte offset of the first comma that is not preceded by a backslash.
fn unescaped_comma(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            ',' if !escaped => return Some(idx),
            '\\' => escaped = true,
            _ => escaped = false,
        }
    }
    None
}

/// Byte offset just past the `>` closing the first `<...>` pair, if any.
fn author_end(segment: &str) -> Option<usize> {
    let open = segment.find('<')?;
    let close = segment[open..].find('>')?;
    Some(open + close + 1)
}

/// Whether `text` begins with `word` standing on its own.
fn starts_with_word(text: &str, word: &str) -> bool {
    match text.strip_prefix(word) {
        Some(after) => after
            .chars()
            .next()
            .is_none_or(|ch| ch.is_whitespace() || ch == ','),
        None => false,
    }
}
