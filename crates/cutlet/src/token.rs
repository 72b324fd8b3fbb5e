use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Classification of a lexed token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum TokenKind {
    /// End of the current source.
    Eof,
    /// A bare word: a run of non-space, non-newline characters.
    Word,
    /// A `$name` or `${name}` variable reference.
    Variable,
    /// The body of a `"…"` or `'…'` quoted string.
    String,
    /// The body of a `[…]` subcommand.
    Subcommand,
    /// The body of a `{…}` braced literal.
    Block,
    /// A `#` comment running to end of line.
    Comment,
    /// An end-of-line marker.
    Eol,
    /// Placeholder used when reporting errors with no real token available.
    Invalid,
}

/// A lexed token with enough position information to re-lex its body.
///
/// `position` is the byte offset in the stream of the token's first
/// character, including any leading delimiter. `content_offset` records how
/// many bytes of delimiter (`"`, `'`, `{`, `[`, `$`) were stripped from the
/// front, so pushing the token text back into the tokenizer preserves
/// absolute source positions for nested parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
    pub content_offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            content_offset: 0,
        }
    }

    pub fn with_offset(
        kind: TokenKind,
        text: impl Into<String>,
        position: usize,
        content_offset: usize,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            content_offset,
        }
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }

    pub fn invalid(text: impl Into<String>, position: usize) -> Self {
        Self::new(TokenKind::Invalid, text, position)
    }

    /// Byte offset of the token's content (past any leading delimiter).
    pub fn content_position(&self) -> usize {
        self.position + self.content_offset
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.position, self.kind, self.text)
    }
}
