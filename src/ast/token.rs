use std::fmt;

use crate::loc::Loc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Nil,
    TypeKeyword,
    Bool,
    Int,
    Str,
    Ident,
    Quote,
    /// One of `?`, `|` or `$`; only meaningful inside type expressions.
    Special,
    /// One of `(`, `)`, `[` or `]`.
    Paren,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Eof => "an end of file",
            TokenKind::Nil => "a nil",
            TokenKind::TypeKeyword => "a type keyword",
            TokenKind::Bool => "a boolean",
            TokenKind::Int => "an integer",
            TokenKind::Str => "a string",
            TokenKind::Ident => "an identifier",
            TokenKind::Quote => "a quote",
            TokenKind::Special => "a special character",
            TokenKind::Paren => "a parenthesis",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token (string literals already unescaped). `None` only for
    /// [`TokenKind::Eof`].
    pub text: Option<String>,
    pub loc: Loc,
}

impl Token {
    pub fn new<S: Into<String>>(kind: TokenKind, text: S, loc: Loc) -> Self {
        Token {
            kind,
            text: Some(text.into()),
            loc,
        }
    }

    pub fn eof(loc: Loc) -> Self {
        Token {
            kind: TokenKind::Eof,
            text: None,
            loc,
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// `true` if the token has the given kind and text.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text() == text
    }
}
