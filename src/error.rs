//! Errors of every pipeline stage. Each one carries the [`Loc`] it should be reported at and
//! renders its message through `Display`.
use thiserror::Error;

use crate::ast::node::Node;
use crate::ast::token::TokenKind;
use crate::ast::types::Type;
use crate::loc::Loc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// Input ended inside a string literal.
    #[error("Unterminated string literal")]
    StrEof { loc: Loc },
    #[error("Unknown escape sequence '\\{escape}' in string literal")]
    StrEsc { escape: char, loc: Loc },
}

impl LexError {
    pub fn loc(&self) -> Loc {
        match self {
            LexError::StrEof { loc } | LexError::StrEsc { loc, .. } => *loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {wanted} token")]
    ExpectedType { wanted: TokenKind, loc: Loc },
    #[error("Expected text '{wanted}'")]
    ExpectedValue { wanted: String, loc: Loc },
    #[error("Expected a type expression")]
    ExpectedTypeExpr { loc: Loc },
    #[error("Type keyword found outside type expression")]
    TypeKeyword { loc: Loc },
    #[error("Expected an expression")]
    ExpectedExpr { loc: Loc },
    #[error("Integer literal {text} is out of range")]
    IntOutOfRange { text: String, loc: Loc },
    #[error("Expression is nested too deeply")]
    TooDeep { loc: Loc },
}

impl ParserError {
    pub fn loc(&self) -> Loc {
        match self {
            ParserError::Lex(err) => err.loc(),
            ParserError::ExpectedType { loc, .. }
            | ParserError::ExpectedValue { loc, .. }
            | ParserError::ExpectedTypeExpr { loc }
            | ParserError::TypeKeyword { loc }
            | ParserError::ExpectedExpr { loc }
            | ParserError::TooDeep { loc }
            | ParserError::IntOutOfRange { loc, .. } => *loc,
        }
    }
}

/// Evaluation-time errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error("Division by zero")]
    ZeroDiv { loc: Loc },
    #[error("Cannot call a non-function value (got {value})")]
    NotCallable { value: Box<Node>, loc: Loc },
    #[error("Identifier '{name}' does not exist")]
    IdentNotFound { name: String, loc: Loc },
    #[error("Cannot set variable '{name}' because it already exists")]
    VarAlreadyExists { name: String, loc: Loc },
    #[error("Invalid number of arguments to function (got {got}, expected {expected})")]
    InvalidArgsNum {
        got: usize,
        expected: usize,
        loc: Loc,
    },
    #[error("Expected a value of type {expected} (got {got})")]
    TypeMismatch { expected: Type, got: Type, loc: Loc },
    #[error("Malformed '{form}' expression")]
    BadForm { form: String, loc: Loc },
    /// Too many calls in progress at once, usually runaway recursion.
    #[error("Maximum call depth exceeded")]
    TooDeep { loc: Loc },
}

impl NodeError {
    pub fn loc(&self) -> Loc {
        match self {
            NodeError::ZeroDiv { loc }
            | NodeError::NotCallable { loc, .. }
            | NodeError::IdentNotFound { loc, .. }
            | NodeError::VarAlreadyExists { loc, .. }
            | NodeError::InvalidArgsNum { loc, .. }
            | NodeError::TypeMismatch { loc, .. }
            | NodeError::BadForm { loc, .. }
            | NodeError::TooDeep { loc } => *loc,
        }
    }
}

/// Anything that can go wrong while reading and running one top-level expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Eval(#[from] NodeError),
    #[error("Unexpected text after expression")]
    TrailingText { loc: Loc },
}

impl Error {
    pub fn loc(&self) -> Loc {
        match self {
            Error::Parse(err) => err.loc(),
            Error::Eval(err) => err.loc(),
            Error::TrailingText { loc } => *loc,
        }
    }
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::Parse(err.into())
    }
}
