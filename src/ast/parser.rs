//! Parser converts a token stream into [`Node`]s.
//!
//! Every production either succeeds or puts back every token it consumed, so the caller can try
//! another production from the same position. Put-back tokens live in `restore` (next token on
//! top) and are always preferred over pulling a new token from the lexer.
use tracing::trace;

use crate::ast::lexer::Lexer;
use crate::ast::node::{Node, NodeKind};
use crate::ast::source::Source;
use crate::ast::token::{Token, TokenKind};
use crate::ast::types::Type;
use crate::error::ParserError;

type Result<T> = std::result::Result<T, ParserError>;

/// Deepest nesting of lists, quotes and type expressions the parser accepts.
pub const MAX_NESTING: usize = 128;

pub struct Parser<S> {
    lexer: Lexer<S>,
    /// Tokens waiting to be consumed again, the next one last.
    restore: Vec<Token>,
    /// Tokens consumed since the current top-level expression started, in order.
    consumed: Vec<Token>,
    /// Expressions and type expressions currently being parsed.
    nesting: usize,
}

impl<S: Source> Parser<S> {
    pub fn new(source: S) -> Parser<S> {
        Parser {
            lexer: Lexer::new(source),
            restore: Vec::new(),
            consumed: Vec::new(),
            nesting: 0,
        }
    }

    pub fn source(&self) -> &S {
        self.lexer.source()
    }

    /// `true` when the current line holds nothing more to parse: the source is positionally
    /// exhausted and no token or character is buffered.
    pub fn is_eol(&self) -> bool {
        self.restore.is_empty() && self.lexer.is_eol()
    }

    /// Throw away the rest of the current line and everything buffered.
    pub fn skip_line(&mut self) {
        self.lexer.skip_line();
        self.restore.clear();
        self.consumed.clear();
    }

    /// `true` when no more input is left at all.
    pub fn is_eof(&mut self) -> Result<bool> {
        Ok(self.peek()?.kind == TokenKind::Eof)
    }

    pub fn peek(&mut self) -> Result<&Token> {
        if self.restore.is_empty() {
            let token = self.lexer.next_token()?;
            self.restore.push(token);
        }
        // just pushed if it was empty
        Ok(&self.restore[self.restore.len() - 1])
    }

    fn next_token(&mut self) -> Result<Token> {
        let token = match self.restore.pop() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        self.consumed.push(token.clone());
        Ok(token)
    }

    /// Run the production `f`. If it fails, every token it consumed is put back.
    fn production<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mark = self.consumed.len();
        let result = f(self);
        if result.is_err() {
            let tokens = self.consumed.split_off(mark);
            trace!("backtracking over {} tokens", tokens.len());
            self.restore.extend(tokens.into_iter().rev());
        }
        result
    }

    /// Run `f` one level deeper, failing with `TooDeep` at the next token past [`MAX_NESTING`].
    fn nested<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.nesting >= MAX_NESTING {
            let loc = self.peek()?.loc;
            return Err(ParserError::TooDeep { loc });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn expect_kind(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.next_token()?;
        if token.kind != kind {
            return Err(ParserError::ExpectedType {
                wanted: kind,
                loc: token.loc,
            });
        }
        Ok(token)
    }

    fn expect_text(&mut self, kind: TokenKind, text: &str) -> Result<Token> {
        let token = self.expect_kind(kind)?;
        if token.text() != text {
            return Err(ParserError::ExpectedValue {
                wanted: text.to_string(),
                loc: token.loc,
            });
        }
        Ok(token)
    }

    /// Parse one complete expression. On failure nothing is consumed.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn parse_expr(&mut self) -> Result<Node> {
        let node = self.expr()?;
        self.consumed.clear();
        Ok(node)
    }

    fn expr(&mut self) -> Result<Node> {
        self.nested(|p| p.production(|p| {
            let token = p.peek()?.clone();
            trace!("expr: {:?}", token);
            match (token.kind, token.text()) {
                (TokenKind::Nil, _) => p.parse_nil(),
                (TokenKind::Special, "$") => p.parse_type_expr(),
                (TokenKind::Bool, _) => p.parse_bool(),
                (TokenKind::Int, _) => p.parse_int(),
                (TokenKind::Str, _) => p.parse_str(),
                (TokenKind::Ident, _) => p.parse_ident(),
                (TokenKind::Quote, _) => p.parse_quote(),
                (TokenKind::Paren, "(") => p.parse_list(),
                (TokenKind::TypeKeyword, _) => Err(ParserError::TypeKeyword { loc: token.loc }),
                _ => Err(ParserError::ExpectedExpr { loc: token.loc }),
            }
        }))
    }

    fn parse_nil(&mut self) -> Result<Node> {
        self.production(|p| {
            let token = p.expect_kind(TokenKind::Nil)?;
            Ok(Node::nil(token.loc))
        })
    }

    fn parse_bool(&mut self) -> Result<Node> {
        self.production(|p| {
            let token = p.expect_kind(TokenKind::Bool)?;
            Ok(Node::new(NodeKind::Bool(token.text() == "true"), token.loc))
        })
    }

    fn parse_int(&mut self) -> Result<Node> {
        self.production(|p| {
            let token = p.expect_kind(TokenKind::Int)?;
            let n = token
                .text()
                .parse::<i64>()
                .map_err(|_| ParserError::IntOutOfRange {
                    text: token.text().to_string(),
                    loc: token.loc,
                })?;
            Ok(Node::new(NodeKind::Int(n), token.loc))
        })
    }

    fn parse_str(&mut self) -> Result<Node> {
        self.production(|p| {
            let token = p.expect_kind(TokenKind::Str)?;
            let loc = token.loc;
            Ok(Node::new(NodeKind::Str(token.text.unwrap_or_default()), loc))
        })
    }

    fn parse_ident(&mut self) -> Result<Node> {
        self.production(|p| {
            let token = p.expect_kind(TokenKind::Ident)?;
            let loc = token.loc;
            Ok(Node::new(
                NodeKind::Ident(token.text.unwrap_or_default()),
                loc,
            ))
        })
    }

    fn parse_quote(&mut self) -> Result<Node> {
        self.production(|p| {
            let quote = p.expect_kind(TokenKind::Quote)?;
            let value = p.expr()?;
            Ok(Node::new(NodeKind::Quote(Box::new(value)), quote.loc))
        })
    }

    fn parse_list(&mut self) -> Result<Node> {
        self.production(|p| {
            let paren = p.expect_text(TokenKind::Paren, "(")?;
            let mut values = Vec::new();
            while !p.peek()?.is(TokenKind::Paren, ")") {
                values.push(p.expr()?);
            }
            p.expect_text(TokenKind::Paren, ")")?;
            Ok(Node::new(NodeKind::List(values), paren.loc))
        })
    }

    fn parse_type_expr(&mut self) -> Result<Node> {
        self.production(|p| {
            let dollar = p.expect_text(TokenKind::Special, "$")?;
            let ty = p.parse_type()?;
            Ok(Node::new(NodeKind::Type(ty), dollar.loc))
        })
    }

    fn parse_type(&mut self) -> Result<Type> {
        self.nested(|p| p.production(|p| {
            let token = p.peek()?.clone();
            match (token.kind, token.text()) {
                (TokenKind::TypeKeyword, _) | (TokenKind::Nil, _) => p.parse_type_atom(),
                (TokenKind::Quote, _) => p.parse_type_quote(),
                (TokenKind::Paren, "[") => p.parse_type_list(),
                (TokenKind::Special, "?") => p.parse_type_infer(),
                (TokenKind::Paren, "(") => p.parse_type_paren(),
                _ => Err(ParserError::ExpectedTypeExpr { loc: token.loc }),
            }
        }))
    }

    fn parse_type_atom(&mut self) -> Result<Type> {
        self.production(|p| {
            let token = p.next_token()?;
            // `nil` has a token kind of its own but names a type as well
            let ty = match token.kind {
                TokenKind::TypeKeyword | TokenKind::Nil => Type::from_keyword(token.text()),
                _ => None,
            };
            ty.ok_or(ParserError::ExpectedType {
                wanted: TokenKind::TypeKeyword,
                loc: token.loc,
            })
        })
    }

    fn parse_type_quote(&mut self) -> Result<Type> {
        self.production(|p| {
            p.expect_kind(TokenKind::Quote)?;
            Ok(Type::quoted(p.parse_type()?))
        })
    }

    fn parse_type_list(&mut self) -> Result<Type> {
        self.production(|p| {
            p.expect_text(TokenKind::Paren, "[")?;
            let inner = p.parse_type()?;
            p.expect_text(TokenKind::Paren, "]")?;
            Ok(Type::list_of(inner))
        })
    }

    fn parse_type_infer(&mut self) -> Result<Type> {
        self.production(|p| {
            p.expect_text(TokenKind::Special, "?")?;
            let name = p.expect_kind(TokenKind::Ident)?;
            Ok(Type::Infer(name.text.unwrap_or_default()))
        })
    }

    /// `(a | b | c)` is `Union(Union(a, b), c)`; `(a)` is just `a`.
    fn parse_type_paren(&mut self) -> Result<Type> {
        self.production(|p| {
            p.expect_text(TokenKind::Paren, "(")?;
            let mut ty = p.parse_type()?;
            while p.peek()?.is(TokenKind::Special, "|") {
                p.next_token()?;
                let right = p.parse_type()?;
                ty = Type::union(ty, right);
            }
            p.expect_text(TokenKind::Paren, ")")?;
            Ok(ty)
        })
    }
}
