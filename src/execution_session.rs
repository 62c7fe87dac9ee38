use std::io::Write;

use anyhow::{bail, Result};
use tracing::debug;

use crate::ast::node::{Builtin, Node};
use crate::ast::parser::Parser;
use crate::ast::source::{LineBuffer, Source};
use crate::diagnostic::render;
use crate::env::Env;
use crate::error::Error;
use crate::loc::Loc;
use crate::stdlib;

/// Interpreter state that outlives a single expression: the top-level environment.
pub struct ExecutionSession {
    env: Env,
}

impl Default for ExecutionSession {
    fn default() -> Self {
        ExecutionSession::new()
    }
}

impl ExecutionSession {
    /// A session with the standard built-ins installed.
    pub fn new() -> Self {
        ExecutionSession {
            env: Env::with_builtins(stdlib::BUILTINS.iter().cloned()),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Install an extra built-in, replacing any previous binding of the same name.
    pub fn register(&mut self, builtin: Builtin) {
        self.env.register(builtin);
    }

    /// Read one expression from `parser` and evaluate it.
    pub fn eval_expr<S: Source>(&mut self, parser: &mut Parser<S>) -> Result<Node, Error> {
        let node = parser.parse_expr()?;
        debug!("eval: {}", node);
        Ok(node.eval(&mut self.env)?)
    }

    /// Evaluate every expression in `input`, returning the value of the last one (`nil` when
    /// there is none). Stops at the first error.
    pub fn eval(&mut self, input: &str) -> Result<Node, Error> {
        let mut parser = Parser::new(LineBuffer::from_text(input));
        let mut value = Node::nil(Loc::default());
        while !parser.is_eof()? {
            value = self.eval_expr(&mut parser)?;
        }
        Ok(value)
    }

    /// Run a whole script. The error carries the rendered diagnostic of the first failure.
    pub fn run_file(&mut self, text: &str) -> Result<()> {
        let mut parser = Parser::new(LineBuffer::from_text(text));
        loop {
            let step = match parser.is_eof() {
                Ok(true) => return Ok(()),
                Ok(false) => self.eval_expr(&mut parser),
                Err(err) => Err(err.into()),
            };
            if let Err(err) = step {
                bail!("{}", render(&err, parser.source()));
            }
        }
    }

    /// Interactive protocol: one expression per line, its value echoed to `out`.
    ///
    /// Errors are rendered to `out` and discard the rest of the line they were found on; bindings
    /// made by earlier lines stay. Returns when the source is exhausted.
    pub fn run_repl<S: Source, W: Write>(
        &mut self,
        parser: &mut Parser<S>,
        out: &mut W,
    ) -> std::io::Result<()> {
        loop {
            let result = match parser.is_eof() {
                Ok(true) => return Ok(()),
                Ok(false) => self.eval_line(parser),
                Err(err) => Err(err.into()),
            };
            match result {
                Ok(value) => writeln!(out, "{}", value)?,
                Err(err) => {
                    writeln!(out, "{}", render(&err, parser.source()))?;
                    parser.skip_line();
                }
            }
            out.flush()?;
        }
    }

    fn eval_line<S: Source>(&mut self, parser: &mut Parser<S>) -> Result<Node, Error> {
        let node = parser.parse_expr()?;
        if !parser.is_eol() {
            let loc = match parser.peek() {
                Ok(token) => token.loc,
                Err(err) => err.loc(),
            };
            return Err(Error::TrailingText { loc });
        }
        debug!("eval: {}", node);
        Ok(node.eval(&mut self.env)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;

    #[test]
    fn test_eval_returns_last_value() {
        let mut es = ExecutionSession::new();
        assert_eq!(es.eval("(set x 2) (* x 21)").unwrap().to_string(), "42");
        assert_eq!(es.eval("").unwrap().to_string(), "nil");
    }

    #[test]
    fn test_bindings_survive_errors() {
        let mut es = ExecutionSession::new();
        es.eval("(set x 1)").unwrap();
        assert!(matches!(
            es.eval("(undefined)"),
            Err(Error::Eval(NodeError::IdentNotFound { .. }))
        ));
        assert_eq!(es.eval("x").unwrap().to_string(), "1");
        assert_eq!(es.env().depth(), 1);
    }

    #[test]
    fn test_register_extra_builtin() {
        fn answer(form: &Node, _env: &mut Env, _args: &[Node]) -> Result<Node, NodeError> {
            Ok(Node::new(crate::ast::node::NodeKind::Int(42), form.loc))
        }
        let mut es = ExecutionSession::new();
        es.register(Builtin::new("answer", 0, answer));
        assert_eq!(es.eval("(answer)").unwrap().to_string(), "42");
    }

    #[test]
    fn test_run_file_renders_first_error() {
        let mut es = ExecutionSession::new();
        let err = es.run_file("(set a 1)\n(+ a b)\n(set c 3)\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "2:6: error: Identifier 'b' does not exist\n(+ a b)\n     ^"
        );
        assert!(es.env().lookup("a").is_some());
        assert!(es.env().lookup("c").is_none());
    }
}
