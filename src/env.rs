//! Lexical scopes as a stack of frames.
use std::collections::HashMap;

use tracing::debug;

use crate::ast::node::{Builtin, Node, NodeKind};
use crate::error::NodeError;
use crate::loc::Loc;

pub type Frame = HashMap<String, Node>;

/// Most call forms that may be under evaluation at once.
pub const MAX_NESTING: usize = 256;

/// Stack of frames, innermost last. There is always at least the top-level frame.
#[derive(Debug, Clone)]
pub struct Env {
    frames: Vec<Frame>,
    /// Call forms currently being evaluated.
    nesting: usize,
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

impl Env {
    pub fn new() -> Env {
        Env {
            frames: vec![Frame::new()],
            nesting: 0,
        }
    }

    /// Environment whose top-level frame holds `builtins`.
    pub fn with_builtins<I: IntoIterator<Item = Builtin>>(builtins: I) -> Env {
        let mut env = Env::new();
        for builtin in builtins {
            env.register(builtin);
        }
        env
    }

    pub fn register(&mut self, builtin: Builtin) {
        let name = builtin.name;
        let value = Node::new(NodeKind::BuiltinFunc(builtin.into()), Loc::default());
        self.frames[0].insert(name.to_string(), value);
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Node> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Bind `name` in the innermost frame, replacing a binding of the same name there.
    pub fn insert<S: Into<String>>(&mut self, name: S, value: Node) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::new());
        debug!("pushed frame, depth {}", self.frames.len());
    }

    /// Drop the innermost frame. The top-level frame is never popped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        let frame = self.frames.pop();
        debug!("popped frame, depth {}", self.frames.len());
        frame
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Run `f` as one more nested call form, failing with `TooDeep` at `loc` once
    /// [`MAX_NESTING`] forms are already in progress.
    pub fn nested<T, F>(&mut self, loc: Loc, f: F) -> Result<T, NodeError>
    where
        F: FnOnce(&mut Env) -> Result<T, NodeError>,
    {
        if self.nesting >= MAX_NESTING {
            return Err(NodeError::TooDeep { loc });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    /// Run `f` in a fresh frame that is popped again whatever `f` returns.
    pub fn scoped<T, F: FnOnce(&mut Env) -> T>(&mut self, f: F) -> T {
        self.push();
        let result = f(self);
        self.pop();
        result
    }
}
