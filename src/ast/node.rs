//! AST nodes. The same type is used for values: evaluating a node yields another node.
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::ast::types::Type;
use crate::env::Env;
use crate::error::NodeError;
use crate::loc::Loc;

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Nil,
    /// Type literal, written `$<type>`.
    Type(Type),
    Bool(bool),
    Int(i64),
    Str(String),
    Ident(String),
    /// `'x` suspends the evaluation of `x`.
    Quote(Box<Node>),
    List(Vec<Node>),
    BuiltinFunc(Rc<Builtin>),
    UserFunc(Rc<UserFunc>),
}

/// Structural equality. Locations are ignored so that a value compares equal to the same value
/// parsed or computed elsewhere.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Host implementation of a built-in callable.
///
/// Receives the whole call form (a [`NodeKind::List`]), the environment and the raw, unevaluated
/// arguments. Whether and when an argument is evaluated is up to the function.
pub type BuiltinFn = fn(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub func: BuiltinFn,
}

impl Builtin {
    pub const fn new(name: &'static str, arity: usize, func: BuiltinFn) -> Self {
        Builtin { name, arity, func }
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

/// A function created at runtime. It owns its parameter list and body, never a scope: the
/// environment of the call site is passed in on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunc {
    /// Empty for anonymous functions.
    pub name: String,
    pub params: Vec<String>,
    pub body: Node,
}

pub trait Callable {
    /// Invoke with the call form `form`, whose tail is `args`.
    fn call(&self, form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError>;
}

/// Where arity errors are reported: the head of the call form.
fn head_loc(form: &Node) -> Loc {
    match &form.kind {
        NodeKind::List(values) if !values.is_empty() => values[0].loc,
        _ => form.loc,
    }
}

impl Callable for Builtin {
    fn call(&self, form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
        if args.len() != self.arity {
            return Err(NodeError::InvalidArgsNum {
                got: args.len(),
                expected: self.arity,
                loc: head_loc(form),
            });
        }
        trace!("calling builtin {}", self.name);
        (self.func)(form, env, args)
    }
}

impl Callable for UserFunc {
    fn call(&self, form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
        if args.len() != self.params.len() {
            return Err(NodeError::InvalidArgsNum {
                got: args.len(),
                expected: self.params.len(),
                loc: head_loc(form),
            });
        }
        trace!("calling {} with {:?}", self.display_name(), self.params);
        env.scoped(|env| {
            // Each argument sees the parameters bound before it; the first failure stops the rest.
            for (param, arg) in self.params.iter().zip(args) {
                let value = arg.eval(env)?;
                env.insert(param, value);
            }
            self.body.eval(env)
        })
    }
}

impl UserFunc {
    fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<lambda>"
        } else {
            &self.name
        }
    }
}

impl Node {
    pub fn new(kind: NodeKind, loc: Loc) -> Self {
        Node { kind, loc }
    }

    pub fn nil(loc: Loc) -> Self {
        Node::new(NodeKind::Nil, loc)
    }

    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match &self.kind {
            NodeKind::BuiltinFunc(f) => Some(&**f),
            NodeKind::UserFunc(f) => Some(&**f),
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::List(values) => Some(values),
            _ => None,
        }
    }

    /// Structural type of the node.
    pub fn type_of(&self) -> Type {
        match &self.kind {
            NodeKind::Nil => Type::Nil,
            NodeKind::Type(_) => Type::Type,
            NodeKind::Bool(_) => Type::Bool,
            NodeKind::Int(_) => Type::Int,
            NodeKind::Str(_) => Type::Str,
            NodeKind::Ident(_) => Type::Symbol,
            NodeKind::Quote(inner) => Type::quoted(inner.type_of()),
            // element types are not inferred
            NodeKind::List(_) => Type::list_of(Type::Any),
            NodeKind::BuiltinFunc(_) | NodeKind::UserFunc(_) => Type::Func,
        }
    }

    #[tracing::instrument(level = "trace", skip(self, env), fields(node = %self))]
    pub fn eval(&self, env: &mut Env) -> Result<Node, NodeError> {
        match &self.kind {
            NodeKind::Nil
            | NodeKind::Type(_)
            | NodeKind::Bool(_)
            | NodeKind::Int(_)
            | NodeKind::Str(_)
            | NodeKind::BuiltinFunc(_)
            | NodeKind::UserFunc(_) => Ok(self.clone()),
            NodeKind::Ident(name) => {
                env.lookup(name)
                    .cloned()
                    .ok_or_else(|| NodeError::IdentNotFound {
                        name: name.clone(),
                        loc: self.loc,
                    })
            }
            NodeKind::Quote(inner) => Ok((**inner).clone()),
            NodeKind::List(values) => {
                let (head, args) = match values.split_first() {
                    Some(split) => split,
                    None => return Ok(self.clone()),
                };
                env.nested(self.loc, |env| {
                    let callee = head.eval(env)?;
                    match callee.as_callable() {
                        Some(f) => f.call(self, env, args),
                        None => Err(NodeError::NotCallable {
                            value: Box::new(callee),
                            loc: head.loc,
                        }),
                    }
                })
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Nil => write!(f, "nil"),
            NodeKind::Type(ty) => write!(f, "${}", ty),
            NodeKind::Bool(b) => write!(f, "{}", b),
            NodeKind::Int(n) => write!(f, "{}", n),
            NodeKind::Str(s) => write_escaped(f, s),
            NodeKind::Ident(name) => write!(f, "{}", name),
            NodeKind::Quote(inner) => write!(f, "'{}", inner),
            NodeKind::List(v) => {
                write!(f, "(")?;
                let mut first = true;
                for i in v {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", i)?;
                    first = false;
                }
                write!(f, ")")
            }
            NodeKind::BuiltinFunc(func) => write!(f, "#<func {}>", func.name),
            NodeKind::UserFunc(func) if func.name.is_empty() => write!(f, "#<lambda>"),
            NodeKind::UserFunc(func) => write!(f, "#<func {}>", func.name),
        }
    }
}
