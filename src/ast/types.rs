//! Structural types as written in `$` type annotations.
//!
//! Types are only ever parsed and printed. Nothing unifies [`Type::Infer`] placeholders or
//! normalizes unions, so `(int | str)` and `(str | int)` stay distinct values.
use std::fmt;

/// Words that name an atomic type (besides `nil`, which has its own token kind).
pub const TYPE_KEYWORDS: &[&str] = &["type", "bool", "int", "str", "sym", "func", "any"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Nil,
    /// The type of type literals.
    Type,
    Bool,
    Int,
    Str,
    /// A quoted identifier.
    Symbol,
    Func,
    Any,
    Quoted(Box<Type>),
    ListOf(Box<Type>),
    /// Named placeholder written `?name`.
    Infer(String),
    Union(Box<Type>, Box<Type>),
}

impl Type {
    /// Atomic type named by `word`, if it is `nil` or a type keyword.
    pub fn from_keyword(word: &str) -> Option<Type> {
        let ty = match word {
            "nil" => Type::Nil,
            "type" => Type::Type,
            "bool" => Type::Bool,
            "int" => Type::Int,
            "str" => Type::Str,
            "sym" => Type::Symbol,
            "func" => Type::Func,
            "any" => Type::Any,
            _ => return None,
        };
        Some(ty)
    }

    pub fn quoted(inner: Type) -> Type {
        Type::Quoted(Box::new(inner))
    }

    pub fn list_of(inner: Type) -> Type {
        Type::ListOf(Box::new(inner))
    }

    pub fn union(left: Type, right: Type) -> Type {
        Type::Union(Box::new(left), Box::new(right))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Nil => write!(f, "nil"),
            Type::Type => write!(f, "type"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Str => write!(f, "str"),
            Type::Symbol => write!(f, "sym"),
            Type::Func => write!(f, "func"),
            Type::Any => write!(f, "any"),
            Type::Quoted(t) => write!(f, "'{}", t),
            Type::ListOf(t) => write!(f, "[{}]", t),
            Type::Infer(name) => write!(f, "?{}", name),
            // Parenthesized so the rendering parses back to the same tree.
            Type::Union(l, r) => write!(f, "({} | {})", l, r),
        }
    }
}
