//! Built-in callables installed into every session's top-level frame.
//!
//! Every built-in receives its arguments unevaluated. Plain functions evaluate all of them left to
//! right; the binding forms (`set`, `let`, `lambda`) treat some of them as syntax.
use std::io::Write;
use std::rc::Rc;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::ast::node::{Builtin, Node, NodeKind, UserFunc};
use crate::ast::types::Type;
use crate::env::Env;
use crate::error::NodeError;

pub static STDOUT: Lazy<Mutex<Box<dyn Write + Sync + Send>>> =
    Lazy::new(|| Mutex::new(Box::new(std::io::stdout())));

/// Redirect the output of `print`.
pub fn set_stdout(out: Box<dyn Write + Sync + Send>) {
    let mut stdout = STDOUT.lock().unwrap_or_else(|e| e.into_inner());
    *stdout = out;
}

pub const BUILTINS: &[Builtin] = &[
    Builtin::new("!", 1, op_not),
    Builtin::new("+", 2, op_plus),
    Builtin::new("-", 2, op_minus),
    Builtin::new("*", 2, op_mult),
    Builtin::new("/", 2, op_div),
    Builtin::new("%", 2, op_mod),
    Builtin::new("=", 2, op_eq),
    Builtin::new("!=", 2, op_neq),
    Builtin::new("<", 2, op_less),
    Builtin::new(">", 2, op_greater),
    Builtin::new("<=", 2, op_leq),
    Builtin::new(">=", 2, op_geq),
    Builtin::new("set", 2, func_set),
    Builtin::new("let", 2, func_let),
    Builtin::new("lambda", 2, func_lambda),
    Builtin::new("print", 1, func_print),
    Builtin::new("typeof", 1, func_typeof),
];

fn mismatch(expected: Type, got: &Node) -> NodeError {
    NodeError::TypeMismatch {
        expected,
        got: got.type_of(),
        loc: got.loc,
    }
}

fn eval_int(arg: &Node, env: &mut Env) -> Result<i64, NodeError> {
    let value = arg.eval(env)?;
    match value.kind {
        NodeKind::Int(n) => Ok(n),
        // report where the operand was written, not where its value came from
        _ => Err(mismatch(Type::Int, &Node::new(value.kind, arg.loc))),
    }
}

fn eval_bool(arg: &Node, env: &mut Env) -> Result<bool, NodeError> {
    let value = arg.eval(env)?;
    match value.kind {
        NodeKind::Bool(b) => Ok(b),
        _ => Err(mismatch(Type::Bool, &Node::new(value.kind, arg.loc))),
    }
}

fn bad_form(form: &Node, name: &str) -> NodeError {
    NodeError::BadForm {
        form: name.to_string(),
        loc: form.loc,
    }
}

fn op_not(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let b = eval_bool(&args[0], env)?;
    Ok(Node::new(NodeKind::Bool(!b), form.loc))
}

macro_rules! int_ops {
    ( $( $name:ident => |$a:ident, $b:ident| $kind:ident($body:expr) ),* $(,)? ) => {
        $(
            fn $name(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
                let $a = eval_int(&args[0], env)?;
                let $b = eval_int(&args[1], env)?;
                Ok(Node::new(NodeKind::$kind($body), form.loc))
            }
        )*
    };
}

int_ops! {
    op_plus => |a, b| Int(a.wrapping_add(b)),
    op_minus => |a, b| Int(a.wrapping_sub(b)),
    op_mult => |a, b| Int(a.wrapping_mul(b)),
    op_less => |a, b| Bool(a < b),
    op_greater => |a, b| Bool(a > b),
    op_leq => |a, b| Bool(a <= b),
    op_geq => |a, b| Bool(a >= b),
}

/// Quotient rounded towards negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn eval_divisor(args: &[Node], env: &mut Env) -> Result<(i64, i64), NodeError> {
    let a = eval_int(&args[0], env)?;
    let b = eval_int(&args[1], env)?;
    if b == 0 {
        return Err(NodeError::ZeroDiv { loc: args[1].loc });
    }
    Ok((a, b))
}

fn op_div(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let (a, b) = eval_divisor(args, env)?;
    Ok(Node::new(NodeKind::Int(floor_div(a, b)), form.loc))
}

/// Remainder with the sign of the divisor.
fn op_mod(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let (a, b) = eval_divisor(args, env)?;
    let r = a.wrapping_sub(floor_div(a, b).wrapping_mul(b));
    Ok(Node::new(NodeKind::Int(r), form.loc))
}

fn op_eq(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let left = args[0].eval(env)?;
    let right = args[1].eval(env)?;
    Ok(Node::new(NodeKind::Bool(left == right), form.loc))
}

fn op_neq(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let left = args[0].eval(env)?;
    let right = args[1].eval(env)?;
    Ok(Node::new(NodeKind::Bool(left != right), form.loc))
}

/// `(set name value)` binds a new variable in the innermost scope.
fn func_set(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let name = args[0]
        .as_ident()
        .ok_or_else(|| mismatch(Type::Symbol, &args[0]))?;
    let mut value = args[1].eval(env)?;
    if env.lookup(name).is_some() {
        return Err(NodeError::VarAlreadyExists {
            name: name.to_string(),
            loc: form.loc,
        });
    }
    if let NodeKind::UserFunc(f) = &value.kind {
        if f.name.is_empty() {
            let named = UserFunc {
                name: name.to_string(),
                ..(**f).clone()
            };
            value = Node::new(NodeKind::UserFunc(Rc::new(named)), value.loc);
        }
    }
    debug!("set {} = {}", name, value);
    env.insert(name, value.clone());
    Ok(value)
}

/// `(let () body)` or `(let (name value) body)`.
fn func_let(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let binding = args[0].as_list().ok_or_else(|| bad_form(form, "let"))?;
    let body = &args[1];
    match binding {
        [] => env.scoped(|env| body.eval(env)),
        [name, value] => {
            let name = name.as_ident().ok_or_else(|| mismatch(Type::Symbol, name))?;
            let value = value.eval(env)?;
            trace!("let {} = {}", name, value);
            env.scoped(|env| {
                env.insert(name, value);
                body.eval(env)
            })
        }
        _ => Err(bad_form(form, "let")),
    }
}

/// `(lambda (params...) body)`
fn func_lambda(form: &Node, _env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let params = args[0]
        .as_list()
        .ok_or_else(|| bad_form(form, "lambda"))?
        .iter()
        .map(|p| {
            p.as_ident()
                .map(String::from)
                .ok_or_else(|| mismatch(Type::Symbol, p))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let func = UserFunc {
        name: String::new(),
        params,
        body: args[1].clone(),
    };
    Ok(Node::new(NodeKind::UserFunc(Rc::new(func)), form.loc))
}

/// Strings are written raw, anything else the way the console echoes it.
fn func_print(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let value = args[0].eval(env)?;
    let mut stdout = STDOUT.lock().unwrap_or_else(|e| e.into_inner());
    let written = match &value.kind {
        NodeKind::Str(s) => writeln!(stdout, "{}", s),
        _ => writeln!(stdout, "{}", value),
    };
    if let Err(err) = written {
        tracing::error!("print: {}", err);
    }
    Ok(Node::nil(form.loc))
}

fn func_typeof(form: &Node, env: &mut Env, args: &[Node]) -> Result<Node, NodeError> {
    let value = args[0].eval(env)?;
    Ok(Node::new(NodeKind::Type(value.type_of()), form.loc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parser::Parser;
    use crate::ast::source::LineBuffer;
    use crate::loc::Loc;

    fn eval_in(env: &mut Env, input: &str) -> Result<Node, NodeError> {
        let node = Parser::new(LineBuffer::from_text(input))
            .parse_expr()
            .unwrap();
        node.eval(env)
    }

    fn eval(input: &str) -> Result<Node, NodeError> {
        eval_in(&mut Env::with_builtins(BUILTINS.iter().cloned()), input)
    }

    fn show(input: &str) -> String {
        eval(input).unwrap().to_string()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(show("(+ 1 2)"), "3");
        assert_eq!(show("(- 1 (* 2 3))"), "-5");
        assert_eq!(show("(/ 7 2)"), "3");
        assert_eq!(show("(/ -7 2)"), "-4");
        assert_eq!(show("(/ 7 -2)"), "-4");
        assert_eq!(show("(% -7 2)"), "1");
        assert_eq!(show("(% 7 -2)"), "-1");
        assert_eq!(show("(% 6 3)"), "0");
    }

    #[test]
    fn test_zero_division_points_at_divisor() {
        assert_eq!(
            eval("(/ 1 (- 2 2))"),
            Err(NodeError::ZeroDiv {
                loc: Loc::new(0, 5)
            })
        );
        assert!(matches!(eval("(% 1 0)"), Err(NodeError::ZeroDiv { .. })));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(show("(< 1 2)"), "true");
        assert_eq!(show("(>= 1 2)"), "false");
        assert_eq!(show("(= '(1 \"a\") '(1 \"a\"))"), "true");
        assert_eq!(show("(!= nil false)"), "true");
        assert_eq!(show("(! (= 1 1))"), "false");
    }

    #[test]
    fn test_operand_type_mismatch() {
        assert_eq!(
            eval("(+ 1 \"a\")"),
            Err(NodeError::TypeMismatch {
                expected: Type::Int,
                got: Type::Str,
                loc: Loc::new(0, 5)
            })
        );
        assert!(matches!(
            eval("(! 1)"),
            Err(NodeError::TypeMismatch {
                expected: Type::Bool,
                ..
            })
        ));
    }

    #[test]
    fn test_set() {
        let mut env = Env::with_builtins(BUILTINS.iter().cloned());
        assert_eq!(eval_in(&mut env, "(set x 5)").unwrap().to_string(), "5");
        assert_eq!(eval_in(&mut env, "x").unwrap().to_string(), "5");
        assert_eq!(
            eval_in(&mut env, "(set x 6)"),
            Err(NodeError::VarAlreadyExists {
                name: "x".into(),
                loc: Loc::new(0, 0)
            })
        );
        assert!(matches!(
            eval_in(&mut env, "(set + 1)"),
            Err(NodeError::VarAlreadyExists { .. })
        ));
    }

    #[test]
    fn test_set_names_lambda() {
        let mut env = Env::with_builtins(BUILTINS.iter().cloned());
        let f = eval_in(&mut env, "(set inc (lambda (n) (+ n 1)))").unwrap();
        assert_eq!(f.to_string(), "#<func inc>");
        assert_eq!(eval_in(&mut env, "(inc 41)").unwrap().to_string(), "42");
    }

    #[test]
    fn test_let() {
        assert_eq!(show("(let (x 2) (* x x))"), "4");
        assert_eq!(show("(let () 1)"), "1");
        assert_eq!(show("(let (x 1) (let (x 2) x))"), "2");
    }

    #[test]
    fn test_let_scope_is_popped() {
        let mut env = Env::with_builtins(BUILTINS.iter().cloned());
        eval_in(&mut env, "(let (x 1) (set y x))").unwrap();
        assert!(env.lookup("y").is_none());
        assert!(eval_in(&mut env, "(let (x 1) (missing x))").is_err());
        assert_eq!(env.depth(), 1);
        assert!(env.lookup("x").is_none());
    }

    #[test]
    fn test_malformed_forms() {
        assert!(matches!(eval("(let x 1)"), Err(NodeError::BadForm { .. })));
        assert!(matches!(
            eval("(let (x 1 2) x)"),
            Err(NodeError::BadForm { .. })
        ));
        assert!(matches!(
            eval("(lambda (1) 1)"),
            Err(NodeError::TypeMismatch {
                expected: Type::Symbol,
                ..
            })
        ));
        assert!(matches!(
            eval("(set 1 1)"),
            Err(NodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_lambda() {
        assert_eq!(show("(lambda (a b) (+ a b))"), "#<lambda>");
        assert_eq!(show("((lambda (a b) (- a b)) 5 3)"), "2");
    }

    #[test]
    fn test_typeof() {
        assert_eq!(show("(typeof 1)"), "$int");
        assert_eq!(show("(typeof ''x)"), "$'sym");
        assert_eq!(show("(typeof typeof)"), "$func");
        assert_eq!(show("(typeof $int)"), "$type");
    }
}
