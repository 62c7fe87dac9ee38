pub mod ast;
pub mod diagnostic;
pub mod env;
pub mod error;
mod execution_session;
pub mod loc;
pub mod stdlib;

pub use execution_session::ExecutionSession;
// re-export the pieces every embedder touches
pub use ast::node::{Builtin, Node, NodeKind};
pub use error::Error;
pub use stdlib::set_stdout;
