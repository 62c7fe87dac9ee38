//! Plain-text rendering of errors against the source they were found in.
use std::fmt::Write;

use crate::ast::source::Source;
use crate::error::Error;

/// Render `error` as
///
/// ```text
/// 1:2: error: Identifier 'foo' does not exist
/// (foo 1)
///  ^
/// ```
///
/// The source line and the caret are left out when the line is not known to `source`.
pub fn render<S: Source>(error: &Error, source: &S) -> String {
    let loc = error.loc();
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write!(out, "{}: error: {}", loc, error);
    if let Some(line) = source.line(loc.line) {
        let _ = write!(out, "\n{}\n{:>width$}", line, "^", width = loc.col + 1);
    }
    out
}
