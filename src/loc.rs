use std::fmt;

/// Position in the source text. Both fields are zero-based; [`Display`](fmt::Display) renders
/// them one-based, the way editors count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

impl Loc {
    pub fn new(line: usize, col: usize) -> Self {
        Loc { line, col }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_based() {
        assert_eq!(Loc::new(0, 0).to_string(), "1:1");
        assert_eq!(Loc::new(4, 11).to_string(), "5:12");
    }

    #[test]
    fn test_ordering_follows_source_order() {
        assert!(Loc::new(0, 9) < Loc::new(1, 0));
        assert!(Loc::new(2, 3) < Loc::new(2, 4));
    }
}
