//! Character sources the lexer pulls from.
use crate::loc::Loc;

/// A pull-based character source that knows where it is.
///
/// The console and the file runner both feed the front-end through this trait, so the lexer
/// never needs to know whether more input is waiting on a terminal or already sits in memory.
pub trait Source {
    /// Next character, or `None` once the input is exhausted.
    fn next_char(&mut self) -> Option<char>;

    /// Location of the character the next call to [`Source::next_char`] returns.
    fn loc(&self) -> Loc;

    /// Raw text of an already-read line (without its trailing newline).
    fn line(&self, line: usize) -> Option<&str>;

    /// `true` when nothing but whitespace or a comment is left on the current line.
    fn is_eol(&self) -> bool;

    /// Drop whatever is left on the current line.
    fn skip_line(&mut self);
}

/// Buffers input one line at a time, pulling a new line from `feed` only when the current one is
/// used up.
///
/// Every line handed out by the feed is kept so diagnostics can quote it later.
pub struct LineBuffer<I> {
    feed: I,
    lines: Vec<String>,
    current: Vec<char>,
    col: usize,
}

/// A [`LineBuffer`] over text that is entirely in memory.
pub type TextBuffer = LineBuffer<std::vec::IntoIter<String>>;

impl<I: Iterator<Item = String>> LineBuffer<I> {
    pub fn new(feed: I) -> Self {
        LineBuffer {
            feed,
            lines: Vec::new(),
            current: Vec::new(),
            col: 0,
        }
    }

    fn fetch(&mut self) -> bool {
        match self.feed.next() {
            Some(mut line) => {
                if !line.ends_with('\n') {
                    line.push('\n');
                }
                self.current = line.chars().collect();
                self.lines.push(line);
                self.col = 0;
                true
            }
            None => false,
        }
    }
}

impl LineBuffer<std::vec::IntoIter<String>> {
    pub fn from_text(text: &str) -> TextBuffer {
        let lines = text
            .split_inclusive('\n')
            .map(String::from)
            .collect::<Vec<_>>();
        LineBuffer::new(lines.into_iter())
    }
}

impl<I: Iterator<Item = String>> Source for LineBuffer<I> {
    fn next_char(&mut self) -> Option<char> {
        if self.col >= self.current.len() && !self.fetch() {
            return None;
        }
        let c = self.current[self.col];
        self.col += 1;
        Some(c)
    }

    fn loc(&self) -> Loc {
        if self.lines.is_empty() {
            Loc::new(0, 0)
        } else if self.col >= self.current.len() {
            Loc::new(self.lines.len(), 0)
        } else {
            Loc::new(self.lines.len() - 1, self.col)
        }
    }

    fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(|l| l.trim_end_matches('\n'))
    }

    fn is_eol(&self) -> bool {
        let rest = self.current.get(self.col..).unwrap_or(&[]);
        match rest.iter().find(|c| !c.is_whitespace()) {
            None => true,
            Some(&c) => c == ';',
        }
    }

    fn skip_line(&mut self) {
        self.col = self.current.len();
    }
}
