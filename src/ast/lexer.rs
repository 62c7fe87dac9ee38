//! Tokenizer. Pulls characters from a [`Source`] and hands out one [`Token`] per call.
use logos::Logos;
use tracing::trace;

use crate::ast::source::Source;
use crate::ast::token::{Token, TokenKind};
use crate::error::LexError;
use crate::loc::Loc;

/// Classification of a complete bare word. A word is only given one of these kinds when the
/// whole word matches; anything else is an identifier.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Word {
    #[token("nil")]
    Nil,

    #[token("type")]
    #[token("bool")]
    #[token("int")]
    #[token("str")]
    #[token("sym")]
    #[token("func")]
    #[token("any")]
    TypeKeyword,

    #[token("true")]
    #[token("false")]
    Bool,

    #[regex(r"[+-]?[0-9]+")]
    Int,

    #[error]
    Other,
}

fn classify(word: &str) -> TokenKind {
    let mut lex = Word::lexer(word);
    let first = lex.next();
    if lex.span() != (0..word.len()) {
        return TokenKind::Ident;
    }
    match first {
        Some(Word::Nil) => TokenKind::Nil,
        Some(Word::TypeKeyword) => TokenKind::TypeKeyword,
        Some(Word::Bool) => TokenKind::Bool,
        Some(Word::Int) => TokenKind::Int,
        Some(Word::Other) | None => TokenKind::Ident,
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Characters that end a word and start the next token.
fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '?' | '|')
}

pub struct Lexer<S> {
    source: S,
    /// One character read past the end of a word, returned before anything new is pulled.
    pushback: Option<(char, Loc)>,
}

impl<S: Source> Lexer<S> {
    pub fn new(source: S) -> Self {
        Lexer {
            source,
            pushback: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_eol(&self) -> bool {
        self.pushback.is_none() && self.source.is_eol()
    }

    pub fn skip_line(&mut self) {
        self.pushback = None;
        self.source.skip_line();
    }

    fn get_char(&mut self) -> Option<(char, Loc)> {
        if let Some(pushed) = self.pushback.take() {
            return Some(pushed);
        }
        let loc = self.source.loc();
        self.source.next_char().map(|c| (c, loc))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let (c, loc) = loop {
            match self.get_char() {
                None => return Ok(Token::eof(self.source.loc())),
                Some((c, _)) if is_blank(c) => {}
                Some((';', _)) => self.skip_comment(),
                Some(first) => break first,
            }
        };

        let token = match c {
            '(' | ')' | '[' | ']' => Token::new(TokenKind::Paren, c, loc),
            '\'' => Token::new(TokenKind::Quote, c, loc),
            '?' | '|' | '$' => Token::new(TokenKind::Special, c, loc),
            '"' => self.string(loc)?,
            _ => self.word(c, loc),
        };
        trace!("token: {:?}", token);
        Ok(token)
    }

    fn skip_comment(&mut self) {
        while let Some((c, _)) = self.get_char() {
            if c == '\n' {
                break;
            }
        }
    }

    fn string(&mut self, start: Loc) -> Result<Token, LexError> {
        let mut value = String::new();
        loop {
            match self.get_char() {
                None => return Err(LexError::StrEof { loc: start }),
                Some(('"', _)) => return Ok(Token::new(TokenKind::Str, value, start)),
                Some(('\\', escape_loc)) => match self.get_char() {
                    None => return Err(LexError::StrEof { loc: escape_loc }),
                    Some(('n', _)) => value.push('\n'),
                    Some(('\\', _)) => value.push('\\'),
                    Some(('"', _)) => value.push('"'),
                    Some((escape, loc)) => return Err(LexError::StrEsc { escape, loc }),
                },
                Some((c, _)) => value.push(c),
            }
        }
    }

    fn word(&mut self, first: char, start: Loc) -> Token {
        let mut word = String::from(first);
        while let Some((c, loc)) = self.get_char() {
            if is_blank(c) {
                break;
            }
            if is_delimiter(c) {
                self.pushback = Some((c, loc));
                break;
            }
            word.push(c);
        }
        Token::new(classify(&word), word, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::source::{LineBuffer, TextBuffer};

    fn lexer(input: &str) -> Lexer<TextBuffer> {
        Lexer::new(LineBuffer::from_text(input))
    }

    fn tokens(input: &str) -> Vec<(TokenKind, String)> {
        let mut lex = lexer(input);
        let mut v = Vec::new();
        loop {
            let token = lex.next_token().unwrap();
            if token.kind == TokenKind::Eof {
                assert_eq!(token.text, None);
                return v;
            }
            v.push((token.kind, token.text().to_string()));
        }
    }

    #[test]
    fn test_classify_words() {
        use TokenKind::*;
        assert_eq!(classify("nil"), Nil);
        assert_eq!(classify("int"), TypeKeyword);
        assert_eq!(classify("any"), TypeKeyword);
        assert_eq!(classify("true"), Bool);
        assert_eq!(classify("false"), Bool);
        assert_eq!(classify("42"), Int);
        assert_eq!(classify("-42"), Int);
        assert_eq!(classify("+7"), Int);
        assert_eq!(classify("+"), Ident);
        assert_eq!(classify("-"), Ident);
        assert_eq!(classify("1-2"), Ident);
        assert_eq!(classify("--1"), Ident);
        assert_eq!(classify("nils"), Ident);
        assert_eq!(classify("integer"), Ident);
        assert_eq!(classify("truex"), Ident);
        assert_eq!(classify("123abc"), Ident);
        assert_eq!(classify("lambda"), Ident);
    }

    #[test]
    fn test_every_type_keyword_is_classified() {
        for kw in crate::ast::types::TYPE_KEYWORDS {
            assert_eq!(classify(kw), TokenKind::TypeKeyword, "{}", kw);
            assert_eq!(classify(&format!("{}s", kw)), TokenKind::Ident, "{}", kw);
        }
    }

    #[test]
    fn test_alphanumeric_words_keep_their_text() {
        for word in &["abc", "a1", "Foo42", "x", "nil0", "TRUE"] {
            assert_eq!(tokens(word), vec![(TokenKind::Ident, word.to_string())]);
        }
    }

    #[test]
    fn test_punctuation() {
        use TokenKind::*;
        assert_eq!(
            tokens("$(int|str)"),
            vec![
                (Special, "$".into()),
                (Paren, "(".into()),
                (TypeKeyword, "int".into()),
                (Special, "|".into()),
                (TypeKeyword, "str".into()),
                (Paren, ")".into()),
            ]
        );
        assert_eq!(
            tokens("'[?T]"),
            vec![
                (Quote, "'".into()),
                (Paren, "[".into()),
                (Special, "?".into()),
                (Ident, "T".into()),
                (Paren, "]".into()),
            ]
        );
    }

    #[test]
    fn test_word_stops_at_delimiter() {
        use TokenKind::*;
        assert_eq!(
            tokens("(+ 1 x)"),
            vec![
                (Paren, "(".into()),
                (Ident, "+".into()),
                (Int, "1".into()),
                (Ident, "x".into()),
                (Paren, ")".into()),
            ]
        );
    }

    #[test]
    fn test_token_locations() {
        let mut lex = lexer("(foo\n  12)");
        let locs = std::iter::from_fn(|| {
            let t = lex.next_token().unwrap();
            if t.kind == TokenKind::Eof {
                None
            } else {
                Some(t.loc)
            }
        })
        .collect::<Vec<_>>();
        assert_eq!(
            locs,
            vec![Loc::new(0, 0), Loc::new(0, 1), Loc::new(1, 2), Loc::new(1, 4)]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\nb\\c\"d""#),
            vec![(TokenKind::Str, "a\nb\\c\"d".into())]
        );
        assert_eq!(
            tokens(r#""(not a list)""#),
            vec![(TokenKind::Str, "(not a list)".into())]
        );
    }

    #[test]
    fn test_unterminated_string_points_at_quote() {
        let mut lex = lexer("  \"abc");
        assert_eq!(
            lex.next_token(),
            Err(LexError::StrEof {
                loc: Loc::new(0, 2)
            })
        );
    }

    /// Source without the line structure of [`LineBuffer`], so input can end mid-escape.
    struct Chars(Vec<char>, usize);

    impl Source for Chars {
        fn next_char(&mut self) -> Option<char> {
            let c = self.0.get(self.1).copied();
            self.1 += 1;
            c
        }
        fn loc(&self) -> Loc {
            Loc::new(0, self.1)
        }
        fn line(&self, _line: usize) -> Option<&str> {
            None
        }
        fn is_eol(&self) -> bool {
            self.1 >= self.0.len()
        }
        fn skip_line(&mut self) {
            self.1 = self.0.len();
        }
    }

    #[test]
    fn test_unterminated_escape_points_at_backslash() {
        let mut lex = Lexer::new(Chars("\"ab\\".chars().collect(), 0));
        assert_eq!(
            lex.next_token(),
            Err(LexError::StrEof {
                loc: Loc::new(0, 3)
            })
        );
    }

    #[test]
    fn test_unknown_escape() {
        let mut lex = lexer(r#""a\qb""#);
        assert_eq!(
            lex.next_token(),
            Err(LexError::StrEsc {
                escape: 'q',
                loc: Loc::new(0, 3)
            })
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("; leading\n1 ; trailing\n2"),
            vec![(TokenKind::Int, "1".into()), (TokenKind::Int, "2".into())]
        );
    }

    #[test]
    fn test_eol_tracks_pushback() {
        let mut lex = lexer("x)\n");
        lex.next_token().unwrap();
        assert!(!lex.is_eol());
        lex.next_token().unwrap();
        assert!(lex.is_eol());
    }

    #[test]
    fn test_eof_after_whitespace() {
        let mut lex = lexer("   \n\t");
        let token = lex.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Eof);
        assert_eq!(token.text, None);
    }
}
