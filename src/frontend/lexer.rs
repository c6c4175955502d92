//! Lexer for Plume
//!
//! Converts source code into a flat stream of positioned tokens. The lexer is
//! a character-class state machine: a word (label, keyword or integer) is
//! accumulated until some delimiter flushes it, while punctuation and
//! operators are emitted as soon as they are recognised.

use log::debug;

use crate::frontend::token::Token;
use crate::utils::{Error, Result, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Current line (1-based)
    line: usize,
    /// Current column (1-based)
    column: usize,
    /// Word being accumulated
    word: String,
    /// Position of the first character of `word`
    word_start: Span,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            word: String::new(),
            word_start: Span::new(1, 1),
            tokens: Vec::new(),
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Advance to the next character, keeping line/column in step.
    /// `\r` does not occupy a column.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        match c {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some('\r') | None => {}
            Some(_) => self.column += 1,
        }
        c
    }

    fn here(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn push(&mut self, text: impl Into<String>, span: Span) {
        self.tokens.push(Token::new(text, span));
    }

    /// Emit the in-progress word, if any
    fn flush_word(&mut self) {
        if !self.word.is_empty() {
            let word = std::mem::take(&mut self.word);
            let span = self.word_start;
            self.push(word, span);
        }
    }

    /// Read a string literal, quotes included
    fn read_string(&mut self) -> Result<()> {
        let start = self.here();
        let mut text = String::new();
        // opening quote
        if let Some(quote) = self.advance() {
            text.push(quote);
        }

        loop {
            match self.peek() {
                None => return Err(Error::lex("unclosed quote", self.here())),
                Some('\n') => {
                    return Err(Error::lex("multiline strings are not supported", self.here()))
                }
                Some('"') => {
                    self.advance();
                    text.push('"');
                    break;
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }

        self.push(text, start);
        Ok(())
    }

    /// Read `:` or `:=`
    fn read_colon(&mut self) -> Result<()> {
        let start = self.here();
        self.advance();
        match self.peek() {
            Some('=') => {
                self.advance();
                self.push(":=", start);
            }
            Some(':') => return Err(Error::lex("repeated colon", self.here())),
            _ => self.push(":", start),
        }
        Ok(())
    }

    /// Read `<`, `>`, `<=`, `>=` or `==`
    fn read_relational(&mut self) -> Result<()> {
        let start = self.here();
        let first = match self.advance() {
            Some(c) => c,
            None => return Ok(()),
        };

        match self.peek() {
            Some(second @ ('=' | '<' | '>')) => {
                let op: String = [first, second].iter().collect();
                if !matches!(op.as_str(), "<=" | ">=" | "==") {
                    return Err(Error::lex("symbol not in grammar", start));
                }
                self.advance();
                self.push(op, start);
            }
            // a lone `=` is not an operator
            _ if first == '=' => return Err(Error::lex("symbol not in grammar", start)),
            _ => self.push(first.to_string(), start),
        }
        Ok(())
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.peek() {
            match c {
                '(' | ')' | ';' | ',' | '+' | '-' | '*' | '/' | '%' => {
                    self.flush_word();
                    let span = self.here();
                    self.advance();
                    self.push(c.to_string(), span);
                }
                ' ' | '\t' | '\n' => {
                    self.flush_word();
                    self.advance();
                }
                '\r' => {
                    self.advance();
                }
                '"' => {
                    self.flush_word();
                    self.read_string()?;
                }
                ':' => {
                    self.flush_word();
                    self.read_colon()?;
                }
                '<' | '>' | '=' => {
                    self.flush_word();
                    self.read_relational()?;
                }
                c if c.is_ascii_alphanumeric() || c == '_' => {
                    if self.word.is_empty() {
                        self.word_start = self.here();
                    }
                    self.word.push(c);
                    self.advance();
                }
                _ => return Err(Error::lex("symbol not in grammar", self.here())),
            }
        }
        self.flush_word();

        debug!("lexed {} tokens over {} lines", self.tokens.len(), self.line);
        Ok(std::mem::take(&mut self.tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(source: &str) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    fn lex_err(source: &str) -> (String, Span) {
        match Lexer::new(source).tokenize() {
            Err(Error::Lex { message, span }) => (message, span),
            other => panic!("expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_program() {
        assert_eq!(
            texts("program x : Integer; begin x := (+ 2 3); print x; end;"),
            vec![
                "program", "x", ":", "Integer", ";", "begin", "x", ":=", "(", "+", "2", "3",
                ")", ";", "print", "x", ";", "end", ";",
            ]
        );
    }

    #[test]
    fn test_single_char_tokens_split_words() {
        assert_eq!(texts("f(a,b)"), vec!["f", "(", "a", ",", "b", ")"]);
        assert_eq!(texts("a-b"), vec!["a", "-", "b"]);
    }

    #[test]
    fn test_relational_operators() {
        assert_eq!(texts("a<=b >= c==d<e>f"), vec![
            "a", "<=", "b", ">=", "c", "==", "d", "<", "e", ">", "f",
        ]);
    }

    #[test]
    fn test_colon_forms() {
        assert_eq!(texts("x:Integer"), vec!["x", ":", "Integer"]);
        assert_eq!(texts("x:=1"), vec!["x", ":=", "1"]);
        assert_eq!(lex_err("x::y").0, "repeated colon");
    }

    #[test]
    fn test_strings_kept_verbatim() {
        assert_eq!(texts("print \"a b;c\";"), vec!["print", "\"a b;c\"", ";"]);
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(lex_err("print \"abc").0, "unclosed quote");
        assert_eq!(lex_err("print \"ab\ncd\";").0, "multiline strings are not supported");
    }

    #[test]
    fn test_bad_operators() {
        assert_eq!(lex_err("x = 1").0, "symbol not in grammar");
        assert_eq!(lex_err("a <> b").0, "symbol not in grammar");
        assert_eq!(lex_err("a =< b").0, "symbol not in grammar");
        assert_eq!(lex_err("a & b").0, "symbol not in grammar");
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("program\n  abc := (- 12);").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3));
        assert_eq!(tokens[2].span, Span::new(2, 7));
        assert_eq!(tokens[5].text, "12");
        assert_eq!(tokens[5].span, Span::new(2, 13));
    }

    #[test]
    fn test_carriage_return_is_invisible() {
        let tokens = Lexer::new("a\r\nbc").tokenize().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].span, Span::new(2, 1));
    }

    #[test]
    fn test_error_position() {
        let (_, span) = lex_err("ab $");
        assert_eq!(span, Span::new(1, 4));
    }

    #[test]
    fn test_operator_error_points_at_operator() {
        assert_eq!(lex_err("x = 1"), ("symbol not in grammar".to_string(), Span::new(1, 3)));
        assert_eq!(lex_err("a <> b").1, Span::new(1, 3));
        assert_eq!(lex_err("ab\n  =< b").1, Span::new(2, 3));
    }

    #[test]
    fn test_eof_flushes_word() {
        assert_eq!(texts("end"), vec!["end"]);
        assert!(texts("").is_empty());
    }
}
