//! Character stream -> token stream (spec §4.1).
//!
//! Hand-rolled rather than combinator-based: the grammar needs precise byte
//! offsets and a single token of lookahead, which a recursive-descent
//! `Lexer` gives for free. `chumsky`-based lexing (the approach `prqlc-parser`
//! takes) is a poor fit here because spec §4.1 pins down lexer internals
//! (peek buffer, escape handling, two-char-operator priority) at a level of
//! detail that only makes sense for a direct state machine.

use hrql_ast::{Error, Span, Token, TokenKind};

pub struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    idx: usize,
    len_bytes: usize,
    peeked: Option<Token>,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("asc", TokenKind::Asc),
    ("desc", TokenKind::Desc),
];

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            chars: src.char_indices().collect(),
            idx: 0,
            len_bytes: src.len(),
            peeked: None,
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token, Error> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan_token()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> Result<Token, Error> {
        if let Some(t) = self.peeked.take() {
            return Ok(t);
        }
        self.scan_token()
    }

    fn cur(&self) -> Option<(usize, char)> {
        self.chars.get(self.idx).copied()
    }

    fn cur_offset(&self) -> usize {
        self.chars
            .get(self.idx)
            .map(|(o, _)| *o)
            .unwrap_or(self.len_bytes)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let c = self.cur();
        if c.is_some() {
            self.idx += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.cur() {
                Some((_, c)) if c.is_whitespace() => {
                    self.bump();
                }
                Some((_, '/')) if self.chars.get(self.idx + 1).map(|(_, c)| *c) == Some('/') => {
                    while let Some((_, c)) = self.cur() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> Result<Token, Error> {
        self.skip_trivia();

        let start = self.cur_offset();
        let Some((_, c)) = self.cur() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::new(start, start)));
        };

        let two_char = |l: &mut Self, second: char, two: TokenKind, one: TokenKind| {
            l.bump();
            if l.cur().map(|(_, c)| c) == Some(second) {
                l.bump();
                let end = l.cur_offset();
                Token::new(two, &l.src[start..end], Span::new(start, end))
            } else {
                let end = l.cur_offset();
                Token::new(one, &l.src[start..end], Span::new(start, end))
            }
        };

        let tok = match c {
            '|' => {
                self.bump();
                self.single(TokenKind::Pipe, start)
            }
            '.' => {
                self.bump();
                self.single(TokenKind::Dot, start)
            }
            '(' => {
                self.bump();
                self.single(TokenKind::LParen, start)
            }
            ')' => {
                self.bump();
                self.single(TokenKind::RParen, start)
            }
            ',' => {
                self.bump();
                self.single(TokenKind::Comma, start)
            }
            '+' => {
                self.bump();
                self.single(TokenKind::Plus, start)
            }
            '-' => {
                self.bump();
                self.single(TokenKind::Minus, start)
            }
            '*' => {
                self.bump();
                self.single(TokenKind::Star, start)
            }
            '/' => {
                self.bump();
                self.single(TokenKind::Slash, start)
            }
            '=' => two_char(self, '=', TokenKind::Eq, TokenKind::Eq).ensure_two(
                self,
                start,
                "bare `=` is not an operator; did you mean `==`?",
            )?,
            '!' => two_char(self, '=', TokenKind::Neq, TokenKind::Neq).ensure_two(
                self,
                start,
                "bare `!` is not an operator; did you mean `!=`?",
            )?,
            '>' => two_char(self, '=', TokenKind::Gte, TokenKind::Gt),
            '<' => two_char(self, '=', TokenKind::Lte, TokenKind::Lt),
            '"' => self.scan_string(start)?,
            c if c.is_ascii_digit() => self.scan_number(start),
            c if c.is_alphabetic() || c == '_' => self.scan_ident(start),
            other => {
                return Err(Error::lexical(
                    format!("unexpected character {other:?}"),
                    Span::new(start, start + other.len_utf8()),
                ))
            }
        };

        Ok(tok)
    }

    fn single(&self, kind: TokenKind, start: usize) -> Token {
        let end = self.cur_offset();
        Token::new(kind, &self.src[start..end], Span::new(start, end))
    }

    fn scan_string(&mut self, start: usize) -> Result<Token, Error> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(Error::lexical(
                        "unterminated string literal",
                        Span::new(start, self.cur_offset()),
                    ))
                }
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.bump() {
                    None => {
                        return Err(Error::lexical(
                            "unterminated string literal",
                            Span::new(start, self.cur_offset()),
                        ))
                    }
                    Some((_, escaped)) => value.push(escaped),
                },
                Some((_, c)) => value.push(c),
            }
        }
        let end = self.cur_offset();
        Ok(Token::new(TokenKind::String, value, Span::new(start, end)))
    }

    fn scan_number(&mut self, start: usize) -> Token {
        while self.cur().is_some_and(|(_, c)| c.is_ascii_digit()) {
            self.bump();
        }
        if self.cur().map(|(_, c)| c) == Some('.')
            && self
                .chars
                .get(self.idx + 1)
                .is_some_and(|(_, c)| c.is_ascii_digit())
        {
            self.bump(); // '.'
            while self.cur().is_some_and(|(_, c)| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let end = self.cur_offset();
        Token::new(TokenKind::Number, &self.src[start..end], Span::new(start, end))
    }

    fn scan_ident(&mut self, start: usize) -> Token {
        while self
            .cur()
            .is_some_and(|(_, c)| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let end = self.cur_offset();
        let text = &self.src[start..end];
        let kind = KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == text)
            .map(|(_, k)| *k)
            .unwrap_or(TokenKind::Ident);
        Token::new(kind, text, Span::new(start, end))
    }
}

/// Small helper trait used only to keep the `=`/`!` bare-operator checks
/// inline with the `two_char` closure above instead of duplicating the scan.
trait EnsureTwo {
    fn ensure_two(self, lexer: &Lexer, start: usize, msg: &str) -> Result<Token, Error>;
}

impl EnsureTwo for Token {
    fn ensure_two(self, _lexer: &Lexer, start: usize, msg: &str) -> Result<Token, Error> {
        if matches!(self.kind, TokenKind::Eq | TokenKind::Neq) && self.text.len() == 1 {
            return Err(Error::lexical(msg, Span::new(start, start + 1)));
        }
        Ok(self)
    }
}
