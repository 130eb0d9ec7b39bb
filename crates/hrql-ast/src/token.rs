use std::fmt;

use crate::Span;

/// One lexed token plus its starting byte offset (spec §3, "Token").
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw slice of the input this token was lexed from.
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Pipe,
    Dot,
    LParen,
    RParen,
    Comma,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Plus,
    Minus,
    Star,
    Slash,
    Ident,
    String,
    Number,
    True,
    False,
    And,
    Or,
    Asc,
    Desc,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Pipe => "`|`",
            TokenKind::Dot => "`.`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Comma => "`,`",
            TokenKind::Eq => "`==`",
            TokenKind::Neq => "`!=`",
            TokenKind::Gt => "`>`",
            TokenKind::Gte => "`>=`",
            TokenKind::Lt => "`<`",
            TokenKind::Lte => "`<=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Ident => "identifier",
            TokenKind::String => "string literal",
            TokenKind::Number => "number literal",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::And => "`and`",
            TokenKind::Or => "`or`",
            TokenKind::Asc => "`asc`",
            TokenKind::Desc => "`desc`",
        };
        f.write_str(s)
    }
}
