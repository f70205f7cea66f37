//! Token definitions for declaration files

use crate::common::Span;
use logos::Logos;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

fn unescape(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Quote `s` as a string literal that [`unescape`] reads back unchanged
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// All token kinds of the declaration language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"\(\*([^*]|\*+[^*)])*\*+\)")] // (* comments *)
pub enum TokenKind {
    // === Keywords ===
    #[token("external")]
    External,
    #[token("local_")]
    Local,

    // === Names ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_']*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"'[a-z][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    TypeVar(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    StringLiteral(String),

    // === Punctuation ===
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
    #[token("=")]
    Eq,
    #[token("*")]
    Star,
    #[token("#")]
    Hash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    /// `[@` opening a type attribute
    #[token("[@")]
    AttrOpen,
    /// `[@@` opening a declaration attribute
    #[token("[@@")]
    DeclAttrOpen,
    #[token("]")]
    RBracket,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::External => write!(f, "'external'"),
            TokenKind::Local => write!(f, "'local_'"),
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::TypeVar(s) => write!(f, "type variable '{}", s),
            TokenKind::StringLiteral(s) => write!(f, "string {:?}", s),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Hash => write!(f, "'#'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::AttrOpen => write!(f, "'[@'"),
            TokenKind::DeclAttrOpen => write!(f, "'[@@'"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
