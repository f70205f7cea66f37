//! Lexer implementation using logos

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};
use logos::Logos;

/// Lexer for declaration files
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            at_eof: false,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CompileResult<Token> {
        if self.at_eof {
            let len = self.inner.source().len();
            return Ok(Token::new(TokenKind::Eof, Span::new(len, len)));
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Ok(Token::new(kind, Span::new(span.start, span.end)))
            }
            Some(Err(())) => {
                let span = self.inner.span();
                Err(CompileError::lexer(
                    format!("unexpected character '{}'", self.inner.slice()),
                    Span::new(span.start, span.end),
                ))
            }
            None => {
                self.at_eof = true;
                let len = self.inner.source().len();
                Ok(Token::new(TokenKind::Eof, Span::new(len, len)))
            }
        }
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize_all(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            kinds("external local_ local_opt"),
            vec![
                TokenKind::External,
                TokenKind::Local,
                TokenKind::Identifier("local_opt".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_attributes() {
        assert_eq!(
            kinds("[@unboxed] [@@noalloc]"),
            vec![
                TokenKind::AttrOpen,
                TokenKind::Identifier("unboxed".to_string()),
                TokenKind::RBracket,
                TokenKind::DeclAttrOpen,
                TokenKind::Identifier("noalloc".to_string()),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_type_vars() {
        assert_eq!(
            kinds(r#"'a "%array_safe_get_indexed_by_int64#" "a\"b""#),
            vec![
                TokenKind::TypeVar("a".to_string()),
                TokenKind::StringLiteral("%array_safe_get_indexed_by_int64#".to_string()),
                TokenKind::StringLiteral("a\"b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("(* a comment * with stars *) float#"),
            vec![
                TokenKind::Identifier("float".to_string()),
                TokenKind::Hash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("external ?").tokenize_all().unwrap_err();
        assert!(err.to_string().contains("unexpected character"));
    }
}
