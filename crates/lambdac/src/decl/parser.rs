//! Recursive descent parser for `external` declarations

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};

/// Recursive descent parser for declaration files
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse every declaration up to end of file
    pub fn parse(&mut self) -> CompileResult<Vec<ExternalDecl>> {
        let mut decls = Vec::new();

        while !self.at_end() {
            decls.push(self.parse_external()?);
        }

        Ok(decls)
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.span)),
            other => Err(CompileError::parser(
                format!("expected identifier, found {}", other),
                token.span,
            )),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_external(&mut self) -> CompileResult<ExternalDecl> {
        let start = self.expect(TokenKind::External)?.span;
        let (value_name, _) = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;

        let mut types = vec![self.parse_arg_type()?];
        while self.match_token(&TokenKind::Arrow)? {
            types.push(self.parse_arg_type()?);
        }
        let result = types.pop().ok_or_else(|| CompileError::parser("missing result type", start))?;

        self.expect(TokenKind::Eq)?;

        let mut prims = Vec::new();
        while let TokenKind::StringLiteral(s) = &self.current.kind {
            prims.push(s.clone());
            self.advance()?;
        }
        if prims.is_empty() {
            return Err(CompileError::parser(
                format!("expected primitive name, found {}", self.current.kind),
                self.current.span,
            ));
        }

        let mut end = self.current.span;
        let mut attributes = Vec::new();
        while self.check(&TokenKind::DeclAttrOpen) {
            let attr = self.parse_attribute(TokenKind::DeclAttrOpen)?;
            end = attr.span;
            attributes.push(attr);
        }
        if attributes.is_empty() {
            end = Span::new(end.start, end.start);
        }

        Ok(ExternalDecl {
            value_name,
            args: types,
            result,
            prims,
            attributes,
            span: start.to(end),
        })
    }

    fn parse_attribute(&mut self, open: TokenKind) -> CompileResult<Attribute> {
        let start = self.expect(open)?.span;
        let (name, _) = self.expect_identifier()?;
        let end = self.expect(TokenKind::RBracket)?.span;
        Ok(Attribute {
            name,
            span: start.to(end),
        })
    }

    fn parse_arg_type(&mut self) -> CompileResult<ArgType> {
        let start = self.current.span;
        let local = self.match_token(&TokenKind::Local)?;
        let (ty, mut end) = self.parse_type()?;

        let mut attributes = Vec::new();
        while self.check(&TokenKind::AttrOpen) {
            let attr = self.parse_attribute(TokenKind::AttrOpen)?;
            end = attr.span;
            attributes.push(attr);
        }

        Ok(ArgType {
            ty,
            local,
            attributes,
            span: start.to(end),
        })
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn parse_type(&mut self) -> CompileResult<(TypeExpr, Span)> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::TypeVar(name) => Ok((TypeExpr::Var(name), token.span)),
            TokenKind::Identifier(name) => {
                // `float#` is one type only when the hash is adjacent
                if self.check(&TokenKind::Hash) && self.current.span.start == token.span.end {
                    let hash = self.advance()?;
                    Ok((TypeExpr::Unboxed(name), token.span.to(hash.span)))
                } else {
                    Ok((TypeExpr::Named(name), token.span))
                }
            }
            TokenKind::Hash => {
                self.expect(TokenKind::LParen)?;
                let (first, _) = self.parse_type()?;
                let mut components = vec![first];
                while self.match_token(&TokenKind::Star)? {
                    components.push(self.parse_type()?.0);
                }
                let end = self.expect(TokenKind::RParen)?.span;
                Ok((TypeExpr::Product(components), token.span.to(end)))
            }
            other => Err(CompileError::parser(
                format!("expected type, found {}", other),
                token.span,
            )),
        }
    }
}
