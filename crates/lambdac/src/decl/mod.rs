//! Textual primitive declarations
//!
//! A small `external` declaration language standing in for elaboration:
//!
//! ```text
//! external sqrt : float -> float = "caml_sqrt" "caml_sqrt_float" [@@unboxed] [@@noalloc]
//! external get : value -> int64# -> value = "%array_safe_get_indexed_by_int64#"
//! ```
//!
//! The resolver turns written types and representation attributes into the
//! `(mode, representation)` pairs a `PrimitiveDeclaration` carries.

pub mod ast;
pub mod lexer;
pub mod parser;
mod resolve;

pub use ast::{ArgType, Attribute, ExternalDecl, TypeExpr};
pub use parser::Parser;
pub use resolve::resolve_declaration;

use crate::common::CompileResult;
use crate::primitive::PrimitiveDeclaration;

/// Parse and resolve every declaration in `source`
pub fn parse_primitive_declarations(source: &str) -> CompileResult<Vec<(ExternalDecl, PrimitiveDeclaration)>> {
    let decls = Parser::new(source)?.parse()?;
    decls
        .into_iter()
        .map(|decl| {
            let resolved = resolve_declaration(&decl)?;
            Ok((decl, resolved))
        })
        .collect()
}
