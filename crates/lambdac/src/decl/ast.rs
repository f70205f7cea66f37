//! AST of declaration files

use crate::common::Span;

/// Attribute without payload, e.g. `[@unboxed]` or `[@@noalloc]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub span: Span,
}

/// A written type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Boxed or immediate type such as `float` or `int`
    Named(String),
    /// Unboxed type such as `float#`; holds the name without `#`
    Unboxed(String),
    /// Type variable `'a`
    Var(String),
    /// Unboxed product `#(t1 * t2)`
    Product(Vec<TypeExpr>),
}

/// An argument or result position of an external's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgType {
    pub ty: TypeExpr,
    pub local: bool,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// `external name : t1 -> ... -> r = "prim" ... [@@attr] ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDecl {
    pub value_name: String,
    pub args: Vec<ArgType>,
    pub result: ArgType,
    /// Primitive name followed by the payload strings
    pub prims: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

impl ExternalDecl {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}

impl ArgType {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}
