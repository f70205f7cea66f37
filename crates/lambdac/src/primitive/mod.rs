//! Primitive descriptors
//!
//! A primitive is an operation implemented outside the IR: a foreign
//! function or a compiler builtin (names starting with `%`). Its descriptor
//! records the name, arity, effects, allocation behaviour and the native
//! representation of every argument and of the result.
//!
//! Descriptors are built once from a declaration (`parse_declaration`),
//! checked against the builtin representation table
//! (`prim_has_valid_reprs`) and are immutable afterwards.

mod descriptor;
mod print;
mod repr;
mod validate;

pub use descriptor::{
    parse_declaration, desugar_prim_names, is_builtin_name, DeclAttributes, Deprecation,
    Description, ParsedDeclaration, PrimNames, PrimitiveDeclaration, PrimitiveError,
};
pub use print::{print_declaration, PrintedDeclaration, PrintedType};
pub use repr::{Coeffects, Effects, Mode, ModedRepr, NativeRepr};
pub use validate::{check_builtin_reprs, prim_has_valid_reprs, ReprCheck, ValidationConfig};
