//! Rendering descriptors back to declarations
//!
//! The printed form re-parses to the same descriptor: representation
//! attributes go on the declaration when they hold for every argument and
//! the result, and on the individual types otherwise.

use std::fmt;
use super::descriptor::Description;
use crate::decl::lexer::escape;
use super::repr::{Coeffects, Effects, Mode, ModedRepr, NativeRepr};
use crate::types::{BaseSort, Sort};

/// One argument or result type of a printed declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedType {
    pub ty: String,
    /// Printed with a `local_` prefix
    pub local: bool,
    pub attributes: Vec<&'static str>,
}

/// A declaration ready to be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedDeclaration {
    pub value_name: String,
    pub prims: Vec<String>,
    pub arg_types: Vec<PrintedType>,
    pub result: PrintedType,
    /// Declaration-level (`[@@...]`) attributes
    pub attributes: Vec<&'static str>,
}

fn sort_type_name(sort: &Sort) -> String {
    match sort {
        Sort::Base(base) => match base {
            BaseSort::Value => "value".to_string(),
            BaseSort::Void => "void#".to_string(),
            BaseSort::Float64 => "float#".to_string(),
            BaseSort::Float32 => "float32#".to_string(),
            BaseSort::Word => "nativeint#".to_string(),
            BaseSort::Bits8 => "int8#".to_string(),
            BaseSort::Bits16 => "int16#".to_string(),
            BaseSort::Bits32 => "int32#".to_string(),
            BaseSort::Bits64 => "int64#".to_string(),
            BaseSort::Vec128 => "vec128#".to_string(),
            BaseSort::Vec256 => "vec256#".to_string(),
            BaseSort::Vec512 => "vec512#".to_string(),
        },
        Sort::Product(sorts) => {
            let parts: Vec<String> = sorts.iter().map(sort_type_name).collect();
            format!("#({})", parts.join(" * "))
        }
    }
}

/// Canonical type whose resolution yields `repr` (given the right attribute)
fn repr_type_name(repr: &NativeRepr) -> String {
    match repr {
        NativeRepr::Poly => "'a".to_string(),
        NativeRepr::SameAsHost(sort) => sort_type_name(sort),
        NativeRepr::UnboxedFloat(width) => width.name().to_string(),
        NativeRepr::UnboxedInteger(width) => width.name().to_string(),
        NativeRepr::UnboxedVector(width) => width.name().to_string(),
        NativeRepr::UntaggedImmediate => "int".to_string(),
    }
}

fn print_type(slot: &ModedRepr, all_unboxed: bool, all_untagged: bool) -> PrintedType {
    let mut attributes = Vec::new();
    if slot.repr.is_unboxed() && !all_unboxed {
        attributes.push("unboxed");
    }
    if slot.repr.is_untagged() && !all_untagged {
        attributes.push("untagged");
    }
    if slot.mode == Mode::Poly {
        attributes.push("local_opt");
    }
    PrintedType {
        ty: repr_type_name(&slot.repr),
        local: slot.mode == Mode::Local,
        attributes,
    }
}

/// Render `desc` as the declaration of `value_name`
pub fn print_declaration(desc: &Description, value_name: &str) -> PrintedDeclaration {
    let mut prims = vec![desc.name.clone()];
    if !desc.native_name.is_empty() {
        prims.push(desc.native_name.clone());
    }

    let all_unboxed = desc.all_reprs().all(|r| r.repr.is_unboxed());
    let all_untagged = desc.all_reprs().all(|r| r.repr.is_untagged());

    let mut attributes = Vec::new();
    if !desc.alloc {
        attributes.push("noalloc");
    }
    if all_unboxed {
        attributes.push("unboxed");
    } else if all_untagged {
        attributes.push("untagged");
    }
    match desc.effects {
        Effects::NoEffects => attributes.push("no_effects"),
        Effects::OnlyGenerativeEffects => attributes.push("only_generative_effects"),
        Effects::ArbitraryEffects => {}
    }
    if desc.coeffects == Coeffects::NoCoeffects {
        attributes.push("no_coeffects");
    }
    if desc.c_builtin {
        attributes.push("builtin");
    }
    if desc.is_layout_poly {
        attributes.push("layout_poly");
    }

    PrintedDeclaration {
        value_name: value_name.to_string(),
        prims,
        arg_types: desc
            .native_repr_args
            .iter()
            .map(|slot| print_type(slot, all_unboxed, all_untagged))
            .collect(),
        result: print_type(&desc.native_repr_res, all_unboxed, all_untagged),
        attributes,
    }
}

impl fmt::Display for PrintedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local {
            write!(f, "local_ ")?;
        }
        write!(f, "{}", self.ty)?;
        for attr in &self.attributes {
            write!(f, " [@{}]", attr)?;
        }
        Ok(())
    }
}

impl fmt::Display for PrintedDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "external {} : ", self.value_name)?;
        for arg in &self.arg_types {
            write!(f, "{} -> ", arg)?;
        }
        write!(f, "{} =", self.result)?;
        for prim in &self.prims {
            write!(f, " {}", escape(prim))?;
        }
        for attr in &self.attributes {
            write!(f, " [@@{}]", attr)?;
        }
        Ok(())
    }
}
