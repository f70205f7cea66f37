//! Layout resolution of written types

use tracing::trace;
use super::ast::{ArgType, Attribute, ExternalDecl, TypeExpr};
use crate::common::{CompileError, CompileResult};
use crate::primitive::{DeclAttributes, Mode, ModedRepr, NativeRepr, PrimitiveDeclaration};
use crate::types::{BaseSort, FloatWidth, IntWidth, Sort, VectorWidth};

const DECL_ATTRIBUTES: &[&str] = &[
    "noalloc",
    "builtin",
    "no_effects",
    "only_generative_effects",
    "no_coeffects",
    "layout_poly",
    "unboxed",
    "untagged",
];

const TYPE_ATTRIBUTES: &[&str] = &["unboxed", "untagged", "local_opt"];

/// Representation requested by `[@unboxed]`/`[@untagged]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Default,
    Unboxed,
    Untagged,
}

fn check_known(attrs: &[Attribute], known: &[&str]) -> CompileResult<()> {
    match attrs.iter().find(|a| !known.contains(&a.name.as_str())) {
        Some(attr) => Err(CompileError::repr(format!("unknown attribute '{}'", attr.name), attr.span)),
        None => Ok(()),
    }
}

fn unboxed_sort(name: &str) -> Option<BaseSort> {
    let sort = match name {
        "float" => BaseSort::Float64,
        "float32" => BaseSort::Float32,
        "nativeint" => BaseSort::Word,
        "int8" => BaseSort::Bits8,
        "int16" => BaseSort::Bits16,
        "int32" => BaseSort::Bits32,
        "int64" => BaseSort::Bits64,
        "vec128" => BaseSort::Vec128,
        "vec256" => BaseSort::Vec256,
        "vec512" => BaseSort::Vec512,
        "void" => BaseSort::Void,
        _ => return None,
    };
    Some(sort)
}

/// Boxed type names that `[@unboxed]` applies to
fn unboxable(name: &str) -> Option<NativeRepr> {
    let repr = match name {
        "float" => NativeRepr::UnboxedFloat(FloatWidth::F64),
        "float32" => NativeRepr::UnboxedFloat(FloatWidth::F32),
        "nativeint" => NativeRepr::UnboxedInteger(IntWidth::Nativeint),
        "int8" => NativeRepr::UnboxedInteger(IntWidth::Int8),
        "int16" => NativeRepr::UnboxedInteger(IntWidth::Int16),
        "int32" => NativeRepr::UnboxedInteger(IntWidth::Int32),
        "int64" => NativeRepr::UnboxedInteger(IntWidth::Int64),
        "vec128" => NativeRepr::UnboxedVector(VectorWidth::Vec128),
        "vec256" => NativeRepr::UnboxedVector(VectorWidth::Vec256),
        "vec512" => NativeRepr::UnboxedVector(VectorWidth::Vec512),
        _ => return None,
    };
    Some(repr)
}

fn is_immediate(name: &str) -> bool {
    matches!(name, "int" | "char" | "bool")
}

fn type_sort(ty: &TypeExpr) -> Sort {
    match ty {
        TypeExpr::Named(_) | TypeExpr::Var(_) => Sort::VALUE,
        TypeExpr::Unboxed(name) => unboxed_sort(name).map(Sort::Base).unwrap_or(Sort::VALUE),
        TypeExpr::Product(components) => Sort::Product(components.iter().map(type_sort).collect()),
    }
}

fn check_unboxed_names(ty: &TypeExpr, arg: &ArgType) -> CompileResult<()> {
    match ty {
        TypeExpr::Unboxed(name) if unboxed_sort(name).is_none() => Err(CompileError::repr(
            format!("unknown unboxed type '{}#'", name),
            arg.span,
        )),
        TypeExpr::Product(components) => components.iter().try_for_each(|c| check_unboxed_names(c, arg)),
        _ => Ok(()),
    }
}

fn resolve_arg(arg: &ArgType, global: Request, layout_poly: bool) -> CompileResult<ModedRepr> {
    check_known(&arg.attributes, TYPE_ATTRIBUTES)?;
    check_unboxed_names(&arg.ty, arg)?;

    let unboxed = arg.has_attribute("unboxed");
    let untagged = arg.has_attribute("untagged");
    let request = match (unboxed, untagged, global) {
        (true, true, _) => {
            return Err(CompileError::repr(
                "a type cannot be both [@unboxed] and [@untagged]",
                arg.span,
            ))
        }
        (true, false, Request::Untagged) | (false, true, Request::Unboxed) => {
            return Err(CompileError::repr(
                "type attribute conflicts with the declaration attribute",
                arg.span,
            ))
        }
        (true, false, _) => Request::Unboxed,
        (false, true, _) => Request::Untagged,
        (false, false, global) => global,
    };

    let repr = match (&arg.ty, request) {
        (TypeExpr::Named(name), Request::Unboxed) => unboxable(name).ok_or_else(|| {
            CompileError::repr(format!("don't know how to unbox type '{}'", name), arg.span)
        })?,
        (TypeExpr::Named(name), Request::Untagged) => {
            if !is_immediate(name) {
                return Err(CompileError::repr(
                    format!("don't know how to untag type '{}'", name),
                    arg.span,
                ));
            }
            NativeRepr::UntaggedImmediate
        }
        (TypeExpr::Named(_), Request::Default) => NativeRepr::VALUE,
        (TypeExpr::Var(_), Request::Default) if layout_poly => NativeRepr::Poly,
        (TypeExpr::Var(_), Request::Default) => NativeRepr::VALUE,
        (ty @ (TypeExpr::Unboxed(_) | TypeExpr::Product(_)), Request::Default) => {
            NativeRepr::SameAsHost(type_sort(ty))
        }
        (_, _) => {
            return Err(CompileError::repr(
                "[@unboxed]/[@untagged] only apply to boxed or immediate types",
                arg.span,
            ))
        }
    };

    let local_opt = arg.has_attribute("local_opt");
    let mode = match (arg.local, local_opt) {
        (true, true) => {
            return Err(CompileError::repr("a type cannot be both local_ and [@local_opt]", arg.span))
        }
        (true, false) => Mode::Local,
        (false, true) => Mode::Poly,
        (false, false) => Mode::Global,
    };

    Ok(ModedRepr::new(mode, repr))
}

/// Turn a parsed `external` into the declaration handed to descriptor construction
pub fn resolve_declaration(decl: &ExternalDecl) -> CompileResult<PrimitiveDeclaration> {
    check_known(&decl.attributes, DECL_ATTRIBUTES)?;

    let global = match (decl.has_attribute("unboxed"), decl.has_attribute("untagged")) {
        (true, true) => {
            return Err(CompileError::repr(
                "a declaration cannot be both [@@unboxed] and [@@untagged]",
                decl.span,
            ))
        }
        (true, false) => Request::Unboxed,
        (false, true) => Request::Untagged,
        (false, false) => Request::Default,
    };

    let attributes = DeclAttributes {
        noalloc: decl.has_attribute("noalloc"),
        builtin: decl.has_attribute("builtin"),
        no_effects: decl.has_attribute("no_effects"),
        only_generative_effects: decl.has_attribute("only_generative_effects"),
        no_coeffects: decl.has_attribute("no_coeffects"),
        layout_poly: decl.has_attribute("layout_poly"),
    };

    let native_repr_args = decl
        .args
        .iter()
        .map(|arg| resolve_arg(arg, global, attributes.layout_poly))
        .collect::<CompileResult<Vec<_>>>()?;
    let native_repr_res = resolve_arg(&decl.result, global, attributes.layout_poly)?;

    // The parser guarantees at least one string
    let (name, payload) = match decl.prims.split_first() {
        Some((name, payload)) => (name.clone(), payload.to_vec()),
        None => return Err(CompileError::parser("missing primitive name", decl.span)),
    };

    trace!(value = %decl.value_name, prim = %name, "resolved declaration");

    Ok(PrimitiveDeclaration {
        name,
        payload,
        attributes,
        native_repr_args,
        native_repr_res,
        span: decl.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::decl::Parser;

    fn resolve(source: &str) -> CompileResult<PrimitiveDeclaration> {
        let decls = Parser::new(source)?.parse()?;
        resolve_declaration(&decls[0])
    }

    #[test]
    fn test_global_unboxed() {
        let decl = resolve(r#"external sqrt : float -> float = "caml_sqrt" "sqrt" [@@unboxed] [@@noalloc]"#).unwrap();
        let f = ModedRepr::global(NativeRepr::UnboxedFloat(FloatWidth::F64));
        assert_eq!(decl.native_repr_args, vec![f.clone()]);
        assert_eq!(decl.native_repr_res, f);
        assert!(decl.attributes.noalloc);
        assert_eq!(decl.name, "caml_sqrt");
        assert_eq!(decl.payload, vec!["sqrt".to_string()]);
    }

    #[test]
    fn test_per_type_reprs_and_modes() {
        let decl = resolve(
            r#"external g : int64 [@unboxed] -> local_ int [@untagged] -> value [@local_opt] = "g" "g_nat""#,
        )
        .unwrap();
        assert_eq!(
            decl.native_repr_args,
            vec![
                ModedRepr::global(NativeRepr::UnboxedInteger(IntWidth::Int64)),
                ModedRepr::new(Mode::Local, NativeRepr::UntaggedImmediate),
            ]
        );
        assert_eq!(decl.native_repr_res, ModedRepr::new(Mode::Poly, NativeRepr::VALUE));
    }

    #[test]
    fn test_unboxed_type_names_give_sorts() {
        let decl = resolve(r#"external h : #(float# * value) -> nativeint# = "h" "h_nat""#).unwrap();
        assert_eq!(
            decl.native_repr_args[0].repr,
            NativeRepr::SameAsHost(Sort::Product(vec![Sort::FLOAT64, Sort::VALUE]))
        );
        assert_eq!(decl.native_repr_res.repr, NativeRepr::SameAsHost(Sort::WORD));
    }

    #[test]
    fn test_type_variables() {
        let poly = resolve(r#"external id : 'a -> 'a = "%identity" [@@layout_poly]"#).unwrap();
        assert_eq!(poly.native_repr_res.repr, NativeRepr::Poly);
        let mono = resolve(r#"external id : 'a -> 'a = "%identity""#).unwrap();
        assert_eq!(mono.native_repr_res.repr, NativeRepr::VALUE);
    }

    #[test]
    fn test_cannot_unbox_string() {
        let err = resolve(r#"external f : string -> int = "f" "g" [@@unboxed]"#).unwrap_err();
        assert!(err.to_string().contains("don't know how to unbox"));
    }

    #[test]
    fn test_conflicting_attributes() {
        assert!(resolve(r#"external f : int [@unboxed] [@untagged] -> int = "f" "g""#).is_err());
        assert!(resolve(r#"external f : local_ int [@local_opt] -> int = "f" "g""#).is_err());
        assert!(resolve(r#"external f : int -> int = "f" "g" [@@unboxed] [@@untagged]"#).is_err());
        assert!(resolve(r#"external f : float# [@unboxed] -> int = "f" "g""#).is_err());
    }

    #[test]
    fn test_unknown_attributes() {
        let err = resolve(r#"external f : int -> int = "f" [@@inline]"#).unwrap_err();
        assert!(err.to_string().contains("unknown attribute 'inline'"));
        assert!(resolve(r#"external f : int [@boxed] -> int = "f""#).is_err());
        assert!(resolve(r#"external f : foo# -> int = "f""#).is_err());
    }
}
