//! Descriptor construction from declarations

use std::fmt;
use thiserror::Error;
use tracing::debug;
use crate::common::Span;
use super::repr::{Coeffects, Effects, ModedRepr, NativeRepr};
use crate::ir::layout_of_native_repr;
use crate::types::{FloatWidth, Layout};

/// Errors raised while building or validating a primitive descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("cannot use \"float\" in conjunction with [@unboxed]/[@untagged]")]
    LegacyFloatWithReprAttribute { span: Span },

    #[error("cannot use \"float\" in conjunction with types of non-value layouts")]
    LegacyFloatWithNonValueSort { span: Span },

    #[error("cannot use \"noalloc\" in conjunction with [@@noalloc]")]
    LegacyNoallocWithNoallocAttribute { span: Span },

    #[error("cannot use \"float\" in conjunction with [@layout_poly]")]
    LegacyFloatWithLayoutPoly { span: Span },

    #[error("the native code version of the primitive is mandatory when attributes [@untagged] or [@unboxed] are present")]
    MissingNativeForReprAttribute { span: Span },

    #[error("the native code version of the primitive is mandatory for types with non-value layouts")]
    MissingNativeForNonValueSort { span: Span },

    #[error("at most one of [@no_effects] and [@only_generative_effects] can be specified")]
    InconsistentEffectAttributes { span: Span },

    #[error("cannot use [@@only_generative_effects] in conjunction with [@@noalloc]")]
    InconsistentNoallocAttributes { span: Span },

    /// Also raised for a representation placeholder on a non-builtin
    #[error("attribute [@layout_poly] can only be used on built-in primitives")]
    LayoutPolyOnNonBuiltin { span: Span },

    #[error("the primitive [{name}] is used in an invalid declaration: argument or return types have the wrong layout")]
    InvalidNativeReprForPrimitive { name: String, span: Span },
}

impl PrimitiveError {
    pub fn span(&self) -> Span {
        match self {
            PrimitiveError::LegacyFloatWithReprAttribute { span }
            | PrimitiveError::LegacyFloatWithNonValueSort { span }
            | PrimitiveError::LegacyNoallocWithNoallocAttribute { span }
            | PrimitiveError::LegacyFloatWithLayoutPoly { span }
            | PrimitiveError::MissingNativeForReprAttribute { span }
            | PrimitiveError::MissingNativeForNonValueSort { span }
            | PrimitiveError::InconsistentEffectAttributes { span }
            | PrimitiveError::InconsistentNoallocAttributes { span }
            | PrimitiveError::LayoutPolyOnNonBuiltin { span }
            | PrimitiveError::InvalidNativeReprForPrimitive { span, .. } => *span,
        }
    }
}

/// Non-fatal warning for legacy markers in the name list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deprecation {
    LegacyFloat { span: Span },
    LegacyNoalloc { span: Span },
}

impl Deprecation {
    pub fn span(&self) -> Span {
        match self {
            Deprecation::LegacyFloat { span } | Deprecation::LegacyNoalloc { span } => *span,
        }
    }
}

impl fmt::Display for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deprecation::LegacyFloat { .. } => {
                write!(f, "[@@unboxed] + [@@noalloc] should be used instead of \"float\"")
            }
            Deprecation::LegacyNoalloc { .. } => {
                write!(f, "[@@noalloc] should be used instead of \"noalloc\"")
            }
        }
    }
}

/// Zero-payload attributes recognised on a primitive declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclAttributes {
    pub noalloc: bool,
    pub builtin: bool,
    pub no_effects: bool,
    pub only_generative_effects: bool,
    pub no_coeffects: bool,
    pub layout_poly: bool,
}

/// A primitive declaration as handed over by elaboration.
///
/// `payload` holds the strings after the primitive name, e.g.
/// `["noalloc", "caml_sqrt", "float"]`. Representations come from layout
/// resolution of the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveDeclaration {
    pub name: String,
    pub payload: Vec<String>,
    pub attributes: DeclAttributes,
    pub native_repr_args: Vec<ModedRepr>,
    pub native_repr_res: ModedRepr,
    pub span: Span,
}

/// Canonical reading of a primitive name list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimNames {
    pub name: String,
    /// Empty when there is no native version
    pub native_name: String,
    pub legacy_noalloc: bool,
    pub legacy_float: bool,
}

/// Split the legacy `"noalloc"`/`"float"` markers out of a name list
pub fn desugar_prim_names(name: &str, payload: &[String]) -> PrimNames {
    let (native_name, legacy_noalloc, legacy_float) = match payload {
        [noalloc, native, float, ..] if noalloc == "noalloc" && float == "float" => {
            (native.clone(), true, true)
        }
        [noalloc, native, ..] if noalloc == "noalloc" => (native.clone(), true, false),
        [native, float, ..] if float == "float" => (native.clone(), false, true),
        [noalloc] if noalloc == "noalloc" => (String::new(), true, false),
        [native, ..] => (native.clone(), false, false),
        [] => (String::new(), false, false),
    };
    PrimNames {
        name: name.to_string(),
        native_name,
        legacy_noalloc,
        legacy_float,
    }
}

/// Builtins are recognised by their leading `%`
pub fn is_builtin_name(name: &str) -> bool {
    name.starts_with('%')
}

/// Immutable description of a primitive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Description {
    pub name: String,
    /// Always `native_repr_args.len()`
    pub arity: usize,
    pub alloc: bool,
    /// The C compiler may replace the call with a builtin
    pub c_builtin: bool,
    pub effects: Effects,
    pub coeffects: Coeffects,
    /// Empty when there is no native version
    pub native_name: String,
    pub native_repr_args: Vec<ModedRepr>,
    pub native_repr_res: ModedRepr,
    pub is_layout_poly: bool,
}

impl Description {
    pub fn new(
        name: impl Into<String>,
        alloc: bool,
        c_builtin: bool,
        effects: Effects,
        coeffects: Coeffects,
        native_name: impl Into<String>,
        native_repr_args: Vec<ModedRepr>,
        native_repr_res: ModedRepr,
        is_layout_poly: bool,
    ) -> Self {
        Self {
            name: name.into(),
            arity: native_repr_args.len(),
            alloc,
            c_builtin,
            effects,
            coeffects,
            native_name: native_name.into(),
            native_repr_args,
            native_repr_res,
            is_layout_poly,
        }
    }

    /// A primitive taking and returning global values of the default sort
    pub fn simple_on_values(name: impl Into<String>, arity: usize, alloc: bool) -> Self {
        Self::new(
            name,
            alloc,
            false,
            Effects::ArbitraryEffects,
            Coeffects::HasCoeffects,
            "",
            vec![ModedRepr::value(); arity],
            ModedRepr::value(),
            false,
        )
    }

    /// Name used by the bytecode runtime
    pub fn byte_name(&self) -> &str {
        &self.name
    }

    /// Name of the native implementation, falling back to the declared name
    pub fn native_name(&self) -> &str {
        if self.native_name.is_empty() {
            &self.name
        } else {
            &self.native_name
        }
    }

    /// Whether native code calls an external symbol
    pub fn native_name_is_external(&self) -> bool {
        let name = self.native_name();
        !name.is_empty() && !is_builtin_name(name)
    }

    pub fn is_builtin(&self) -> bool {
        is_builtin_name(&self.name)
    }

    /// Layout of the value a call returns
    pub fn result_layout(&self) -> Layout {
        layout_of_native_repr(&self.native_repr_res.repr)
    }

    /// All argument representations followed by the result one
    pub fn all_reprs(&self) -> impl Iterator<Item = &ModedRepr> {
        self.native_repr_args.iter().chain(std::iter::once(&self.native_repr_res))
    }
}

/// Result of a successful `parse_declaration`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDeclaration {
    pub description: Description,
    pub deprecation: Option<Deprecation>,
}

/// Build a descriptor from a declaration, enforcing attribute consistency
pub fn parse_declaration(decl: &PrimitiveDeclaration) -> Result<ParsedDeclaration, PrimitiveError> {
    let span = decl.span;
    let attrs = decl.attributes;
    let names = desugar_prim_names(&decl.name, &decl.payload);
    let builtin = is_builtin_name(&names.name);
    let all_reprs = || decl.native_repr_args.iter().chain(std::iter::once(&decl.native_repr_res));

    // Whatever the name list looks like, only builtins are layout-polymorphic
    if !builtin && (attrs.layout_poly || all_reprs().any(|r| r.repr == NativeRepr::Poly)) {
        return Err(PrimitiveError::LayoutPolyOnNonBuiltin { span });
    }

    if attrs.no_effects && attrs.only_generative_effects {
        return Err(PrimitiveError::InconsistentEffectAttributes { span });
    }
    let effects = if attrs.no_effects {
        Effects::NoEffects
    } else if attrs.only_generative_effects {
        Effects::OnlyGenerativeEffects
    } else {
        Effects::ArbitraryEffects
    };
    let coeffects = if attrs.no_coeffects {
        Coeffects::NoCoeffects
    } else {
        Coeffects::HasCoeffects
    };

    if names.legacy_float {
        if all_reprs().any(|r| r.repr.is_unboxed() || r.repr.is_untagged()) {
            return Err(PrimitiveError::LegacyFloatWithReprAttribute { span });
        }
        if all_reprs().any(|r| r.repr.has_non_value_sort()) {
            return Err(PrimitiveError::LegacyFloatWithNonValueSort { span });
        }
        if attrs.layout_poly {
            return Err(PrimitiveError::LegacyFloatWithLayoutPoly { span });
        }
    }
    if names.legacy_noalloc && attrs.noalloc {
        return Err(PrimitiveError::LegacyNoallocWithNoallocAttribute { span });
    }

    // "float" always implied "noalloc"
    let legacy_noalloc = names.legacy_noalloc || names.legacy_float;
    let deprecation = if names.legacy_float {
        Some(Deprecation::LegacyFloat { span })
    } else if legacy_noalloc {
        Some(Deprecation::LegacyNoalloc { span })
    } else {
        None
    };

    if names.native_name.is_empty() && !builtin {
        if all_reprs().any(|r| r.repr.is_unboxed() || r.repr.is_untagged()) {
            return Err(PrimitiveError::MissingNativeForReprAttribute { span });
        }
        if all_reprs().any(|r| r.repr.has_non_value_sort()) {
            return Err(PrimitiveError::MissingNativeForNonValueSort { span });
        }
    }

    let noalloc = legacy_noalloc || attrs.noalloc;
    if noalloc && attrs.only_generative_effects {
        return Err(PrimitiveError::InconsistentNoallocAttributes { span });
    }

    let (native_repr_args, native_repr_res) = if names.legacy_float {
        let float = ModedRepr::global(NativeRepr::UnboxedFloat(FloatWidth::F64));
        (vec![float.clone(); decl.native_repr_args.len()], float)
    } else {
        (decl.native_repr_args.clone(), decl.native_repr_res.clone())
    };

    debug!(
        name = %names.name,
        native = %names.native_name,
        arity = native_repr_args.len(),
        noalloc,
        "built primitive descriptor"
    );

    let description = Description::new(
        names.name,
        !noalloc,
        attrs.builtin,
        effects,
        coeffects,
        names.native_name,
        native_repr_args,
        native_repr_res,
        attrs.layout_poly,
    );
    Ok(ParsedDeclaration { description, deprecation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::primitive::Mode;
    use crate::types::{IntWidth, Sort};

    fn decl(name: &str, payload: &[&str], args: Vec<NativeRepr>, res: NativeRepr) -> PrimitiveDeclaration {
        PrimitiveDeclaration {
            name: name.to_string(),
            payload: payload.iter().map(|s| s.to_string()).collect(),
            attributes: DeclAttributes::default(),
            native_repr_args: args.into_iter().map(ModedRepr::global).collect(),
            native_repr_res: ModedRepr::global(res),
            span: Span::new(0, 10),
        }
    }

    #[test]
    fn test_desugar_name_lists() {
        let s = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            desugar_prim_names("f", &s(&["noalloc", "caml_f", "float"])),
            PrimNames { name: "f".into(), native_name: "caml_f".into(), legacy_noalloc: true, legacy_float: true }
        );
        assert_eq!(
            desugar_prim_names("f", &s(&["caml_f", "float"])),
            PrimNames { name: "f".into(), native_name: "caml_f".into(), legacy_noalloc: false, legacy_float: true }
        );
        assert_eq!(
            desugar_prim_names("f", &s(&["noalloc"])),
            PrimNames { name: "f".into(), native_name: String::new(), legacy_noalloc: true, legacy_float: false }
        );
        assert_eq!(
            desugar_prim_names("f", &s(&["noalloc", "caml_f"])),
            PrimNames { name: "f".into(), native_name: "caml_f".into(), legacy_noalloc: true, legacy_float: false }
        );
        assert_eq!(desugar_prim_names("f", &[]).native_name, "");
    }

    #[test]
    fn test_plain_external() {
        let d = decl("caml_hash", &["caml_hash_native"], vec![NativeRepr::VALUE; 2], NativeRepr::VALUE);
        let parsed = parse_declaration(&d).unwrap();
        assert_eq!(parsed.deprecation, None);
        let desc = parsed.description;
        assert_eq!(desc.arity, 2);
        assert!(desc.alloc);
        assert_eq!(desc.effects, Effects::ArbitraryEffects);
        assert_eq!(desc.native_name(), "caml_hash_native");
        assert_eq!(desc.byte_name(), "caml_hash");
        assert!(desc.native_name_is_external());
    }

    #[test]
    fn test_inconsistent_effects() {
        let mut d = decl("%foo", &[], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        d.attributes.no_effects = true;
        d.attributes.only_generative_effects = true;
        d.attributes.layout_poly = true;
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::InconsistentEffectAttributes { span: d.span })
        );
    }

    #[test]
    fn test_noalloc_with_generative_effects() {
        let mut d = decl("f", &["caml_f"], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        d.attributes.noalloc = true;
        d.attributes.only_generative_effects = true;
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::InconsistentNoallocAttributes { span: d.span })
        );
        let mut legacy = decl("f", &["noalloc", "caml_f"], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        legacy.attributes.only_generative_effects = true;
        assert_eq!(
            parse_declaration(&legacy),
            Err(PrimitiveError::InconsistentNoallocAttributes { span: legacy.span })
        );
    }

    #[test]
    fn test_layout_poly_requires_builtin() {
        let mut d = decl("caml_f", &["caml_f_native"], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        d.attributes.layout_poly = true;
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LayoutPolyOnNonBuiltin { span: d.span })
        );
        let mut ok = decl("%identity", &[], vec![NativeRepr::Poly], NativeRepr::Poly);
        ok.attributes.layout_poly = true;
        assert!(parse_declaration(&ok).unwrap().description.is_layout_poly);
    }

    #[test]
    fn test_layout_poly_on_non_builtin_for_every_name_list() {
        let shapes: [&[&str]; 6] = [
            &[],
            &["caml_f_nat"],
            &["noalloc"],
            &["noalloc", "caml_f_nat"],
            &["caml_f_nat", "float"],
            &["noalloc", "caml_f_nat", "float"],
        ];
        for payload in shapes {
            let mut d = decl("caml_f", payload, vec![NativeRepr::VALUE], NativeRepr::VALUE);
            d.attributes.layout_poly = true;
            assert_eq!(
                parse_declaration(&d),
                Err(PrimitiveError::LayoutPolyOnNonBuiltin { span: d.span }),
                "{:?}",
                payload
            );
            d.attributes.noalloc = true;
            assert_eq!(
                parse_declaration(&d),
                Err(PrimitiveError::LayoutPolyOnNonBuiltin { span: d.span }),
                "{:?} [@@noalloc]",
                payload
            );
        }
    }

    #[test]
    fn test_poly_repr_requires_builtin() {
        let d = decl("caml_f", &[], vec![NativeRepr::Poly], NativeRepr::VALUE);
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LayoutPolyOnNonBuiltin { span: d.span })
        );
        let d = decl("caml_f", &["caml_f_nat"], vec![NativeRepr::VALUE], NativeRepr::Poly);
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LayoutPolyOnNonBuiltin { span: d.span })
        );
    }

    #[test]
    fn test_legacy_float_forces_unboxed_float64() {
        let d = decl("sqrt", &["caml_sqrt", "float"], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        let parsed = parse_declaration(&d).unwrap();
        let f64_repr = ModedRepr::global(NativeRepr::UnboxedFloat(FloatWidth::F64));
        assert_eq!(parsed.description.native_repr_args, vec![f64_repr.clone()]);
        assert_eq!(parsed.description.native_repr_res, f64_repr);
        assert!(!parsed.description.alloc);
        assert_eq!(parsed.deprecation, Some(Deprecation::LegacyFloat { span: d.span }));
    }

    #[test]
    fn test_legacy_float_conflicts() {
        let d = decl("f", &["caml_f", "float"], vec![NativeRepr::UntaggedImmediate], NativeRepr::VALUE);
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LegacyFloatWithReprAttribute { span: d.span })
        );
        let d = decl("f", &["caml_f", "float"], vec![NativeRepr::SameAsHost(Sort::FLOAT64)], NativeRepr::VALUE);
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LegacyFloatWithNonValueSort { span: d.span })
        );
        let mut d = decl("%f", &["caml_f", "float"], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        d.attributes.layout_poly = true;
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LegacyFloatWithLayoutPoly { span: d.span })
        );
    }

    #[test]
    fn test_legacy_noalloc() {
        let d = decl("f", &["noalloc", "caml_f"], vec![NativeRepr::VALUE], NativeRepr::VALUE);
        let parsed = parse_declaration(&d).unwrap();
        assert!(!parsed.description.alloc);
        assert_eq!(parsed.deprecation, Some(Deprecation::LegacyNoalloc { span: d.span }));

        let mut d = d;
        d.attributes.noalloc = true;
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::LegacyNoallocWithNoallocAttribute { span: d.span })
        );
    }

    #[test]
    fn test_missing_native_version() {
        let d = decl("caml_f", &[], vec![NativeRepr::UnboxedInteger(IntWidth::Int64)], NativeRepr::VALUE);
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::MissingNativeForReprAttribute { span: d.span })
        );
        let d = decl("caml_f", &[], vec![NativeRepr::VALUE], NativeRepr::SameAsHost(Sort::BITS64));
        assert_eq!(
            parse_declaration(&d),
            Err(PrimitiveError::MissingNativeForNonValueSort { span: d.span })
        );
        // builtins have no native version to require
        let d = decl("%unbox_int64", &[], vec![NativeRepr::VALUE], NativeRepr::SameAsHost(Sort::BITS64));
        assert!(parse_declaration(&d).is_ok());
    }

    #[test]
    fn test_simple_on_values() {
        let desc = Description::simple_on_values("caml_alloc_dummy", 3, true);
        assert_eq!(desc.arity, 3);
        assert_eq!(desc.native_repr_args.len(), 3);
        assert!(desc.all_reprs().all(|r| r.repr.is_value() && r.mode == Mode::Global));
        assert_eq!(desc.native_name(), "caml_alloc_dummy");
    }

    #[test]
    fn test_builtin_native_name_is_not_external() {
        let desc = Description::simple_on_values("%field0", 1, false);
        assert!(desc.is_builtin());
        assert!(!desc.native_name_is_external());
    }
}
