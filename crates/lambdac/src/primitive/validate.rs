//! Representation checks for builtin primitives
//!
//! Each builtin with a fixed shape has an entry in a closed table. The
//! table is generated once from the same combinations the lowering of
//! builtins recognises (containers, access widths, index kinds).

use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, trace};
use crate::common::Span;
use super::descriptor::{Description, PrimitiveError};
use super::repr::NativeRepr;
use crate::types::{BaseSort, Sort};

/// Knobs for representation validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationConfig {
    /// Accept unboxed product sorts at primitive boundaries (experimental)
    pub allow_product_sorts: bool,
}

/// Outcome of checking a descriptor against its rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReprCheck {
    Success,
    /// The rule expects a different number of arguments
    WrongArity,
    WrongRepr,
}

#[derive(Debug, Clone)]
enum Slot {
    Any,
    Is(NativeRepr),
}

#[derive(Debug, Clone)]
enum Rule {
    /// One slot per argument, then one for the result
    Slots(Vec<Slot>),
    /// `arity` arguments and the result all share the result's representation
    SameArgResRepr { arity: usize },
    /// Leading arguments are fixed, later arguments and the result are free
    ArgPrefix(Vec<NativeRepr>),
}

fn exactly(reprs: Vec<NativeRepr>) -> Rule {
    Rule::Slots(reprs.into_iter().map(Slot::Is).collect())
}

fn host(sort: BaseSort) -> NativeRepr {
    NativeRepr::SameAsHost(Sort::Base(sort))
}

const INDEX_KINDS: [(&str, BaseSort); 4] = [
    ("", BaseSort::Value),
    ("_indexed_by_int64#", BaseSort::Bits64),
    ("_indexed_by_int32#", BaseSort::Bits32),
    ("_indexed_by_nativeint#", BaseSort::Word),
];

/// Access widths of indexed loads/stores: plain widths plus aligned and
/// unaligned 128-bit SIMD accesses
const ACCESS_WIDTHS: [&str; 5] = ["16", "32", "64", "a128", "u128"];

static BUILTIN_RULES: LazyLock<HashMap<String, Rule>> = LazyLock::new(build_rules);

fn build_rules() -> HashMap<String, Rule> {
    let value = NativeRepr::VALUE;
    let mut rules = HashMap::new();

    for name in ["%identity", "%opaque", "%obj_magic"] {
        rules.insert(name.to_string(), Rule::SameArgResRepr { arity: 1 });
    }
    rules.insert("%ignore".to_string(), Rule::Slots(vec![Slot::Any, Slot::Is(value.clone())]));

    let boxable = [
        ("float", BaseSort::Float64),
        ("float32", BaseSort::Float32),
        ("nativeint", BaseSort::Word),
        ("int32", BaseSort::Bits32),
        ("int64", BaseSort::Bits64),
        ("vec128", BaseSort::Vec128),
    ];
    for (suffix, sort) in boxable {
        rules.insert(format!("%box_{suffix}"), exactly(vec![host(sort), value.clone()]));
        rules.insert(format!("%unbox_{suffix}"), exactly(vec![value.clone(), host(sort)]));
    }

    rules.insert(
        "%reinterpret_tagged_int63_as_unboxed_int64".to_string(),
        exactly(vec![value.clone(), host(BaseSort::Bits64)]),
    );
    rules.insert(
        "%reinterpret_unboxed_int64_as_tagged_int63".to_string(),
        exactly(vec![host(BaseSort::Bits64), value.clone()]),
    );

    for safety in ["safe", "unsafe"] {
        for op in ["get", "set"] {
            for (suffix, index) in INDEX_KINDS {
                rules.insert(
                    format!("%array_{safety}_{op}{suffix}"),
                    Rule::ArgPrefix(vec![value.clone(), host(index)]),
                );
            }
        }
    }

    for container in ["string", "bytes", "bigstring"] {
        for width in ACCESS_WIDTHS {
            for unsafe_suffix in ["", "u"] {
                for (suffix, index) in INDEX_KINDS {
                    rules.insert(
                        format!("%caml_{container}_get{width}{unsafe_suffix}{suffix}"),
                        exactly(vec![value.clone(), host(index), value.clone()]),
                    );
                    // strings are immutable
                    if container != "string" {
                        rules.insert(
                            format!("%caml_{container}_set{width}{unsafe_suffix}{suffix}"),
                            exactly(vec![value.clone(), host(index), value.clone(), value.clone()]),
                        );
                    }
                }
            }
        }
    }

    rules
}

fn check_slots(slots: &[Slot], reprs: &[&NativeRepr]) -> ReprCheck {
    if slots.len() != reprs.len() {
        return ReprCheck::WrongArity;
    }
    let matches = slots.iter().zip(reprs).all(|(slot, repr)| match slot {
        Slot::Any => true,
        Slot::Is(required) => required == *repr,
    });
    if matches { ReprCheck::Success } else { ReprCheck::WrongRepr }
}

fn apply_rule(rule: &Rule, desc: &Description) -> ReprCheck {
    let reprs: Vec<&NativeRepr> = desc.all_reprs().map(|r| &r.repr).collect();
    match rule {
        Rule::Slots(slots) => check_slots(slots, &reprs),
        Rule::SameArgResRepr { arity } => {
            if desc.native_repr_args.len() != *arity {
                return ReprCheck::WrongArity;
            }
            let res = &desc.native_repr_res.repr;
            if reprs.iter().all(|repr| *repr == res) {
                ReprCheck::Success
            } else {
                ReprCheck::WrongRepr
            }
        }
        Rule::ArgPrefix(prefix) => {
            if desc.native_repr_args.len() < prefix.len() {
                return ReprCheck::WrongArity;
            }
            let matches = prefix
                .iter()
                .zip(&desc.native_repr_args)
                .all(|(required, arg)| *required == arg.repr);
            if matches { ReprCheck::Success } else { ReprCheck::WrongRepr }
        }
    }
}

/// Rule for primitives without a table entry: every slot must be a value,
/// an unboxed/untagged kind or a host value of an unboxed base sort.
fn generic_check(desc: &Description, config: &ValidationConfig) -> ReprCheck {
    let valid = desc.all_reprs().all(|r| match &r.repr {
        NativeRepr::Poly => desc.is_layout_poly,
        NativeRepr::SameAsHost(Sort::Product(_)) => config.allow_product_sorts,
        NativeRepr::SameAsHost(Sort::Base(BaseSort::Void)) => false,
        NativeRepr::SameAsHost(Sort::Base(_))
        | NativeRepr::UnboxedFloat(_)
        | NativeRepr::UnboxedVector(_)
        | NativeRepr::UnboxedInteger(_)
        | NativeRepr::UntaggedImmediate => true,
    });
    if valid { ReprCheck::Success } else { ReprCheck::WrongRepr }
}

/// Check a descriptor against its table entry, or the generic rule
pub fn check_builtin_reprs(desc: &Description, config: &ValidationConfig) -> ReprCheck {
    match BUILTIN_RULES.get(desc.name.as_str()) {
        Some(rule) => {
            trace!(name = %desc.name, ?rule, "checking builtin representation rule");
            apply_rule(rule, desc)
        }
        None => generic_check(desc, config),
    }
}

/// Validate the representations of a descriptor.
///
/// Arity mismatches are reported by the arity check at the declaration
/// site, so `ReprCheck::WrongArity` is accepted here.
pub fn prim_has_valid_reprs(
    desc: &Description,
    span: Span,
    config: &ValidationConfig,
) -> Result<(), PrimitiveError> {
    match check_builtin_reprs(desc, config) {
        ReprCheck::Success => Ok(()),
        ReprCheck::WrongArity => {
            debug!(name = %desc.name, arity = desc.arity, "representation rule arity mismatch ignored");
            Ok(())
        }
        ReprCheck::WrongRepr => Err(PrimitiveError::InvalidNativeReprForPrimitive {
            name: desc.name.clone(),
            span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::primitive::{Coeffects, Effects, ModedRepr};
    use crate::types::{FloatWidth, IntWidth};

    fn desc(name: &str, args: Vec<NativeRepr>, res: NativeRepr) -> Description {
        Description::new(
            name,
            true,
            false,
            Effects::ArbitraryEffects,
            Coeffects::HasCoeffects,
            "",
            args.into_iter().map(ModedRepr::global).collect(),
            ModedRepr::global(res),
            false,
        )
    }

    fn validate(d: &Description) -> Result<(), PrimitiveError> {
        prim_has_valid_reprs(d, Span::new(3, 7), &ValidationConfig::default())
    }

    #[test]
    fn test_box_float_exact_match() {
        let ok = desc("%box_float", vec![NativeRepr::SameAsHost(Sort::FLOAT64)], NativeRepr::VALUE);
        assert_eq!(validate(&ok), Ok(()));

        let bad = desc("%box_float", vec![NativeRepr::VALUE], NativeRepr::VALUE);
        assert_eq!(
            validate(&bad),
            Err(PrimitiveError::InvalidNativeReprForPrimitive {
                name: "%box_float".to_string(),
                span: Span::new(3, 7),
            })
        );
    }

    #[test]
    fn test_array_get_requires_value_array_and_index() {
        let ok = desc(
            "%array_safe_get",
            vec![NativeRepr::VALUE, NativeRepr::VALUE],
            NativeRepr::SameAsHost(Sort::FLOAT64),
        );
        assert_eq!(validate(&ok), Ok(()));

        let bad = desc(
            "%array_safe_get",
            vec![NativeRepr::VALUE, NativeRepr::UntaggedImmediate],
            NativeRepr::VALUE,
        );
        assert!(matches!(
            validate(&bad),
            Err(PrimitiveError::InvalidNativeReprForPrimitive { .. })
        ));

        let indexed = desc(
            "%array_unsafe_set_indexed_by_int32#",
            vec![NativeRepr::VALUE, NativeRepr::SameAsHost(Sort::BITS32), NativeRepr::SameAsHost(Sort::FLOAT64)],
            NativeRepr::VALUE,
        );
        assert_eq!(validate(&indexed), Ok(()));
    }

    #[test]
    fn test_identity_shares_one_repr() {
        let ok = desc("%identity", vec![NativeRepr::SameAsHost(Sort::BITS64)], NativeRepr::SameAsHost(Sort::BITS64));
        assert_eq!(check_builtin_reprs(&ok, &ValidationConfig::default()), ReprCheck::Success);
        let bad = desc("%opaque", vec![NativeRepr::VALUE], NativeRepr::SameAsHost(Sort::BITS64));
        assert_eq!(check_builtin_reprs(&bad, &ValidationConfig::default()), ReprCheck::WrongRepr);
    }

    #[test]
    fn test_wrong_arity_is_not_reported() {
        let d = desc("%box_int64", vec![NativeRepr::SameAsHost(Sort::BITS64), NativeRepr::VALUE], NativeRepr::VALUE);
        assert_eq!(check_builtin_reprs(&d, &ValidationConfig::default()), ReprCheck::WrongArity);
        assert_eq!(validate(&d), Ok(()));
    }

    #[test]
    fn test_indexed_string_loads() {
        let get = desc(
            "%caml_bigstring_get64u_indexed_by_nativeint#",
            vec![NativeRepr::VALUE, NativeRepr::SameAsHost(Sort::WORD)],
            NativeRepr::VALUE,
        );
        assert_eq!(validate(&get), Ok(()));

        let set = desc(
            "%caml_bytes_seta128",
            vec![NativeRepr::VALUE, NativeRepr::VALUE, NativeRepr::VALUE],
            NativeRepr::VALUE,
        );
        assert_eq!(validate(&set), Ok(()));

        // no stores into strings, so the generic rule applies and passes
        assert!(!BUILTIN_RULES.contains_key("%caml_string_set16"));
    }

    #[test]
    fn test_reinterpret_int63() {
        let d = desc(
            "%reinterpret_tagged_int63_as_unboxed_int64",
            vec![NativeRepr::VALUE],
            NativeRepr::SameAsHost(Sort::BITS64),
        );
        assert_eq!(validate(&d), Ok(()));
        let d = desc(
            "%reinterpret_unboxed_int64_as_tagged_int63",
            vec![NativeRepr::VALUE],
            NativeRepr::SameAsHost(Sort::BITS64),
        );
        assert!(validate(&d).is_err());
    }

    #[test]
    fn test_generic_rule() {
        let unboxed = desc(
            "%some_builtin",
            vec![NativeRepr::UnboxedFloat(FloatWidth::F64), NativeRepr::UntaggedImmediate],
            NativeRepr::UnboxedInteger(IntWidth::Int32),
        );
        assert_eq!(validate(&unboxed), Ok(()));

        let void = desc("%some_builtin", vec![NativeRepr::SameAsHost(Sort::Base(BaseSort::Void))], NativeRepr::VALUE);
        assert!(validate(&void).is_err());

        let poly = desc("%some_builtin", vec![NativeRepr::Poly], NativeRepr::VALUE);
        assert!(validate(&poly).is_err());
    }

    #[test]
    fn test_products_need_flag() {
        let product = desc(
            "caml_pair",
            vec![NativeRepr::SameAsHost(Sort::Product(vec![Sort::VALUE, Sort::FLOAT64]))],
            NativeRepr::VALUE,
        );
        assert!(validate(&product).is_err());
        let config = ValidationConfig { allow_product_sorts: true };
        assert_eq!(prim_has_valid_reprs(&product, Span::unknown(), &config), Ok(()));
    }
}
