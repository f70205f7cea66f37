//! Native representations, modes, effects and coeffects

use std::fmt;
use crate::types::{FloatWidth, IntWidth, Sort, VectorWidth};

/// Low-level representation of a value crossing a primitive boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeRepr {
    /// Placeholder of a layout-polymorphic builtin, fixed at each use site.
    /// Equal to itself and to nothing else.
    Poly,
    /// Passed exactly as the host value of the given sort
    SameAsHost(Sort),
    UnboxedFloat(FloatWidth),
    UnboxedVector(VectorWidth),
    UnboxedInteger(IntWidth),
    UntaggedImmediate,
}

impl NativeRepr {
    pub const VALUE: NativeRepr = NativeRepr::SameAsHost(Sort::VALUE);

    /// Host value of the default sort
    pub fn is_value(&self) -> bool {
        matches!(self, NativeRepr::SameAsHost(sort) if sort.is_value())
    }

    /// Set by an explicit `[@unboxed]`
    pub fn is_unboxed(&self) -> bool {
        matches!(
            self,
            NativeRepr::UnboxedFloat(_) | NativeRepr::UnboxedVector(_) | NativeRepr::UnboxedInteger(_)
        )
    }

    /// Set by an explicit `[@untagged]`
    pub fn is_untagged(&self) -> bool {
        matches!(self, NativeRepr::UntaggedImmediate)
    }

    /// Host value of a sort other than `value`
    pub fn has_non_value_sort(&self) -> bool {
        matches!(self, NativeRepr::SameAsHost(sort) if !sort.is_value())
    }
}

impl fmt::Display for NativeRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeRepr::Poly => write!(f, "poly"),
            NativeRepr::SameAsHost(sort) => write!(f, "{}", sort),
            NativeRepr::UnboxedFloat(width) => write!(f, "unboxed {}", width.name()),
            NativeRepr::UnboxedVector(width) => write!(f, "unboxed {}", width.name()),
            NativeRepr::UnboxedInteger(width) => write!(f, "unboxed {}", width.name()),
            NativeRepr::UntaggedImmediate => write!(f, "untagged int"),
        }
    }
}

/// Calling-convention mode of an argument or result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    Local,
    #[default]
    Global,
    /// May be local or global depending on the caller
    Poly,
}

/// A representation together with its mode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModedRepr {
    pub mode: Mode,
    pub repr: NativeRepr,
}

impl ModedRepr {
    pub fn new(mode: Mode, repr: NativeRepr) -> Self {
        Self { mode, repr }
    }

    pub fn global(repr: NativeRepr) -> Self {
        Self::new(Mode::Global, repr)
    }

    /// Global host value of the default sort
    pub fn value() -> Self {
        Self::global(NativeRepr::VALUE)
    }
}

/// Side effects a primitive may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Effects {
    NoEffects,
    /// Only allocation of fresh values
    OnlyGenerativeEffects,
    #[default]
    ArbitraryEffects,
}

/// Whether a primitive observes mutable state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Coeffects {
    NoCoeffects,
    #[default]
    HasCoeffects,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BaseSort;

    #[test]
    fn test_poly_only_equals_poly() {
        assert_eq!(NativeRepr::Poly, NativeRepr::Poly);
        let concrete = [
            NativeRepr::VALUE,
            NativeRepr::SameAsHost(Sort::FLOAT64),
            NativeRepr::UnboxedFloat(FloatWidth::F64),
            NativeRepr::UnboxedInteger(IntWidth::Int64),
            NativeRepr::UnboxedVector(VectorWidth::Vec128),
            NativeRepr::UntaggedImmediate,
        ];
        for repr in &concrete {
            assert_ne!(&NativeRepr::Poly, repr);
        }
    }

    #[test]
    fn test_structural_equality_includes_width() {
        assert_eq!(
            NativeRepr::UnboxedInteger(IntWidth::Int32),
            NativeRepr::UnboxedInteger(IntWidth::Int32)
        );
        assert_ne!(
            NativeRepr::UnboxedInteger(IntWidth::Int32),
            NativeRepr::UnboxedInteger(IntWidth::Int64)
        );
        assert_ne!(
            NativeRepr::SameAsHost(Sort::Base(BaseSort::Bits64)),
            NativeRepr::UnboxedInteger(IntWidth::Int64)
        );
    }

    #[test]
    fn test_classification() {
        assert!(NativeRepr::VALUE.is_value());
        assert!(NativeRepr::UnboxedFloat(FloatWidth::F32).is_unboxed());
        assert!(NativeRepr::UntaggedImmediate.is_untagged());
        assert!(NativeRepr::SameAsHost(Sort::BITS32).has_non_value_sort());
        assert!(!NativeRepr::Poly.has_non_value_sort());
    }

    #[test]
    fn test_effect_classes_are_distinct() {
        assert_ne!(Effects::NoEffects, Effects::OnlyGenerativeEffects);
        assert_eq!(Effects::default(), Effects::ArbitraryEffects);
        assert_eq!(Coeffects::default(), Coeffects::HasCoeffects);
    }
}
