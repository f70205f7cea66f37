//! Property tests using proptest.
//!
//! Invariants checked for arbitrary inputs:
//!
//! 1. A descriptor's arity is the number of its argument representations
//! 2. Printing a descriptor and reading the declaration back gives the same descriptor
//! 3. Mapping the identity over a term rebuilds the same term
//! 4. Freshening bound variables keeps the free variables

use std::collections::HashMap;

use proptest::prelude::*;

use crate::decl::parse_primitive_declarations;
use crate::ir::{
    duplicate, free_variables, map, rename, Ident, Idents, Lambda, LetKind, Primitive, StructuredConstant,
};
use crate::common::Span;
use crate::primitive::{
    parse_declaration, print_declaration, Coeffects, Description, Effects, Mode, ModedRepr, NativeRepr,
};
use crate::types::{BaseSort, FloatWidth, IntWidth, Layout, Sort, VectorWidth};

// ---------------------------------------------------------------------------
// Strategies for descriptors
// ---------------------------------------------------------------------------

const BASE_SORTS: &[BaseSort] = &[
    BaseSort::Void,
    BaseSort::Value,
    BaseSort::Float64,
    BaseSort::Float32,
    BaseSort::Word,
    BaseSort::Bits8,
    BaseSort::Bits16,
    BaseSort::Bits32,
    BaseSort::Bits64,
    BaseSort::Vec128,
    BaseSort::Vec256,
    BaseSort::Vec512,
];

const NAME_POOL: &[&str] = &["caml_sqrt", "caml_hash", "caml_blit", "caml_ldexp", "caml_compare"];

fn arb_base_sort() -> impl Strategy<Value = Sort> {
    prop::sample::select(BASE_SORTS).prop_map(Sort::Base)
}

fn arb_sort() -> impl Strategy<Value = Sort> {
    prop_oneof![
        arb_base_sort(),
        prop::collection::vec(arb_base_sort(), 2..=3).prop_map(Sort::Product),
    ]
}

/// Every representation a declaration can spell without `[@@layout_poly]`
fn arb_repr() -> impl Strategy<Value = NativeRepr> {
    prop_oneof![
        Just(NativeRepr::VALUE),
        arb_sort().prop_map(NativeRepr::SameAsHost),
        prop::sample::select(&[FloatWidth::F64, FloatWidth::F32][..]).prop_map(NativeRepr::UnboxedFloat),
        prop::sample::select(
            &[IntWidth::Int8, IntWidth::Int16, IntWidth::Int32, IntWidth::Int64, IntWidth::Nativeint][..]
        )
        .prop_map(NativeRepr::UnboxedInteger),
        prop::sample::select(&[VectorWidth::Vec128, VectorWidth::Vec256, VectorWidth::Vec512][..])
            .prop_map(NativeRepr::UnboxedVector),
        Just(NativeRepr::UntaggedImmediate),
    ]
}

fn arb_moded_repr() -> impl Strategy<Value = ModedRepr> {
    (prop::sample::select(&[Mode::Global, Mode::Local, Mode::Poly][..]), arb_repr())
        .prop_map(|(mode, repr)| ModedRepr::new(mode, repr))
}

fn arb_effects() -> impl Strategy<Value = Effects> {
    prop::sample::select(&[Effects::ArbitraryEffects, Effects::NoEffects, Effects::OnlyGenerativeEffects][..])
}

/// Non-builtin descriptors with a native implementation
fn arb_description() -> impl Strategy<Value = Description> {
    (
        prop::sample::select(NAME_POOL),
        any::<bool>(),
        any::<bool>(),
        arb_effects(),
        any::<bool>(),
        prop::collection::vec(arb_moded_repr(), 0..4),
        arb_moded_repr(),
    )
        .prop_filter("noalloc excludes generative effects", |(_, alloc, _, effects, _, _, _)| {
            *alloc || *effects != Effects::OnlyGenerativeEffects
        })
        .prop_map(|(name, alloc, c_builtin, effects, no_coeffects, args, res)| {
            let coeffects = if no_coeffects { Coeffects::NoCoeffects } else { Coeffects::HasCoeffects };
            Description::new(name, alloc, c_builtin, effects, coeffects, format!("{}_native", name), args, res, false)
        })
}

proptest! {
    #[test]
    fn arity_matches_argument_reprs(desc in arb_description()) {
        prop_assert_eq!(desc.arity, desc.native_repr_args.len());
    }

    /// The canonical declaration of a descriptor re-resolves to it.
    #[test]
    fn printed_declaration_reparses_to_same_descriptor(desc in arb_description()) {
        let source = print_declaration(&desc, "f").to_string();
        let decls = parse_primitive_declarations(&source)
            .map_err(|e| TestCaseError::fail(format!("{}: {}", source, e)))?;
        prop_assert_eq!(decls.len(), 1);

        let parsed = parse_declaration(&decls[0].1)
            .map_err(|e| TestCaseError::fail(format!("{}: {}", source, e)))?;
        prop_assert_eq!(parsed.deprecation, None);
        prop_assert_eq!(parsed.description, desc);
    }
}

// ---------------------------------------------------------------------------
// Strategies for terms
// ---------------------------------------------------------------------------

const VAR_COUNT: usize = 4;

/// Term skeleton over a fixed pool of variables
#[derive(Debug, Clone)]
enum Shape {
    Var(usize),
    Int(i64),
    Add(Box<Shape>, Box<Shape>),
    Let(usize, Box<Shape>, Box<Shape>),
    If(Box<Shape>, Box<Shape>, Box<Shape>),
    Seq(Box<Shape>, Box<Shape>),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (0..VAR_COUNT).prop_map(Shape::Var),
        (-8i64..8).prop_map(Shape::Int),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Shape::Add(Box::new(a), Box::new(b))),
            (0..VAR_COUNT, inner.clone(), inner.clone())
                .prop_map(|(v, d, b)| Shape::Let(v, Box::new(d), Box::new(b))),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| Shape::If(Box::new(c), Box::new(t), Box::new(e))),
            (inner.clone(), inner).prop_map(|(a, b)| Shape::Seq(Box::new(a), Box::new(b))),
        ]
    })
}

fn build(shape: &Shape, vars: &[Ident]) -> Lambda {
    match shape {
        Shape::Var(i) => Lambda::Var(vars[*i]),
        Shape::Int(n) => Lambda::Const(StructuredConstant::int(*n)),
        Shape::Add(a, b) => Lambda::prim(Primitive::AddInt, vec![build(a, vars), build(b, vars)], Span::unknown()),
        Shape::Let(v, def, body) => Lambda::Let {
            kind: LetKind::Strict,
            layout: Layout::int(),
            id: vars[*v],
            def: Box::new(build(def, vars)),
            body: Box::new(build(body, vars)),
        },
        Shape::If(c, t, e) => Lambda::if_then_else(build(c, vars), build(t, vars), build(e, vars), Layout::int()),
        Shape::Seq(a, b) => Lambda::seq(build(a, vars), build(b, vars)),
    }
}

fn term(shape: &Shape) -> (Idents, Lambda) {
    let mut idents = Idents::new();
    let vars: Vec<Ident> = (0..VAR_COUNT).map(|i| idents.create_local(&format!("v{}", i))).collect();
    let lam = build(shape, &vars);
    (idents, lam)
}

proptest! {
    #[test]
    fn identity_map_rebuilds_term(shape in arb_shape()) {
        let (_, lam) = term(&shape);
        let mapped = map(lam.clone(), &mut |l| l);
        prop_assert_eq!(mapped, lam);
    }

    #[test]
    fn empty_rename_is_identity(shape in arb_shape()) {
        let (_, lam) = term(&shape);
        prop_assert_eq!(rename(&HashMap::new(), &lam), lam);
    }

    #[test]
    fn duplicate_keeps_free_variables(shape in arb_shape()) {
        let (mut idents, lam) = term(&shape);
        let copy = duplicate(&mut idents, &lam);
        prop_assert_eq!(free_variables(&copy), free_variables(&lam));
    }
}
