//! Layouts of constants, primitives and terms

use std::collections::HashMap;
use super::ident::Ident;
use super::lambda::{Constant, Lambda, StructuredConstant};
use super::primitive::{
    ArrayRefKind, BigarrayKind, ImmediateOrPointer, MemoryAccessSize, Primitive,
};
use crate::primitive::NativeRepr;
use crate::types::{ArrayKind, FloatWidth, IntWidth, Layout, VectorWidth};

pub fn structured_constant_layout(cst: &StructuredConstant) -> Layout {
    match cst {
        StructuredConstant::Base(base) => match base {
            Constant::Int(_) | Constant::Char(_) => Layout::int(),
            Constant::String(_) => Layout::string(),
            Constant::Float(_) => Layout::boxed_float(FloatWidth::F64),
            Constant::Float32(_) => Layout::boxed_float(FloatWidth::F32),
            Constant::UnboxedFloat(_) => Layout::unboxed_float(FloatWidth::F64),
            Constant::UnboxedFloat32(_) => Layout::unboxed_float(FloatWidth::F32),
            Constant::Int32(_) => Layout::boxed_int(IntWidth::Int32),
            Constant::Int64(_) => Layout::boxed_int(IntWidth::Int64),
            Constant::Nativeint(_) => Layout::boxed_int(IntWidth::Nativeint),
            Constant::UnboxedInt32(_) => Layout::unboxed_int(IntWidth::Int32),
            Constant::UnboxedInt64(_) => Layout::unboxed_int(IntWidth::Int64),
            Constant::UnboxedNativeint(_) => Layout::unboxed_int(IntWidth::Nativeint),
        },
        StructuredConstant::FloatArray(_) => Layout::array(ArrayKind::Float),
        StructuredConstant::Block { .. }
        | StructuredConstant::FloatBlock(_)
        | StructuredConstant::ImmString(_) => Layout::any_value(),
    }
}

/// Layout of a value crossing an external call with representation `repr`.
///
/// Unboxed and untagged representations are converted at the call
/// boundary, so the term sees the boxed or tagged value.
pub fn layout_of_native_repr(repr: &NativeRepr) -> Layout {
    match repr {
        NativeRepr::Poly => Layout::top(),
        NativeRepr::SameAsHost(sort) => Layout::of_sort(sort),
        NativeRepr::UnboxedFloat(width) => Layout::boxed_float(*width),
        NativeRepr::UnboxedInteger(width) => Layout::boxed_int(*width),
        NativeRepr::UnboxedVector(width) => Layout::boxed_vector(*width),
        NativeRepr::UntaggedImmediate => Layout::int(),
    }
}

fn bigarray_layout(kind: BigarrayKind) -> Layout {
    match kind {
        BigarrayKind::Unknown | BigarrayKind::Complex32 | BigarrayKind::Complex64 => Layout::any_value(),
        BigarrayKind::Float32 | BigarrayKind::Float64 => Layout::boxed_float(FloatWidth::F64),
        BigarrayKind::Sint8
        | BigarrayKind::Uint8
        | BigarrayKind::Sint16
        | BigarrayKind::Uint16
        | BigarrayKind::CamlInt => Layout::int(),
        BigarrayKind::Int32 => Layout::boxed_int(IntWidth::Int32),
        BigarrayKind::Int64 => Layout::boxed_int(IntWidth::Int64),
        BigarrayKind::NativeInt => Layout::boxed_int(IntWidth::Nativeint),
    }
}

fn array_ref_layout(kind: ArrayRefKind) -> Layout {
    match kind {
        ArrayRefKind::Gen(_) | ArrayRefKind::Addr => Layout::any_value(),
        ArrayRefKind::Int => Layout::int(),
        ArrayRefKind::Float(_) => Layout::boxed_float(FloatWidth::F64),
        ArrayRefKind::UnboxedFloat(width) => Layout::unboxed_float(width),
        ArrayRefKind::UnboxedInt(width) => Layout::unboxed_int(width),
        ArrayRefKind::UnboxedVector(width) => Layout::unboxed_vector(width),
    }
}

fn load_layout(size: MemoryAccessSize, unboxed: bool) -> Layout {
    match (size, unboxed) {
        (MemoryAccessSize::Sixteen, _) => Layout::int(),
        (MemoryAccessSize::ThirtyTwo, false) => Layout::boxed_int(IntWidth::Int32),
        (MemoryAccessSize::ThirtyTwo, true) => Layout::unboxed_int(IntWidth::Int32),
        (MemoryAccessSize::SixtyFour, false) => Layout::boxed_int(IntWidth::Int64),
        (MemoryAccessSize::SixtyFour, true) => Layout::unboxed_int(IntWidth::Int64),
        (MemoryAccessSize::OneTwentyEight { .. }, false) => Layout::boxed_vector(VectorWidth::Vec128),
        (MemoryAccessSize::OneTwentyEight { .. }, true) => Layout::unboxed_vector(VectorWidth::Vec128),
    }
}

/// Layout of the value a primitive returns
pub fn primitive_result_layout(prim: &Primitive) -> Layout {
    match prim {
        Primitive::Opaque(layout) | Primitive::ObjMagic(layout) => layout.clone(),
        Primitive::BytesToString | Primitive::BytesOfString => Layout::string(),
        Primitive::Ignore
        | Primitive::SetGlobal(_)
        | Primitive::SetField { .. }
        | Primitive::SetFieldComputed { .. }
        | Primitive::SetFloatField { .. }
        | Primitive::OffsetRef(_)
        | Primitive::BytesSet(_)
        | Primitive::ArraySet { .. }
        | Primitive::BigarraySet { .. }
        | Primitive::Store { .. }
        | Primitive::CpuRelax
        | Primitive::Poll => Layout::unit(),
        Primitive::GetGlobal(_) | Primitive::GetPredef(_) => Layout::module_field(),
        Primitive::MakeBlock { .. }
        | Primitive::MakeFloatBlock { .. }
        | Primitive::MakeMixedBlock { .. }
        | Primitive::DupRecord => Layout::block(),
        Primitive::MakeArray { kind, .. } | Primitive::DupArray(kind, _) => Layout::array(*kind),
        Primitive::Field { .. } | Primitive::FieldComputed => Layout::field(),
        Primitive::FloatField { .. } => Layout::boxed_float(FloatWidth::F64),
        Primitive::Ccall(desc) => layout_of_native_repr(&desc.native_repr_res.repr),
        Primitive::Raise(_) => Layout::bottom(),
        Primitive::Sequand
        | Primitive::Sequor
        | Primitive::Not
        | Primitive::NegInt
        | Primitive::AddInt
        | Primitive::SubInt
        | Primitive::MulInt
        | Primitive::DivInt(_)
        | Primitive::ModInt(_)
        | Primitive::AndInt
        | Primitive::OrInt
        | Primitive::XorInt
        | Primitive::LslInt
        | Primitive::LsrInt
        | Primitive::AsrInt
        | Primitive::IntComp(_)
        | Primitive::OffsetInt(_)
        | Primitive::IntOfFloat(_)
        | Primitive::FloatComp(..)
        | Primitive::StringLength
        | Primitive::StringRef(_)
        | Primitive::BytesLength
        | Primitive::BytesRef(_)
        | Primitive::ArrayLength(_)
        | Primitive::IsInt
        | Primitive::IsOut
        | Primitive::IntOfBint(_)
        | Primitive::BintComp(..)
        | Primitive::BigarrayDim(_)
        | Primitive::CtConst(_)
        | Primitive::Bswap16
        | Primitive::ProbeIsEnabled(_)
        | Primitive::AtomicCompareAndSet
        | Primitive::AtomicFetchAdd
        | Primitive::ReinterpretUnboxedInt64AsTaggedInt63 => Layout::int(),
        Primitive::FloatOfInt(width, _)
        | Primitive::NegFloat(width, _)
        | Primitive::AbsFloat(width, _)
        | Primitive::AddFloat(width, _)
        | Primitive::SubFloat(width, _)
        | Primitive::MulFloat(width, _)
        | Primitive::DivFloat(width, _)
        | Primitive::BoxFloat(width, _) => Layout::boxed_float(*width),
        Primitive::FloatOfFloat32(_) => Layout::boxed_float(FloatWidth::F64),
        Primitive::Float32OfFloat(_) => Layout::boxed_float(FloatWidth::F32),
        Primitive::UnboxFloat(width) => Layout::unboxed_float(*width),
        Primitive::ArrayRef { kind, .. } => array_ref_layout(*kind),
        Primitive::BintOfInt(width, _)
        | Primitive::CvtBint { to: width, .. }
        | Primitive::NegBint(width, _)
        | Primitive::AddBint(width, _)
        | Primitive::SubBint(width, _)
        | Primitive::MulBint(width, _)
        | Primitive::DivBint { width, .. }
        | Primitive::ModBint { width, .. }
        | Primitive::AndBint(width, _)
        | Primitive::OrBint(width, _)
        | Primitive::XorBint(width, _)
        | Primitive::LslBint(width, _)
        | Primitive::LsrBint(width, _)
        | Primitive::AsrBint(width, _)
        | Primitive::Bbswap(width, _)
        | Primitive::BoxInt(width, _) => Layout::boxed_int(*width),
        Primitive::UnboxInt(width) => Layout::unboxed_int(*width),
        Primitive::GetHeader(_) => Layout::boxed_int(IntWidth::Nativeint),
        Primitive::BigarrayRef { kind, .. } => bigarray_layout(*kind),
        Primitive::Load { size, unboxed, .. } => load_layout(*size, *unboxed),
        Primitive::AtomicLoad(ImmediateOrPointer::Immediate) => Layout::int(),
        Primitive::AtomicLoad(ImmediateOrPointer::Pointer)
        | Primitive::AtomicExchange
        | Primitive::IntAsPointer(_)
        | Primitive::ObjDup
        | Primitive::DlsGet => Layout::any_value(),
        Primitive::ReinterpretTaggedInt63AsUnboxedInt64 => Layout::unboxed_int(IntWidth::Int64),
        Primitive::UnboxVector(width) => Layout::unboxed_vector(*width),
        Primitive::BoxVector(width, _) => Layout::boxed_vector(*width),
    }
}

/// Layout of `lam`, with `env` giving the layouts of its free variables.
///
/// Variables missing from `env` are taken to be generic values.
pub fn compute_layout(env: &HashMap<Ident, Layout>, lam: &Lambda) -> Layout {
    let mut bound: Vec<(Ident, Layout)> = Vec::new();
    let mut lam = lam;
    loop {
        match lam {
            Lambda::Var(id) | Lambda::MutVar(id) => {
                return bound
                    .iter()
                    .rev()
                    .find(|(v, _)| v == id)
                    .map(|(_, layout)| layout.clone())
                    .or_else(|| env.get(id).cloned())
                    .unwrap_or_else(Layout::any_value);
            }
            Lambda::Const(cst) => return structured_constant_layout(cst),
            Lambda::Function(_) => return Layout::function(),
            Lambda::Apply(apply) => return apply.result_layout.clone(),
            Lambda::Send { layout, .. } => return layout.clone(),
            Lambda::Let { layout, id, body, .. } | Lambda::MutLet { layout, id, body, .. } => {
                bound.push((*id, layout.clone()));
                lam = body;
            }
            Lambda::LetRec { bindings, body } => {
                bound.extend(bindings.iter().map(|b| (b.id, Layout::letrec())));
                lam = body;
            }
            Lambda::Prim { prim, .. } => return primitive_result_layout(prim),
            Lambda::Switch { layout, .. }
            | Lambda::StringSwitch { layout, .. }
            | Lambda::StaticCatch { layout, .. }
            | Lambda::TryWith { layout, .. }
            | Lambda::IfThenElse { layout, .. }
            | Lambda::Region { layout, .. } => return layout.clone(),
            Lambda::StaticRaise { .. } => return Layout::bottom(),
            Lambda::Sequence(_, body)
            | Lambda::Event { body, .. }
            | Lambda::IfUsed { body, .. }
            | Lambda::Exclave(body) => lam = body,
            Lambda::While { .. } | Lambda::For { .. } | Lambda::Assign { .. } => return Layout::unit(),
        }
    }
}
