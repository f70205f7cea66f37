//! Allocation and locality analysis
//!
//! Both analyses over-approximate: anything that might allocate along some
//! code path is reported as allocating.

use tracing::trace;
use super::lambda::{Function, Lambda, RegionClose};
use super::primitive::{AllocMode, ArrayRefKind, MemoryAccessSize, Primitive};
use super::traverse::{shallow_iter_positions, Position};
use crate::primitive::Mode;

/// Where an allocating primitive may place its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationSite {
    Heap,
    /// The innermost open region
    Region,
    /// Either, decided by the mode the primitive is used at
    HeapOrRegion,
}

impl From<AllocMode> for AllocationSite {
    fn from(mode: AllocMode) -> Self {
        match mode {
            AllocMode::Heap => AllocationSite::Heap,
            AllocMode::Local => AllocationSite::Region,
        }
    }
}

impl AllocationSite {
    pub fn may_use_region(self) -> bool {
        !matches!(self, AllocationSite::Heap)
    }
}

/// Whether `prim` may allocate, and where; `None` when it never does
pub fn primitive_may_allocate(prim: &Primitive) -> Option<AllocationSite> {
    let site = match prim {
        Primitive::BytesToString
        | Primitive::BytesOfString
        | Primitive::Ignore
        | Primitive::GetGlobal(_)
        | Primitive::SetGlobal(_)
        | Primitive::GetPredef(_)
        | Primitive::Field { .. }
        | Primitive::FieldComputed
        | Primitive::SetField { .. }
        | Primitive::SetFieldComputed { .. }
        | Primitive::SetFloatField { .. }
        | Primitive::Raise(_)
        | Primitive::Sequand
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
        | Primitive::OffsetRef(_)
        | Primitive::IntOfFloat(_)
        | Primitive::FloatComp(..)
        | Primitive::UnboxFloat(_)
        | Primitive::StringLength
        | Primitive::StringRef(_)
        | Primitive::BytesLength
        | Primitive::BytesRef(_)
        | Primitive::BytesSet(_)
        | Primitive::ArrayLength(_)
        | Primitive::ArraySet { .. }
        | Primitive::IsInt
        | Primitive::IsOut
        | Primitive::IntOfBint(_)
        | Primitive::BintComp(..)
        | Primitive::UnboxInt(_)
        | Primitive::BigarraySet { .. }
        | Primitive::BigarrayDim(_)
        | Primitive::Store { .. }
        | Primitive::CtConst(_)
        | Primitive::Bswap16
        | Primitive::Opaque(_)
        | Primitive::ObjMagic(_)
        | Primitive::ProbeIsEnabled(_)
        | Primitive::AtomicLoad(_)
        | Primitive::AtomicExchange
        | Primitive::AtomicCompareAndSet
        | Primitive::AtomicFetchAdd
        | Primitive::CpuRelax
        | Primitive::DlsGet
        | Primitive::ReinterpretTaggedInt63AsUnboxedInt64
        | Primitive::ReinterpretUnboxedInt64AsTaggedInt63
        | Primitive::UnboxVector(_) => return None,

        Primitive::MakeBlock { mode, .. }
        | Primitive::MakeFloatBlock { mode, .. }
        | Primitive::MakeMixedBlock { mode, .. }
        | Primitive::FloatField { mode, .. }
        | Primitive::MakeArray { mode, .. }
        | Primitive::FloatOfInt(_, mode)
        | Primitive::FloatOfFloat32(mode)
        | Primitive::Float32OfFloat(mode)
        | Primitive::NegFloat(_, mode)
        | Primitive::AbsFloat(_, mode)
        | Primitive::AddFloat(_, mode)
        | Primitive::SubFloat(_, mode)
        | Primitive::MulFloat(_, mode)
        | Primitive::DivFloat(_, mode)
        | Primitive::BoxFloat(_, mode)
        | Primitive::BintOfInt(_, mode)
        | Primitive::CvtBint { mode, .. }
        | Primitive::NegBint(_, mode)
        | Primitive::AddBint(_, mode)
        | Primitive::SubBint(_, mode)
        | Primitive::MulBint(_, mode)
        | Primitive::DivBint { mode, .. }
        | Primitive::ModBint { mode, .. }
        | Primitive::AndBint(_, mode)
        | Primitive::OrBint(_, mode)
        | Primitive::XorBint(_, mode)
        | Primitive::LslBint(_, mode)
        | Primitive::LsrBint(_, mode)
        | Primitive::AsrBint(_, mode)
        | Primitive::BoxInt(_, mode)
        | Primitive::Bbswap(_, mode)
        | Primitive::IntAsPointer(mode)
        | Primitive::GetHeader(mode)
        | Primitive::BoxVector(_, mode) => AllocationSite::from(*mode),

        Primitive::DupRecord | Primitive::DupArray(..) | Primitive::ObjDup | Primitive::Poll => {
            AllocationSite::Heap
        }
        Primitive::BigarrayRef { .. } => AllocationSite::Heap,

        Primitive::ArrayRef { kind, .. } => match kind {
            ArrayRefKind::Gen(mode) | ArrayRefKind::Float(mode) => AllocationSite::from(*mode),
            ArrayRefKind::Addr
            | ArrayRefKind::Int
            | ArrayRefKind::UnboxedFloat(_)
            | ArrayRefKind::UnboxedInt(_)
            | ArrayRefKind::UnboxedVector(_) => return None,
        },

        Primitive::Load { size, unboxed, mode, .. } => match (size, unboxed) {
            (MemoryAccessSize::Sixteen, _) | (_, true) => return None,
            _ => AllocationSite::from(*mode),
        },

        Primitive::Ccall(desc) => {
            if !desc.alloc {
                return None;
            }
            match desc.native_repr_res.mode {
                Mode::Global => AllocationSite::Heap,
                Mode::Local => AllocationSite::Region,
                Mode::Poly => AllocationSite::HeapOrRegion,
            }
        }
    };
    Some(site)
}

fn allocates_locally(prim: &Primitive) -> bool {
    primitive_may_allocate(prim).is_some_and(AllocationSite::may_use_region)
}

/// Whether evaluating `lam` may allocate in the region open around it
pub fn may_allocate_in_region(lam: &Lambda) -> bool {
    let result = allocates(lam);
    trace!(result, "may_allocate_in_region");
    result
}

fn allocates(lam: &Lambda) -> bool {
    match lam {
        Lambda::Var(_) | Lambda::MutVar(_) | Lambda::Const(_) => false,
        Lambda::Function(Function { mode, .. }) => mode.is_local(),
        // Closures are allocated here; their bodies run later
        Lambda::LetRec { bindings, body } => {
            bindings.iter().any(|b| b.def.mode.is_local()) || allocates(body)
        }
        Lambda::Apply(apply) if apply.mode.is_local() => true,
        Lambda::Send { region_close: RegionClose::Normal, mode: AllocMode::Local, .. } => true,
        Lambda::Prim { prim, args, .. } => allocates_locally(prim) || args.iter().any(allocates),
        // An exclave in the body allocates in the parent region
        Lambda::Region { body, .. } => escapes_region(body),
        Lambda::Exclave(_) => true,
        other => any_subterm(other, |_, sub| allocates(sub)),
    }
}

/// Whether a region body may allocate in the parent region through an exclave
fn escapes_region(lam: &Lambda) -> bool {
    any_subterm(lam, |pos, sub| match (pos, sub) {
        (Position::Tail, Lambda::Exclave(body)) => allocates(body),
        _ => escapes_region(sub),
    })
}

fn any_subterm(lam: &Lambda, mut pred: impl FnMut(Position, &Lambda) -> bool) -> bool {
    let mut found = false;
    shallow_iter_positions(lam, &mut |pos, sub| {
        if !found && pred(pos, sub) {
            found = true;
        }
    });
    found
}
