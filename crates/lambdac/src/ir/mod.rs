//! Lambda intermediate representation
//!
//! The term language primitives are lowered into, with the helpers the
//! middle end builds on: construction, layout computation, traversal,
//! substitution, allocation analysis and well-formedness checking.

mod alloc;
mod builder;
mod check;
mod guarded;
mod ident;
mod lambda;
mod layout;
mod primitive;
mod print;
mod subst;
mod traverse;

pub use alloc::{may_allocate_in_region, primitive_may_allocate, AllocationSite};
pub use builder::{
    bind_with_layout, const_int, lambda_unit, lfunction, lfunction_def, make_sequence, name_lambda,
    name_lambda_list, FunctionSpec,
};
pub use check::{check_well_formed, Violation};
pub use guarded::{is_guarded, make_key, patch_guarded, staticfail};
pub use ident::{Ident, Idents, Session, StaticLabel, StaticLabels};
pub use lambda::{
    Apply, Constant, Direction, Event, EventEnv, EventKind, Function, FunctionAttribute, FunctionKind,
    InlineAttribute, Lambda, LetKind, LocalAttribute, MethKind, Param, PollAttribute, PopRegion, Probe,
    RecBinding, RegionClose, SpecialiseAttribute, StructuredConstant, Switch, TailcallAttribute, ValueDesc,
};
pub use layout::{compute_layout, layout_of_native_repr, primitive_result_layout, structured_constant_layout};
pub use primitive::{
    AllocMode, ArrayIndexKind, ArrayRefKind, BigarrayKind, BigarrayLayout, ByteContainer,
    CompileTimeConstant, FloatComparison, ImmediateOrPointer, InitOrAssign, IntegerComparison, IsSafe,
    MemoryAccessSize, Mutability, Primitive, RaiseKind,
};
pub use print::Printer;
pub use subst::{duplicate, rename, subst, UpdateEnv};
pub use traverse::{
    free_variables, map, shallow_iter, shallow_iter_positions, shallow_map, shallow_map_positions, Position,
};
