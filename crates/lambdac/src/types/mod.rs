//! Layouts and machine widths shared by the descriptor model and the IR
//!
//! The width enums are the single source of truth for unboxed shapes: both
//! `NativeRepr` (primitive boundaries) and `Layout` (IR values) are built on
//! them, so the two stay isomorphic by construction.

mod layout;
mod width;

pub use layout::{
    ArrayKind, ConstructorShape, FlatElement, Layout, MixedBlockShape, ValueKind,
};
pub use width::{BaseSort, FloatWidth, IntWidth, Sort, VectorWidth};
