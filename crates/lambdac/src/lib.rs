//! Lambda IR - primitive descriptors and the lambda intermediate language
//!
//! This library models the middle end's view of primitive operations and
//! the term language programs are lowered into before code generation.
//!
//! ## Architecture
//!
//! The library is organized into:
//! - **Primitives** (`primitive/`): Descriptor construction, validation and printing
//! - **IR** (`ir/`): Lambda terms and the utilities built on them
//! - **Declarations** (`decl/`): Textual `external` declarations and their resolution
//! - **Driver** (`driver/`): The declaration checking pipeline
//! - **Common** (`common/`): Shared infrastructure (errors, spans)
//! - **Types** (`types/`): Sorts, widths and layouts

pub mod common;
pub mod types;
pub mod primitive;
pub mod decl;
pub mod ir;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use driver::{CheckedPrimitive, DriverConfig, DriverOutput, Pipeline};
pub use primitive::{Description, PrimitiveError};

#[cfg(test)]
mod prop_tests;
