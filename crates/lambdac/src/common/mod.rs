//! Common infrastructure shared by the descriptor model, the declaration
//! surface and the lambda IR

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use span::Span;
