//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream};
use thiserror::Error;
use super::Span;
use crate::primitive::{Deprecation, PrimitiveError};

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    /// A written type cannot be given the requested native representation
    #[error("Representation error at {span:?}: {message}")]
    Repr { message: String, span: Span },

    #[error(transparent)]
    Primitive(#[from] PrimitiveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn repr(message: impl Into<String>, span: Span) -> Self {
        Self::Repr {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lexer { span, .. }
            | CompileError::Parser { span, .. }
            | CompileError::Repr { span, .. } => Some(*span),
            CompileError::Primitive(err) => Some(err.span()),
            CompileError::Io(_) => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = Self::error_diagnostic(file_id, error);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    pub fn report_warning(&self, file_id: usize, warning: &Deprecation) {
        let diagnostic = Self::warning_diagnostic(file_id, warning);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    /// Render an error without colors, as it would appear on stderr
    pub fn render_error(&self, file_id: usize, error: &CompileError) -> String {
        let diagnostic = Self::error_diagnostic(file_id, error);
        let mut buffer = NoColor::new(Vec::new());
        let _ = term::emit(&mut buffer, &self.config, &self.files, &diagnostic);
        String::from_utf8_lossy(&buffer.into_inner()).into_owned()
    }

    fn error_diagnostic(file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Repr { message, span } => Diagnostic::error()
                .with_message("Invalid native representation")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Primitive(err) => {
                let span = err.span();
                Diagnostic::error()
                    .with_message("Invalid primitive declaration")
                    .with_labels(vec![
                        Label::primary(file_id, span.start..span.end).with_message(err.to_string())
                    ])
            }

            CompileError::Io(err) => {
                Diagnostic::error().with_message(format!("IO error: {}", err))
            }
        }
    }

    fn warning_diagnostic(file_id: usize, warning: &Deprecation) -> Diagnostic<usize> {
        let span = warning.span();
        Diagnostic::warning()
            .with_message("deprecated")
            .with_labels(vec![
                Label::primary(file_id, span.start..span.end).with_message(warning.to_string())
            ])
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
