// src/error/compile_error.rs
use crate::location::source_span::SourceSpan;
use thiserror::Error;

/// Errors raised by the middle-end.
///
/// The IR pipeline treats its input as well-formed; these are programmer
/// errors and abort the current function's pipeline rather than being
/// recovered from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    /// An AST invariant the lowering relies on was broken.
    #[error("input contract violation: {0}")]
    InputContractViolation(String),

    /// An SSA or CFG invariant was broken mid-pass.
    #[error("IR invariant violation: {0}")]
    InvariantViolation(String),

    /// A construct the middle-end does not lower yet.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{message} at {span}")]
    LexerError { message: String, span: SourceSpan },

    #[error("Syntax error: {message} at {span}")]
    SyntaxError { message: String, span: SourceSpan },

    #[error("Semantic error: {message} at {span}")]
    SemanticError { message: String, span: SourceSpan },

    #[error("IR error in function '{function}': {source}")]
    IrError {
        function: String,
        #[source]
        source: IrError,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CompileError {
    pub fn message(&self) -> Option<&str> {
        match self {
            CompileError::LexerError { message, .. }
            | CompileError::SyntaxError { message, .. }
            | CompileError::SemanticError { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            CompileError::LexerError { span, .. }
            | CompileError::SyntaxError { span, .. }
            | CompileError::SemanticError { span, .. } => Some(span),
            _ => None,
        }
    }
}
