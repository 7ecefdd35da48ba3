use thiserror::Error;

/// Any error produced by this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Failure while reading a document. The parse never yields a partial
/// document: any of these aborts it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected '{found}' at offset {at}, expected '{expected}'")]
    MismatchedBracket {
        expected: char,
        found: char,
        at: usize,
    },
    #[error("unexpected '{found}' at offset {at}")]
    UnexpectedCharacter { found: char, at: usize },
    #[error("unclosed '{open}' left at end of input")]
    UnbalancedBracket { open: char },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("escape at end of input")]
    UnterminatedEscape,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("member name is empty at offset {at}")]
    EmptyMemberName { at: usize },
    #[error("annotation name is empty at offset {at}")]
    EmptyAnnotationName { at: usize },
}

/// Failure while resolving or mutating through a path string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no node at '{path}'")]
    NotFound { path: String },
    #[error("node at '{path}' is {actual}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("moving node into '{path}' would make an ancestor its own descendant")]
    WouldCycle { path: String },
}

impl PathError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        PathError::NotFound { path: path.into() }
    }

    pub(crate) fn mismatch(
        path: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        PathError::TypeMismatch {
            path: path.into(),
            expected,
            actual,
        }
    }
}

/// Failure reported by (or on behalf of) the external function resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("no function named '{name}'")]
    Unresolved { name: String },
    #[error("no function resolver was supplied, cannot invoke '{name}'")]
    NoResolver { name: String },
    #[error("function '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

impl FunctionError {
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        FunctionError::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}
