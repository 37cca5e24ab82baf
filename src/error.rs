//! Error types for the pycpp transpiler

use thiserror::Error;

/// Transpiler errors
///
/// Every failure in the pipeline (scan, parse, translate, bind) surfaces as
/// one of these variants. No error is downgraded to a warning: a partially
/// rendered translation unit handed to a C++ compiler produces far worse
/// diagnostics than failing here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Scanner / parser errors
    /// Invalid source text at a known position
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where the error occurred (1-indexed)
        line: usize,
        /// Column number where the error occurred (1-indexed)
        col: usize,
        /// Error description
        message: String,
    },

    /// Source ended in the middle of a construct
    #[error("Unexpected end of file")]
    UnexpectedEof,

    /// Parser found a token it cannot use here
    #[error("Unexpected token at line {line}: expected {expected}, got {got}")]
    UnexpectedToken {
        /// Expected token description
        expected: String,
        /// Actual token received
        got: String,
        /// Line number of the offending token
        line: usize,
    },

    /// Inconsistent indentation (dedent to a level never pushed)
    #[error("Indentation error at line {line}: {message}")]
    IndentationError {
        /// Line number of the offending line
        line: usize,
        /// Error description
        message: String,
    },

    // Translator errors
    /// Construct outside the restricted grammar
    ///
    /// **Triggered by:** non-`range` for-loop iterables, multi-target
    /// assignment, or any statement/expression kind the translator does not
    /// model. Always fatal for the whole translation.
    #[error("Unsupported syntax at line {line}: {message}")]
    UnsupportedSyntax {
        /// Line number of the construct
        line: usize,
        /// Error description
        message: String,
    },

    /// Reference to a name with no binding in any enclosing scope
    #[error("Can't find name `{name}`")]
    UnboundName {
        /// The unresolved identifier
        name: String,
    },

    /// Parameters or locals missing their type annotation
    ///
    /// Reported as a batch: all offending names at once, so a single run
    /// reveals every annotation the caller still has to add.
    #[error("Missing type annotation for: {}", names.join(", "))]
    MissingAnnotations {
        /// Every unannotated name, in declaration order
        names: Vec<String>,
    },

    /// Type-level failure (bad cast target, invalid array shape, reference
    /// declared without an initializer)
    #[error("Type error: {0}")]
    TypeError(String),

    // Binding errors
    /// Keyword arguments against a positional-only C++ call
    #[error("Keyword arguments are invalid for a C++ call: {context}")]
    KeywordArguments {
        /// Where the keyword arguments appeared
        context: String,
    },

    /// Class member kind the binding generator cannot register
    #[error("Unsupported class member: {name}")]
    UnsupportedMember {
        /// Member name
        name: String,
    },
}

impl Error {
    /// Create a syntax error at a source position
    pub fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        Error::SyntaxError {
            line,
            col,
            message: message.into(),
        }
    }

    /// Create an unsupported-syntax error at a source line
    pub fn unsupported(line: usize, message: impl Into<String>) -> Self {
        Error::UnsupportedSyntax {
            line,
            message: message.into(),
        }
    }

    /// Create a type error with a message
    pub fn type_error(message: impl Into<String>) -> Self {
        Error::TypeError(message.into())
    }
}

/// Result type for pycpp operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_annotations_batches_all_names() {
        let err = Error::MissingAnnotations {
            names: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Missing type annotation for: a, b");
    }

    #[test]
    fn unbound_name_message_matches_lookup_failure() {
        let err = Error::UnboundName {
            name: "x".to_string(),
        };
        assert!(err.to_string().contains("`x`"));
    }
}
