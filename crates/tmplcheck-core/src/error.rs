//! Unified error types for tmplcheck.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ParseError      - template source could not be parsed (with ParseErrorKind)
//! TypeError       - misuse of the TypeTable builders
//! CheckError      - a template failed type checking
//! └── CheckErrorKind - what failed, grouped by ErrorCategory
//! ```
//!
//! A check is fail-fast: the first `CheckError` aborts the walk of its tree and
//! is returned unchanged. Callers that check many templates collect errors
//! themselves (see `tmplcheck::CheckErrors`).

use std::fmt;

use thiserror::Error;

use crate::{Location, Span};

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Input ended inside an action or block.
    UnexpectedEof,
    /// A `{{` action was never closed.
    UnclosedAction,
    /// A `/* */` comment was never closed.
    UnclosedComment,
    /// A string or character literal was never closed.
    UnterminatedString,
    /// A literal could not be decoded.
    InvalidLiteral,
    /// A variable was used before it was declared.
    UndefinedVariable,
    /// Too many variables declared in a pipeline.
    TooManyDeclarations,
    /// `{{end}}`, `{{else}}`, `{{break}}` or `{{continue}}` out of place.
    MisplacedKeyword,
    /// A `define`d template name was used twice.
    DuplicateTemplate,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::UnclosedAction => "unclosed action",
            ParseErrorKind::UnclosedComment => "unclosed comment",
            ParseErrorKind::UnterminatedString => "unterminated quoted string",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::UndefinedVariable => "undefined variable",
            ParseErrorKind::TooManyDeclarations => "too many declarations",
            ParseErrorKind::MisplacedKeyword => "misplaced keyword",
            ParseErrorKind::DuplicateTemplate => "duplicate template",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{file}:{span}: {kind}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// Name of the source being parsed.
    pub file: String,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(
        kind: ParseErrorKind,
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file: file.into(),
            span,
            message: message.into(),
        }
    }

    /// Format the error with the offending source line and a caret under it.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!("{self}\n");
        if let Some(line_text) = source.lines().nth(self.span.line.saturating_sub(1) as usize) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", self.span.line, line_text));
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }
        output
    }
}

// ============================================================================
// Type Table Errors
// ============================================================================

/// Errors raised while building a `TypeTable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Methods and underlying types can only be set on named types.
    #[error("{0} is not a named type")]
    NotNamed(String),

    /// A method type must be a function signature.
    #[error("{0} is not a function signature")]
    NotASignature(String),

    /// The method already exists on the type.
    #[error("method {method} already declared on {type_name}")]
    DuplicateMethod { type_name: String, method: String },
}

// ============================================================================
// Check Errors
// ============================================================================

/// Coarse grouping of check failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A field or method is absent or not visible.
    LookupFailure,
    /// A callable has an invalid result list.
    SignatureShapeError,
    /// A call has the wrong number of arguments.
    ArityMismatch,
    /// A value's type is not assignable where it is used.
    AssignabilityError,
    /// The operation is not defined for the type involved.
    UnsupportedOperation,
    /// An identifier, variable or template name is unknown.
    NotFound,
}

/// What went wrong during a check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckErrorKind {
    // === LookupFailure ===
    /// No field or method with this name.
    #[error("can't evaluate field {name} in type {type_name}")]
    FieldNotFound { name: String, type_name: String },

    /// The identifier is not exported.
    #[error("field or method {name} is not exported on type {type_name}")]
    Unexported { name: String, type_name: String },

    // === SignatureShapeError ===
    /// A callable must return one value, or a value and an error.
    #[error("function {name} has {count} return values; should be 1 or 2")]
    ResultCount { name: String, count: usize },

    /// A two-result callable whose second result is not an error.
    #[error("invalid function signature for {name}: second return value should be error; is {found}")]
    SecondResultNotError { name: String, found: String },

    // === ArityMismatch ===
    /// Argument count does not fit the parameter list.
    #[error("wrong number of args for {name}: want {}{expected} got {found}", at_least(.variadic))]
    WrongArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        variadic: bool,
    },

    // === AssignabilityError ===
    /// A call argument does not fit its parameter.
    #[error("wrong argument type for {name}: argument {index} has type {found} expected {expected}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
        found: String,
    },

    /// A value is not assignable to a variable or key.
    #[error("{what}: type {found} is not assignable to {expected}")]
    NotAssignable {
        what: String,
        expected: String,
        found: String,
    },

    // === UnsupportedOperation ===
    #[error("range can't iterate over type {type_name}")]
    CannotRange { type_name: String },

    #[error("can't index item of type {type_name}")]
    CannotIndex { type_name: String },

    #[error("can't slice item of type {type_name}{}", detail_suffix(.detail))]
    CannotSlice { type_name: String, detail: String },

    #[error("len of type {type_name}")]
    CannotTakeLen { type_name: String },

    #[error("non-function of type {type_name}")]
    NotCallable { type_name: String },

    #[error("can't give argument to non-function {node}")]
    NotAFunction { node: String },

    #[error("can't evaluate field {name} in a callable of type {type_name}")]
    CallableField { name: String, type_name: String },

    #[error("{name} has arguments but cannot be invoked as function")]
    FieldArguments { name: String },

    #[error("invalid map key {key} for type {type_name}")]
    MapKey { key: String, type_name: String },

    #[error("integer literal {text} overflows int")]
    IntegerOverflow { text: String },

    #[error("index out of range: {text}")]
    NegativeIndex { text: String },

    #[error("{message}")]
    InvalidDeclaration { message: String },

    #[error("template {name:?} nested more than {limit} levels deep")]
    TemplateDepthExceeded { name: String, limit: usize },

    // === NotFound ===
    #[error("function {name:?} not defined")]
    UndefinedFunction { name: String },

    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("no such template {name:?}")]
    TemplateNotFound { name: String },
}

fn at_least(variadic: &bool) -> &'static str {
    if *variadic { "at least " } else { "" }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

impl CheckErrorKind {
    /// The category this failure belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckErrorKind::FieldNotFound { .. } | CheckErrorKind::Unexported { .. } => {
                ErrorCategory::LookupFailure
            }
            CheckErrorKind::ResultCount { .. } | CheckErrorKind::SecondResultNotError { .. } => {
                ErrorCategory::SignatureShapeError
            }
            CheckErrorKind::WrongArgumentCount { .. } => ErrorCategory::ArityMismatch,
            CheckErrorKind::ArgumentType { .. } | CheckErrorKind::NotAssignable { .. } => {
                ErrorCategory::AssignabilityError
            }
            CheckErrorKind::CannotRange { .. }
            | CheckErrorKind::CannotIndex { .. }
            | CheckErrorKind::CannotSlice { .. }
            | CheckErrorKind::CannotTakeLen { .. }
            | CheckErrorKind::NotCallable { .. }
            | CheckErrorKind::NotAFunction { .. }
            | CheckErrorKind::CallableField { .. }
            | CheckErrorKind::FieldArguments { .. }
            | CheckErrorKind::MapKey { .. }
            | CheckErrorKind::IntegerOverflow { .. }
            | CheckErrorKind::NegativeIndex { .. }
            | CheckErrorKind::InvalidDeclaration { .. }
            | CheckErrorKind::TemplateDepthExceeded { .. } => ErrorCategory::UnsupportedOperation,
            CheckErrorKind::UndefinedFunction { .. }
            | CheckErrorKind::UndefinedVariable { .. }
            | CheckErrorKind::TemplateNotFound { .. } => ErrorCategory::NotFound,
        }
    }
}

/// A located check failure.
///
/// Displays as `file:line:col: executing "name" at <context>: message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: executing {template:?} at <{context}>: {kind}")]
pub struct CheckError {
    /// What failed.
    pub kind: CheckErrorKind,
    /// Name of the template whose tree contained the failing node.
    pub template: String,
    /// Source text of the failing node.
    pub context: String,
    /// Where the failing node starts.
    pub location: Location,
}

impl CheckError {
    /// Create a located error.
    pub fn new(
        kind: CheckErrorKind,
        template: impl Into<String>,
        context: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            kind,
            template: template.into(),
            context: context.into(),
            location,
        }
    }

    /// The category of the underlying failure.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_error_display() {
        let err = CheckError::new(
            CheckErrorKind::FieldNotFound {
                name: "Missing".to_string(),
                type_name: "app.Page".to_string(),
            },
            "index",
            ".Missing",
            Location::new("index.gohtml", Span::new(1, 3, 8)),
        );
        assert_eq!(
            err.to_string(),
            "index.gohtml:1:3: executing \"index\" at <.Missing>: can't evaluate field Missing in type app.Page"
        );
        assert_eq!(err.category(), ErrorCategory::LookupFailure);
    }

    #[test]
    fn argument_count_message_mentions_variadic_minimum() {
        let fixed = CheckErrorKind::WrongArgumentCount {
            name: "upper".to_string(),
            expected: 1,
            found: 2,
            variadic: false,
        };
        assert_eq!(fixed.to_string(), "wrong number of args for upper: want 1 got 2");

        let variadic = CheckErrorKind::WrongArgumentCount {
            name: "printf".to_string(),
            expected: 1,
            found: 0,
            variadic: true,
        };
        assert_eq!(
            variadic.to_string(),
            "wrong number of args for printf: want at least 1 got 0"
        );
        assert_eq!(variadic.category(), ErrorCategory::ArityMismatch);
    }

    #[test]
    fn argument_type_message() {
        let kind = CheckErrorKind::ArgumentType {
            name: "upper".to_string(),
            index: 0,
            expected: "string".to_string(),
            found: "int".to_string(),
        };
        assert_eq!(
            kind.to_string(),
            "wrong argument type for upper: argument 0 has type int expected string"
        );
        assert_eq!(kind.category(), ErrorCategory::AssignabilityError);
    }

    #[test]
    fn parse_error_with_source() {
        let err = ParseError::new(
            ParseErrorKind::UnclosedAction,
            "page.gohtml",
            Span::new(2, 3, 2),
            "missing }}",
        );
        let rendered = err.display_with_source("line one\n  {{ .Name\n");
        assert!(rendered.starts_with("page.gohtml:2:3: unclosed action: missing }}"));
        assert!(rendered.contains("  2 |   {{ .Name"));
        assert!(rendered.contains("  |   ^~"));
    }
}
