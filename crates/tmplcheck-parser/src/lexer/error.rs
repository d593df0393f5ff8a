//! Errors produced while scanning template source.

use thiserror::Error;
use tmplcheck_core::{ParseError, ParseErrorKind, Span};

/// A lexical error. Converted to a [`ParseError`] once the source name is known.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct LexerError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl LexerError {
    fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn unclosed_action(span: Span) -> Self {
        Self::new(ParseErrorKind::UnclosedAction, span, "unclosed action")
    }

    pub fn unclosed_comment(span: Span) -> Self {
        Self::new(ParseErrorKind::UnclosedComment, span, "unclosed comment")
    }

    pub fn unterminated(span: Span, what: &str) -> Self {
        Self::new(
            ParseErrorKind::UnterminatedString,
            span,
            format!("unterminated {what}"),
        )
    }

    pub fn bad_number(span: Span, text: &str) -> Self {
        Self::new(
            ParseErrorKind::InvalidLiteral,
            span,
            format!("bad number syntax: {text:?}"),
        )
    }

    pub fn unexpected(span: Span, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::UnexpectedToken, span, message)
    }

    /// Attach the source name.
    pub fn into_parse_error(self, file: &str) -> ParseError {
        ParseError::new(self.kind, file, self.span, self.message)
    }
}
