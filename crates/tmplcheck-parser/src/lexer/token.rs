//! Token types for the template lexer.

use std::fmt;

use tmplcheck_core::Span;

/// A token from template source.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token.
    pub lexeme: &'src str,
    /// Location in source.
    pub span: Span,
    /// Whitespace separated this token from the previous one.
    pub spaced: bool,
}

impl<'src> Token<'src> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span, spaced: bool) -> Self {
        Self {
            kind,
            lexeme,
            span,
            spaced,
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of the template language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Outside actions
    // =========================================
    /// Plain text between actions.
    Text,
    /// `{{/* ... */}}`, the whole action.
    Comment,
    /// `{{` or `{{- `
    LeftDelim,
    /// `}}` or ` -}}`
    RightDelim,

    // =========================================
    // Operands
    // =========================================
    /// Bare function name: `printf`
    Identifier,
    /// Field access: `.Name`
    Field,
    /// Variable: `$` or `$name`
    Variable,
    /// The cursor: `.`
    Dot,
    /// `true` or `false`
    Bool,
    /// Numeric constant: `42`, `0x1F`, `1e3`, `2i`
    Number,
    /// Character constant: `'a'`
    Char,
    /// Quoted string: `"text"`
    String,
    /// Raw string: `` `text` ``
    RawString,

    // =========================================
    // Punctuation
    // =========================================
    /// `|`
    Pipe,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `:=`
    Declare,
    /// `=`
    Assign,
    /// `,`
    Comma,

    // =========================================
    // Keywords
    // =========================================
    Block,
    Break,
    Continue,
    Define,
    Else,
    End,
    If,
    Nil,
    Range,
    Template,
    With,

    // =========================================
    // Special
    // =========================================
    /// End of input.
    Eof,
    /// Lexing failed; the error is held by the lexer.
    Error,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn description(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Comment => "comment",
            TokenKind::LeftDelim => "{{",
            TokenKind::RightDelim => "}}",
            TokenKind::Identifier => "identifier",
            TokenKind::Field => "field",
            TokenKind::Variable => "variable",
            TokenKind::Dot => "dot",
            TokenKind::Bool => "boolean",
            TokenKind::Number => "number",
            TokenKind::Char => "character constant",
            TokenKind::String | TokenKind::RawString => "string",
            TokenKind::Pipe => "'|'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Declare => "':='",
            TokenKind::Assign => "'='",
            TokenKind::Comma => "','",
            TokenKind::Block => "block",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Define => "define",
            TokenKind::Else => "else",
            TokenKind::End => "end",
            TokenKind::If => "if",
            TokenKind::Nil => "nil",
            TokenKind::Range => "range",
            TokenKind::Template => "template",
            TokenKind::With => "with",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "error",
        }
    }

    /// Whether this kind is a keyword.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Block
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Define
                | TokenKind::Else
                | TokenKind::End
                | TokenKind::If
                | TokenKind::Nil
                | TokenKind::Range
                | TokenKind::Template
                | TokenKind::With
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Classify a bare word.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "block" => Block,
        "break" => Break,
        "continue" => Continue,
        "define" => Define,
        "else" => Else,
        "end" => End,
        "if" => If,
        "nil" => Nil,
        "range" => Range,
        "template" => Template,
        "with" => With,
        "true" | "false" => Bool,
        _ => return None,
    })
}
