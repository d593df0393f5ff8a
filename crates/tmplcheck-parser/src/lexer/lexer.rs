//! Main lexer implementation for template source.
//!
//! The [`Lexer`] alternates between two modes. Outside actions it produces
//! [`TokenKind::Text`] runs up to the next `{{`. Inside an action it produces
//! operand and punctuation tokens until the closing `}}`. Trim markers
//! (`{{- ` and ` -}}`) remove the whitespace of the adjacent text run, and
//! comments (`{{/* ... */}}`) are scanned whole as a single token.

use std::collections::VecDeque;

use tmplcheck_core::Span;

use super::cursor::{Cursor, is_ident_continue, is_ident_start, is_space};
use super::error::LexerError;
use super::token::{Token, TokenKind, lookup_keyword};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// Lexer for template source.
///
/// Provides lookahead via [`peek`](Self::peek) and [`peek_nth`](Self::peek_nth).
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Lookahead buffer for peeking.
    lookahead: VecDeque<Token<'src>>,
    /// Accumulated errors.
    errors: Vec<LexerError>,
    /// Currently between `{{` and `}}`.
    in_action: bool,
    /// Open parentheses in the current action.
    paren_depth: u32,
    /// The last action ended with ` -}}`.
    trim_next_text: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            lookahead: VecDeque::with_capacity(4),
            errors: Vec::new(),
            in_action: false,
            paren_depth: 0,
            trim_next_text: false,
        }
    }

    /// Take the first accumulated error, if any.
    pub fn take_error(&mut self) -> Option<LexerError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> &Token<'src> {
        self.peek_nth(0)
    }

    /// Peek at the nth token ahead (0 = next).
    pub fn peek_nth(&mut self, n: usize) -> &Token<'src> {
        while self.lookahead.len() <= n {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        &self.lookahead[n]
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'src> {
        if self.in_action {
            self.scan_action()
        } else {
            self.scan_text()
        }
    }

    fn make_token(&self, kind: TokenKind, start: Mark, spaced: bool) -> Token<'src> {
        let lexeme = self.cursor.slice_from(start.offset);
        let span = Span::new(start.line, start.col, lexeme.len() as u32);
        Token::new(kind, lexeme, span, spaced)
    }

    fn make_error(&mut self, error: LexerError) -> Token<'src> {
        let span = error.span;
        self.errors.push(error);
        // Stop scanning; every further token is an error too.
        self.in_action = false;
        self.cursor.advance_bytes(self.cursor.rest().len());
        Token::new(TokenKind::Error, "", span, false)
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.cursor.offset(),
            line: self.cursor.line(),
            col: self.cursor.column(),
        }
    }

    // =========================================
    // Scanning: Text
    // =========================================

    fn scan_text(&mut self) -> Token<'src> {
        if self.has_errors() {
            let span = Span::point(self.cursor.line(), self.cursor.column());
            return Token::new(TokenKind::Error, "", span, false);
        }

        if std::mem::take(&mut self.trim_next_text) {
            self.cursor.eat_while(is_space);
        }

        let start = self.mark();
        if self.cursor.is_eof() {
            return Token::new(
                TokenKind::Eof,
                "",
                Span::point(start.line, start.col),
                false,
            );
        }

        let rest = self.cursor.rest();
        let Some(delim) = rest.find(LEFT_DELIM) else {
            self.cursor.advance_bytes(rest.len());
            return self.make_token(TokenKind::Text, start, false);
        };

        if delim == 0 {
            return self.scan_left_delim();
        }

        self.cursor.advance_bytes(delim);
        let mut text = &rest[..delim];
        if is_left_trim(self.cursor.rest()) {
            text = text.trim_end_matches(is_space);
            if text.is_empty() {
                return self.scan_left_delim();
            }
        }
        let span = Span::new(start.line, start.col, text.len() as u32);
        Token::new(TokenKind::Text, text, span, false)
    }

    fn scan_left_delim(&mut self) -> Token<'src> {
        let start = self.mark();
        self.cursor.eat_str(LEFT_DELIM);
        let trimmed = self.cursor.check_str("-") && self.cursor.peek_nth(1).is_some_and(is_space);
        if trimmed {
            self.cursor.advance();
            self.cursor.eat_while(is_space);
        }

        if self.cursor.check_str(LEFT_COMMENT) {
            return self.scan_comment(start);
        }

        self.in_action = true;
        self.paren_depth = 0;
        let lexeme = self.cursor.slice_from(start.offset);
        Token::new(
            TokenKind::LeftDelim,
            lexeme,
            Span::new(start.line, start.col, LEFT_DELIM.len() as u32),
            false,
        )
    }

    fn scan_comment(&mut self, start: Mark) -> Token<'src> {
        self.cursor.eat_str(LEFT_COMMENT);
        let Some(end) = self.cursor.rest().find(RIGHT_COMMENT) else {
            let span = Span::new(start.line, start.col, LEFT_DELIM.len() as u32);
            return self.make_error(LexerError::unclosed_comment(span));
        };
        self.cursor.advance_bytes(end + RIGHT_COMMENT.len());

        if self.cursor.check_str(" -}}") || self.cursor.check_str("\t-}}") {
            self.cursor.advance_bytes(4);
            self.trim_next_text = true;
        } else if !self.cursor.eat_str(RIGHT_DELIM) {
            let span = Span::point(self.cursor.line(), self.cursor.column());
            return self.make_error(LexerError::unexpected(
                span,
                "comment ends before closing delimiter",
            ));
        }

        self.make_token(TokenKind::Comment, start, false)
    }

    // =========================================
    // Scanning: Inside actions
    // =========================================

    fn scan_action(&mut self) -> Token<'src> {
        let spaced = !self.cursor.eat_while(is_space).is_empty();
        let start = self.mark();

        if spaced && self.cursor.check_str("-}}") {
            self.cursor.advance_bytes(3);
            self.trim_next_text = true;
            return self.close_action(start, spaced);
        }
        if self.cursor.check_str(RIGHT_DELIM) {
            self.cursor.advance_bytes(RIGHT_DELIM.len());
            return self.close_action(start, spaced);
        }

        let Some(c) = self.cursor.peek() else {
            let span = Span::point(start.line, start.col);
            return self.make_error(LexerError::unclosed_action(span));
        };

        match c {
            '|' => self.single(TokenKind::Pipe, start, spaced),
            '(' => {
                self.paren_depth += 1;
                self.single(TokenKind::LeftParen, start, spaced)
            }
            ')' => {
                if self.paren_depth == 0 {
                    let span = Span::new(start.line, start.col, 1);
                    return self.make_error(LexerError::unexpected(span, "unexpected right paren"));
                }
                self.paren_depth -= 1;
                self.single(TokenKind::RightParen, start, spaced)
            }
            ':' => {
                if self.cursor.eat_str(":=") {
                    self.make_token(TokenKind::Declare, start, spaced)
                } else {
                    let span = Span::new(start.line, start.col, 1);
                    self.make_error(LexerError::unexpected(span, "expected :="))
                }
            }
            '=' => self.single(TokenKind::Assign, start, spaced),
            ',' => self.single(TokenKind::Comma, start, spaced),
            '"' => self.scan_quoted('"', TokenKind::String, "quoted string", start, spaced),
            '\'' => self.scan_quoted('\'', TokenKind::Char, "character constant", start, spaced),
            '`' => self.scan_raw_string(start, spaced),
            '$' => {
                self.cursor.advance();
                self.cursor.eat_while(is_ident_continue);
                self.make_token(TokenKind::Variable, start, spaced)
            }
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start, spaced)
            }
            '.' => {
                self.cursor.advance();
                if self.cursor.eat_while(is_ident_continue).is_empty() {
                    self.make_token(TokenKind::Dot, start, spaced)
                } else {
                    self.make_token(TokenKind::Field, start, spaced)
                }
            }
            '+' | '-' | '0'..='9' => self.scan_number(start, spaced),
            c if is_ident_start(c) => {
                let word = self.cursor.eat_while(is_ident_continue);
                let kind = lookup_keyword(word).unwrap_or(TokenKind::Identifier);
                self.make_token(kind, start, spaced)
            }
            other => {
                let span = Span::new(start.line, start.col, other.len_utf8() as u32);
                self.make_error(LexerError::unexpected(
                    span,
                    format!("unrecognized character in action: {other:?}"),
                ))
            }
        }
    }

    fn close_action(&mut self, start: Mark, spaced: bool) -> Token<'src> {
        if self.paren_depth > 0 {
            let span = Span::point(start.line, start.col);
            return self.make_error(LexerError::unexpected(span, "unclosed left paren"));
        }
        self.in_action = false;
        self.make_token(TokenKind::RightDelim, start, spaced)
    }

    fn single(&mut self, kind: TokenKind, start: Mark, spaced: bool) -> Token<'src> {
        self.cursor.advance();
        self.make_token(kind, start, spaced)
    }

    // =========================================
    // Scanning: Strings
    // =========================================

    fn scan_quoted(
        &mut self,
        quote: char,
        kind: TokenKind,
        what: &str,
        start: Mark,
        spaced: bool,
    ) -> Token<'src> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let len = self.cursor.offset() - start.offset;
                    let span = Span::new(start.line, start.col, len);
                    return self.make_error(LexerError::unterminated(span, what));
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek().is_some_and(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    return self.make_token(kind, start, spaced);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn scan_raw_string(&mut self, start: Mark, spaced: bool) -> Token<'src> {
        self.cursor.advance();
        match self.cursor.rest().find('`') {
            Some(end) => {
                self.cursor.advance_bytes(end + 1);
                self.make_token(TokenKind::RawString, start, spaced)
            }
            None => {
                let span = Span::new(start.line, start.col, 1);
                self.make_error(LexerError::unterminated(span, "raw quoted string"))
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    fn scan_number(&mut self, start: Mark, spaced: bool) -> Token<'src> {
        if !self.scan_number_body() {
            return self.bad_number(start);
        }

        // Complex constant written as a sum: 1+2i
        if matches!(self.cursor.peek(), Some('+' | '-')) {
            if !self.scan_number_body() || !self.cursor.slice_from(start.offset).ends_with('i') {
                return self.bad_number(start);
            }
        }

        if self.cursor.check(is_ident_continue) || self.cursor.check(|c| c == '.') {
            self.cursor.eat_while(|c| is_ident_continue(c) || c == '.');
            return self.bad_number(start);
        }

        self.make_token(TokenKind::Number, start, spaced)
    }

    /// Scan sign, digits, fraction, exponent and imaginary suffix.
    fn scan_number_body(&mut self) -> bool {
        let _ = self.cursor.eat('+') || self.cursor.eat('-');

        let mut digits: fn(char) -> bool = |c| c.is_ascii_digit() || c == '_';
        let mut exponent = "eE";
        if self.cursor.check_str("0x") || self.cursor.check_str("0X") {
            self.cursor.advance_bytes(2);
            digits = |c| c.is_ascii_hexdigit() || c == '_';
            exponent = "pP";
        } else if self.cursor.check_str("0o") || self.cursor.check_str("0O") {
            self.cursor.advance_bytes(2);
            digits = |c| ('0'..='7').contains(&c) || c == '_';
        } else if self.cursor.check_str("0b") || self.cursor.check_str("0B") {
            self.cursor.advance_bytes(2);
            digits = |c| c == '0' || c == '1' || c == '_';
        }

        let mut any = !self.cursor.eat_while(digits).is_empty();
        if self.cursor.eat('.') {
            any |= !self.cursor.eat_while(digits).is_empty();
        }
        if !any {
            return false;
        }
        if self.cursor.check(|c| exponent.contains(c)) {
            self.cursor.advance();
            let _ = self.cursor.eat('+') || self.cursor.eat('-');
            if self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_').is_empty() {
                return false;
            }
        }
        self.cursor.eat('i');
        true
    }

    fn bad_number(&mut self, start: Mark) -> Token<'src> {
        let text = self.cursor.slice_from(start.offset);
        let span = Span::new(start.line, start.col, text.len() as u32);
        self.make_error(LexerError::bad_number(span, text))
    }
}

/// Scan position captured at the start of a token.
#[derive(Clone, Copy)]
struct Mark {
    offset: u32,
    line: u32,
    col: u32,
}

/// Whether `rest` starts with a left delimiter carrying a trim marker.
fn is_left_trim(rest: &str) -> bool {
    rest.strip_prefix(LEFT_DELIM)
        .and_then(|after| after.strip_prefix('-'))
        .and_then(|after| after.chars().next())
        .is_some_and(is_space)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token();
            kinds.push(token.kind);
            if matches!(token.kind, TokenKind::Eof | TokenKind::Error) {
                return kinds;
            }
        }
    }

    #[test]
    fn text_only() {
        assert_eq!(kinds("hello"), vec![TokenKind::Text, TokenKind::Eof]);
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn simple_action() {
        use TokenKind::*;
        assert_eq!(
            kinds("Hi {{.Name}}!"),
            vec![Text, LeftDelim, Field, RightDelim, Text, Eof]
        );
    }

    #[test]
    fn pipeline_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{{$x := printf "%d" .Count | html}}"#),
            vec![
                LeftDelim, Variable, Declare, Identifier, String, Field, Pipe, Identifier,
                RightDelim, Eof
            ]
        );
    }

    #[test]
    fn keywords_and_literals() {
        use TokenKind::*;
        assert_eq!(
            kinds("{{if true}}{{else}}{{end}}{{range nil}}{{end}}"),
            vec![
                LeftDelim, If, Bool, RightDelim, LeftDelim, Else, RightDelim, LeftDelim, End,
                RightDelim, LeftDelim, Range, Nil, RightDelim, LeftDelim, End, RightDelim, Eof
            ]
        );
    }

    #[test]
    fn fields_are_separate_tokens() {
        let mut lexer = Lexer::new("{{.A.B .C}}");
        lexer.next_token();
        let a = lexer.next_token();
        let b = lexer.next_token();
        let c = lexer.next_token();
        assert_eq!((a.lexeme, a.spaced), (".A", false));
        assert_eq!((b.lexeme, b.spaced), (".B", false));
        assert_eq!((c.lexeme, c.spaced), (".C", true));
    }

    #[test]
    fn numbers() {
        for source in [
            "{{1}}",
            "{{-1}}",
            "{{0x1F}}",
            "{{1.5e3}}",
            "{{2i}}",
            "{{1+2i}}",
            "{{.5}}",
            "{{1_000}}",
        ] {
            let mut lexer = Lexer::new(source);
            lexer.next_token();
            let token = lexer.next_token();
            assert_eq!(token.kind, TokenKind::Number, "{source}");
        }
        assert!(kinds("{{3k}}").contains(&TokenKind::Error));
    }

    #[test]
    fn trim_markers() {
        let mut lexer = Lexer::new("a  {{- .X -}}  b");
        let text = lexer.next_token();
        assert_eq!(text.lexeme, "a");
        assert_eq!(lexer.next_token().kind, TokenKind::LeftDelim);
        assert_eq!(lexer.next_token().kind, TokenKind::Field);
        assert_eq!(lexer.next_token().kind, TokenKind::RightDelim);
        assert_eq!(lexer.next_token().lexeme, "b");
    }

    #[test]
    fn negative_number_is_not_trim() {
        use TokenKind::*;
        assert_eq!(kinds("{{-3}}"), vec![LeftDelim, Number, RightDelim, Eof]);
    }

    #[test]
    fn comments() {
        let mut lexer = Lexer::new("a{{/* note */}}b");
        assert_eq!(lexer.next_token().kind, TokenKind::Text);
        let comment = lexer.next_token();
        assert_eq!(comment.kind, TokenKind::Comment);
        assert_eq!(comment.lexeme, "{{/* note */}}");
        assert_eq!(lexer.next_token().lexeme, "b");

        assert!(kinds("{{/* open").contains(&TokenKind::Error));
    }

    #[test]
    fn unclosed_action_is_error() {
        let mut lexer = Lexer::new("{{.Name");
        lexer.next_token();
        lexer.next_token();
        assert_eq!(lexer.next_token().kind, TokenKind::Error);
        let error = lexer.take_error().unwrap();
        assert_eq!(error.kind, tmplcheck_core::ParseErrorKind::UnclosedAction);
    }

    #[test]
    fn strings() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{{"a\"b" `raw` 'c'}}"#),
            vec![LeftDelim, String, RawString, Char, RightDelim, Eof]
        );
        assert!(kinds(r#"{{"open}}"#).contains(&Error));
    }

    #[test]
    fn spans_track_lines() {
        let mut lexer = Lexer::new("line\n  {{.X}}");
        lexer.next_token();
        let delim = lexer.next_token();
        assert_eq!((delim.span.line, delim.span.col), (2, 3));
        let field = lexer.next_token();
        assert_eq!((field.span.line, field.span.col, field.span.len), (2, 5, 2));
    }
}
