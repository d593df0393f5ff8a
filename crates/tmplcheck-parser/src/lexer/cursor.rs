/// A cursor over template source that tracks position.
///
/// Provides low-level character access with peek/advance semantics.
/// Tracks byte offset, line number, and column number as it advances.
pub struct Cursor<'src> {
    /// The source text being scanned.
    source: &'src str,
    /// Remaining source text (slice starting at current position).
    rest: &'src str,
    /// Current byte offset from start of source.
    offset: u32,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed, byte-based).
    column: u32,
}

impl<'src> Cursor<'src> {
    /// Create a new cursor at the start of the source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current byte offset from start of source.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Current line number (1-indexed).
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column number (1-indexed, byte-based).
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Remaining, unconsumed source.
    #[inline]
    pub fn rest(&self) -> &'src str {
        self.rest
    }

    /// Check if we've reached the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let first = *self.rest.as_bytes().first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest.chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Check if the current character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Check if the upcoming bytes match the given string.
    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Consume the current character and advance.
    ///
    /// Returns the consumed character, or `None` if at EOF.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }

        Some(ch)
    }

    /// Advance by n bytes, keeping line and column tracking correct.
    ///
    /// `n` must land on a character boundary.
    pub fn advance_bytes(&mut self, n: usize) {
        debug_assert!(self.rest.is_char_boundary(n));

        for ch in self.rest[..n].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += ch.len_utf8() as u32;
            }
        }

        self.rest = &self.rest[n..];
        self.offset += n as u32;
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the given string if the source continues with it.
    #[inline]
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.check_str(s) {
            self.advance_bytes(s.len());
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches.
    ///
    /// Returns the consumed slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset;
        while self.check(&f) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Get a slice of source from a starting offset to current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whitespace that may separate action operands.
#[inline]
pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cursor = Cursor::new("{{.}}");
        assert_eq!(cursor.peek(), Some('{'));
        assert_eq!(cursor.offset(), 0);

        assert!(cursor.eat_str("{{"));
        assert_eq!(cursor.peek(), Some('.'));
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.rest(), ".}}");
    }

    #[test]
    fn cursor_eat_while() {
        let mut cursor = Cursor::new("Name.Email");
        assert_eq!(cursor.eat_while(is_ident_continue), "Name");
        assert!(cursor.eat('.'));
        assert_eq!(cursor.eat_while(is_ident_continue), "Email");
        assert!(cursor.is_eof());
    }

    #[test]
    fn cursor_line_and_column() {
        let mut cursor = Cursor::new("a\nbc");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
    }

    #[test]
    fn cursor_utf8() {
        let mut cursor = Cursor::new("héllo");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.column(), 4);
        assert_eq!(cursor.slice_from(0), "hé");
    }

    #[test]
    fn cursor_advance_bytes_tracks_lines() {
        let mut cursor = Cursor::new("ab\ncd{{");
        cursor.advance_bytes(5);
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.column(), 3);
        assert!(cursor.check_str("{{"));
        assert_eq!(cursor.peek_nth(1), Some('{'));
    }
}
