//! Decoding of string, character and number literals.

use super::node::NumberNode;

/// Lexical class of a number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    /// `42`, `0x1F`, `0o17`, `0b101`
    Int,
    /// `'a'`
    Rune,
    /// `1.5`, `1e3`, `0x1p-2`
    Float,
    /// `2i`, `1+2i`
    Complex,
}

impl NumberKind {
    /// Classify literal text. Returns `None` for malformed literals.
    pub fn classify(text: &str) -> Option<NumberKind> {
        if text.starts_with('\'') {
            return unquote_char(text).map(|_| NumberKind::Rune);
        }
        if let Some(body) = text.strip_suffix('i') {
            let (real, imag) = split_complex(body);
            if let Some(real) = real {
                NumberKind::classify(real)?;
            }
            return real_kind(imag).map(|_| NumberKind::Complex);
        }
        real_kind(text)
    }
}

impl NumberNode {
    /// Integer value of an integer or rune literal.
    ///
    /// Returns `None` for other kinds, and for integers that do not fit in 64 bits.
    pub fn int_value(&self) -> Option<i64> {
        match self.kind {
            NumberKind::Rune => unquote_char(&self.text).map(|c| c as i64),
            NumberKind::Int => parse_int(&self.text),
            NumberKind::Float | NumberKind::Complex => None,
        }
    }

    /// Whether the literal is written with a leading minus sign.
    pub fn is_negative(&self) -> bool {
        self.text.starts_with('-')
    }
}

fn real_kind(text: &str) -> Option<NumberKind> {
    let body = text.trim_start_matches(['+', '-']);
    let (radix, digits) = split_radix(body);
    let is_float = match radix {
        16 => digits.contains(['.', 'p', 'P']),
        10 => digits.contains(['.', 'e', 'E']),
        _ => false,
    };

    if is_float {
        let clean = body.replace('_', "");
        let valid = radix == 16 || clean.parse::<f64>().is_ok();
        return valid.then_some(NumberKind::Float);
    }

    let clean = digits.replace('_', "");
    let valid = !clean.is_empty() && clean.chars().all(|c| c.is_digit(radix));
    valid.then_some(NumberKind::Int)
}

/// Split `1+2` into (`Some("1")`, `"+2"`); a lone `2` gives (`None`, `"2"`).
fn split_complex(body: &str) -> (Option<&str>, &str) {
    let bytes = body.as_bytes();
    for i in (1..bytes.len()).rev() {
        if matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E' | b'p' | b'P') {
            return (Some(&body[..i]), &body[i..]);
        }
    }
    (None, body)
}

fn split_radix(body: &str) -> (u32, &str) {
    let lower = body.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0b") => (2, &body[2..]),
        _ if body.len() > 1
            && body.starts_with('0')
            && body.chars().all(|c| ('0'..='7').contains(&c) || c == '_') =>
        {
            (8, &body[1..])
        }
        _ => (10, body),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = split_radix(body);
    let magnitude = u128::from_str_radix(&digits.replace('_', ""), radix).ok()?;
    let value = if negative {
        -i128::try_from(magnitude).ok()?
    } else {
        i128::try_from(magnitude).ok()?
    };
    i64::try_from(value).ok()
}

/// Decode a character literal including its quotes.
pub fn unquote_char(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let (c, rest) = unescape_one(inner, '\'')?;
    rest.is_empty().then_some(c)
}

/// Decode a quoted (`"..."`) or raw (`` `...` ``) string literal.
pub fn unquote_string(text: &str) -> Option<String> {
    if let Some(raw) = text.strip_prefix('`') {
        return raw.strip_suffix('`').map(|s| s.replace('\r', ""));
    }
    let mut rest = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(rest.len());
    while !rest.is_empty() {
        let (c, tail) = unescape_one(rest, '"')?;
        out.push(c);
        rest = tail;
    }
    Some(out)
}

/// Decode one possibly escaped character, returning it and the remaining text.
fn unescape_one(text: &str, quote: char) -> Option<(char, &str)> {
    let mut chars = text.chars();
    let c = chars.next()?;
    if c == quote || c == '\n' {
        return None;
    }
    if c != '\\' {
        return Some((c, chars.as_str()));
    }

    let escape = chars.next()?;
    let rest = chars.as_str();
    let simple = match escape {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0C'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0B'),
        '\\' => Some('\\'),
        '\'' if quote == '\'' => Some('\''),
        '"' if quote == '"' => Some('"'),
        _ => None,
    };
    if let Some(c) = simple {
        return Some((c, rest));
    }

    let (width, radix) = match escape {
        'x' => (2, 16),
        'u' => (4, 16),
        'U' => (8, 16),
        '0'..='7' => (2, 8),
        _ => return None,
    };
    if escape.is_digit(8) {
        let digits = rest.get(..width)?;
        let value = u32::from_str_radix(&format!("{escape}{digits}"), radix).ok()?;
        return char::from_u32(value).filter(|_| value <= 0xFF).map(|c| (c, &rest[width..]));
    }
    let digits = rest.get(..width)?;
    let value = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(value).map(|c| (c, &rest[width..]))
}
