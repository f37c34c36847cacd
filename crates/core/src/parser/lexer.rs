//! Content stream tokenizer.
//!
//! Turns raw content stream bytes into the token sequence the interpreter
//! folds over. Tokenization is tolerant: malformed input is skipped rather
//! than reported, so a damaged stream still yields every operator that can
//! be recovered.

use crate::error::{PdfError, Result};

/// A content stream token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    String(Vec<u8>),
    /// A name without its leading `/`
    Name(String),
    ArrayStart,
    ArrayEnd,
    Operator(String),
}

impl Token {
    /// Convenience constructor for operator tokens.
    pub fn op(name: &str) -> Self {
        Self::Operator(name.to_string())
    }

    /// Convenience constructor for name tokens.
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// Tokenizer over one content stream.
pub struct ContentLexer<'a> {
    data: &'a [u8],
    pos: usize,
    /// Set after an `ID` operator: the next call skips inline image data.
    in_inline_data: bool,
}

impl<'a> ContentLexer<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            in_inline_data: false,
        }
    }

    /// Current byte offset.
    pub const fn tell(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance_one(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Reads the next token, or `None` at end of input.
    ///
    /// `Some(Err(_))` reports a malformed token; the lexer has already moved
    /// past it.
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        if self.in_inline_data {
            self.in_inline_data = false;
            self.skip_inline_data();
            return Some(Ok(Token::op("EI")));
        }

        loop {
            self.skip_whitespace();
            let start = self.pos;
            let b = self.peek()?;

            let result = match b {
                b'/' => self.parse_name(),
                b'(' => self.parse_string(),
                b'<' => {
                    if self.peek_at(1) == Some(b'<') {
                        // Dictionaries only occur as marked-content operands,
                        // which the interpreter ignores.
                        self.pos += 2;
                        continue;
                    }
                    self.parse_hex_string()
                }
                b'>' => {
                    self.pos += if self.peek_at(1) == Some(b'>') { 2 } else { 1 };
                    continue;
                }
                b'[' => {
                    self.pos += 1;
                    Ok(Token::ArrayStart)
                }
                b']' => {
                    self.pos += 1;
                    Ok(Token::ArrayEnd)
                }
                b'{' | b'}' | b')' => {
                    self.pos += 1;
                    continue;
                }
                b'+' | b'-' => {
                    if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') {
                        self.parse_number(start)
                    } else {
                        self.parse_keyword()
                    }
                }
                b'.' => {
                    if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
                        self.parse_number(start)
                    } else {
                        self.parse_keyword()
                    }
                }
                c if c.is_ascii_digit() => self.parse_number(start),
                _ => self.parse_keyword(),
            };

            return match result {
                Ok(Token::Operator(op)) => match op.as_str() {
                    "true" => Some(Ok(Token::Number(1.0))),
                    "false" => Some(Ok(Token::Number(0.0))),
                    "null" => continue,
                    "ID" => {
                        self.in_inline_data = true;
                        Some(Ok(Token::Operator(op)))
                    }
                    _ => Some(Ok(Token::Operator(op))),
                },
                other => Some(other),
            };
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                self.skip_comment();
            } else if is_whitespace(b) {
                self.pos += 1;
            } else {
                return;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.advance_one() {
            if b == b'\n' || b == b'\r' {
                break;
            }
        }
    }

    fn parse_name(&mut self) -> Result<Token> {
        self.pos += 1; // skip '/'
        let mut name = Vec::with_capacity(16);

        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            if b == b'#' {
                let h1 = self.peek_at(1).and_then(hex_value);
                let h2 = self.peek_at(2).and_then(hex_value);
                if let (Some(h1), Some(h2)) = (h1, h2) {
                    self.pos += 3;
                    name.push((h1 << 4) | h2);
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }

        Ok(Token::Name(String::from_utf8_lossy(&name).into_owned()))
    }

    fn parse_number(&mut self, start_pos: usize) -> Result<Token> {
        let mut negative = false;
        if self.peek() == Some(b'-') {
            negative = true;
            self.pos += 1;
        } else if self.peek() == Some(b'+') {
            self.pos += 1;
        }
        // Some producers emit doubled signs such as "--5".
        while matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }

        let mut int_part: f64 = 0.0;
        let mut has_int = false;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                has_int = true;
                int_part = int_part * 10.0 + f64::from(b - b'0');
                self.pos += 1;
            } else {
                break;
            }
        }

        let mut value = int_part;
        let mut frac_digits = 0;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            let mut scale = 0.1;
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() {
                    value += f64::from(b - b'0') * scale;
                    scale *= 0.1;
                    frac_digits += 1;
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }

        if !has_int && frac_digits == 0 {
            return Err(PdfError::TokenError {
                pos: start_pos,
                msg: "invalid number".into(),
            });
        }

        Ok(Token::Number(if negative { -value } else { value }))
    }

    fn parse_string(&mut self) -> Result<Token> {
        self.pos += 1; // skip '('
        let mut result = Vec::with_capacity(32);
        let mut depth = 1;

        while depth > 0 {
            match self.advance_one() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance_one() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(c) if (b'0'..b'8').contains(&c) => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d) if (b'0'..b'8').contains(&d) => {
                                    self.pos += 1;
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(Token::String(result))
    }

    fn parse_hex_string(&mut self) -> Result<Token> {
        self.pos += 1; // skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(c) if c.is_ascii_hexdigit() => {
                    self.pos += 1;
                    let nibble = hex_value(c).unwrap_or(0);
                    if let Some(high) = pending.take() {
                        result.push((high << 4) | nibble);
                    } else {
                        pending = Some(nibble);
                    }
                }
                Some(c) if is_whitespace(c) => self.pos += 1,
                Some(_) => break,
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // An odd trailing digit is padded with 0.
        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(Token::String(result))
    }

    fn parse_keyword(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            // Lone delimiter with no token meaning; step over it.
            self.pos += 1;
            return Err(PdfError::TokenError {
                pos: start,
                msg: "unexpected delimiter".into(),
            });
        }
        Ok(Token::Operator(
            String::from_utf8_lossy(&self.data[start..self.pos]).into_owned(),
        ))
    }

    /// Skips inline image bytes up to and including the `EI` marker.
    fn skip_inline_data(&mut self) {
        // A single whitespace byte separates ID from the data.
        if matches!(self.peek(), Some(b) if is_whitespace(b)) {
            self.pos += 1;
        }
        while self.pos < self.data.len() {
            let rest = &self.data[self.pos..];
            let preceded_by_ws = self.pos > 0 && is_whitespace(self.data[self.pos - 1]);
            if preceded_by_ws
                && rest.starts_with(b"EI")
                && rest.get(2).is_none_or(|&b| is_whitespace(b) || is_delimiter(b))
            {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }
}

impl Iterator for ContentLexer<'_> {
    type Item = Token;

    /// Yields well-formed tokens, skipping malformed ones.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_token()? {
                Ok(token) => return Some(token),
                Err(err) => {
                    tracing::trace!(%err, "skipping malformed token");
                    continue;
                }
            }
        }
    }
}

/// Tokenizes a whole content stream.
pub fn tokenize(data: &[u8]) -> Vec<Token> {
    ContentLexer::new(data).collect()
}

/// Check if byte is PDF whitespace.
const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_parse() {
        let tokens = tokenize(b"BT ET");
        assert_eq!(tokens, vec![Token::op("BT"), Token::op("ET")]);
    }

    #[test]
    fn test_name_hex_escape() {
        let tokens = tokenize(b"/A#20B");
        assert_eq!(tokens, vec![Token::name("A B")]);
    }

    #[test]
    fn test_unterminated_string_is_skipped() {
        let tokens = tokenize(b"1 0 0 RG (abc");
        assert_eq!(tokens.last(), Some(&Token::op("RG")));
    }
}
