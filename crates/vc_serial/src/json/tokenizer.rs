use alloc::string::String;

use crate::json::token::{Token, TokenKind, TokenSet};
use crate::{Error, ParseError, Result};

/// Structural characters end a literal.
#[inline]
fn is_delimiter(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | ':' | ',' | '"') || is_whitespace(c)
}

#[inline]
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{feff}')
}

/// Classifies the raw text of a literal.
pub(crate) fn classify(text: &str) -> TokenKind {
    match text {
        "true" => return TokenKind::True,
        "false" => return TokenKind::False,
        "null" => return TokenKind::Null,
        _ => {}
    }

    let bytes = text.as_bytes();
    let mut pos = 0;
    let digits = |pos: &mut usize| {
        let start = *pos;
        while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
            *pos += 1;
        }
        *pos - start
    };

    if bytes.first() == Some(&b'-') {
        pos += 1;
    }
    if digits(&mut pos) == 0 {
        return TokenKind::Literal;
    }
    let mut fraction = false;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        if digits(&mut pos) == 0 {
            return TokenKind::Literal;
        }
        fraction = true;
    }
    let mut exponent = false;
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        if digits(&mut pos) == 0 {
            return TokenKind::Literal;
        }
        exponent = true;
    }
    if pos != bytes.len() {
        return TokenKind::Literal;
    }

    match (fraction, exponent) {
        (false, false) => TokenKind::Number,
        (false, true) => TokenKind::NumberExp,
        (true, false) => TokenKind::Float,
        (true, true) => TokenKind::FloatExp,
    }
}

// -----------------------------------------------------------------------------
// Tokenizer

/// Splits JSON text into tokens, one at a time, tracking line and column.
pub(crate) struct Tokenizer {
    text: String,
    pos: usize,
    line: usize,
    column: usize,
    peeked: Option<Token>,
}

impl Tokenizer {
    pub(crate) fn new(text: String) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    /// Returns the next token without consuming it.
    pub(crate) fn peek(&mut self) -> Result<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Returns the kind of the next token without consuming it.
    #[inline]
    pub(crate) fn peek_kind(&mut self) -> Result<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    pub(crate) fn next_token(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    /// Consumes the next token, failing unless its kind is in `expected`.
    pub(crate) fn expect(&mut self, expected: TokenSet) -> Result<Token> {
        let token = self.next_token()?;
        if expected.contains(token.kind.into()) {
            Ok(token)
        } else {
            Err(unexpected(&token, expected).into())
        }
    }

    // -------------------------------------------------------------------------
    // Characters

    #[inline]
    fn current(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes four hex digits, or nothing if they are not all there.
    fn hex4(&mut self) -> Option<u16> {
        let digits = self.text.get(self.pos..self.pos + 4)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let unit = u16::from_str_radix(digits, 16).ok()?;
        self.pos += 4;
        self.column += 4;
        Some(unit)
    }

    // -------------------------------------------------------------------------
    // Tokens

    fn scan(&mut self) -> Result<Token> {
        while self.current().is_some_and(is_whitespace) {
            self.bump();
        }
        let (line, column) = (self.line, self.column);
        let Some(c) = self.current() else {
            return Ok(Token::punct(TokenKind::End, line, column));
        };

        let kind = match c {
            '{' => TokenKind::BraceOpen,
            '}' => TokenKind::BraceClose,
            '[' => TokenKind::BracketOpen,
            ']' => TokenKind::BracketClose,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '"' => {
                self.bump();
                let text = self.scan_string()?;
                return Ok(Token {
                    kind: TokenKind::String,
                    text,
                    line,
                    column,
                });
            }
            _ => {
                let start = self.pos;
                while self.current().is_some_and(|c| !is_delimiter(c)) {
                    self.bump();
                }
                let text = String::from(&self.text[start..self.pos]);
                return Ok(Token {
                    kind: classify(&text),
                    text,
                    line,
                    column,
                });
            }
        };
        self.bump();
        Ok(Token::punct(kind, line, column))
    }

    fn scan_string(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.unterminated()),
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    None => return Err(self.unterminated()),
                    Some('b') => text.push('\u{8}'),
                    Some('f') => text.push('\u{c}'),
                    Some('n') => text.push('\n'),
                    Some('r') => text.push('\r'),
                    Some('t') => text.push('\t'),
                    Some('u') => self.scan_unicode_escape(&mut text),
                    // `\"`, `\\`, `\/` and unknown escapes stand for themselves.
                    Some(other) => text.push(other),
                },
                Some(c) => text.push(c),
            }
        }
    }

    /// Decodes the digits after `\u`.
    ///
    /// Without four hex digits the escape is kept as a plain `u`. Surrogate
    /// pairs are combined; an unpaired surrogate becomes U+FFFD.
    fn scan_unicode_escape(&mut self, text: &mut String) {
        let Some(unit) = self.hex4() else {
            text.push('u');
            return;
        };
        let decoded = match unit {
            0xD800..=0xDBFF => self.low_surrogate().and_then(|low| {
                let scalar = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                char::from_u32(scalar)
            }),
            0xDC00..=0xDFFF => None,
            _ => char::from_u32(u32::from(unit)),
        };
        text.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    /// Consumes `\uXXXX` if it is a low surrogate.
    fn low_surrogate(&mut self) -> Option<u16> {
        if !self.text[self.pos..].starts_with("\\u") {
            return None;
        }
        let (pos, column) = (self.pos, self.column);
        self.pos += 2;
        self.column += 2;
        match self.hex4() {
            Some(low @ 0xDC00..=0xDFFF) => Some(low),
            _ => {
                self.pos = pos;
                self.column = column;
                None
            }
        }
    }

    fn unterminated(&self) -> Error {
        ParseError {
            line: self.line,
            column: self.column,
            expected: TokenSet::STRING,
            found: TokenKind::End,
        }
        .into()
    }
}

/// Builds the diagnostic for `token` appearing where only `expected` is allowed.
pub(crate) fn unexpected(token: &Token, expected: TokenSet) -> ParseError {
    ParseError {
        line: token.line,
        column: token.column,
        expected,
        found: token.kind,
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::{Tokenizer, classify};
    use crate::json::token::{TokenKind, TokenSet};
    use crate::{Error, ParseError};

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(String::from(text));
        let mut kinds = Vec::new();
        loop {
            let token = tokenizer.next_token().unwrap();
            kinds.push(token.kind);
            if token.kind == TokenKind::End {
                return kinds;
            }
        }
    }

    fn decode(text: &str) -> String {
        let mut tokenizer = Tokenizer::new(String::from(text));
        tokenizer.expect(TokenSet::STRING).unwrap().text
    }

    #[test]
    fn literals_are_classified() {
        assert_eq!(classify("0"), TokenKind::Number);
        assert_eq!(classify("-42"), TokenKind::Number);
        assert_eq!(classify("4e10"), TokenKind::NumberExp);
        assert_eq!(classify("-0.5"), TokenKind::Float);
        assert_eq!(classify("1.5E+3"), TokenKind::FloatExp);
        assert_eq!(classify("true"), TokenKind::True);
        assert_eq!(classify("null"), TokenKind::Null);
        assert_eq!(classify("1."), TokenKind::Literal);
        assert_eq!(classify("-"), TokenKind::Literal);
        assert_eq!(classify("1e"), TokenKind::Literal);
        assert_eq!(classify("NaN"), TokenKind::Literal);
        assert_eq!(classify("0x10"), TokenKind::Literal);
    }

    #[test]
    fn punctuation_and_values() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{"a": [1, 2.5, true, null]}"#),
            [BraceOpen, String, Colon, BracketOpen, Number, Comma, Float, Comma, True, Comma, Null, BracketClose, BraceClose, End],
        );
        assert_eq!(kinds("  \n\t "), [End]);
    }

    #[test]
    fn positions_are_one_based() {
        let mut tokenizer = Tokenizer::new(String::from("{\n  \"key\": 7\n}"));
        let open = tokenizer.next_token().unwrap();
        assert_eq!((open.line, open.column), (1, 1));
        let key = tokenizer.next_token().unwrap();
        assert_eq!((key.line, key.column), (2, 3));
        let colon = tokenizer.next_token().unwrap();
        assert_eq!((colon.line, colon.column), (2, 8));
        let number = tokenizer.next_token().unwrap();
        assert_eq!((number.line, number.column, number.text.as_str()), (2, 10, "7"));
        let close = tokenizer.next_token().unwrap();
        assert_eq!((close.line, close.column), (3, 1));
    }

    #[test]
    fn escapes_are_decoded() {
        assert_eq!(decode(r#""a\"b\\c\/d""#), "a\"b\\c/d");
        assert_eq!(decode(r#""\b\f\n\r\t""#), "\u{8}\u{c}\n\r\t");
        assert_eq!(decode(r#""\u0041\u00e9""#), "Aé");
        assert_eq!(decode(r#""\ud83d\ude00""#), "😀");
    }

    #[test]
    fn malformed_unicode_escapes_degrade() {
        // Missing hex digits keep a literal `u`.
        assert_eq!(decode(r#""\uZZ""#), "uZZ");
        assert_eq!(decode(r#""\u12""#), "u12");
        // Unpaired surrogates become U+FFFD.
        assert_eq!(decode(r#""\ud83dx""#), "\u{fffd}x");
        assert_eq!(decode(r#""\ude00""#), "\u{fffd}");
        assert_eq!(decode(r#""\ud83dA""#), "\u{fffd}A");
    }

    #[test]
    fn unterminated_string_is_reported() {
        let mut tokenizer = Tokenizer::new(String::from("\"abc"));
        let err = tokenizer.next_token().unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError {
                line: 1,
                column: 5,
                found: TokenKind::End,
                ..
            })
        ));
    }

    #[test]
    fn expect_reports_the_allowed_set() {
        let mut tokenizer = Tokenizer::new(String::from("\n  :"));
        let err = tokenizer.expect(TokenSet::VALUE).unwrap_err();
        let Error::Parse(err) = err else { panic!("not a parse error: {err}") };
        assert_eq!((err.line, err.column), (2, 3));
        assert_eq!(err.found, TokenKind::Colon);
        assert_eq!(err.expected, TokenSet::VALUE);
    }
}
