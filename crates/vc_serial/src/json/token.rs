use alloc::string::String;
use core::fmt;

use bitflags::bitflags;

// -----------------------------------------------------------------------------
// TokenKind

/// Classification of a JSON token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    Colon,
    Comma,
    String,
    /// A bare word that is neither a keyword nor a number.
    Literal,
    True,
    False,
    Null,
    /// Integer without exponent, e.g. `-12`.
    Number,
    /// Integer with exponent, e.g. `12e3`.
    NumberExp,
    /// Fraction without exponent, e.g. `1.5`.
    Float,
    /// Fraction with exponent, e.g. `1.5e-3`.
    FloatExp,
    End,
}

impl TokenKind {
    const ALL: [TokenKind; 16] = [
        TokenKind::BraceOpen,
        TokenKind::BraceClose,
        TokenKind::BracketOpen,
        TokenKind::BracketClose,
        TokenKind::Colon,
        TokenKind::Comma,
        TokenKind::String,
        TokenKind::Literal,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Null,
        TokenKind::Number,
        TokenKind::NumberExp,
        TokenKind::Float,
        TokenKind::FloatExp,
        TokenKind::End,
    ];

    /// Returns `true` for the four numeric kinds.
    #[inline]
    pub fn is_number(self) -> bool {
        TokenSet::NUMBERS.contains(self.into())
    }

    const fn describe(self) -> &'static str {
        match self {
            TokenKind::BraceOpen => "`{`",
            TokenKind::BraceClose => "`}`",
            TokenKind::BracketOpen => "`[`",
            TokenKind::BracketClose => "`]`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::String => "string",
            TokenKind::Literal => "literal",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Null => "`null`",
            TokenKind::Number => "number",
            TokenKind::NumberExp => "number with exponent",
            TokenKind::Float => "float",
            TokenKind::FloatExp => "float with exponent",
            TokenKind::End => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// -----------------------------------------------------------------------------
// TokenSet

bitflags! {
    /// A set of [`TokenKind`]s, used to report what a parser would have accepted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenSet: u16 {
        const BRACE_OPEN    = 1 << 0;
        const BRACE_CLOSE   = 1 << 1;
        const BRACKET_OPEN  = 1 << 2;
        const BRACKET_CLOSE = 1 << 3;
        const COLON         = 1 << 4;
        const COMMA         = 1 << 5;
        const STRING        = 1 << 6;
        const LITERAL       = 1 << 7;
        const TRUE          = 1 << 8;
        const FALSE         = 1 << 9;
        const NULL          = 1 << 10;
        const NUMBER        = 1 << 11;
        const NUMBER_EXP    = 1 << 12;
        const FLOAT         = 1 << 13;
        const FLOAT_EXP     = 1 << 14;
        const END           = 1 << 15;

        const NUMBERS = Self::NUMBER.bits()
            | Self::NUMBER_EXP.bits()
            | Self::FLOAT.bits()
            | Self::FLOAT_EXP.bits();
        const BOOLEANS = Self::TRUE.bits() | Self::FALSE.bits();
        /// Every token that can start a value.
        const VALUE = Self::BRACE_OPEN.bits()
            | Self::BRACKET_OPEN.bits()
            | Self::STRING.bits()
            | Self::BOOLEANS.bits()
            | Self::NULL.bits()
            | Self::NUMBERS.bits();
    }
}

impl From<TokenKind> for TokenSet {
    #[inline]
    fn from(kind: TokenKind) -> Self {
        TokenSet::from_bits_retain(1 << kind as u16)
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in TokenKind::ALL {
            if !self.contains(kind.into()) {
                continue;
            }
            if !first {
                f.write_str(" or ")?;
            }
            first = false;
            f.write_str(kind.describe())?;
        }
        if first {
            f.write_str("nothing")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Token

/// One token with its 1-based source position.
///
/// `text` holds the decoded content of strings and the raw text of literals;
/// it is empty for punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    #[inline]
    pub(crate) const fn punct(kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: String::new(),
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{TokenKind, TokenSet};

    #[test]
    fn kinds_map_to_their_flags() {
        assert_eq!(TokenSet::from(TokenKind::BraceOpen), TokenSet::BRACE_OPEN);
        assert_eq!(TokenSet::from(TokenKind::FloatExp), TokenSet::FLOAT_EXP);
        assert_eq!(TokenSet::from(TokenKind::End), TokenSet::END);
        assert!(TokenKind::NumberExp.is_number());
        assert!(!TokenKind::String.is_number());
    }

    #[test]
    fn sets_display_in_declaration_order() {
        let set = TokenSet::COMMA | TokenSet::BRACE_CLOSE;
        assert_eq!(set.to_string(), "`}` or `,`");
        assert_eq!(TokenSet::empty().to_string(), "nothing");
    }
}
