//! Error types shared by every codec.
//!
//! - [`Error`]: the single error returned by readers and writers.
//! - [`MalformedError`]: fatal stream-format errors, no recovery is attempted.
//! - [`ParseError`]: JSON token errors with full position diagnostics.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;

use thiserror::Error;

use crate::json::{TokenKind, TokenSet};

// -----------------------------------------------------------------------------
// Error

/// Errors produced while encoding or decoding an object graph.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },
    #[error("failed to process member `{member}` of `{owner}`")]
    Member {
        owner: Cow<'static, str>,
        member: &'static str,
        #[source]
        source: Box<Error>,
    },
    #[error("unsupported shape: {0}")]
    Unsupported(Cow<'static, str>),
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },
    #[error("required value of type `{0}` is missing")]
    MissingRequired(Cow<'static, str>),
    #[error("custom error: {0}")]
    Custom(String),
}

impl Error {
    /// Wraps `self` with the identity of the member being processed.
    #[cold]
    pub fn in_member(self, owner: Cow<'static, str>, member: &'static str) -> Self {
        Error::Member {
            owner,
            member,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through [`Error::Member`] wrappers.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Member { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns `true` if this error reports a shape the engine cannot handle.
    ///
    /// The `try_*` entry points turn such errors into "not handled" results.
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root_cause(), Error::Unsupported(_))
    }

    /// Returns the chain of member names from the outermost owner to the failing member.
    pub fn member_path(&self) -> alloc::vec::Vec<&'static str> {
        let mut path = alloc::vec::Vec::new();
        let mut current = self;
        while let Error::Member { member, source, .. } = current {
            path.push(*member);
            current = source;
        }
        path
    }
}

// -----------------------------------------------------------------------------
// MalformedError

/// Fatal stream-format errors.
///
/// These abort the current top-level operation; no partial result is guaranteed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedError {
    #[error("reference index {index} is not in the table (size {len})")]
    InvalidReference { index: u32, len: usize },
    #[error("reference index {0} refers to an instance that is still being read")]
    PendingReference(u32),
    #[error("null reference for a non-optional shared value")]
    NullReference,
    #[error("invalid element count: {0}")]
    InvalidCount(u64),
    #[error("invalid type tag: {0}")]
    InvalidTypeTag(u8),
    #[error("type metadata mismatch: expected `{expected}`, found `{found}`")]
    TypeTagMismatch { expected: String, found: String },
    #[error("varint exceeds {bits} bits")]
    VarintOverflow { bits: u32 },
    #[error("varint of {bits} bits has no terminating byte")]
    TruncatedVarint { bits: u32 },
    #[error("invalid bool encoding: {0}")]
    InvalidBool(u8),
    #[error("invalid char lead: {0}")]
    InvalidCharLead(u8),
    #[error("invalid char scalar value: {0:#x}")]
    InvalidChar(u32),
    #[error("invalid utf-8 sequence")]
    InvalidUtf8,
    #[error("unexpected member `{0}`")]
    UnexpectedMember(String),
    #[error("array length mismatch: expected {expected}, found {found}")]
    ArrayLength { expected: usize, found: usize },
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),
    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),
    #[error("expected a single character, found `{0}`")]
    CharLength(String),
    #[error("invalid uuid: {0}")]
    InvalidUuid(String),
    #[error("invalid network address: {0}")]
    InvalidAddress(String),
    #[error("invalid {kind} literal `{text}`")]
    InvalidNumber { kind: &'static str, text: String },
    #[error("invalid base64 payload")]
    InvalidBase64,
}

// -----------------------------------------------------------------------------
// ParseError

/// A JSON token appeared where it is not allowed.
///
/// Carries the 1-based position, the token kinds that were acceptable at that
/// position and the kind actually found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected {found} at line {line}, column {column}; expected {expected}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub expected: TokenSet,
    pub found: TokenKind,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
