use core::str::FromStr;

use rust_decimal::Decimal;

use crate::info::{TypeDescriptor, Typed};
use crate::json::token::TokenKind;
use crate::{Error, MalformedError, Result};

/// Picks the type of a number read into a [`Dynamic`](crate::Dynamic) slot.
///
/// The candidates are tried in a fixed widening order: `i16`, `i32`, `i64`,
/// finite `f32`, `Decimal`, `f64`. The first that parses wins, so a literal
/// such as `1` always comes back as `i16` and a fraction as `f32` when it
/// fits one.
pub(crate) fn widen(text: &str) -> Result<&'static TypeDescriptor> {
    if text.parse::<i16>().is_ok() {
        return Ok(i16::type_descriptor());
    }
    if text.parse::<i32>().is_ok() {
        return Ok(i32::type_descriptor());
    }
    if text.parse::<i64>().is_ok() {
        return Ok(i64::type_descriptor());
    }
    if text.parse::<f32>().is_ok_and(f32::is_finite) {
        return Ok(f32::type_descriptor());
    }
    if parse_decimal(text).is_ok() {
        return Ok(Decimal::type_descriptor());
    }
    if text.parse::<f64>().is_ok() {
        return Ok(f64::type_descriptor());
    }
    Err(MalformedError::InvalidNumber {
        kind: "number",
        text: text.into(),
    }
    .into())
}

/// Parses an integer literal of type `T`.
pub(crate) fn parse_integer<T: FromStr>(kind: TokenKind, text: &str, name: &'static str) -> Result<T> {
    if kind != TokenKind::Number {
        return Err(invalid(name, text));
    }
    text.parse().map_err(|_| invalid(name, text))
}

/// Parses a float from a number literal or from the strings written for
/// non-finite values.
pub(crate) fn parse_float<T: FromStr>(kind: TokenKind, text: &str, name: &'static str) -> Result<T> {
    let literal = match (kind, text) {
        (TokenKind::String, "NaN") => "NaN",
        (TokenKind::String, "Infinity") => "inf",
        (TokenKind::String, "-Infinity") => "-inf",
        (kind, text) if kind.is_number() => text,
        _ => return Err(invalid(name, text)),
    };
    literal.parse().map_err(|_| invalid(name, text))
}

/// Parses a decimal literal, keeping its scale.
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str_exact(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| invalid("decimal", text))
}

#[cold]
fn invalid(kind: &'static str, text: &str) -> Error {
    MalformedError::InvalidNumber {
        kind,
        text: text.into(),
    }
    .into()
}
