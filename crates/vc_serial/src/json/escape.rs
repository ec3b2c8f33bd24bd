use alloc::string::String;
use core::fmt::Write;

/// Appends `value` to `out` as a quoted JSON string.
///
/// Control characters use their short escape where one exists and `\u00XX`
/// otherwise. With `ascii_only`, every non-ASCII character is written as
/// `\uXXXX`, using a surrogate pair outside the basic plane.
pub(crate) fn quote_into(out: &mut String, value: &str, ascii_only: bool) {
    out.reserve(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => push_unit(out, c as u16),
            c if ascii_only && !c.is_ascii() => {
                let mut units = [0_u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_unit(out, *unit);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[inline]
fn push_unit(out: &mut String, unit: u16) {
    // Writing into a `String` cannot fail.
    let _ = write!(out, "\\u{unit:04x}");
}
