//! Construction of full type paths.
//!
//! Paths are the textual identity shared by the type registry, the binary
//! type tags and the JSON `__type` discriminator:
//!
//! - generic: `definition<A, B>`
//! - array: `[element; N]`
//! - nested: `declaring::ident`

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt::Write;

/// Returns the last `::` segment of a path without generic arguments.
pub fn ident_of(path: &'static str) -> &'static str {
    let base = match path.find('<') {
        Some(end) => &path[..end],
        None => path,
    };
    match base.rfind("::") {
        Some(start) => &base[start + 2..],
        None => base,
    }
}

pub fn generic_path<'a>(definition: &str, arguments: impl IntoIterator<Item = &'a str>) -> String {
    let mut path = String::with_capacity(definition.len() + 16);
    path.push_str(definition);
    path.push('<');
    for (index, argument) in arguments.into_iter().enumerate() {
        if index > 0 {
            path.push_str(", ");
        }
        path.push_str(argument);
    }
    path.push('>');
    path
}

pub fn array_path(element: &str, len: usize) -> String {
    let mut path = String::with_capacity(element.len() + 8);
    let _ = write!(path, "[{element}; {len}]");
    path
}

pub fn nested_path(declaring: &str, ident: &str) -> String {
    let mut path = String::with_capacity(declaring.len() + ident.len() + 2);
    path.push_str(declaring);
    path.push_str("::");
    path.push_str(ident);
    path
}

/// Turns a computed path into a `'static` one.
///
/// Descriptors are built once per type and never freed, so the leak is bounded
/// by the number of instantiated types.
#[inline]
pub(crate) fn leak(path: String) -> &'static str {
    Box::leak(path.into_boxed_str())
}
