//! See [`Reflect`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Type Descriptor Derivation
///
/// `#[derive(Reflect)]` implements `Typed`, and through it `Reflect`, for a
/// struct with named fields or a unit struct. Every field becomes a member of
/// the composite, in declaration order.
///
/// Field types must implement `Typed`; type parameters get a `Typed` bound.
///
/// ## Type Attributes
///
/// ### Type Path
///
/// The full type path defaults to `module_path!()` followed by the type name.
/// It is what binary type tags and the JSON `__type` member carry, so a type
/// that must stay readable after being moved can pin it:
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// #[reflect(type_path = "shop::Order")]
/// struct Order { /* ... */ }
/// ```
///
/// For generic types the path names the definition; argument paths are
/// appended, e.g. `shop::Page<u32>`.
///
/// ### Nested Types
///
/// A type that is conceptually declared inside another one can say so; its
/// path becomes `declaring::Ident` and binary type tags encode it as nested:
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// #[reflect(nested_in = Order)]
/// struct Line { /* ... */ }
/// ```
///
/// `nested_in` conflicts with `type_path` and is not available on generic types.
///
/// ### Default Constructor
///
/// Readers create composites from their default constructor. The macro cannot
/// tell whether `Default` is implemented, so it has to be declared:
///
/// ```rust, ignore
/// #[derive(Reflect, Default)]
/// #[reflect(default)]
/// struct Order { /* ... */ }
/// ```
///
/// Without it, reading the type is reported as an unsupported shape.
///
/// ### Auto Registration
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// #[reflect(auto_register)]
/// struct Order { /* ... */ }
/// ```
///
/// Submits the type for `TypeRegistry::auto_register`. It has no effect on
/// generic types, or when the `auto_register` feature is disabled.
///
/// ## Field Attributes
///
/// - `#[reflect(skip)]`: the member is described but never serialized.
/// - `#[reflect(rename = "Name")]`: the member name used by the formats.
///
/// ```rust, ignore
/// #[derive(Reflect, Default)]
/// #[reflect(default)]
/// struct Node {
///     #[reflect(rename = "Name")]
///     name: String,
///     #[reflect(skip)]
///     cached_len: usize,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match derive_data::ReflectStruct::from_ast(&ast) {
        Ok(data) => impls::impl_reflect(&data).into(),
        Err(err) => err.into_compile_error().into(),
    }
}
