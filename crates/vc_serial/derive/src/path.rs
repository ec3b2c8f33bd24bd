//! Paths of the `vc_serial` items used by generated code, in one place so
//! that moving an item only touches this module.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the access path to the `vc_serial` crate.
///
/// 1. For crates that depend on `vc_serial`, `::vc_serial` is returned.
/// 2. For crates that depend on the `vc_codec` facade, `::vc_codec::serial` is returned.
/// 3. Otherwise `::vc_serial`, which `vc_serial` itself aliases to `crate`.
///
/// This reads the caller's manifest, so it is called once per derive.
pub(crate) fn vc_serial() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_serial"))
}

#[inline(always)]
pub(crate) fn macro_exports_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::__macro_exports }
}

#[inline(always)]
pub(crate) fn typed_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::Typed }
}

#[inline(always)]
pub(crate) fn type_descriptor_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::TypeDescriptor }
}

#[inline(always)]
pub(crate) fn type_kind_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::TypeKind }
}

#[inline(always)]
pub(crate) fn composite_info_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::CompositeInfo }
}

#[inline(always)]
pub(crate) fn member_descriptor_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::MemberDescriptor }
}

#[inline(always)]
pub(crate) fn non_generic_cell_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::NonGenericDescriptorCell }
}

#[inline(always)]
pub(crate) fn generic_cell_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::GenericDescriptorCell }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::__macro_exports::auto_register }
}
