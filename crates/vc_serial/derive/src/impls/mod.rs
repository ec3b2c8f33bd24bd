//! Code generation.

// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod trait_typed;

// -----------------------------------------------------------------------------
// Internal API

use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ReflectStruct;

/// `Typed` implementation, plus the registration submission if requested.
pub(crate) fn impl_reflect(data: &ReflectStruct) -> TokenStream {
    let typed_impl = trait_typed::impl_trait_typed(data);
    let auto_register_impl = auto_register::get_auto_register_impl(data);

    quote! {
        #typed_impl

        #auto_register_impl
    }
}
