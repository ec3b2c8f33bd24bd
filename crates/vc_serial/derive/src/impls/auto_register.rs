use proc_macro2::TokenStream;

use crate::derive_data::ReflectStruct;

/// Generate the `inventory` submission for `#[reflect(auto_register)]`.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(data: &ReflectStruct) -> TokenStream {
    let Some(span) = data.attrs().auto_register else {
        return TokenStream::new();
    };
    // Invalid for generic types.
    if data.is_generic() {
        return TokenStream::new();
    }

    let auto_register_ = crate::path::auto_register_(data.vc_serial_path());
    let ident = data.ident();

    quote::quote_spanned! { span =>
        #auto_register_::inventory::submit! {
            #auto_register_::__AutoRegisterFunc(#auto_register_::__register::<#ident>)
        }
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &ReflectStruct) -> TokenStream {
    TokenStream::new()
}
