use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::{ReflectStruct, StructField};

/// Generate implementation code for `Typed`.
///
/// Non-generic types store their descriptor in a `NonGenericDescriptorCell`,
/// generic ones in a `GenericDescriptorCell` keyed by instantiation. Member
/// types are referenced through `fn` pointers, so recursive types never
/// request their own descriptor while it is being built.
pub(crate) fn impl_trait_typed(data: &ReflectStruct) -> TokenStream {
    let vc_serial_path = data.vc_serial_path();
    let typed_ = crate::path::typed_(vc_serial_path);
    let type_descriptor_ = crate::path::type_descriptor_(vc_serial_path);

    let descriptor_tokens = descriptor_tokens(data);

    let cell_tokens = if data.is_generic() {
        let cell_ = crate::path::generic_cell_(vc_serial_path);
        quote! {
            static CELL: #cell_ = #cell_::new();
            CELL.get_or_insert::<Self>(|| {
                #descriptor_tokens
            })
        }
    } else {
        let cell_ = crate::path::non_generic_cell_(vc_serial_path);
        quote! {
            static CELL: #cell_ = #cell_::new();
            CELL.get_or_init(|| {
                #descriptor_tokens
            })
        }
    };

    let ident = data.ident();
    let (impl_generics, ty_generics, where_clause) = data.split_generics();

    quote! {
        impl #impl_generics #typed_ for #ident #ty_generics #where_clause {
            fn type_descriptor() -> &'static #type_descriptor_ {
                #cell_tokens
            }
        }
    }
}

/// The `TypeDescriptor` construction expression.
fn descriptor_tokens(data: &ReflectStruct) -> TokenStream {
    let vc_serial_path = data.vc_serial_path();
    let typed_ = crate::path::typed_(vc_serial_path);
    let type_descriptor_ = crate::path::type_descriptor_(vc_serial_path);
    let type_kind_ = crate::path::type_kind_(vc_serial_path);
    let composite_info_ = crate::path::composite_info_(vc_serial_path);
    let exports = crate::path::macro_exports_(vc_serial_path);

    let members = data.fields().iter().map(|field| member_tokens(data, field));
    let kind = quote! {
        #type_kind_::Composite(#composite_info_::new(
            #exports::Vec::from([#(#members),*])
        ))
    };

    let constructor = if data.is_generic() {
        let path = data.type_path();
        let arguments = data.type_params().map(|param| quote! { <#param as #typed_>::type_descriptor });
        quote! {
            #type_descriptor_::generic::<Self>(#path, &[#(#arguments),*], #kind)
        }
    } else if let Some(declaring) = &data.attrs().nested_in {
        let ident = syn::LitStr::new(&data.ident().to_string(), data.ident().span());
        quote! {
            #type_descriptor_::nested::<Self>(<#declaring as #typed_>::type_descriptor, #ident, #kind)
        }
    } else {
        let path = data.type_path();
        quote! {
            #type_descriptor_::new::<Self>(#path, #kind)
        }
    };

    let with_default = data.attrs().default.map(|_| {
        quote! { .with_default::<Self>() }
    });

    quote! {
        #constructor #with_default
    }
}

/// One `MemberDescriptor::field` expression.
fn member_tokens(data: &ReflectStruct, field: &StructField) -> TokenStream {
    let member_descriptor_ = crate::path::member_descriptor_(data.vc_serial_path());
    let name = field.member_name();
    let ident = field.ident;
    let ty = field.ty;

    let skip = field.attrs.skip.then(|| quote! { .with_serializable(false) });

    quote! {
        #member_descriptor_::field::<Self, #ty>(
            #name,
            |value| &value.#ident,
            |value| &mut value.#ident,
        )
        #skip
    }
}
