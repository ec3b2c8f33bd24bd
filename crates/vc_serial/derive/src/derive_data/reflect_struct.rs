use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericParam, Generics, Ident, LitStr, Path, Type};

use super::{FieldAttributes, TypeAttributes};

/// A named field of the derived struct.
pub(crate) struct StructField<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub attrs: FieldAttributes,
}

impl StructField<'_> {
    /// The member name the formats use.
    pub fn member_name(&self) -> LitStr {
        match &self.attrs.rename {
            Some(name) => name.clone(),
            None => {
                let ident = self.ident.to_string();
                let name = ident.strip_prefix("r#").unwrap_or(&ident);
                LitStr::new(name, self.ident.span())
            }
        }
    }
}

/// Everything the derive needs to know about the input struct.
pub(crate) struct ReflectStruct<'a> {
    vc_serial_path: Path,
    ident: &'a Ident,
    generics: &'a Generics,
    attrs: TypeAttributes,
    fields: Vec<StructField<'a>>,
}

impl<'a> ReflectStruct<'a> {
    pub fn from_ast(ast: &'a DeriveInput) -> syn::Result<Self> {
        let attrs = TypeAttributes::parse(&ast.attrs)?;

        let fields = match &ast.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named
                    .named
                    .iter()
                    .map(|field| {
                        Ok(StructField {
                            // Named fields always have an ident.
                            ident: field.ident.as_ref().ok_or_else(|| {
                                syn::Error::new_spanned(field, "expected a named field")
                            })?,
                            ty: &field.ty,
                            attrs: FieldAttributes::parse(&field.attrs)?,
                        })
                    })
                    .collect::<syn::Result<Vec<_>>>()?,
                Fields::Unit => Vec::new(),
                Fields::Unnamed(unnamed) => {
                    return Err(syn::Error::new_spanned(
                        unnamed,
                        "`Reflect` cannot be derived for tuple structs, use named fields",
                    ));
                }
            },
            Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span,
                    "`Reflect` cannot be derived for enums",
                ));
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span,
                    "`Reflect` cannot be derived for unions",
                ));
            }
        };

        if let Some(param) = ast.generics.params.iter().find(|param| !matches!(param, GenericParam::Type(_))) {
            return Err(syn::Error::new_spanned(
                param,
                "`Reflect` only supports type parameters",
            ));
        }
        if let Some(nested_in) = &attrs.nested_in
            && !ast.generics.params.is_empty()
        {
            return Err(syn::Error::new_spanned(
                nested_in,
                "`nested_in` is not available on generic types",
            ));
        }

        Ok(Self {
            vc_serial_path: crate::path::vc_serial(),
            ident: &ast.ident,
            generics: &ast.generics,
            attrs,
            fields,
        })
    }

    #[inline]
    pub fn vc_serial_path(&self) -> &Path {
        &self.vc_serial_path
    }

    #[inline]
    pub fn ident(&self) -> &Ident {
        self.ident
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn fields(&self) -> &[StructField<'a>] {
        &self.fields
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generics.params.is_empty()
    }

    /// The type's own path: the explicit `type_path` or `module_path!()::Ident`.
    pub fn type_path(&self) -> TokenStream {
        match &self.attrs.type_path {
            Some(path) => quote! { #path },
            None => {
                let exports = crate::path::macro_exports_(&self.vc_serial_path);
                let ident = LitStr::new(&self.ident.to_string(), Span::call_site());
                quote! { #exports::concat!(#exports::module_path!(), "::", #ident) }
            }
        }
    }

    /// Impl generics, type generics and a where clause bounding every type
    /// parameter by `Typed`.
    ///
    /// A generic type with `default` is also bounded by `Default`, which a
    /// derived `Default` only provides for some instantiations.
    pub fn split_generics(&self) -> (TokenStream, TokenStream, TokenStream) {
        let typed_ = crate::path::typed_(&self.vc_serial_path);
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        let existing = where_clause.map(|clause| {
            let predicates = clause.predicates.iter();
            quote! { #(#predicates,)* }
        });
        let bounds = self.generics.type_params().map(|param| {
            let ident = &param.ident;
            quote! { #ident: #typed_, }
        });
        let ident = self.ident;
        let default_bound = (self.is_generic() && self.attrs.default.is_some())
            .then(|| quote! { #ident #ty_generics: ::core::default::Default, });

        (
            quote! { #impl_generics },
            quote! { #ty_generics },
            quote! { where #existing #(#bounds)* #default_bound },
        )
    }

    /// Type parameters, in declaration order.
    pub fn type_params(&self) -> impl Iterator<Item = &Ident> {
        self.generics.type_params().map(|param| &param.ident)
    }
}
