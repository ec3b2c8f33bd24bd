use proc_macro2::Span;
use syn::{Attribute, LitStr, Path};

use crate::REFLECT_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// Type-level `#[reflect(...)]` options.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `type_path = "..."`
    pub type_path: Option<LitStr>,
    /// `nested_in = Type`
    pub nested_in: Option<Path>,
    /// `default`
    pub default: Option<Span>,
    /// `auto_register`
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(REFLECT_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("type_path") {
                    set_once(&mut parsed.type_path, meta.value()?.parse()?, &meta.path)
                } else if meta.path.is_ident("nested_in") {
                    set_once(&mut parsed.nested_in, meta.value()?.parse()?, &meta.path)
                } else if meta.path.is_ident("default") {
                    set_once(&mut parsed.default, meta.input.span(), &meta.path)
                } else if meta.path.is_ident("auto_register") {
                    set_once(&mut parsed.auto_register, meta.input.span(), &meta.path)
                } else {
                    Err(meta.error(
                        "unknown type attribute, expected `type_path`, `nested_in`, `default` or `auto_register`",
                    ))
                }
            })?;
        }

        if let (Some(path), Some(_)) = (&parsed.type_path, &parsed.nested_in) {
            return Err(syn::Error::new(path.span(), "`type_path` conflicts with `nested_in`"));
        }
        if let Some(path) = &parsed.type_path
            && path.value().trim().is_empty()
        {
            return Err(syn::Error::new(path.span(), "`type_path` must not be empty"));
        }
        Ok(parsed)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// Field-level `#[reflect(...)]` options.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    /// `skip`
    pub skip: bool,
    /// `rename = "..."`
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(REFLECT_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    parsed.skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    set_once(&mut parsed.rename, meta.value()?.parse()?, &meta.path)
                } else {
                    Err(meta.error("unknown field attribute, expected `skip` or `rename`"))
                }
            })?;
        }
        Ok(parsed)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, path: &Path) -> syn::Result<()> {
    if slot.is_some() {
        let name = path.get_ident().map(ToString::to_string).unwrap_or_default();
        return Err(syn::Error::new_spanned(path, format!("duplicate `{name}` attribute")));
    }
    *slot = Some(value);
    Ok(())
}
