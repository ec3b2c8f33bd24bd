//! Type lookup and instance construction services used by readers.
//!
//! - [`TypeRegistry`]: registered descriptors, indexed by path.
//! - [`TypeResolver`]: the lookup-by-name seam readers depend on.
//! - [`InstanceFactory`]: the construct-default-instance seam.
//!
//! The `inventory` crate is used to implement static registration of types
//! annotated with `#[reflect(auto_register)]`, see [`TypeRegistry::auto_register`].

mod type_registry;

pub use type_registry::TypeRegistry;

use alloc::borrow::Cow;
use alloc::boxed::Box;

use crate::info::TypeDescriptor;
use crate::info::type_path::{array_path, generic_path, nested_path};
use crate::{Error, Reflect, Result};

// -----------------------------------------------------------------------------
// TypeResolver

/// Resolves type paths back to descriptors.
pub trait TypeResolver {
    /// Returns the type registered under `path`.
    fn resolve(&self, path: &str) -> Option<&'static TypeDescriptor>;

    /// Returns the number of type arguments of a generic definition.
    fn generic_arity(&self, definition: &str) -> Option<usize>;

    /// Resolves a closed generic instantiation from its parts.
    fn resolve_generic(
        &self,
        definition: &str,
        arguments: &[&'static TypeDescriptor],
    ) -> Option<&'static TypeDescriptor> {
        self.resolve(&generic_path(
            definition,
            arguments.iter().map(|argument| argument.path()),
        ))
    }

    fn resolve_array(&self, element: &TypeDescriptor, len: usize) -> Option<&'static TypeDescriptor> {
        self.resolve(&array_path(element.path(), len))
    }

    fn resolve_nested(&self, declaring: &TypeDescriptor, ident: &str) -> Option<&'static TypeDescriptor> {
        self.resolve(&nested_path(declaring.path(), ident))
    }

    /// Like [`resolve`](Self::resolve), with a missing path as an error.
    fn require(&self, path: &str) -> Result<&'static TypeDescriptor> {
        self.resolve(path)
            .ok_or_else(|| Error::UnknownType(path.into()))
    }
}

// -----------------------------------------------------------------------------
// InstanceFactory

/// Constructs the default instance a composite is read into.
pub trait InstanceFactory {
    fn create(&self, ty: &'static TypeDescriptor) -> Result<Box<dyn Reflect>>;
}

/// Uses the default constructor recorded in the descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl InstanceFactory for DefaultFactory {
    fn create(&self, ty: &'static TypeDescriptor) -> Result<Box<dyn Reflect>> {
        ty.construct().ok_or_else(|| {
            Error::Unsupported(Cow::Owned(alloc::format!(
                "`{}` has no default constructor",
                ty.path()
            )))
        })
    }
}
