use alloc::boxed::Box;
use core::fmt;
use core::net::{Ipv4Addr, SocketAddr};

use uuid::Uuid;

use crate::Reflect;
use crate::info::{ExtendedKind, NonGenericDescriptorCell, TypeDescriptor, TypeKind, Typed};

// -----------------------------------------------------------------------------
// TypeRef

/// A value naming a registered type.
///
/// Encoded as the full type path and resolved back through the reader's
/// [`TypeResolver`](crate::registry::TypeResolver).
///
/// ```
/// use vc_serial::impls::TypeRef;
///
/// let ty = TypeRef::of::<u64>();
/// assert_eq!(ty.get().path(), "u64");
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TypeRef(pub &'static TypeDescriptor);

impl TypeRef {
    #[inline]
    pub fn of<T: Typed>() -> Self {
        Self(T::type_descriptor())
    }

    #[inline]
    pub fn get(&self) -> &'static TypeDescriptor {
        self.0
    }
}

impl Default for TypeRef {
    #[inline]
    fn default() -> Self {
        Self::of::<()>()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.0.path()).finish()
    }
}

// -----------------------------------------------------------------------------
// Typed

fn nil_uuid() -> Box<dyn Reflect> {
    Box::new(Uuid::nil())
}

fn unspecified_addr() -> Box<dyn Reflect> {
    Box::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
}

impl Typed for Uuid {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
        CELL.get_or_init(|| {
            TypeDescriptor::new::<Self>("uuid::Uuid", TypeKind::Extended(ExtendedKind::Uuid))
                .with_constructor(nil_uuid)
        })
    }
}

impl Typed for SocketAddr {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
        CELL.get_or_init(|| {
            TypeDescriptor::new::<Self>(
                "core::net::SocketAddr",
                TypeKind::Extended(ExtendedKind::SocketAddr),
            )
            .with_constructor(unspecified_addr)
        })
    }
}

impl Typed for TypeRef {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
        CELL.get_or_init(|| {
            TypeDescriptor::new::<Self>(
                "vc_serial::impls::TypeRef",
                TypeKind::Extended(ExtendedKind::TypeRef),
            )
            .with_default::<Self>()
        })
    }
}
