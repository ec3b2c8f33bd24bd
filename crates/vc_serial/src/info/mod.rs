//! Static type information.
//!
//! Every serializable type owns one [`TypeDescriptor`], reachable without an
//! instance through [`Typed`]. The descriptor classifies the type once, as a
//! [`TypeKind`], so the dispatcher never probes a type twice.

mod cell;
mod descriptor;
mod kinds;
mod member;
mod typed;

pub mod type_path;

pub use cell::{GenericDescriptorCell, NonGenericDescriptorCell};
pub use descriptor::{TypeDescriptor, TypeShape};
pub use kinds::{
    CollectionBuildStrategy, CompositeInfo, ExtendedKind, MapEntry, MapInfo, OptionalInfo,
    SequenceInfo, SharedInfo, TypeKind, ValueKind,
};
pub use member::{FieldAccess, MemberAccess, MemberDescriptor, MemberValue, PropertyAccess};
pub use typed::Typed;

pub(crate) use member::{mismatch, owner_ref, take_value};
