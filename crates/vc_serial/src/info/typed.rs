use core::any::Any;

use crate::info::TypeDescriptor;

// -----------------------------------------------------------------------------
// Typed

/// A static accessor to the descriptor of a type.
///
/// Automatically implemented by [`#[derive(Reflect)]`](crate::derive::Reflect),
/// allowing access to type information without an instance of the type.
///
/// # Manually Impl
///
/// It is not recommended to implement manually, but [`NonGenericDescriptorCell`]
/// and [`GenericDescriptorCell`] make it short:
///
/// ```
/// use vc_serial::info::{
///     CompositeInfo, MemberDescriptor, NonGenericDescriptorCell,
///     TypeDescriptor, TypeKind, Typed,
/// };
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Typed for Point {
///     fn type_descriptor() -> &'static TypeDescriptor {
///         static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
///         CELL.get_or_init(|| {
///             TypeDescriptor::new::<Self>(
///                 "demo::Point",
///                 TypeKind::Composite(CompositeInfo::new(vec![
///                     MemberDescriptor::field::<Self, i32>("x", |p| &p.x, |p| &mut p.x),
///                     MemberDescriptor::field::<Self, i32>("y", |p| &p.y, |p| &mut p.y),
///                 ])),
///             )
///             .with_default::<Self>()
///         })
///     }
/// }
///
/// let info = Point::type_descriptor();
/// assert_eq!(info.ident(), "Point");
/// assert_eq!(info.as_composite().unwrap().members().len(), 2);
/// ```
///
/// [`NonGenericDescriptorCell`]: crate::info::NonGenericDescriptorCell
/// [`GenericDescriptorCell`]: crate::info::GenericDescriptorCell
pub trait Typed: Any + Send + Sync + Sized {
    /// Returns the descriptor of `Self`, built once for the process lifetime.
    fn type_descriptor() -> &'static TypeDescriptor;
}
