use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::info::{TypeDescriptor, Typed};

// -----------------------------------------------------------------------------
// Reflect

/// A run-time value the engine can walk.
///
/// Automatically implemented for every [`Typed`] type, which in turn is
/// implemented by [`#[derive(Reflect)]`](crate::derive::Reflect) and by
/// this crate for the built-in value, collection and wrapper types.
///
/// # Examples
///
/// ```
/// use vc_serial::Reflect;
///
/// let value: Box<dyn Reflect> = Box::new(7_u16);
///
/// assert!(value.is::<u16>());
/// assert_eq!(value.descriptor().path(), "u16");
/// assert_eq!(value.take::<u16>().ok(), Some(7));
/// ```
pub trait Reflect: Any + Send + Sync {
    /// Returns the descriptor of the concrete run-time type.
    fn descriptor(&self) -> &'static TypeDescriptor;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn as_reflect(&self) -> &dyn Reflect;

    fn into_reflect(self: Box<Self>) -> Box<dyn Reflect>;
}

impl<T: Typed> Reflect for T {
    #[inline]
    fn descriptor(&self) -> &'static TypeDescriptor {
        T::type_descriptor()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    #[inline]
    fn into_reflect(self: Box<Self>) -> Box<dyn Reflect> {
        self
    }
}

impl dyn Reflect {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.descriptor().type_id() == TypeId::of::<T>()
    }

    /// Downcasts the value to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcasts the value to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Downcasts the value to type `T`, consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    pub fn downcast<T: Any>(self: Box<dyn Reflect>) -> Result<Box<T>, Box<dyn Reflect>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(value) => Ok(value),
            Err(_) => unreachable!("type is already checked"),
        }
    }

    /// Downcasts the value to type `T`, unboxing and consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    #[inline]
    pub fn take<T: Any>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        self.downcast::<T>().map(|value| *value)
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.descriptor().path())
    }
}

// -----------------------------------------------------------------------------
// Dynamic

/// A slot whose concrete type is only known at run time.
///
/// Codecs write type metadata for the held value (a binary type tag, or the
/// JSON `__type` discriminator for composites) so that it can be
/// reconstructed without a static type.
///
/// # Examples
///
/// ```
/// use vc_serial::Dynamic;
///
/// let slot = Dynamic::new(String::from("text"));
/// assert_eq!(slot.get().descriptor().ident(), "String");
/// assert_eq!(slot.downcast_ref::<String>().map(String::as_str), Some("text"));
/// ```
pub struct Dynamic(pub Box<dyn Reflect>);

impl Dynamic {
    #[inline]
    pub fn new<T: Reflect>(value: T) -> Self {
        Self(Box::new(value))
    }

    #[inline]
    pub fn get(&self) -> &dyn Reflect {
        &*self.0
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut dyn Reflect {
        &mut *self.0
    }

    #[inline]
    pub fn into_inner(self) -> Box<dyn Reflect> {
        self.0
    }

    /// Downcasts the held value by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl Default for Dynamic {
    #[inline]
    fn default() -> Self {
        Self(Box::new(()))
    }
}

impl From<Box<dyn Reflect>> for Dynamic {
    #[inline]
    fn from(value: Box<dyn Reflect>) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dynamic")
            .field(&self.0.descriptor().path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Dynamic, Reflect};
    use alloc::boxed::Box;
    use alloc::string::String;

    #[test]
    fn downcast_keeps_value_on_mismatch() {
        let value: Box<dyn Reflect> = Box::new(String::from("kept"));

        let value = value.downcast::<u32>().unwrap_err();
        assert_eq!(value.take::<String>().unwrap(), "kept");
    }

    #[test]
    fn dynamic_reports_inner_type() {
        let slot = Dynamic::new(5_i64);

        assert!(slot.get().is::<i64>());
        assert!(!slot.get().is::<Dynamic>());
        assert_eq!(slot.downcast_ref::<i64>(), Some(&5));
        assert!(Dynamic::default().get().is::<()>());
    }
}
