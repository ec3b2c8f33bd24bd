use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::marker::PhantomData;

use crate::info::{TypeDescriptor, Typed};
use crate::{Error, Reflect, Result};

// -----------------------------------------------------------------------------
// MemberValue

/// The current value of a member, either borrowed from its owner or computed.
pub enum MemberValue<'a> {
    Borrowed(&'a dyn Reflect),
    Owned(Box<dyn Reflect>),
}

impl MemberValue<'_> {
    #[inline]
    pub fn as_reflect(&self) -> &dyn Reflect {
        match self {
            MemberValue::Borrowed(value) => *value,
            MemberValue::Owned(value) => &**value,
        }
    }
}

// -----------------------------------------------------------------------------
// MemberAccess

/// Read/write capability of one member, independent of how it is stored.
pub trait MemberAccess: Send + Sync + 'static {
    /// Returns the member value of `owner`.
    fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<MemberValue<'a>>;

    /// Replaces the member value of `owner`.
    fn set(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()>;
}

pub(crate) fn owner_ref<O: Typed>(owner: &dyn Reflect) -> Result<&O> {
    owner.downcast_ref::<O>().ok_or_else(|| mismatch::<O>(owner))
}

pub(crate) fn owner_mut<O: Typed>(owner: &mut dyn Reflect) -> Result<&mut O> {
    let found = owner.descriptor();
    owner
        .downcast_mut::<O>()
        .ok_or_else(|| Error::TypeMismatch {
            expected: Cow::Borrowed(O::type_descriptor().path()),
            found: Cow::Borrowed(found.path()),
        })
}

pub(crate) fn take_value<F: Typed>(value: Box<dyn Reflect>) -> Result<F> {
    value.take::<F>().map_err(|value| mismatch::<F>(&*value))
}

#[cold]
pub(crate) fn mismatch<T: Typed>(found: &dyn Reflect) -> Error {
    Error::TypeMismatch {
        expected: Cow::Borrowed(T::type_descriptor().path()),
        found: Cow::Borrowed(found.descriptor().path()),
    }
}

/// Accessor of a stored field, through a pair of projection functions.
pub struct FieldAccess<O, F> {
    get: fn(&O) -> &F,
    get_mut: fn(&mut O) -> &mut F,
    _marker: PhantomData<fn(O) -> F>,
}

impl<O: Typed, F: Typed> MemberAccess for FieldAccess<O, F> {
    #[inline]
    fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<MemberValue<'a>> {
        Ok(MemberValue::Borrowed((self.get)(owner_ref::<O>(owner)?)))
    }

    fn set(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()> {
        let value = take_value::<F>(value)?;
        *(self.get_mut)(owner_mut::<O>(owner)?) = value;
        Ok(())
    }
}

/// Accessor of a computed member, through a getter and a setter closure.
pub struct PropertyAccess<O, F> {
    getter: Box<dyn Fn(&O) -> F + Send + Sync>,
    setter: Box<dyn Fn(&mut O, F) + Send + Sync>,
}

impl<O: Typed, F: Typed> MemberAccess for PropertyAccess<O, F> {
    fn get<'a>(&self, owner: &'a dyn Reflect) -> Result<MemberValue<'a>> {
        let value = (self.getter)(owner_ref::<O>(owner)?);
        Ok(MemberValue::Owned(Box::new(value)))
    }

    fn set(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()> {
        let value = take_value::<F>(value)?;
        (self.setter)(owner_mut::<O>(owner)?, value);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// MemberDescriptor

/// One serializable slot of a composite type.
///
/// Owned by the [`TypeDescriptor`] of its composite and never mutated after
/// creation; cloning only bumps the accessor's reference count.
#[derive(Clone)]
pub struct MemberDescriptor {
    name: &'static str,
    declared: fn() -> &'static TypeDescriptor,
    serializable: bool,
    access: Arc<dyn MemberAccess>,
}

impl MemberDescriptor {
    /// Creates a member from an arbitrary accessor.
    pub fn new<F: Typed>(name: &'static str, access: Arc<dyn MemberAccess>) -> Self {
        Self {
            name,
            declared: F::type_descriptor,
            serializable: true,
            access,
        }
    }

    /// Creates a member backed by a stored field.
    ///
    /// ```
    /// use vc_serial::info::MemberDescriptor;
    ///
    /// struct Pair { left: u8, right: u8 }
    ///
    /// # impl vc_serial::info::Typed for Pair {
    /// #     fn type_descriptor() -> &'static vc_serial::info::TypeDescriptor { unimplemented!() }
    /// # }
    /// let member = MemberDescriptor::field::<Pair, u8>("left", |p| &p.left, |p| &mut p.left);
    /// assert_eq!(member.name(), "left");
    /// assert_eq!(member.declared().path(), "u8");
    /// ```
    pub fn field<O: Typed, F: Typed>(
        name: &'static str,
        get: fn(&O) -> &F,
        get_mut: fn(&mut O) -> &mut F,
    ) -> Self {
        Self::new::<F>(
            name,
            Arc::new(FieldAccess {
                get,
                get_mut,
                _marker: PhantomData,
            }),
        )
    }

    /// Creates a member backed by a getter and a setter.
    pub fn property<O: Typed, F: Typed>(
        name: &'static str,
        getter: impl Fn(&O) -> F + Send + Sync + 'static,
        setter: impl Fn(&mut O, F) + Send + Sync + 'static,
    ) -> Self {
        Self::new::<F>(
            name,
            Arc::new(PropertyAccess {
                getter: Box::new(getter),
                setter: Box::new(setter),
            }),
        )
    }

    /// Marks the member as excluded from serialization.
    #[inline]
    pub fn with_serializable(mut self, serializable: bool) -> Self {
        self.serializable = serializable;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared (static) type of the member.
    #[inline]
    pub fn declared(&self) -> &'static TypeDescriptor {
        (self.declared)()
    }

    #[inline]
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    #[inline]
    pub fn access(&self) -> &dyn MemberAccess {
        &*self.access
    }

    #[inline]
    pub(crate) fn declared_fn(&self) -> fn() -> &'static TypeDescriptor {
        self.declared
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("declared", &self.declared().path())
            .field("serializable", &self.serializable)
            .finish_non_exhaustive()
    }
}
