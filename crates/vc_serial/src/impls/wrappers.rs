use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::info::{
    GenericDescriptorCell, NonGenericDescriptorCell, OptionalInfo, SharedInfo, TypeDescriptor,
    TypeKind, Typed, owner_ref, take_value,
};
use crate::{Dynamic, Reflect, Result};

// -----------------------------------------------------------------------------
// Option

fn option_get<T: Typed>(value: &dyn Reflect) -> Result<Option<&dyn Reflect>> {
    let option = owner_ref::<Option<T>>(value)?;
    Ok(option.as_ref().map(|inner| inner as &dyn Reflect))
}

fn option_some<T: Typed>(inner: Box<dyn Reflect>) -> Result<Box<dyn Reflect>> {
    Ok(Box::new(Some(take_value::<T>(inner)?)))
}

fn option_none<T: Typed>() -> Box<dyn Reflect> {
    Box::new(None::<T>)
}

impl<T: Typed> Typed for Option<T> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = OptionalInfo::new(
                T::type_descriptor,
                option_get::<T>,
                option_some::<T>,
                option_none::<T>,
            );
            TypeDescriptor::generic::<Self>(
                "core::option::Option",
                &[T::type_descriptor],
                TypeKind::Optional(info),
            )
            .with_constructor(option_none::<T>)
        })
    }
}

// -----------------------------------------------------------------------------
// Arc

fn arc_get<T: Typed>(value: &dyn Reflect) -> Result<(&dyn Reflect, usize)> {
    let shared = owner_ref::<Arc<T>>(value)?;
    Ok((&**shared as &dyn Reflect, Arc::as_ptr(shared).addr()))
}

fn arc_wrap<T: Typed>(pointee: Box<dyn Reflect>) -> Result<Box<dyn Reflect>> {
    Ok(Box::new(Arc::new(take_value::<T>(pointee)?)))
}

fn arc_share<T: Typed>(shared: &dyn Reflect) -> Result<Box<dyn Reflect>> {
    Ok(Box::new(Arc::clone(owner_ref::<Arc<T>>(shared)?)))
}

impl<T: Typed> Typed for Arc<T> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = SharedInfo::new(
                T::type_descriptor,
                arc_get::<T>,
                arc_wrap::<T>,
                arc_share::<T>,
            );
            TypeDescriptor::generic::<Self>(
                "alloc::sync::Arc",
                &[T::type_descriptor],
                TypeKind::Shared(info),
            )
        })
    }
}

// -----------------------------------------------------------------------------
// Dynamic

impl Typed for Dynamic {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
        CELL.get_or_init(|| {
            TypeDescriptor::new::<Self>("vc_serial::Dynamic", TypeKind::Dynamic)
                .with_default::<Self>()
        })
    }
}
