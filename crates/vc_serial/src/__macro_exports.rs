//! Items used by `#[derive(Reflect)]` expansions. Not public API.

#[doc(hidden)]
pub use alloc::vec::Vec;
#[doc(hidden)]
pub use core::concat;
#[doc(hidden)]
pub use core::module_path;

#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub mod auto_register {
    pub use inventory;

    use crate::info::Typed;
    use crate::registry::TypeRegistry;

    /// One statically submitted registration.
    pub struct __AutoRegisterFunc(pub fn(&mut TypeRegistry));

    inventory::collect!(__AutoRegisterFunc);

    /// Registers `T`; the derive submits this for every `auto_register` type.
    pub fn __register<T: Typed>(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }

    // Submitted by this crate so that a visit proves `inventory` works here.
    fn mark_available(registry: &mut TypeRegistry) {
        registry.mark_auto_registered();
    }

    inventory::submit! {
        __AutoRegisterFunc(mark_available)
    }

    pub(crate) fn register_types(registry: &mut TypeRegistry) {
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(registry);
        }
    }
}
