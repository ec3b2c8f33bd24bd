use alloc::borrow::Cow;
use alloc::format;

use crate::info::{TypeDescriptor, Typed, owner_ref};
use crate::{Dynamic, Error, Reflect, Result};

/// Returns the value held by a [`Dynamic`] slot.
#[inline]
pub(crate) fn dynamic_inner(slot: &dyn Reflect) -> Result<&dyn Reflect> {
    Ok(owner_ref::<Dynamic>(slot)?.get())
}

/// Picks the element type recorded for a sequence or map.
///
/// A concrete declared type must match every element. For [`Dynamic`]
/// elements, a single common run-time type is used when all elements agree
/// and the declared type otherwise.
pub(crate) fn infer_element<'a>(
    declared: &'static TypeDescriptor,
    items: impl IntoIterator<Item = &'a dyn Reflect>,
) -> Result<&'static TypeDescriptor> {
    if !declared.is_dynamic() {
        for item in items {
            let found = item.descriptor();
            if found != declared {
                return Err(Error::Unsupported(Cow::Owned(format!(
                    "element of type `{found}` in a collection of `{declared}`"
                ))));
            }
        }
        return Ok(declared);
    }

    let mut common: Option<&'static TypeDescriptor> = None;
    for item in items {
        let runtime = dynamic_inner(item)?.descriptor();
        match common {
            None => common = Some(runtime),
            Some(current) if current == runtime => {}
            Some(_) => return Ok(declared),
        }
    }
    Ok(common.unwrap_or(Dynamic::type_descriptor()))
}
