use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::codec::value::{read_extended, read_value};
use crate::codec::{FormatRead, MemberCursor, SharedRead};
use crate::info::{MapInfo, MemberDescriptor, SequenceInfo, TypeDescriptor, TypeKind};
use crate::registry::InstanceFactory;
use crate::{Dynamic, Error, MalformedError, MemberCatalog, ReadAction, Reflect, Result, SerialHooks};

/// Rebuilds an object graph from a [`FormatRead`].
///
/// Every slot yields `None` when the format skipped its content because of
/// the depth limit; the slot then keeps its default.
pub(crate) struct ObjectReader<'a> {
    format: &'a mut dyn FormatRead,
    hooks: &'a dyn SerialHooks,
    factory: &'a dyn InstanceFactory,
}

impl<'a> ObjectReader<'a> {
    #[inline]
    pub(crate) fn new(
        format: &'a mut dyn FormatRead,
        hooks: &'a dyn SerialHooks,
        factory: &'a dyn InstanceFactory,
    ) -> Self {
        Self {
            format,
            hooks,
            factory,
        }
    }

    /// Reads the top-level value; a skipped root falls back to its default.
    pub(crate) fn read_root(&mut self, ty: &'static TypeDescriptor) -> Result<Box<dyn Reflect>> {
        match self.read_slot(ty)? {
            Some(value) => Ok(value),
            None => self.factory.create(ty).map_err(|_| Error::DepthExceeded {
                limit: self.format.settings().depth_limit,
            }),
        }
    }

    pub(crate) fn read_slot(&mut self, declared: &'static TypeDescriptor) -> Result<Option<Box<dyn Reflect>>> {
        match declared.kind() {
            TypeKind::Value(kind) => read_value(self.format, *kind).map(Some),
            TypeKind::Extended(kind) => read_extended(self.format, *kind).map(Some),
            TypeKind::Sequence(info) => self.read_sequence(declared, info),
            TypeKind::Map(info) => self.read_map(declared, info),
            TypeKind::Optional(info) => {
                let inner = info.inner();
                if !self.format.read_presence(inner)? {
                    return Ok(Some(info.none()));
                }
                match self.read_slot(inner)? {
                    Some(value) => info.some(value).map(Some),
                    None => Ok(None),
                }
            }
            TypeKind::Shared(info) => match self.format.begin_shared()? {
                SharedRead::Null => Err(MalformedError::NullReference.into()),
                SharedRead::Existing(index) => {
                    let existing = self.format.shared_value(index)?;
                    let found = existing.descriptor();
                    if found != declared {
                        return Err(MalformedError::TypeTagMismatch {
                            expected: declared.path().into(),
                            found: found.path().into(),
                        }
                        .into());
                    }
                    info.share(existing).map(Some)
                }
                SharedRead::First(index) => {
                    let Some(pointee) = self.read_slot(info.pointee())? else {
                        return Ok(None);
                    };
                    let shared = info.wrap(pointee)?;
                    self.format.complete_shared(index, info.share(&*shared)?)?;
                    Ok(Some(shared))
                }
            },
            TypeKind::Dynamic => Ok(self
                .read_dynamic()?
                .map(|inner| Box::new(Dynamic(inner)) as Box<dyn Reflect>)),
            TypeKind::Composite(_) => self.read_composite(declared, false),
        }
    }

    fn read_dynamic(&mut self) -> Result<Option<Box<dyn Reflect>>> {
        let runtime = self.format.read_dynamic_type()?;
        let value = match runtime.kind() {
            TypeKind::Composite(_) => self.read_composite(runtime, true)?,
            _ => self.read_slot(runtime)?,
        };
        self.format.end_dynamic()?;
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Composites

    fn read_composite(&mut self, ty: &'static TypeDescriptor, dynamic: bool) -> Result<Option<Box<dyn Reflect>>> {
        if !self.format.begin_composite(ty, dynamic)? {
            return Ok(None);
        }
        let mut target = match self.factory.create(ty) {
            Ok(target) => target,
            Err(err) => match self.hooks.construction_failed(ty, &err) {
                Some(target) => target,
                None => return Err(err),
            },
        };

        let members = MemberCatalog::members_with(ty, self.hooks);
        let mut cursor = MemberCursor::default();
        while let Some(index) = self.format.next_member(ty, &members, &mut cursor)? {
            let member = &members[index];

            #[cfg(all(debug_assertions, feature = "debug"))]
            log::trace!("read `{}::{}`", ty.path(), member.name());

            self.read_member(ty, member, &mut *target)
                .map_err(|err| err.in_member(Cow::Borrowed(ty.path()), member.name()))?;
        }
        self.format.end_composite()?;
        Ok(Some(target))
    }

    fn read_member(
        &mut self,
        owner: &'static TypeDescriptor,
        member: &MemberDescriptor,
        target: &mut dyn Reflect,
    ) -> Result<()> {
        let action = self.hooks.before_read(owner, member);
        let value = match self.hooks.read_member(owner, member, &mut *self.format) {
            Some(value) => Some(value?),
            None => self.read_slot(member.declared())?,
        };
        // Skipped members are still decoded so the stream stays aligned.
        let Some(value) = value else { return Ok(()) };
        if action == ReadAction::Skip {
            return Ok(());
        }
        let value = self.hooks.after_read(owner, member, value);
        member.access().set(target, value)
    }

    // -------------------------------------------------------------------------
    // Collections

    fn read_sequence(
        &mut self,
        ty: &'static TypeDescriptor,
        info: &SequenceInfo,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let Some(mut cursor) = self.format.begin_sequence(ty)? else {
            return Ok(None);
        };
        let declared = info.element();
        let element = self.element_type(declared)?;

        let mut items = Vec::with_capacity(cursor.capacity_hint());
        while self.format.next_element(&mut cursor)? {
            if let Some(item) = self.read_element(declared, element)? {
                items.push(item);
            }
        }
        self.format.end_sequence()?;
        info.build().build(items).map(Some)
    }

    fn read_map(&mut self, ty: &'static TypeDescriptor, info: &MapInfo) -> Result<Option<Box<dyn Reflect>>> {
        let key_ty = info.key();
        let Some(mut cursor) = self.format.begin_map(ty, key_ty)? else {
            return Ok(None);
        };
        let declared = info.value();
        let element = self.element_type(declared)?;

        let mut entries = Vec::with_capacity(cursor.capacity_hint());
        while self.format.next_entry(&mut cursor)? {
            let key = self.read_slot(key_ty)?;
            self.format.begin_entry_value()?;
            let value = self.read_element(declared, element)?;
            self.format.end_entry()?;
            if let (Some(key), Some(value)) = (key, value) {
                entries.push((key, value));
            }
        }
        self.format.end_map()?;
        info.build().build(entries).map(Some)
    }

    fn element_type(&mut self, declared: &'static TypeDescriptor) -> Result<&'static TypeDescriptor> {
        if declared.is_dynamic() && self.format.carries_element_types() {
            self.format.read_element_type()
        } else {
            Ok(declared)
        }
    }

    fn read_element(
        &mut self,
        declared: &'static TypeDescriptor,
        element: &'static TypeDescriptor,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if declared.is_dynamic() && !element.is_dynamic() {
            let value = self.read_slot(element)?;
            Ok(value.map(|inner| Box::new(Dynamic(inner)) as Box<dyn Reflect>))
        } else {
            self.read_slot(declared)
        }
    }
}
