use alloc::borrow::Cow;
use alloc::boxed::Box;

use crate::codec::collection::{dynamic_inner, infer_element};
use crate::codec::value::{write_extended, write_value};
use crate::codec::{FormatWrite, SharedWrite};
use crate::info::{MapInfo, MemberDescriptor, SequenceInfo, TypeDescriptor, TypeKind};
use crate::{Error, MemberCatalog, Reflect, Result, SerialHooks, WriteAction};

/// Walks an object graph and drives a [`FormatWrite`].
pub(crate) struct ObjectWriter<'a> {
    format: &'a mut dyn FormatWrite,
    hooks: &'a dyn SerialHooks,
}

impl<'a> ObjectWriter<'a> {
    #[inline]
    pub(crate) fn new(format: &'a mut dyn FormatWrite, hooks: &'a dyn SerialHooks) -> Self {
        Self { format, hooks }
    }

    /// Writes `value` into a slot whose static type is `declared`.
    pub(crate) fn write_slot(&mut self, declared: &'static TypeDescriptor, value: &dyn Reflect) -> Result<()> {
        let found = value.descriptor();
        if found != declared {
            return Err(Error::TypeMismatch {
                expected: Cow::Borrowed(declared.path()),
                found: Cow::Borrowed(found.path()),
            });
        }

        match declared.kind() {
            TypeKind::Value(kind) => write_value(self.format, *kind, value),
            TypeKind::Extended(kind) => write_extended(self.format, *kind, value),
            TypeKind::Sequence(info) => self.write_sequence(declared, info, value),
            TypeKind::Map(info) => self.write_map(declared, info, value, false),
            TypeKind::Optional(info) => {
                let inner_ty = info.inner();
                match info.get(value)? {
                    Some(inner) => {
                        self.format.write_presence(inner_ty, true)?;
                        self.write_slot(inner_ty, inner)
                    }
                    None => self.format.write_presence(inner_ty, false),
                }
            }
            TypeKind::Shared(info) => {
                let (pointee, address) = info.get(value)?;
                match self.format.begin_shared(address)? {
                    SharedWrite::Reference => Ok(()),
                    SharedWrite::First => self.write_slot(info.pointee(), pointee),
                }
            }
            TypeKind::Dynamic => self.write_dynamic(dynamic_inner(value)?),
            TypeKind::Composite(_) => self.write_composite(declared, value, false),
        }
    }

    fn write_dynamic(&mut self, inner: &dyn Reflect) -> Result<()> {
        let runtime = inner.descriptor();
        self.format.begin_dynamic(runtime)?;
        match runtime.kind() {
            TypeKind::Composite(_) => self.write_composite(runtime, inner, true)?,
            TypeKind::Map(info) => self.write_map(runtime, info, inner, true)?,
            _ => self.write_slot(runtime, inner)?,
        }
        self.format.end_dynamic()
    }

    // -------------------------------------------------------------------------
    // Composites

    fn write_composite(&mut self, ty: &'static TypeDescriptor, value: &dyn Reflect, dynamic: bool) -> Result<()> {
        if !self.format.begin_composite(ty, dynamic)? {
            return Ok(());
        }
        let members = MemberCatalog::members_with(ty, self.hooks);
        for member in members.iter() {
            #[cfg(all(debug_assertions, feature = "debug"))]
            log::trace!("write `{}::{}`", ty.path(), member.name());

            self.write_member(ty, member, value)
                .map_err(|err| err.in_member(Cow::Borrowed(ty.path()), member.name()))?;
        }
        self.format.end_composite()
    }

    fn write_member(
        &mut self,
        owner: &'static TypeDescriptor,
        member: &MemberDescriptor,
        value: &dyn Reflect,
    ) -> Result<()> {
        let current = member.access().get(value)?;
        let substitute: Box<dyn Reflect>;
        let current: &dyn Reflect = match self.hooks.before_write(owner, member, current.as_reflect()) {
            WriteAction::Skip => return Ok(()),
            WriteAction::Process => current.as_reflect(),
            WriteAction::Substitute(value) => {
                substitute = value;
                &*substitute
            }
        };

        self.format.begin_member(member)?;
        match self.hooks.write_member(owner, member, current, &mut *self.format) {
            Some(written) => written?,
            None => self.write_slot(member.declared(), current)?,
        }
        self.format.end_member()?;

        self.hooks.after_write(owner, member, current);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Collections

    fn write_sequence(
        &mut self,
        ty: &'static TypeDescriptor,
        info: &SequenceInfo,
        value: &dyn Reflect,
    ) -> Result<()> {
        let items = info.items(value)?;
        let declared = info.element();
        let element = infer_element(declared, items.iter().copied())?;

        if !self.format.begin_sequence(ty, items.len())? {
            return Ok(());
        }
        let unwrap = self.begin_elements(declared, element)?;
        for (index, item) in items.into_iter().enumerate() {
            self.format.begin_element(index)?;
            self.write_element(declared, element, unwrap, item)?;
        }
        self.format.end_sequence()
    }

    fn write_map(
        &mut self,
        ty: &'static TypeDescriptor,
        info: &MapInfo,
        value: &dyn Reflect,
        dynamic: bool,
    ) -> Result<()> {
        let entries = info.entries(value)?;
        let key = info.key();
        let declared = info.value();
        infer_element(key, entries.iter().map(|(key, _)| *key))?;
        let element = infer_element(declared, entries.iter().map(|(_, value)| *value))?;

        if !self.format.begin_map(ty, key, entries.len(), dynamic)? {
            return Ok(());
        }
        let unwrap = self.begin_elements(declared, element)?;
        for (index, (entry_key, entry_value)) in entries.into_iter().enumerate() {
            self.format.begin_entry(index)?;
            self.write_slot(key, entry_key)?;
            self.format.begin_entry_value()?;
            self.write_element(declared, element, unwrap, entry_value)?;
            self.format.end_entry()?;
        }
        self.format.end_map()
    }

    /// Records the element type when the format carries one.
    ///
    /// Returns `true` if dynamic elements are written without their own metadata.
    fn begin_elements(
        &mut self,
        declared: &'static TypeDescriptor,
        element: &'static TypeDescriptor,
    ) -> Result<bool> {
        if declared.is_dynamic() && self.format.carries_element_types() {
            self.format.write_element_type(element)?;
            return Ok(!element.is_dynamic());
        }
        Ok(false)
    }

    fn write_element(
        &mut self,
        declared: &'static TypeDescriptor,
        element: &'static TypeDescriptor,
        unwrap: bool,
        item: &dyn Reflect,
    ) -> Result<()> {
        if unwrap {
            self.write_slot(element, dynamic_inner(item)?)
        } else {
            self.write_slot(declared, item)
        }
    }
}
