use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::codec::{FormatRead, FormatWrite};
use crate::info::{MemberDescriptor, TypeDescriptor};
use crate::{Error, Reflect, Result};

// -----------------------------------------------------------------------------
// Actions

/// Decision of [`SerialHooks::before_write`].
pub enum WriteAction {
    /// Write the current member value.
    Process,
    /// Do not write the member at all.
    Skip,
    /// Write this value in place of the current one.
    Substitute(Box<dyn Reflect>),
}

/// Decision of [`SerialHooks::before_read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAction {
    /// Decode the member and store it.
    Process,
    /// Decode the member to keep the stream aligned, then discard it.
    Skip,
}

// -----------------------------------------------------------------------------
// SerialHooks

/// Observer of a read or write call tree.
///
/// Passed explicitly to the codec entry points; `()` observes nothing.
/// Every method has a pass-through default, so an implementation only
/// overrides the events it cares about.
///
/// # Examples
///
/// ```
/// use vc_serial::{SerialHooks, WriteAction, Reflect};
/// use vc_serial::info::{MemberDescriptor, TypeDescriptor};
///
/// /// Never writes members named `secret`.
/// struct Redact;
///
/// impl SerialHooks for Redact {
///     fn before_write(
///         &self,
///         _owner: &'static TypeDescriptor,
///         member: &MemberDescriptor,
///         _value: &dyn Reflect,
///     ) -> WriteAction {
///         match member.name() {
///             "secret" => WriteAction::Substitute(Box::new(String::new())),
///             _ => WriteAction::Process,
///         }
///     }
/// }
/// ```
pub trait SerialHooks {
    /// Replaces the candidate member list of `owner` for this call.
    fn members(
        &self,
        owner: &'static TypeDescriptor,
        candidates: &[MemberDescriptor],
    ) -> Option<Vec<MemberDescriptor>> {
        let _ = (owner, candidates);
        None
    }

    /// Called before a member is written.
    fn before_write(
        &self,
        owner: &'static TypeDescriptor,
        member: &MemberDescriptor,
        value: &dyn Reflect,
    ) -> WriteAction {
        let _ = (owner, member, value);
        WriteAction::Process
    }

    /// Writes a member in place of the dispatcher.
    ///
    /// Returning `None` lets the dispatcher write it.
    fn write_member(
        &self,
        owner: &'static TypeDescriptor,
        member: &MemberDescriptor,
        value: &dyn Reflect,
        format: &mut dyn FormatWrite,
    ) -> Option<Result<()>> {
        let _ = (owner, member, value, format);
        None
    }

    /// Called after a member was written.
    fn after_write(&self, owner: &'static TypeDescriptor, member: &MemberDescriptor, value: &dyn Reflect) {
        let _ = (owner, member, value);
    }

    /// Called before a member is read.
    fn before_read(&self, owner: &'static TypeDescriptor, member: &MemberDescriptor) -> ReadAction {
        let _ = (owner, member);
        ReadAction::Process
    }

    /// Reads a member in place of the dispatcher.
    ///
    /// Returning `None` lets the dispatcher read it.
    fn read_member(
        &self,
        owner: &'static TypeDescriptor,
        member: &MemberDescriptor,
        format: &mut dyn FormatRead,
    ) -> Option<Result<Box<dyn Reflect>>> {
        let _ = (owner, member, format);
        None
    }

    /// Called with each decoded member value; the returned value is stored.
    fn after_read(
        &self,
        owner: &'static TypeDescriptor,
        member: &MemberDescriptor,
        value: Box<dyn Reflect>,
    ) -> Box<dyn Reflect> {
        let _ = (owner, member);
        value
    }

    /// Called when an instance of `ty` cannot be constructed.
    ///
    /// Returning an instance continues reading into it; `None` propagates `error`.
    fn construction_failed(&self, ty: &'static TypeDescriptor, error: &Error) -> Option<Box<dyn Reflect>> {
        let _ = (ty, error);
        None
    }
}

impl SerialHooks for () {}
