use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::net::SocketAddr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::info::{MemberDescriptor, TypeDescriptor};
use crate::{Reflect, Result, Settings};

// -----------------------------------------------------------------------------
// Cursors and reference outcomes

/// Outcome of [`FormatWrite::begin_shared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedWrite {
    /// The instance was already written; only its reference was emitted.
    Reference,
    /// First occurrence; the pointee must be written now.
    First,
}

/// Outcome of [`FormatRead::begin_shared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedRead {
    /// The reserved null reference.
    Null,
    /// An instance already materialized in this session.
    Existing(u32),
    /// First occurrence; the pointee follows and must be completed under this index.
    First(u32),
}

/// Position inside a sequence or map being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCursor {
    /// Elements left, when the format prefixes a count.
    pub remaining: Option<usize>,
    /// Index of the next element.
    pub index: usize,
}

impl SequenceCursor {
    #[inline]
    pub const fn counted(count: usize) -> Self {
        Self {
            remaining: Some(count),
            index: 0,
        }
    }

    #[inline]
    pub const fn delimited() -> Self {
        Self {
            remaining: None,
            index: 0,
        }
    }

    /// Preallocation hint, bounded so a forged count cannot exhaust memory.
    #[inline]
    pub fn capacity_hint(&self) -> usize {
        self.remaining.unwrap_or(0).min(1024)
    }
}

/// Position inside a composite being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberCursor {
    /// Index of the next expected member slot.
    pub index: usize,
}

// -----------------------------------------------------------------------------
// FormatWrite

/// The encoding half of a concrete format.
///
/// The dispatcher walks the object graph and calls one method per primitive
/// and per structural marker; implementations only decide how those appear
/// in the output.
pub trait FormatWrite {
    fn settings(&self) -> &Settings;

    /// Clears per-call state (depth, reference table) before a top-level write.
    fn reset_session(&mut self);

    /// Completes a top-level write.
    fn finish_session(&mut self) -> Result<()>;

    fn write_unit(&mut self) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_i8(&mut self, value: i8) -> Result<()>;
    fn write_i16(&mut self, value: i16) -> Result<()>;
    fn write_i32(&mut self, value: i32) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_u8(&mut self, value: u8) -> Result<()>;
    fn write_u16(&mut self, value: u16) -> Result<()>;
    fn write_u32(&mut self, value: u32) -> Result<()>;
    fn write_u64(&mut self, value: u64) -> Result<()>;
    fn write_f32(&mut self, value: f32) -> Result<()>;
    fn write_f64(&mut self, value: f64) -> Result<()>;
    fn write_decimal(&mut self, value: Decimal) -> Result<()>;
    fn write_char(&mut self, value: char) -> Result<()>;
    fn write_str(&mut self, value: &str) -> Result<()>;
    fn write_bytes(&mut self, value: &[u8]) -> Result<()>;
    fn write_chars(&mut self, value: &[char]) -> Result<()>;
    fn write_date_time(&mut self, value: NaiveDateTime) -> Result<()>;

    fn write_uuid(&mut self, value: Uuid) -> Result<()>;
    fn write_socket_addr(&mut self, value: SocketAddr) -> Result<()>;
    fn write_type_ref(&mut self, ty: &'static TypeDescriptor) -> Result<()>;

    /// Marks whether an optional value of type `inner` is present.
    fn write_presence(&mut self, inner: &'static TypeDescriptor, present: bool) -> Result<()>;

    /// Starts a shared instance identified by `address`.
    fn begin_shared(&mut self, address: usize) -> Result<SharedWrite>;

    /// Starts a value whose type is not statically known.
    fn begin_dynamic(&mut self, runtime: &'static TypeDescriptor) -> Result<()>;

    fn end_dynamic(&mut self) -> Result<()> {
        Ok(())
    }

    /// Starts a composite. Returns `false` if its content must be omitted.
    ///
    /// `dynamic` is set when the composite fills a [`Dynamic`](crate::Dynamic) slot.
    fn begin_composite(&mut self, ty: &'static TypeDescriptor, dynamic: bool) -> Result<bool>;
    fn begin_member(&mut self, member: &MemberDescriptor) -> Result<()>;

    fn end_member(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_composite(&mut self) -> Result<()>;

    /// Starts a sequence of `len` elements. Returns `false` if its content must be omitted.
    fn begin_sequence(&mut self, ty: &'static TypeDescriptor, len: usize) -> Result<bool>;
    fn begin_element(&mut self, index: usize) -> Result<()>;
    fn end_sequence(&mut self) -> Result<()>;

    /// Starts a map of `len` entries. Returns `false` if its content must be omitted.
    ///
    /// `dynamic` is set when the map fills a [`Dynamic`](crate::Dynamic) slot.
    fn begin_map(
        &mut self,
        ty: &'static TypeDescriptor,
        key: &'static TypeDescriptor,
        len: usize,
        dynamic: bool,
    ) -> Result<bool>;
    fn begin_entry(&mut self, index: usize) -> Result<()>;
    fn begin_entry_value(&mut self) -> Result<()>;
    fn end_entry(&mut self) -> Result<()>;
    fn end_map(&mut self) -> Result<()>;

    /// Whether sequences of dynamic elements carry their inferred element type.
    fn carries_element_types(&self) -> bool;

    fn write_element_type(&mut self, ty: &'static TypeDescriptor) -> Result<()>;
}

// -----------------------------------------------------------------------------
// FormatRead

/// The decoding half of a concrete format, mirroring [`FormatWrite`].
pub trait FormatRead {
    fn settings(&self) -> &Settings;

    /// Clears per-call state before a top-level read.
    fn reset_session(&mut self);

    /// Completes a top-level read, failing on leftover state.
    fn finish_session(&mut self) -> Result<()>;

    fn read_unit(&mut self) -> Result<()>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_i8(&mut self) -> Result<i8>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_u8(&mut self) -> Result<u8>;
    fn read_u16(&mut self) -> Result<u16>;
    fn read_u32(&mut self) -> Result<u32>;
    fn read_u64(&mut self) -> Result<u64>;
    fn read_f32(&mut self) -> Result<f32>;
    fn read_f64(&mut self) -> Result<f64>;
    fn read_decimal(&mut self) -> Result<Decimal>;
    fn read_char(&mut self) -> Result<char>;
    fn read_string(&mut self) -> Result<String>;
    fn read_bytes(&mut self) -> Result<Vec<u8>>;
    fn read_chars(&mut self) -> Result<Vec<char>>;
    fn read_date_time(&mut self) -> Result<NaiveDateTime>;

    fn read_uuid(&mut self) -> Result<Uuid>;
    fn read_socket_addr(&mut self) -> Result<SocketAddr>;
    fn read_type_ref(&mut self) -> Result<&'static TypeDescriptor>;

    /// Returns whether an optional value of type `inner` is present.
    fn read_presence(&mut self, inner: &'static TypeDescriptor) -> Result<bool>;

    fn begin_shared(&mut self) -> Result<SharedRead>;

    /// Returns an instance completed earlier in this session.
    fn shared_value(&self, index: u32) -> Result<&dyn Reflect>;

    /// Stores the instance reserved by [`SharedRead::First`].
    fn complete_shared(&mut self, index: u32, value: Box<dyn Reflect>) -> Result<()>;

    /// Reads the run-time type of a [`Dynamic`](crate::Dynamic) slot.
    fn read_dynamic_type(&mut self) -> Result<&'static TypeDescriptor>;

    fn end_dynamic(&mut self) -> Result<()> {
        Ok(())
    }

    /// Starts a composite. Returns `false` if its content was skipped.
    fn begin_composite(&mut self, ty: &'static TypeDescriptor, dynamic: bool) -> Result<bool>;

    /// Returns the index in `members` of the next member present in the input.
    fn next_member(
        &mut self,
        owner: &'static TypeDescriptor,
        members: &[MemberDescriptor],
        cursor: &mut MemberCursor,
    ) -> Result<Option<usize>>;

    fn end_composite(&mut self) -> Result<()>;

    /// Starts a sequence. Returns `None` if its content was skipped.
    fn begin_sequence(&mut self, ty: &'static TypeDescriptor) -> Result<Option<SequenceCursor>>;
    fn next_element(&mut self, cursor: &mut SequenceCursor) -> Result<bool>;
    fn end_sequence(&mut self) -> Result<()>;

    /// Starts a map. Returns `None` if its content was skipped.
    fn begin_map(
        &mut self,
        ty: &'static TypeDescriptor,
        key: &'static TypeDescriptor,
    ) -> Result<Option<SequenceCursor>>;
    fn next_entry(&mut self, cursor: &mut SequenceCursor) -> Result<bool>;
    fn begin_entry_value(&mut self) -> Result<()>;
    fn end_entry(&mut self) -> Result<()>;
    fn end_map(&mut self) -> Result<()>;

    fn carries_element_types(&self) -> bool;

    fn read_element_type(&mut self) -> Result<&'static TypeDescriptor>;
}
