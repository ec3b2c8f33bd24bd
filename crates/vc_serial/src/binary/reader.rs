use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::io::{ErrorKind, Read};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::binary::decimal_from_words;
use crate::binary::references::ReadReferences;
use crate::binary::varint::decode_varint;
use crate::codec::{self, FormatRead, MemberCursor, SequenceCursor, SharedRead};
use crate::impls::ticks_to_date_time;
use crate::info::{MemberDescriptor, TypeDescriptor, TypeKind, Typed};
use crate::registry::{DefaultFactory, InstanceFactory, TypeResolver};
use crate::{Error, MalformedError, Reflect, Result, SerialHooks, Settings};

// -----------------------------------------------------------------------------
// BinaryReader

/// Reads object graphs written by [`BinaryWriter`](super::BinaryWriter).
///
/// Type tags of dynamic slots are resolved through `resolver`; composites are
/// created through an [`InstanceFactory`], [`DefaultFactory`] unless replaced.
///
/// # Examples
///
/// ```
/// use vc_serial::Settings;
/// use vc_serial::binary::{BinaryReader, to_bytes};
/// use vc_serial::registry::TypeRegistry;
///
/// let settings = Settings::new();
/// let bytes = to_bytes(&vec![1_u16, 2, 3], &settings).unwrap();
///
/// let registry = TypeRegistry::new();
/// let mut reader = BinaryReader::new(bytes.as_slice(), settings, &registry);
/// assert_eq!(reader.read::<Vec<u16>>().unwrap(), [1, 2, 3]);
/// ```
pub struct BinaryReader<'r, R> {
    input: R,
    peeked: Option<u8>,
    settings: Settings,
    pub(super) resolver: &'r dyn TypeResolver,
    factory: &'r dyn InstanceFactory,
    depth: usize,
    references: ReadReferences,
    /// Reference index already consumed as a presence marker.
    pending_reference: Option<u32>,
    /// Member name read for a slot it did not match.
    pending_name: Option<String>,
}

impl<'r, R: Read> BinaryReader<'r, R> {
    pub fn new(input: R, settings: Settings, resolver: &'r dyn TypeResolver) -> Self {
        Self {
            input,
            peeked: None,
            settings,
            resolver,
            factory: &DefaultFactory,
            depth: 0,
            references: ReadReferences::new(),
            pending_reference: None,
            pending_name: None,
        }
    }

    /// Replaces the factory composites are created with.
    #[inline]
    pub fn with_factory(mut self, factory: &'r dyn InstanceFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Reads one value of type `T`.
    #[inline]
    pub fn read<T: Typed>(&mut self) -> Result<T> {
        self.read_with(&())
    }

    /// Reads one value of type `T`, reporting every member to `hooks`.
    pub fn read_with<T: Typed>(&mut self, hooks: &dyn SerialHooks) -> Result<T> {
        let factory = self.factory;
        codec::read_object(self, hooks, factory)
    }

    /// Reads one value of type `ty`, or `None` if the shape is unsupported.
    pub fn try_read(&mut self, ty: &'static TypeDescriptor) -> Result<Option<Box<dyn Reflect>>> {
        self.try_read_with(ty, &())
    }

    pub fn try_read_with(
        &mut self,
        ty: &'static TypeDescriptor,
        hooks: &dyn SerialHooks,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let factory = self.factory;
        codec::try_read_object(self, ty, hooks, factory)
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.input
    }

    // -------------------------------------------------------------------------
    // Raw input

    pub(super) fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        let mut buf = [0_u8; 1];
        self.input.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(());
        };
        match self.peeked.take() {
            Some(byte) => {
                *first = byte;
                self.input.read_exact(rest)?;
            }
            None => self.input.read_exact(buf)?,
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0_u8; N];
        self.read_raw(&mut buf)?;
        Ok(buf)
    }

    /// Reads `len` bytes without trusting `len` for preallocation.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(4096));
        if len > 0
            && let Some(byte) = self.peeked.take()
        {
            buf.push(byte);
        }
        let rest = (len - buf.len()) as u64;
        Read::by_ref(&mut self.input).take(rest).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(std::io::Error::from(ErrorKind::UnexpectedEof).into());
        }
        Ok(buf)
    }

    /// Returns `true` if the input has no more bytes.
    fn at_end(&mut self) -> Result<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        let mut buf = [0_u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(true),
                Ok(_) => {
                    self.peeked = Some(buf[0]);
                    return Ok(false);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    #[inline]
    fn read_varint(&mut self, bits: u32) -> Result<u64> {
        decode_varint(bits, || self.read_byte())
    }

    pub(super) fn read_len(&mut self) -> Result<usize> {
        let len = self.read_varint(32)?;
        if len > i32::MAX as u64 {
            return Err(MalformedError::InvalidCount(len).into());
        }
        Ok(len as usize)
    }

    fn read_fixed_u32(&mut self) -> Result<u32> {
        let buf = self.read_array::<4>()?;
        Ok(if self.settings.little_endian {
            u32::from_le_bytes(buf)
        } else {
            u32::from_be_bytes(buf)
        })
    }

    pub(super) fn read_utf8(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let bytes = self.read_vec(len)?;
        String::from_utf8(bytes).map_err(|_| MalformedError::InvalidUtf8.into())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.settings.depth_limit {
            return Err(Error::DepthExceeded {
                limit: self.settings.depth_limit,
            });
        }
        Ok(())
    }

    #[inline]
    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn next_name(&mut self) -> Result<Option<String>> {
        if let Some(name) = self.pending_name.take() {
            return Ok(Some(name));
        }
        // Trailing members of the last value may be absent.
        if self.at_end()? {
            return Ok(None);
        }
        self.read_utf8().map(Some)
    }
}

macro_rules! read_integer {
    ($name:ident, $ty:ty, $unsigned:ty, $bits:literal) => {
        fn $name(&mut self) -> Result<$ty> {
            if self.settings.encode_integers_as_varint {
                return Ok(self.read_varint($bits)? as $unsigned as $ty);
            }
            let buf = self.read_array::<{ $bits / 8 }>()?;
            Ok(if self.settings.little_endian {
                <$ty>::from_le_bytes(buf)
            } else {
                <$ty>::from_be_bytes(buf)
            })
        }
    };
}

macro_rules! read_float {
    ($name:ident, $ty:ty, $bits:ty) => {
        fn $name(&mut self) -> Result<$ty> {
            let buf = self.read_array::<{ size_of::<$bits>() }>()?;
            let bits = if self.settings.little_endian {
                <$bits>::from_le_bytes(buf)
            } else {
                <$bits>::from_be_bytes(buf)
            };
            Ok(<$ty>::from_bits(bits))
        }
    };
}

// -----------------------------------------------------------------------------
// FormatRead

impl<R: Read> FormatRead for BinaryReader<'_, R> {
    #[inline]
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn reset_session(&mut self) {
        self.depth = 0;
        self.references.clear();
        self.pending_reference = None;
        self.pending_name = None;
    }

    fn finish_session(&mut self) -> Result<()> {
        match self.pending_name.take() {
            Some(name) => Err(MalformedError::UnexpectedMember(name).into()),
            None => Ok(()),
        }
    }

    #[inline]
    fn read_unit(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MalformedError::InvalidBool(other).into()),
        }
    }

    #[inline]
    fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes([self.read_byte()?]))
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    read_integer!(read_i16, i16, u16, 16);
    read_integer!(read_i32, i32, u32, 32);
    read_integer!(read_i64, i64, u64, 64);
    read_integer!(read_u16, u16, u16, 16);
    read_integer!(read_u32, u32, u32, 32);
    read_integer!(read_u64, u64, u64, 64);

    read_float!(read_f32, f32, u32);
    read_float!(read_f64, f64, u64);

    fn read_decimal(&mut self) -> Result<Decimal> {
        let lo = self.read_fixed_u32()?;
        let mid = self.read_fixed_u32()?;
        let hi = self.read_fixed_u32()?;
        let flags = self.read_fixed_u32()?;
        decimal_from_words([lo, mid, hi, flags])
    }

    fn read_char(&mut self) -> Result<char> {
        let lead = self.read_byte()?;
        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(MalformedError::InvalidCharLead(lead).into()),
        };
        let mut buf = [lead, 0, 0, 0];
        self.read_raw(&mut buf[1..width])?;
        core::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|text| text.chars().next())
            .ok_or_else(|| MalformedError::InvalidUtf8.into())
    }

    #[inline]
    fn read_string(&mut self) -> Result<String> {
        self.read_utf8()
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_vec(len)
    }

    fn read_chars(&mut self) -> Result<Vec<char>> {
        Ok(self.read_utf8()?.chars().collect())
    }

    fn read_date_time(&mut self) -> Result<NaiveDateTime> {
        let ticks = self.read_i64()?;
        ticks_to_date_time(ticks)
    }

    fn read_uuid(&mut self) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.read_array::<16>()?))
    }

    fn read_socket_addr(&mut self) -> Result<SocketAddr> {
        let ip = match self.read_len()? {
            4 => Ipv4Addr::from(self.read_array::<4>()?).into(),
            16 => Ipv6Addr::from(self.read_array::<16>()?).into(),
            len => {
                return Err(MalformedError::InvalidAddress(alloc::format!("address length {len}")).into());
            }
        };
        let port = self.read_i32()?;
        let port = u16::try_from(port)
            .map_err(|_| MalformedError::InvalidAddress(alloc::format!("port {port}")))?;
        Ok(SocketAddr::new(ip, port))
    }

    fn read_type_ref(&mut self) -> Result<&'static TypeDescriptor> {
        let path = self.read_utf8()?;
        self.resolver.require(&path)
    }

    fn read_presence(&mut self, inner: &'static TypeDescriptor) -> Result<bool> {
        if let TypeKind::Shared(_) = inner.kind() {
            let index = self.read_varint(32)? as u32;
            if index == 0 {
                return Ok(false);
            }
            self.pending_reference = Some(index);
            return Ok(true);
        }
        if self.settings.required {
            return Ok(true);
        }
        self.read_bool()
    }

    fn begin_shared(&mut self) -> Result<SharedRead> {
        let index = match self.pending_reference.take() {
            Some(index) => index,
            None => self.read_varint(32)? as u32,
        };
        let shared = self.references.begin(index)?;
        if let SharedRead::Existing(index) = shared {
            log::trace!("shared instance read from reference {index}");
        }
        Ok(shared)
    }

    #[inline]
    fn shared_value(&self, index: u32) -> Result<&dyn Reflect> {
        self.references.get(index)
    }

    #[inline]
    fn complete_shared(&mut self, index: u32, value: Box<dyn Reflect>) -> Result<()> {
        self.references.complete(index, value)
    }

    #[inline]
    fn read_dynamic_type(&mut self) -> Result<&'static TypeDescriptor> {
        self.read_type_tag()
    }

    fn begin_composite(&mut self, ty: &'static TypeDescriptor, dynamic: bool) -> Result<bool> {
        self.enter()?;
        if !dynamic && !self.settings.omit_type_tag {
            self.expect_type_tag(ty)?;
        }
        Ok(true)
    }

    fn next_member(
        &mut self,
        owner: &'static TypeDescriptor,
        members: &[MemberDescriptor],
        cursor: &mut MemberCursor,
    ) -> Result<Option<usize>> {
        if self.settings.omit_member_names {
            let index = cursor.index;
            cursor.index += 1;
            return Ok((index < members.len()).then_some(index));
        }
        while cursor.index < members.len() {
            let Some(name) = self.next_name()? else {
                return Ok(None);
            };
            let index = cursor.index;
            cursor.index += 1;
            if members[index].name() == name {
                return Ok(Some(index));
            }
            log::trace!(
                "member `{}::{}` is absent, found `{name}`",
                owner.path(),
                members[index].name(),
            );
            self.pending_name = Some(name);
        }
        Ok(None)
    }

    #[inline]
    fn end_composite(&mut self) -> Result<()> {
        self.leave();
        Ok(())
    }

    fn begin_sequence(&mut self, _ty: &'static TypeDescriptor) -> Result<Option<SequenceCursor>> {
        self.enter()?;
        Ok(Some(SequenceCursor::counted(self.read_len()?)))
    }

    fn next_element(&mut self, cursor: &mut SequenceCursor) -> Result<bool> {
        match &mut cursor.remaining {
            Some(0) | None => Ok(false),
            Some(remaining) => {
                *remaining -= 1;
                cursor.index += 1;
                Ok(true)
            }
        }
    }

    #[inline]
    fn end_sequence(&mut self) -> Result<()> {
        self.leave();
        Ok(())
    }

    fn begin_map(
        &mut self,
        _ty: &'static TypeDescriptor,
        _key: &'static TypeDescriptor,
    ) -> Result<Option<SequenceCursor>> {
        self.enter()?;
        Ok(Some(SequenceCursor::counted(self.read_len()?)))
    }

    #[inline]
    fn next_entry(&mut self, cursor: &mut SequenceCursor) -> Result<bool> {
        self.next_element(cursor)
    }

    #[inline]
    fn begin_entry_value(&mut self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn end_entry(&mut self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn end_map(&mut self) -> Result<()> {
        self.leave();
        Ok(())
    }

    #[inline]
    fn carries_element_types(&self) -> bool {
        true
    }

    #[inline]
    fn read_element_type(&mut self) -> Result<&'static TypeDescriptor> {
        self.read_type_tag()
    }
}
