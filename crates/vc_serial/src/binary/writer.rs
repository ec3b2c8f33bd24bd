use alloc::borrow::Cow;
use core::net::SocketAddr;
use std::io::Write;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::binary::decimal_words;
use crate::binary::references::WriteReferences;
use crate::binary::varint::encode_varint;
use crate::codec::{self, FormatWrite, SharedWrite};
use crate::impls::date_time_to_ticks;
use crate::info::{MemberDescriptor, TypeDescriptor, TypeKind};
use crate::{Error, MalformedError, Reflect, Result, SerialHooks, Settings};

// -----------------------------------------------------------------------------
// BinaryWriter

/// Writes object graphs in the compact binary format.
///
/// One writer wraps one sink; every [`write`](Self::write) call is an
/// independent session with its own reference table.
///
/// # Examples
///
/// ```
/// use vc_serial::Settings;
/// use vc_serial::binary::BinaryWriter;
///
/// let mut writer = BinaryWriter::new(Vec::new(), Settings::new().with_varint(true));
/// writer.write(&300_i32).unwrap();
/// assert_eq!(writer.into_inner(), [0xAC, 0x02]);
/// ```
pub struct BinaryWriter<W> {
    out: W,
    settings: Settings,
    depth: usize,
    references: WriteReferences,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(out: W, settings: Settings) -> Self {
        Self {
            out,
            settings,
            depth: 0,
            references: WriteReferences::new(),
        }
    }

    /// Writes `value` and everything reachable from it.
    #[inline]
    pub fn write(&mut self, value: &dyn Reflect) -> Result<()> {
        codec::write_object(self, value, &())
    }

    /// Writes `value`, reporting every member to `hooks`.
    #[inline]
    pub fn write_with(&mut self, value: &dyn Reflect, hooks: &dyn SerialHooks) -> Result<()> {
        codec::write_object(self, value, hooks)
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }

    // -------------------------------------------------------------------------
    // Raw output

    #[inline]
    pub(super) fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes).map_err(Error::from)
    }

    #[inline]
    fn write_varint(&mut self, value: u64) -> Result<()> {
        let (buf, len) = encode_varint(value);
        self.write_raw(&buf[..len])
    }

    /// Lengths and counts are always varints bounded by `i32::MAX`.
    pub(super) fn write_len(&mut self, len: usize) -> Result<()> {
        if len > i32::MAX as usize {
            return Err(MalformedError::InvalidCount(len as u64).into());
        }
        self.write_varint(len as u64)
    }

    fn write_fixed_u32(&mut self, value: u32) -> Result<()> {
        if self.settings.little_endian {
            self.write_raw(&value.to_le_bytes())
        } else {
            self.write_raw(&value.to_be_bytes())
        }
    }

    pub(super) fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_len(value.len())?;
        self.write_raw(value.as_bytes())
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
}

macro_rules! write_integer {
    ($name:ident, $ty:ty, $unsigned:ty) => {
        fn $name(&mut self, value: $ty) -> Result<()> {
            if self.settings.encode_integers_as_varint {
                self.write_varint(u64::from(value as $unsigned))
            } else if self.settings.little_endian {
                self.write_raw(&value.to_le_bytes())
            } else {
                self.write_raw(&value.to_be_bytes())
            }
        }
    };
}

macro_rules! write_float {
    ($name:ident, $ty:ty) => {
        fn $name(&mut self, value: $ty) -> Result<()> {
            let bits = value.to_bits();
            if self.settings.little_endian {
                self.write_raw(&bits.to_le_bytes())
            } else {
                self.write_raw(&bits.to_be_bytes())
            }
        }
    };
}

// -----------------------------------------------------------------------------
// FormatWrite

impl<W: Write> FormatWrite for BinaryWriter<W> {
    #[inline]
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn reset_session(&mut self) {
        self.depth = 0;
        self.references.clear();
    }

    fn finish_session(&mut self) -> Result<()> {
        self.out.flush().map_err(Error::from)
    }

    #[inline]
    fn write_unit(&mut self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_raw(&[u8::from(value)])
    }

    #[inline]
    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    #[inline]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_raw(&[value])
    }

    write_integer!(write_i16, i16, u16);
    write_integer!(write_i32, i32, u32);
    write_integer!(write_i64, i64, u64);
    write_integer!(write_u16, u16, u16);
    write_integer!(write_u32, u32, u32);
    write_integer!(write_u64, u64, u64);

    write_float!(write_f32, f32);
    write_float!(write_f64, f64);

    fn write_decimal(&mut self, value: Decimal) -> Result<()> {
        let [lo, mid, hi, flags] = decimal_words(value);
        self.write_fixed_u32(lo)?;
        self.write_fixed_u32(mid)?;
        self.write_fixed_u32(hi)?;
        self.write_fixed_u32(flags)
    }

    fn write_char(&mut self, value: char) -> Result<()> {
        let mut buf = [0_u8; 4];
        self.write_raw(value.encode_utf8(&mut buf).as_bytes())
    }

    #[inline]
    fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_string(value)
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_len(value.len())?;
        self.write_raw(value)
    }

    fn write_chars(&mut self, value: &[char]) -> Result<()> {
        let text: alloc::string::String = value.iter().collect();
        self.write_string(&text)
    }

    fn write_date_time(&mut self, value: NaiveDateTime) -> Result<()> {
        self.write_i64(date_time_to_ticks(value)?)
    }

    #[inline]
    fn write_uuid(&mut self, value: Uuid) -> Result<()> {
        self.write_raw(value.as_bytes())
    }

    fn write_socket_addr(&mut self, value: SocketAddr) -> Result<()> {
        match value {
            SocketAddr::V4(addr) => {
                self.write_len(4)?;
                self.write_raw(&addr.ip().octets())?;
            }
            SocketAddr::V6(addr) => {
                self.write_len(16)?;
                self.write_raw(&addr.ip().octets())?;
            }
        }
        self.write_i32(i32::from(value.port()))
    }

    #[inline]
    fn write_type_ref(&mut self, ty: &'static TypeDescriptor) -> Result<()> {
        self.write_string(ty.path())
    }

    fn write_presence(&mut self, inner: &'static TypeDescriptor, present: bool) -> Result<()> {
        if let TypeKind::Shared(_) = inner.kind() {
            // The reference index carries presence; 0 is null.
            return if present { Ok(()) } else { self.write_varint(0) };
        }
        if self.settings.required {
            if present {
                return Ok(());
            }
            return Err(Error::MissingRequired(Cow::Borrowed(inner.path())));
        }
        self.write_bool(present)
    }

    fn begin_shared(&mut self, address: usize) -> Result<SharedWrite> {
        let (index, existing) = self.references.lookup_or_insert(address);
        self.write_varint(u64::from(index))?;
        if existing {
            log::trace!("shared instance written as reference {index}");
            Ok(SharedWrite::Reference)
        } else {
            Ok(SharedWrite::First)
        }
    }

    #[inline]
    fn begin_dynamic(&mut self, runtime: &'static TypeDescriptor) -> Result<()> {
        self.write_type_tag(runtime)
    }

    fn begin_composite(&mut self, ty: &'static TypeDescriptor, dynamic: bool) -> Result<bool> {
        self.enter()?;
        if !dynamic && !self.settings.omit_type_tag {
            self.write_type_tag(ty)?;
        }
        Ok(true)
    }

    fn begin_member(&mut self, member: &MemberDescriptor) -> Result<()> {
        if self.settings.omit_member_names {
            return Ok(());
        }
        self.write_string(member.name())
    }

    #[inline]
    fn end_composite(&mut self) -> Result<()> {
        self.leave();
        Ok(())
    }

    fn begin_sequence(&mut self, _ty: &'static TypeDescriptor, len: usize) -> Result<bool> {
        self.enter()?;
        self.write_len(len)?;
        Ok(true)
    }

    #[inline]
    fn begin_element(&mut self, _index: usize) -> Result<()> {
        Ok(())
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
        len: usize,
        _dynamic: bool,
    ) -> Result<bool> {
        self.enter()?;
        self.write_len(len)?;
        Ok(true)
    }

    #[inline]
    fn begin_entry(&mut self, _index: usize) -> Result<()> {
        Ok(())
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
    fn write_element_type(&mut self, ty: &'static TypeDescriptor) -> Result<()> {
        self.write_type_tag(ty)
    }
}
