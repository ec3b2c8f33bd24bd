use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Display;
use core::mem;
use core::net::SocketAddr;
use std::collections::HashMap;
use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::codec::{self, FormatWrite, SharedWrite};
use crate::info::{MemberDescriptor, TypeDescriptor};
use crate::json::TYPE_KEY;
use crate::json::date::format_date_time;
use crate::json::escape::quote_into;
use crate::{Dynamic, Error, Reflect, RepeatedObjectPolicy, Result, SerialHooks, Settings};

/// An open object or array.
struct Frame {
    empty: bool,
    close: &'static str,
    /// A map with non-string keys, written as `[[key, value], ...]`.
    pairs: bool,
}

// -----------------------------------------------------------------------------
// JsonWriter

/// Writes object graphs as UTF-8 JSON text.
///
/// JSON has no reference mechanism: a shared instance is written in full at
/// every occurrence, and the depth limit is what keeps a deep graph bounded.
/// With [`RepeatedObjectPolicy::Skip`], a structure below the limit is written
/// as `{}` or `[]`.
///
/// # Examples
///
/// ```
/// use vc_serial::Settings;
/// use vc_serial::json::JsonWriter;
///
/// let settings = Settings::new().with_depth_limit(2);
/// let mut writer = JsonWriter::new(Vec::new(), settings);
/// writer.write(&vec![vec![vec![1_u16]]]).unwrap();
/// assert_eq!(writer.into_inner(), b"[[[]]]");
/// ```
pub struct JsonWriter<W> {
    out: W,
    settings: Settings,
    pretty: bool,
    frames: Vec<Frame>,
    scratch: String,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W, settings: Settings) -> Self {
        Self {
            out,
            settings,
            pretty: false,
            frames: Vec::new(),
            scratch: String::new(),
        }
    }

    /// Indents nested content by two spaces, one item per line.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
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
    // Output

    #[inline]
    fn raw(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).map_err(Error::from)
    }

    fn display(&mut self, value: impl Display) -> Result<()> {
        write!(self.out, "{value}").map_err(Error::from)
    }

    fn quoted(&mut self, value: &str) -> Result<()> {
        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        quote_into(&mut scratch, value, self.settings.encode_unicode);
        let written = self.raw(&scratch);
        self.scratch = scratch;
        written
    }

    fn non_finite(&mut self, nan: bool, negative: bool) -> Result<()> {
        match (nan, negative) {
            (true, _) => self.raw("\"NaN\""),
            (false, false) => self.raw("\"Infinity\""),
            (false, true) => self.raw("\"-Infinity\""),
        }
    }

    fn newline(&mut self) -> Result<()> {
        if !self.pretty {
            return Ok(());
        }
        self.raw("\n")?;
        for _ in 0..self.frames.len() {
            self.raw("  ")?;
        }
        Ok(())
    }

    /// Starts an item of the innermost open structure.
    fn separator(&mut self) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        if !mem::replace(&mut frame.empty, false) {
            self.raw(",")?;
        }
        self.newline()
    }

    fn name(&mut self, name: &str) -> Result<()> {
        self.separator()?;
        self.quoted(name)?;
        self.raw(if self.pretty { ": " } else { ":" })
    }

    /// Opens a structure, or writes it empty once the depth limit is reached.
    fn open(&mut self, ty: &'static TypeDescriptor, open: &'static str, close: &'static str, pairs: bool) -> Result<bool> {
        let limit = self.settings.depth_limit;
        if self.frames.len() >= limit {
            if self.settings.repeated_object_policy == RepeatedObjectPolicy::Fail {
                return Err(Error::DepthExceeded { limit });
            }
            log::warn!("depth limit {limit} reached, `{}` written empty", ty.path());
            self.raw(open)?;
            return self.raw(close).map(|()| false);
        }
        self.raw(open)?;
        self.frames.push(Frame {
            empty: true,
            close,
            pairs,
        });
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        let Some(frame) = self.frames.pop() else {
            return Ok(());
        };
        if !frame.empty {
            self.newline()?;
        }
        self.raw(frame.close)
    }

    #[inline]
    fn in_pairs(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.pairs)
    }
}

macro_rules! write_display {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[inline]
            fn $name(&mut self, value: $ty) -> Result<()> {
                self.display(value)
            }
        )*
    };
}

macro_rules! write_float {
    ($name:ident, $ty:ty) => {
        fn $name(&mut self, value: $ty) -> Result<()> {
            if value.is_finite() {
                // `Debug` keeps a fraction or exponent and round-trips exactly.
                write!(self.out, "{value:?}").map_err(Error::from)
            } else {
                self.non_finite(value.is_nan(), value.is_sign_negative())
            }
        }
    };
}

// -----------------------------------------------------------------------------
// FormatWrite

impl<W: Write> FormatWrite for JsonWriter<W> {
    #[inline]
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn reset_session(&mut self) {
        self.frames.clear();
    }

    fn finish_session(&mut self) -> Result<()> {
        self.out.flush().map_err(Error::from)
    }

    #[inline]
    fn write_unit(&mut self) -> Result<()> {
        self.raw("null")
    }

    #[inline]
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.raw(if value { "true" } else { "false" })
    }

    write_display! {
        write_i8: i8,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_u8: u8,
        write_u16: u16,
        write_u32: u32,
        write_u64: u64,
        write_decimal: Decimal,
    }

    write_float!(write_f32, f32);
    write_float!(write_f64, f64);

    fn write_char(&mut self, value: char) -> Result<()> {
        let mut buf = [0_u8; 4];
        self.quoted(value.encode_utf8(&mut buf))
    }

    #[inline]
    fn write_str(&mut self, value: &str) -> Result<()> {
        self.quoted(value)
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        let encoded = STANDARD.encode(value);
        self.quoted(&encoded)
    }

    fn write_chars(&mut self, value: &[char]) -> Result<()> {
        let text: String = value.iter().collect();
        self.quoted(&text)
    }

    fn write_date_time(&mut self, value: NaiveDateTime) -> Result<()> {
        self.quoted(&format_date_time(value))
    }

    fn write_uuid(&mut self, value: Uuid) -> Result<()> {
        let mut buf = Uuid::encode_buffer();
        self.quoted(value.hyphenated().encode_lower(&mut buf))
    }

    fn write_socket_addr(&mut self, value: SocketAddr) -> Result<()> {
        self.quoted(&value.to_string())
    }

    #[inline]
    fn write_type_ref(&mut self, ty: &'static TypeDescriptor) -> Result<()> {
        self.quoted(ty.path())
    }

    fn write_presence(&mut self, _inner: &'static TypeDescriptor, present: bool) -> Result<()> {
        if present { Ok(()) } else { self.raw("null") }
    }

    #[inline]
    fn begin_shared(&mut self, _address: usize) -> Result<SharedWrite> {
        Ok(SharedWrite::First)
    }

    #[inline]
    fn begin_dynamic(&mut self, _runtime: &'static TypeDescriptor) -> Result<()> {
        Ok(())
    }

    fn begin_composite(&mut self, ty: &'static TypeDescriptor, dynamic: bool) -> Result<bool> {
        if !self.open(ty, "{", "}", false)? {
            return Ok(false);
        }
        if dynamic || !self.settings.omit_type_tag {
            self.name(TYPE_KEY)?;
            self.quoted(ty.path())?;
        }
        Ok(true)
    }

    #[inline]
    fn begin_member(&mut self, member: &MemberDescriptor) -> Result<()> {
        self.name(member.name())
    }

    #[inline]
    fn end_composite(&mut self) -> Result<()> {
        self.close()
    }

    #[inline]
    fn begin_sequence(&mut self, ty: &'static TypeDescriptor, _len: usize) -> Result<bool> {
        self.open(ty, "[", "]", false)
    }

    #[inline]
    fn begin_element(&mut self, _index: usize) -> Result<()> {
        self.separator()
    }

    #[inline]
    fn end_sequence(&mut self) -> Result<()> {
        self.close()
    }

    fn begin_map(
        &mut self,
        ty: &'static TypeDescriptor,
        key: &'static TypeDescriptor,
        _len: usize,
        dynamic: bool,
    ) -> Result<bool> {
        if !key.is::<String>() {
            return self.open(ty, "[", "]", true);
        }
        if !self.open(ty, "{", "}", false)? {
            return Ok(false);
        }
        // An untyped object reads back as `HashMap<String, Dynamic>`.
        if dynamic && !ty.is::<HashMap<String, Dynamic>>() {
            self.name(TYPE_KEY)?;
            self.quoted(ty.path())?;
        }
        Ok(true)
    }

    fn begin_entry(&mut self, _index: usize) -> Result<()> {
        self.separator()?;
        if self.in_pairs() {
            self.raw("[")?;
        }
        Ok(())
    }

    fn begin_entry_value(&mut self) -> Result<()> {
        match (self.in_pairs(), self.pretty) {
            (true, false) => self.raw(","),
            (true, true) => self.raw(", "),
            (false, false) => self.raw(":"),
            (false, true) => self.raw(": "),
        }
    }

    fn end_entry(&mut self) -> Result<()> {
        if self.in_pairs() {
            self.raw("]")?;
        }
        Ok(())
    }

    #[inline]
    fn end_map(&mut self) -> Result<()> {
        self.close()
    }

    #[inline]
    fn carries_element_types(&self) -> bool {
        false
    }

    #[inline]
    fn write_element_type(&mut self, _ty: &'static TypeDescriptor) -> Result<()> {
        Ok(())
    }
}
