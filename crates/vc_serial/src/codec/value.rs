use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::net::SocketAddr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::codec::{FormatRead, FormatWrite};
use crate::impls::TypeRef;
use crate::info::{ExtendedKind, TypeDescriptor, TypeKind, ValueKind, owner_ref};
use crate::{Reflect, Result};

// -----------------------------------------------------------------------------
// Value table

pub(crate) fn write_value(format: &mut dyn FormatWrite, kind: ValueKind, value: &dyn Reflect) -> Result<()> {
    match kind {
        ValueKind::Unit => format.write_unit(),
        ValueKind::Bool => format.write_bool(*owner_ref::<bool>(value)?),
        ValueKind::I8 => format.write_i8(*owner_ref::<i8>(value)?),
        ValueKind::I16 => format.write_i16(*owner_ref::<i16>(value)?),
        ValueKind::I32 => format.write_i32(*owner_ref::<i32>(value)?),
        ValueKind::I64 => format.write_i64(*owner_ref::<i64>(value)?),
        ValueKind::U8 => format.write_u8(*owner_ref::<u8>(value)?),
        ValueKind::U16 => format.write_u16(*owner_ref::<u16>(value)?),
        ValueKind::U32 => format.write_u32(*owner_ref::<u32>(value)?),
        ValueKind::U64 => format.write_u64(*owner_ref::<u64>(value)?),
        ValueKind::F32 => format.write_f32(*owner_ref::<f32>(value)?),
        ValueKind::F64 => format.write_f64(*owner_ref::<f64>(value)?),
        ValueKind::Decimal => format.write_decimal(*owner_ref::<Decimal>(value)?),
        ValueKind::Char => format.write_char(*owner_ref::<char>(value)?),
        ValueKind::String => format.write_str(owner_ref::<String>(value)?),
        ValueKind::Bytes => format.write_bytes(owner_ref::<Vec<u8>>(value)?),
        ValueKind::Chars => format.write_chars(owner_ref::<Vec<char>>(value)?),
        ValueKind::DateTime => format.write_date_time(*owner_ref::<NaiveDateTime>(value)?),
    }
}

pub(crate) fn read_value(format: &mut dyn FormatRead, kind: ValueKind) -> Result<Box<dyn Reflect>> {
    Ok(match kind {
        ValueKind::Unit => {
            format.read_unit()?;
            Box::new(())
        }
        ValueKind::Bool => Box::new(format.read_bool()?),
        ValueKind::I8 => Box::new(format.read_i8()?),
        ValueKind::I16 => Box::new(format.read_i16()?),
        ValueKind::I32 => Box::new(format.read_i32()?),
        ValueKind::I64 => Box::new(format.read_i64()?),
        ValueKind::U8 => Box::new(format.read_u8()?),
        ValueKind::U16 => Box::new(format.read_u16()?),
        ValueKind::U32 => Box::new(format.read_u32()?),
        ValueKind::U64 => Box::new(format.read_u64()?),
        ValueKind::F32 => Box::new(format.read_f32()?),
        ValueKind::F64 => Box::new(format.read_f64()?),
        ValueKind::Decimal => Box::new(format.read_decimal()?),
        ValueKind::Char => Box::new(format.read_char()?),
        ValueKind::String => Box::new(format.read_string()?),
        ValueKind::Bytes => Box::new(format.read_bytes()?),
        ValueKind::Chars => Box::new(format.read_chars()?),
        ValueKind::DateTime => Box::new(format.read_date_time()?),
    })
}

// -----------------------------------------------------------------------------
// Extended table

pub(crate) fn write_extended(
    format: &mut dyn FormatWrite,
    kind: ExtendedKind,
    value: &dyn Reflect,
) -> Result<()> {
    match kind {
        ExtendedKind::Uuid => format.write_uuid(*owner_ref::<Uuid>(value)?),
        ExtendedKind::SocketAddr => format.write_socket_addr(*owner_ref::<SocketAddr>(value)?),
        ExtendedKind::TypeRef => format.write_type_ref(owner_ref::<TypeRef>(value)?.get()),
    }
}

pub(crate) fn read_extended(format: &mut dyn FormatRead, kind: ExtendedKind) -> Result<Box<dyn Reflect>> {
    Ok(match kind {
        ExtendedKind::Uuid => Box::new(format.read_uuid()?),
        ExtendedKind::SocketAddr => Box::new(format.read_socket_addr()?),
        ExtendedKind::TypeRef => Box::new(TypeRef(format.read_type_ref()?)),
    })
}

// -----------------------------------------------------------------------------
// Public contracts

/// Writes `value` if its type is a value kind.
///
/// Returns `false`, writing nothing, for any other kind.
pub fn try_write_value(format: &mut dyn FormatWrite, value: &dyn Reflect) -> Result<bool> {
    match value.descriptor().kind() {
        TypeKind::Value(kind) => write_value(format, *kind, value).map(|()| true),
        _ => Ok(false),
    }
}

/// Reads a value of `ty` if it is a value kind.
pub fn try_read_value(format: &mut dyn FormatRead, ty: &'static TypeDescriptor) -> Result<Option<Box<dyn Reflect>>> {
    match ty.kind() {
        TypeKind::Value(kind) => read_value(format, *kind).map(Some),
        _ => Ok(None),
    }
}

/// Writes `value` if its type is an extended kind.
pub fn try_write_extended(format: &mut dyn FormatWrite, value: &dyn Reflect) -> Result<bool> {
    match value.descriptor().kind() {
        TypeKind::Extended(kind) => write_extended(format, *kind, value).map(|()| true),
        _ => Ok(false),
    }
}

/// Reads a value of `ty` if it is an extended kind.
pub fn try_read_extended(format: &mut dyn FormatRead, ty: &'static TypeDescriptor) -> Result<Option<Box<dyn Reflect>>> {
    match ty.kind() {
        TypeKind::Extended(kind) => read_extended(format, *kind).map(Some),
        _ => Ok(None),
    }
}
