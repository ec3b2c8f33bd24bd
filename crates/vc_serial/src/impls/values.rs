use alloc::string::String;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;

use crate::info::{NonGenericDescriptorCell, TypeDescriptor, TypeKind, Typed, ValueKind};
use crate::{MalformedError, Result};

macro_rules! impl_value_typed {
    ($($ty:ty => $path:literal, $kind:ident;)*) => {$(
        impl Typed for $ty {
            fn type_descriptor() -> &'static TypeDescriptor {
                static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
                CELL.get_or_init(|| {
                    TypeDescriptor::new::<Self>($path, TypeKind::Value(ValueKind::$kind))
                        .with_default::<Self>()
                })
            }
        }
    )*};
}

impl_value_typed! {
    () => "()", Unit;
    bool => "bool", Bool;
    i8 => "i8", I8;
    i16 => "i16", I16;
    i32 => "i32", I32;
    i64 => "i64", I64;
    u8 => "u8", U8;
    u16 => "u16", U16;
    u32 => "u32", U32;
    u64 => "u64", U64;
    f32 => "f32", F32;
    f64 => "f64", F64;
    char => "char", Char;
    String => "alloc::string::String", String;
    Decimal => "rust_decimal::Decimal", Decimal;
    NaiveDateTime => "chrono::NaiveDateTime", DateTime;
}

// -----------------------------------------------------------------------------
// Ticks

/// 100 ns intervals between 0001-01-01T00:00:00 and the Unix epoch.
pub(crate) const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const TICKS_PER_SECOND: i64 = 10_000_000;

/// Converts a date-time to 100 ns ticks since 0001-01-01T00:00:00.
pub(crate) fn date_time_to_ticks(value: NaiveDateTime) -> Result<i64> {
    let utc = value.and_utc();
    utc.timestamp()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(i64::from(utc.timestamp_subsec_nanos() / 100)))
        .and_then(|ticks| ticks.checked_add(UNIX_EPOCH_TICKS))
        .ok_or_else(|| MalformedError::InvalidDateTime(alloc::format!("{value} is out of tick range")).into())
}

/// Converts 100 ns ticks since 0001-01-01T00:00:00 to a date-time.
pub(crate) fn ticks_to_date_time(ticks: i64) -> Result<NaiveDateTime> {
    let since_epoch = ticks
        .checked_sub(UNIX_EPOCH_TICKS)
        .ok_or_else(|| MalformedError::InvalidDateTime(alloc::format!("{ticks} ticks")))?;
    let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) as u32 * 100;
    DateTime::from_timestamp(seconds, nanos)
        .map(|utc| utc.naive_utc())
        .ok_or_else(|| MalformedError::InvalidDateTime(alloc::format!("{ticks} ticks")).into())
}
