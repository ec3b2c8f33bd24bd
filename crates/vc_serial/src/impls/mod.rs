//! [`Typed`](crate::info::Typed) implementations for foreign types.
//!
//! ## Implemented Menu
//!
//! - value kinds:
//!     - `()`, `bool`, `i8`-`i64`, `u8`-`u64`, `f32`, `f64`, `char`
//!     - `String`, `Vec<u8>` (bytes), `Vec<char>` (characters)
//!     - `rust_decimal::Decimal`, `chrono::NaiveDateTime`
//! - extended kinds:
//!     - `uuid::Uuid`, `core::net::SocketAddr`, [`TypeRef`]
//! - sequences:
//!     - `Vec<T>`, `VecDeque<T>`, `[T; N]`, `HashSet<T>`, `BTreeSet<T>`
//! - maps:
//!     - `HashMap<K, V>`, `BTreeMap<K, V>`
//! - wrappers:
//!     - `Option<T>`, `Arc<T>`, [`Dynamic`](crate::Dynamic)

mod collections;
mod extended;
mod values;
mod wrappers;

pub use extended::TypeRef;

pub(crate) use values::{date_time_to_ticks, ticks_to_date_time};

use alloc::boxed::Box;

use crate::Reflect;

/// Boxes the default value of `T`, used as a default constructor.
#[inline]
pub(crate) fn boxed_default<T: Default + Reflect>() -> Box<dyn Reflect> {
    Box::new(T::default())
}
