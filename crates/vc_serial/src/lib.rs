#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(feature = "std"))]
compile_error!("`vc_serial` performs blocking I/O and requires the `std` feature");

// -----------------------------------------------------------------------------
// Extern Self

// Generated code refers to `vc_serial`, which must also resolve inside this crate.
extern crate self as vc_serial;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod catalog;
mod error;
mod hash;
mod hooks;
mod reflect;
mod settings;

pub mod binary;
pub mod codec;
pub mod impls;
pub mod info;
pub mod json;
pub mod registry;

// -----------------------------------------------------------------------------
// Top-Level exports

pub mod __macro_exports;

pub use catalog::MemberCatalog;
pub use error::{Error, MalformedError, ParseError, Result};
pub use hooks::{ReadAction, SerialHooks, WriteAction};
pub use reflect::{Dynamic, Reflect};
pub use settings::{RepeatedObjectPolicy, Settings};
pub use vc_serial_derive as derive;

/// Commonly used items.
pub mod prelude {
    pub use crate::derive::Reflect;
    pub use crate::info::{TypeDescriptor, Typed};
    pub use crate::registry::TypeRegistry;
    pub use crate::{Dynamic, Error, Reflect, Result, SerialHooks, Settings};
}
