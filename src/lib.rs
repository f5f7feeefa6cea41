//! Secret containers which zeroize their memory before it is released.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(feature = "nightly", feature(allocator_api))]
#![warn(missing_docs)]

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
struct _ReadmeDoctests;

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc as alloc_crate;

#[macro_use]
mod macros;

pub mod alloc;

pub mod bytes;

pub mod compare;

pub(crate) mod error;

pub mod expose;

pub(crate) mod raw;

pub mod secret;

pub mod unmanaged;

pub use self::{
    bytes::ByteRepr,
    error::StorageError,
    expose::ExposeSecret,
    secret::Secret,
    unmanaged::UnmanagedSecret,
};
