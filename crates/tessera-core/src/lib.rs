//! Core identifiers and error types for the Tessera device memory manager.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by every other Tessera crate: device addresses,
//! reservation tickets, buffer record identifiers, commit generations, and
//! the error enums surfaced by the arena, the device runtime, and the
//! memory manager.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;

pub use error::{ConfigError, DeviceError, MemoryError};
pub use id::{DevicePtr, Generation, MemorySpace, RecordId, Ticket};
