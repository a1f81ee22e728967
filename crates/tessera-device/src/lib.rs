//! Device runtime interface for the Tessera memory manager.
//!
//! The memory manager only orchestrates device calls; it never talks to a
//! vendor driver directly. [`DeviceRuntime`] is the seam a backend
//! implements (buffer creation and release, host-to-device copies,
//! memset). [`HostDevice`] implements it over host memory so that
//! compiled programs can be planned, committed and resolved without an
//! accelerator, and so tests can read back what reached "device" memory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod host;
pub mod runtime;

pub use host::HostDevice;
pub use runtime::{DeviceRuntime, SharedDevice};
