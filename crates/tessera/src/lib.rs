//! Tessera: device memory management for compiled tensor-graph backends.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tessera sub-crates. For most users, adding `tessera` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera::prelude::*;
//!
//! let device = Arc::new(HostDevice::new());
//! let mut manager = DeviceMemoryManager::new(device.clone(), MemoryConfig::new(16)).unwrap();
//!
//! // Lower one operator: a constant input plus some scratch space.
//! let mut scope = manager.open_scope();
//! let weights = scope.reserve_argspace(&[1, 2, 3, 4]);
//! let scratch = scope.reserve_workspace(256, true);
//! scope.close();
//!
//! // Compilation finished: materialize device buffers.
//! manager.allocate().unwrap();
//!
//! // At run time, resolve tickets right before dispatching the kernel.
//! let ptr = manager.registry().invoke(weights.ticket()).unwrap();
//! assert_eq!(device.read(ptr, 4).unwrap(), vec![1, 2, 3, 4]);
//! assert!(!manager.resolve(scratch.ticket()).unwrap().is_null());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | `DevicePtr`, `Ticket`, `RecordId`, error enums |
//! | [`arena`] | `tessera-arena` | `WorkspaceArena`, `StagingBuffer`, `MemoryConfig` |
//! | [`device`] | `tessera-device` | `DeviceRuntime` trait, `HostDevice` |
//! | [`memory`] | `tessera-memory` | `DeviceMemoryManager`, `Allocator`, `PrimitiveRegistry` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core identifiers and error types (`tessera-core`).
pub use tessera_core as types;

/// Offset-computing arenas and configuration (`tessera-arena`).
///
/// [`arena::WorkspaceArena`] and [`arena::StagingBuffer`] are driven by the
/// memory manager; most users only need [`arena::MemoryConfig`].
pub use tessera_arena as arena;

/// Device runtime seam and the host-simulated device (`tessera-device`).
///
/// Implement [`device::DeviceRuntime`] to plug in an accelerator backend.
pub use tessera_device as device;

/// The memory manager, build scopes and primitive registry (`tessera-memory`).
pub use tessera_memory as memory;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tessera_core::{DevicePtr, MemorySpace, Ticket};

    // Errors
    pub use tessera_core::{ConfigError, DeviceError, MemoryError};

    // Configuration
    pub use tessera_arena::MemoryConfig;

    // Device
    pub use tessera_device::{DeviceRuntime, HostDevice, SharedDevice};

    // Manager
    pub use tessera_memory::{
        AllocationStats, Allocator, DeviceMemoryManager, PrimitiveRegistry, Reservation,
    };
}
