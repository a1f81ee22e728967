//! Deferred-address device memory management for compiled tensor programs.
//!
//! Kernel-building code does not know where its operands will live until
//! the whole program has been planned. This crate lets it reserve logical
//! regions now and receive a [`Ticket`](tessera_core::Ticket) that the
//! compiled program resolves to a concrete device address later, at every
//! execution.
//!
//! # Architecture
//!
//! ```text
//! DeviceMemoryManager (one per compiled program)
//! ├── StagingBuffer      argument bytes waiting for the next commit
//! ├── WorkspaceArena     LIFO scratch offsets for the next commit
//! ├── RecordList × 2     argspace / workspace buffer records, append-only,
//! │                      exactly one trailing "open" record each
//! └── PrimitiveRegistry  ticket → deferred address resolver
//!
//! Allocator<'m>          move-only build scope borrowing the manager;
//!                        frees its workspace offsets exactly once
//! ```
//!
//! # Phases
//!
//! 1. **Build.** Open scopes with [`DeviceMemoryManager::open_scope`],
//!    reserve argument and workspace space, embed the returned tickets.
//!    Scopes may nest via [`Allocator::scope`].
//! 2. **Commit.** Once every scope is closed, call
//!    [`DeviceMemoryManager::allocate`]. Pending argument bytes are copied
//!    to one new device buffer; the workspace high-water mark sizes one new
//!    scratch buffer.
//! 3. **Execute.** The scheduler calls [`PrimitiveRegistry::invoke`] with a
//!    ticket to obtain the operand address, from any thread.
//!
//! Build and commit may alternate any number of times; each commit only
//! materializes the reservations made since the previous one.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod manager;
pub mod record;
pub mod registry;
pub mod stats;

// Public re-exports for the primary API surface.
pub use allocator::{Allocator, Reservation};
pub use manager::DeviceMemoryManager;
pub use record::{BufferRecord, Committed, RecordList};
pub use registry::{Primitive, PrimitiveRegistry};
pub use stats::AllocationStats;
