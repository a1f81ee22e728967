//! Offset-computing arenas for Tessera device memory planning.
//!
//! Nothing in this crate touches device memory. It computes byte offsets
//! and accumulates host bytes so that the memory manager can later size,
//! create and fill real device buffers in one step per commit.
//!
//! # Architecture
//!
//! ```text
//! DeviceMemoryManager (tessera-memory)
//! ├── StagingBuffer   (argument bytes, doubled on overflow, drained per commit)
//! └── WorkspaceArena  (LIFO offset stack + high-water mark, reset per commit)
//! ```
//!
//! Both structures are parameterised by the alignment carried in
//! [`MemoryConfig`]. Every offset they hand out is a multiple of it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod align;
pub mod config;
pub mod staging;
pub mod workspace;

// Public re-exports for the primary API surface.
pub use align::align_up;
pub use config::MemoryConfig;
pub use staging::StagingBuffer;
pub use workspace::WorkspaceArena;
