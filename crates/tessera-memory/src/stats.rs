//! Commit accounting for diagnostics and reporting.

use std::fmt;

use tessera_core::Generation;

/// Snapshot of a manager's committed and pending memory.
///
/// Produced by [`DeviceMemoryManager::stats`](crate::DeviceMemoryManager::stats).
/// Used for reporting only; nothing in the manager branches on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationStats {
    /// Bytes in materialized argspace buffers.
    pub argspace_bytes: usize,
    /// Number of materialized argspace buffers.
    pub argspace_buffers: usize,
    /// Bytes in materialized workspace buffers.
    pub workspace_bytes: usize,
    /// Number of materialized workspace buffers.
    pub workspace_buffers: usize,
    /// Argument bytes staged but not yet committed.
    pub pending_argspace_bytes: usize,
    /// Workspace high-water mark not yet committed.
    pub pending_workspace_bytes: usize,
    /// Primitives registered so far.
    pub primitives: usize,
    /// Generation currently accumulating reservations.
    pub generation: Generation,
}

impl AllocationStats {
    /// Total committed bytes across both memory spaces.
    pub fn committed_bytes(&self) -> usize {
        self.argspace_bytes + self.workspace_bytes
    }

    /// Total bytes the next commit would materialize.
    pub fn pending_bytes(&self) -> usize {
        self.pending_argspace_bytes + self.pending_workspace_bytes
    }
}

impl fmt::Display for AllocationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: argspace {} B in {} buffers, workspace {} B in {} buffers, \
             pending {} B, {} primitives",
            self.generation,
            self.argspace_bytes,
            self.argspace_buffers,
            self.workspace_bytes,
            self.workspace_buffers,
            self.pending_bytes(),
            self.primitives,
        )
    }
}
