//! Build scopes through which kernel-building code reserves memory.
//!
//! An [`Allocator`] is a move-only token holding the manager's unique
//! borrow. It remembers every workspace offset it reserved and frees them,
//! newest first, exactly once: on [`close`](Allocator::close) or, failing
//! that, on drop. Because a nested scope reborrows its parent, the inner
//! scope's offsets are always released before the outer scope can reserve
//! again, which keeps the arena stack in LIFO order without any manual
//! size planning.

use smallvec::SmallVec;
use tessera_core::{MemorySpace, Ticket};

use crate::manager::DeviceMemoryManager;

/// What a reservation call hands back to kernel-building code.
///
/// The [`ticket`](Self::ticket) is what gets embedded in the compiled
/// program. The offset is informational: the byte position inside the
/// generation's staging or workspace region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Reservation {
    ticket: Ticket,
    space: MemorySpace,
    offset: Option<usize>,
    size: usize,
}

impl Reservation {
    pub(crate) fn new(ticket: Ticket, space: MemorySpace, offset: usize, size: usize) -> Self {
        Self {
            ticket,
            space,
            offset: Some(offset),
            size,
        }
    }

    /// A zero-sized workspace reservation resolving to the null address.
    pub(crate) fn null(ticket: Ticket, space: MemorySpace) -> Self {
        Self {
            ticket,
            space,
            offset: None,
            size: 0,
        }
    }

    /// Registry index resolving to this reservation's address.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Memory space the reservation lives in.
    pub fn space(&self) -> MemorySpace {
        self.space
    }

    /// Byte offset within the generation's buffer; `None` for zero-sized
    /// workspace reservations.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Requested size in bytes (before alignment padding).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this reservation resolves to the null address.
    pub fn is_null(&self) -> bool {
        self.offset.is_none()
    }
}

/// A build scope bound to one [`DeviceMemoryManager`].
///
/// Deliberately not `Clone`: duplicating a scope would duplicate the
/// obligation to free its workspace offsets.
///
/// A scope dropped while its thread unwinds still releases its offsets,
/// so a caller that recovers with `catch_unwind` can keep building.
#[must_use = "dropping an allocator immediately releases its workspace"]
pub struct Allocator<'m> {
    manager: &'m mut DeviceMemoryManager,
    /// Workspace offsets reserved by this scope, oldest first.
    active: SmallVec<[usize; 8]>,
}

impl<'m> Allocator<'m> {
    pub(crate) fn new(manager: &'m mut DeviceMemoryManager) -> Self {
        Self {
            manager,
            active: SmallVec::new(),
        }
    }

    /// Stage constant or parameter bytes for the next bulk transfer.
    ///
    /// Argument space is never released; it lives as long as the manager.
    pub fn reserve_argspace(&mut self, data: &[u8]) -> Reservation {
        self.manager.reserve_argspace(data)
    }

    /// Reserve `size` bytes of kernel scratch space.
    ///
    /// The bytes are released when this scope closes and may be handed to
    /// a later scope. With `zero_initialize`, every invocation of the
    /// ticket clears the region before returning its address; callers that
    /// need persistent state zeroed once must not rely on this.
    pub fn reserve_workspace(&mut self, size: usize, zero_initialize: bool) -> Reservation {
        let reservation = self.manager.reserve_workspace(size, zero_initialize);
        if let Some(offset) = reservation.offset() {
            self.active.push(offset);
        }
        reservation
    }

    /// Open a nested scope. Its workspace is released when it closes,
    /// before this scope can reserve again.
    pub fn scope(&mut self) -> Allocator<'_> {
        Allocator::new(&mut *self.manager)
    }

    /// Release this scope's workspace and end the scope.
    pub fn close(mut self) {
        self.release();
    }

    /// Number of workspace offsets this scope still holds.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Read-only view of the manager while the scope is open.
    pub fn manager(&self) -> &DeviceMemoryManager {
        &*self.manager
    }

    fn release(&mut self) {
        if !self.active.is_empty() {
            tracing::trace!(count = self.active.len(), "releasing scope workspace");
        }
        while let Some(offset) = self.active.pop() {
            self.manager.release_workspace(offset);
        }
    }

    /// Release offsets only while they sit on top of the arena stack.
    ///
    /// Used during unwinding, where a LIFO panic would abort the process.
    /// Offsets stuck under a leaked scope stay live and keep blocking
    /// `allocate()`.
    fn release_in_order(&mut self) {
        while let Some(&offset) = self.active.last() {
            if self.manager.workspace_arena().top() != Some(offset) {
                break;
            }
            self.active.pop();
            self.manager.release_workspace(offset);
        }
    }
}

impl Drop for Allocator<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.release_in_order();
        } else {
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_arena::MemoryConfig;
    use tessera_core::{DevicePtr, MemoryError};
    use tessera_device::HostDevice;

    fn manager(alignment: usize) -> DeviceMemoryManager {
        let config = MemoryConfig::new(alignment).with_staging_capacity(256);
        DeviceMemoryManager::new(Arc::new(HostDevice::new()), config).unwrap()
    }

    #[test]
    fn close_releases_scope_offsets() {
        let mut m = manager(8);
        let mut scope = m.open_scope();
        let _ = scope.reserve_workspace(64, false);
        let _ = scope.reserve_workspace(32, true);
        assert_eq!(scope.active_count(), 2);
        assert_eq!(scope.manager().workspace_arena().active_count(), 2);
        scope.close();
        assert!(m.workspace_arena().is_idle());
        assert_eq!(m.workspace_arena().max_allocated(), 96);
    }

    #[test]
    fn drop_releases_like_close() {
        let mut m = manager(8);
        {
            let mut scope = m.open_scope();
            let _ = scope.reserve_workspace(64, false);
        }
        assert!(m.workspace_arena().is_idle());
    }

    #[test]
    fn zero_sized_workspace_is_not_tracked() {
        let mut m = manager(8);
        let mut scope = m.open_scope();
        let r = scope.reserve_workspace(0, true);
        assert!(r.is_null());
        assert_eq!(scope.active_count(), 0);
        assert_eq!(scope.manager().resolve(r.ticket()), Ok(DevicePtr::NULL));
        scope.close();
    }

    #[test]
    fn argspace_is_not_released_on_close() {
        let mut m = manager(8);
        let mut scope = m.open_scope();
        let r = scope.reserve_argspace(&[1, 2, 3, 4]);
        assert_eq!(r.space(), MemorySpace::Argspace);
        assert_eq!(r.offset(), Some(0));
        assert_eq!(r.size(), 4);
        scope.close();
        assert_eq!(m.stats().pending_argspace_bytes, 8);
    }

    #[test]
    fn empty_argspace_resolves_through_its_record() {
        let mut m = manager(8);
        let mut scope = m.open_scope();
        let _ = scope.reserve_argspace(&[5; 12]);
        let empty = scope.reserve_argspace(&[]);
        assert!(!empty.is_null());
        assert_eq!(empty.offset(), Some(16));
        assert_eq!(empty.size(), 0);
        scope.close();

        assert!(matches!(
            m.resolve(empty.ticket()),
            Err(MemoryError::Unallocated { .. })
        ));
        assert_eq!(m.stats().pending_argspace_bytes, 16);

        m.allocate().unwrap();
        let base = m.argspace_records().get(0).unwrap().ptr().unwrap();
        assert_eq!(m.resolve(empty.ticket()), Ok(base.byte_add(16)));
    }

    #[test]
    fn unwinding_through_a_scope_releases_its_workspace() {
        let mut m = manager(8);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut outer = m.open_scope();
            let _ = outer.reserve_workspace(64, false);
            let mut inner = outer.scope();
            let _ = inner.reserve_workspace(32, false);
            panic!("kernel builder failed");
        }));
        assert!(result.is_err());
        assert!(m.workspace_arena().is_idle());
        assert!(m.allocate().is_ok());
        assert_eq!(m.workspace_records().get(0).unwrap().size(), 96);
    }

    #[test]
    fn nested_scope_reuses_released_bytes() {
        let mut m = manager(8);
        let mut outer = m.open_scope();
        let a = outer.reserve_workspace(64, false);
        let inner_offset = {
            let mut inner = outer.scope();
            let b = inner.reserve_workspace(128, false);
            inner.close();
            b.offset()
        };
        let c = outer.reserve_workspace(64, false);
        assert_eq!(a.offset(), Some(0));
        assert_eq!(c.offset(), inner_offset);
        outer.close();
        assert!(m.workspace_arena().is_idle());
        assert_eq!(m.workspace_arena().cursor(), 0);
    }
}
