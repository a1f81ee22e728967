//! The per-program device memory manager.
//!
//! [`DeviceMemoryManager`] owns everything needed to turn reservations into
//! addresses: the staging buffer, the workspace arena, one record list per
//! memory space and the primitive registry. It is created once per
//! compiled program and must outlive every execution of that program.

use std::sync::Arc;

use tessera_arena::{align_up, MemoryConfig, StagingBuffer, WorkspaceArena};
use tessera_core::{ConfigError, DevicePtr, Generation, MemoryError, MemorySpace, Ticket};
use tessera_device::SharedDevice;

use crate::allocator::{Allocator, Reservation};
use crate::record::{Committed, RecordList};
use crate::registry::PrimitiveRegistry;
use crate::stats::AllocationStats;

/// Arbitrates between build-time reservations and device buffers.
///
/// # Lifecycle
///
/// ```text
/// open_scope() ─ reserve_* ─ close ─┐
///        ▲                          ▼
///        └──────────────────── allocate()   (repeatable)
///                                   │
///                         registry().invoke(ticket)   (execution)
/// ```
///
/// Reservations are only reachable through an [`Allocator`] scope, which
/// mutably borrows the manager. The borrow checker therefore rules out
/// committing while a scope is alive; [`allocate`](Self::allocate) still
/// checks the arena at run time to catch a leaked scope.
pub struct DeviceMemoryManager {
    config: MemoryConfig,
    device: SharedDevice,
    staging: StagingBuffer,
    workspace: WorkspaceArena,
    argspace_records: RecordList,
    workspace_records: RecordList,
    registry: PrimitiveRegistry,
    generation: Generation,
}

impl DeviceMemoryManager {
    /// Create a manager that commits buffers on `device`.
    pub fn new(device: SharedDevice, config: MemoryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(device, config))
    }

    /// Create a manager with [`MemoryConfig::default`].
    pub fn with_default_config(device: SharedDevice) -> Self {
        Self::build(device, MemoryConfig::default())
    }

    fn build(device: SharedDevice, config: MemoryConfig) -> Self {
        Self {
            staging: StagingBuffer::new(config.staging_capacity, config.alignment),
            workspace: WorkspaceArena::new(),
            argspace_records: RecordList::new(MemorySpace::Argspace),
            workspace_records: RecordList::new(MemorySpace::Workspace),
            registry: PrimitiveRegistry::new(),
            generation: Generation::default(),
            config,
            device,
        }
    }

    /// Open a build scope for reserving memory.
    pub fn open_scope(&mut self) -> Allocator<'_> {
        Allocator::new(self)
    }

    /// Stage `data` for the next commit and register its address resolver.
    ///
    /// The primitive captures the open argspace record, so it resolves to
    /// `record.ptr + offset` once that record is committed. Empty `data`
    /// stages nothing but still resolves through the record, to the
    /// current end of the staged bytes.
    pub(crate) fn reserve_argspace(&mut self, data: &[u8]) -> Reservation {
        let offset = self.staging.write(data);
        let record = Arc::clone(self.argspace_records.open_record());
        tracing::trace!(
            offset,
            size = data.len(),
            record = %record.id(),
            "argspace reserved"
        );
        let ticket = self.registry.insert(move || record.resolve(offset));
        Reservation::new(ticket, MemorySpace::Argspace, offset, data.len())
    }

    /// Reserve `size` bytes of workspace and register its address resolver.
    ///
    /// The caller owns the returned offset on the arena stack and must free
    /// it in LIFO order; [`Allocator`] does this on close. A zero `size`
    /// touches no arena state and resolves to [`DevicePtr::NULL`].
    ///
    /// With `zero_initialize`, the primitive clears the `size` bytes on the
    /// device each time it is invoked, not only the first time.
    pub(crate) fn reserve_workspace(&mut self, size: usize, zero_initialize: bool) -> Reservation {
        if size == 0 {
            let ticket = self.registry.insert(|| Ok(DevicePtr::NULL));
            return Reservation::null(ticket, MemorySpace::Workspace);
        }

        let offset = self.workspace.allocate(size, self.config.alignment);
        let record = Arc::clone(self.workspace_records.open_record());
        tracing::trace!(
            offset,
            size,
            zero_initialize,
            record = %record.id(),
            "workspace reserved"
        );

        let ticket = if zero_initialize {
            let device = Arc::clone(&self.device);
            self.registry.insert(move || {
                let ptr = record.resolve(offset)?;
                device.memset(ptr, 0, size).map_err(|e| {
                    tracing::warn!(%ptr, size, error = %e, "workspace zero-fill failed");
                    MemoryError::from(e)
                })?;
                Ok(ptr)
            })
        } else {
            self.registry.insert(move || record.resolve(offset))
        };
        Reservation::new(ticket, MemorySpace::Workspace, offset, size)
    }

    /// Release a workspace offset previously returned by
    /// [`reserve_workspace`](Self::reserve_workspace).
    pub(crate) fn release_workspace(&mut self, offset: usize) {
        self.workspace.free(offset);
    }

    /// Commit every reservation made since the previous commit.
    ///
    /// Pending argument bytes are copied to one new device buffer in a
    /// single transfer; a nonzero workspace high-water mark sizes one new
    /// scratch buffer. Each committed record is filled in and a fresh open
    /// record appended, so later reservations target the next generation.
    ///
    /// # Errors
    ///
    /// - [`MemoryError::ReservationsInProgress`] if any workspace offset is
    ///   still held, which means an [`Allocator`] was leaked. Nothing is
    ///   committed.
    /// - [`MemoryError::Device`] if creating or filling a buffer fails. A
    ///   failed argspace commit leaves all state untouched; if only the
    ///   workspace commit fails, the argspace commit stands, the generation
    ///   still advances, and the workspace demand stays pending for a retry.
    pub fn allocate(&mut self) -> Result<(), MemoryError> {
        if !self.workspace.is_idle() {
            let active = self.workspace.active_count();
            tracing::warn!(active, "allocate rejected: reservations in progress");
            return Err(MemoryError::ReservationsInProgress { active });
        }

        let current = self.generation;
        let next = current.next();

        if !self.staging.is_empty() {
            let size = align_up(self.staging.len(), self.config.alignment);
            let ptr = self.device.create_buffer(size)?;
            if let Err(e) = self.device.copy_host_to_device(ptr, self.staging.as_bytes()) {
                if let Err(free_err) = self.device.free_buffer(ptr) {
                    tracing::warn!(%ptr, error = %free_err, "failed to release argspace buffer");
                }
                return Err(e.into());
            }
            self.staging.drain();
            self.argspace_records.commit(Committed { ptr, size }, next);
            tracing::debug!(%ptr, size, generation = %current, "argspace committed");
            self.generation = next;
        }

        let size = self.workspace.max_allocated();
        if size > 0 {
            let ptr = self.device.create_buffer(size)?;
            self.workspace_records.commit(Committed { ptr, size }, next);
            self.workspace.reset();
            tracing::debug!(%ptr, size, generation = %current, "workspace committed");
            self.generation = next;
        }

        Ok(())
    }

    /// Total size of all committed buffers in both memory spaces.
    pub fn get_allocation_size(&self) -> usize {
        self.argspace_records.committed_bytes() + self.workspace_records.committed_bytes()
    }

    /// Accounting snapshot of committed and pending memory.
    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            argspace_bytes: self.argspace_records.committed_bytes(),
            argspace_buffers: self.argspace_records.committed_count(),
            workspace_bytes: self.workspace_records.committed_bytes(),
            workspace_buffers: self.workspace_records.committed_count(),
            pending_argspace_bytes: self.staging.len(),
            pending_workspace_bytes: self.workspace.max_allocated(),
            primitives: self.registry.len(),
            generation: self.generation,
        }
    }

    /// Resolve `ticket` to a device address.
    ///
    /// Shorthand for `self.registry().invoke(ticket)`.
    pub fn resolve(&self, ticket: Ticket) -> Result<DevicePtr, MemoryError> {
        self.registry.invoke(ticket)
    }

    /// The registry the scheduler resolves tickets through.
    pub fn registry(&self) -> &PrimitiveRegistry {
        &self.registry
    }

    /// Mutable registry access, for callers registering their own
    /// primitives alongside memory resolvers.
    pub fn registry_mut(&mut self) -> &mut PrimitiveRegistry {
        &mut self.registry
    }

    /// Argspace buffer records, oldest first.
    pub fn argspace_records(&self) -> &RecordList {
        &self.argspace_records
    }

    /// Workspace buffer records, oldest first.
    pub fn workspace_records(&self) -> &RecordList {
        &self.workspace_records
    }

    /// The workspace arena for the generation being built.
    pub fn workspace_arena(&self) -> &WorkspaceArena {
        &self.workspace
    }

    /// The generation currently accumulating reservations.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// The device buffers are committed on.
    pub fn device(&self) -> &SharedDevice {
        &self.device
    }
}

impl Drop for DeviceMemoryManager {
    fn drop(&mut self) {
        let committed = self
            .argspace_records
            .committed_buffers()
            .chain(self.workspace_records.committed_buffers());
        for buffer in committed {
            if let Err(e) = self.device.free_buffer(buffer.ptr) {
                tracing::warn!(ptr = %buffer.ptr, size = buffer.size, error = %e, "failed to free device buffer");
            }
        }
    }
}
