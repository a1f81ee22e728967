//! Append-only table of deferred address resolvers.
//!
//! Compiled kernel programs store [`Ticket`]s, not addresses. Right before
//! dispatching a kernel the scheduler calls [`PrimitiveRegistry::invoke`],
//! which runs the stored primitive and yields the operand's current device
//! address. Tickets are positions in an append-only vector and are never
//! reused or invalidated.

use std::fmt;

use tessera_core::{DevicePtr, MemoryError, Ticket};

/// A deferred, replayable zero-argument address resolver.
///
/// `Send + Sync` because kernels, and therefore primitive invocations, may
/// run in parallel on scheduler worker threads.
pub type Primitive = Box<dyn Fn() -> Result<DevicePtr, MemoryError> + Send + Sync>;

/// Registry of primitives addressed by [`Ticket`].
#[derive(Default)]
pub struct PrimitiveRegistry {
    primitives: Vec<Primitive>,
}

impl PrimitiveRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive and return its ticket.
    pub fn insert<F>(&mut self, primitive: F) -> Ticket
    where
        F: Fn() -> Result<DevicePtr, MemoryError> + Send + Sync + 'static,
    {
        let ticket = Ticket(self.primitives.len());
        self.primitives.push(Box::new(primitive));
        ticket
    }

    /// Run the primitive behind `ticket`.
    ///
    /// Safe to call repeatedly and concurrently. Fails with
    /// [`MemoryError::UnknownTicket`] for a ticket this registry never
    /// issued, or with whatever the primitive reports (typically
    /// [`MemoryError::Unallocated`] when its buffer was never committed).
    pub fn invoke(&self, ticket: Ticket) -> Result<DevicePtr, MemoryError> {
        let primitive = self
            .primitives
            .get(ticket.0)
            .ok_or(MemoryError::UnknownTicket { ticket })?;
        primitive()
    }

    /// Number of registered primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Whether no primitive has been registered.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveRegistry")
            .field("len", &self.primitives.len())
            .finish()
    }
}
