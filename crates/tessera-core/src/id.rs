//! Strongly-typed identifiers and the [`DevicePtr`] address type.

use std::fmt;

/// An address in device memory.
///
/// Device addresses are opaque integers handed out by a
/// `DeviceRuntime`. They are never dereferenced on the host; the
/// memory manager only ever adds byte offsets to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevicePtr(pub u64);

impl DevicePtr {
    /// The null device address. Zero-sized workspace reservations resolve
    /// to this value.
    pub const NULL: DevicePtr = DevicePtr(0);

    /// Returns `true` if this is the null address.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The address `offset` bytes past this one.
    ///
    /// # Panics
    ///
    /// Panics if the resulting address overflows `u64`.
    pub fn byte_add(self, offset: usize) -> Self {
        Self(
            self.0
                .checked_add(offset as u64)
                .expect("device address overflow"),
        )
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for DevicePtr {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a deferred primitive in the primitive registry.
///
/// Compiled kernel programs embed tickets instead of raw addresses and
/// resolve them immediately before dispatch. A ticket carries no release
/// responsibility and may be copied freely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub usize);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Ticket {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// The two device memory spaces managed per compiled program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemorySpace {
    /// Persistent kernel arguments, parameters and constants.
    Argspace,
    /// Transient kernel scratch space, reused across build scopes.
    Workspace,
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argspace => write!(f, "argspace"),
            Self::Workspace => write!(f, "workspace"),
        }
    }
}

/// Stable identity of a buffer record within one memory space.
///
/// `RecordId { space, index }` names the `index`-th record ever opened
/// in `space`. Records are never removed or relocated, so an id stays
/// valid for the manager's whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId {
    /// Which memory space the record belongs to.
    pub space: MemorySpace,
    /// Position of the record in that space's record list.
    pub index: u32,
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.space, self.index)
    }
}

/// Counts commits performed by the memory manager.
///
/// Generation `n` is the set of reservations accumulated between the
/// `n`-th and `(n+1)`-th call to `allocate()`. The first generation is 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u32);

impl Generation {
    /// The generation following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
