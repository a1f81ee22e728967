//! Error types for the Tessera device memory manager.
//!
//! Organized by layer: configuration validation, the device runtime, and
//! the memory manager itself. Build-time misuse of the workspace stack
//! (out-of-order release) is a programmer error and panics instead of
//! producing one of these values.

use std::error::Error;
use std::fmt;

use crate::id::{DevicePtr, RecordId, Ticket};

/// Errors reported by a device runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not satisfy a buffer creation request.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still available on the device.
        available: usize,
    },
    /// The pointer does not belong to any live buffer on the device.
    InvalidPointer {
        /// The offending address.
        ptr: DevicePtr,
    },
    /// An access ran past the end of the buffer containing `ptr`.
    OutOfBounds {
        /// Start of the access.
        ptr: DevicePtr,
        /// Length of the access in bytes.
        len: usize,
    },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                available,
            } => {
                write!(
                    f,
                    "device out of memory: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::InvalidPointer { ptr } => write!(f, "invalid device pointer {ptr}"),
            Self::OutOfBounds { ptr, len } => {
                write!(f, "device access of {len} bytes at {ptr} is out of bounds")
            }
        }
    }
}

impl Error for DeviceError {}

/// Errors from the device memory manager and its primitives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// `allocate()` was called while workspace reservations are still held
    /// by an open (or leaked) allocator scope.
    ReservationsInProgress {
        /// Number of workspace offsets still active.
        active: usize,
    },
    /// A primitive was invoked before the buffer it targets was committed.
    Unallocated {
        /// The record the primitive targets.
        record: RecordId,
    },
    /// The ticket does not name any registered primitive.
    UnknownTicket {
        /// The unrecognised ticket.
        ticket: Ticket,
    },
    /// The device runtime failed.
    Device(DeviceError),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservationsInProgress { active } => {
                write!(
                    f,
                    "cannot allocate while reservations are in progress ({active} workspace offsets active); close all allocator scopes first"
                )
            }
            Self::Unallocated { record } => {
                write!(f, "attempt to use unallocated device memory ({record})")
            }
            Self::UnknownTicket { ticket } => write!(f, "unknown primitive ticket {ticket}"),
            Self::Device(e) => write!(f, "device error: {e}"),
        }
    }
}

impl Error for MemoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for MemoryError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

/// Errors from validating a memory configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Alignment must be a nonzero power of two.
    AlignmentNotPowerOfTwo {
        /// The rejected alignment.
        alignment: usize,
    },
    /// The staging buffer must start with a nonzero capacity, or doubling
    /// growth can never make room.
    ZeroStagingCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlignmentNotPowerOfTwo { alignment } => {
                write!(f, "alignment {alignment} is not a nonzero power of two")
            }
            Self::ZeroStagingCapacity => write!(f, "staging capacity must be nonzero"),
        }
    }
}

impl Error for ConfigError {}
