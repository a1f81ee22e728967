//! A [`DeviceRuntime`] backed by host memory.
//!
//! [`HostDevice`] hands out synthetic, non-overlapping device addresses and
//! keeps each buffer's bytes in a `Vec<u8>`. An optional capacity limit
//! makes buffer creation fail with [`DeviceError::OutOfMemory`] the way a
//! real accelerator would.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_core::{DeviceError, DevicePtr};

use crate::runtime::DeviceRuntime;

/// First address handed out. Keeps zero free for [`DevicePtr::NULL`].
const BASE_ADDRESS: u64 = 0x1000_0000;

/// Alignment of every buffer base address, like a real device allocator.
const BASE_ALIGNMENT: u64 = 256;

struct HostState {
    /// Live buffers keyed by base address.
    buffers: BTreeMap<u64, Vec<u8>>,
    next_address: u64,
    bytes_in_use: usize,
}

/// Simulated device whose memory lives on the host.
pub struct HostDevice {
    state: Mutex<HostState>,
    /// Maximum total bytes of live buffers, or `None` for unlimited.
    capacity: Option<usize>,
}

impl HostDevice {
    /// Create a device with unlimited memory.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a device that refuses to hold more than `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity))
    }

    fn build(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(HostState {
                buffers: BTreeMap::new(),
                next_address: BASE_ADDRESS,
                bytes_in_use: 0,
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy `len` bytes of device memory starting at `ptr` back to the host.
    pub fn read(&self, ptr: DevicePtr, len: usize) -> Result<Vec<u8>, DeviceError> {
        let mut state = self.lock();
        let bytes = locate(&mut state.buffers, ptr, len)?;
        Ok(bytes.to_vec())
    }

    /// Number of live buffers.
    pub fn live_buffers(&self) -> usize {
        self.lock().buffers.len()
    }

    /// Total bytes held by live buffers.
    pub fn bytes_in_use(&self) -> usize {
        self.lock().bytes_in_use
    }

    /// Size of the live buffer whose base address is `ptr`.
    pub fn buffer_size(&self, ptr: DevicePtr) -> Option<usize> {
        self.lock().buffers.get(&ptr.0).map(Vec::len)
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `[ptr, ptr + len)` to a mutable slice of the containing buffer.
fn locate(
    buffers: &mut BTreeMap<u64, Vec<u8>>,
    ptr: DevicePtr,
    len: usize,
) -> Result<&mut [u8], DeviceError> {
    let (&base, buffer) = buffers
        .range_mut(..=ptr.0)
        .next_back()
        .ok_or(DeviceError::InvalidPointer { ptr })?;
    let start = (ptr.0 - base) as usize;
    if start > buffer.len() {
        return Err(DeviceError::InvalidPointer { ptr });
    }
    let end = start
        .checked_add(len)
        .filter(|&end| end <= buffer.len())
        .ok_or(DeviceError::OutOfBounds { ptr, len })?;
    Ok(&mut buffer[start..end])
}

impl DeviceRuntime for HostDevice {
    fn create_buffer(&self, size: usize) -> Result<DevicePtr, DeviceError> {
        let mut state = self.lock();
        if let Some(capacity) = self.capacity {
            let available = capacity.saturating_sub(state.bytes_in_use);
            if size > available {
                return Err(DeviceError::OutOfMemory {
                    requested: size,
                    available,
                });
            }
        }

        let base = state.next_address;
        // Leave at least one alignment unit of gap so that an address one
        // past the end of a buffer never lands inside the next one.
        let span = (size as u64).div_ceil(BASE_ALIGNMENT) * BASE_ALIGNMENT + BASE_ALIGNMENT;
        state.next_address = base + span;
        state.buffers.insert(base, vec![0; size]);
        state.bytes_in_use += size;
        tracing::trace!(size, ptr = %DevicePtr(base), "host device buffer created");
        Ok(DevicePtr(base))
    }

    fn free_buffer(&self, ptr: DevicePtr) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let buffer = state
            .buffers
            .remove(&ptr.0)
            .ok_or(DeviceError::InvalidPointer { ptr })?;
        state.bytes_in_use -= buffer.len();
        tracing::trace!(size = buffer.len(), %ptr, "host device buffer freed");
        Ok(())
    }

    fn copy_host_to_device(&self, dst: DevicePtr, src: &[u8]) -> Result<(), DeviceError> {
        let mut state = self.lock();
        locate(&mut state.buffers, dst, src.len())?.copy_from_slice(src);
        Ok(())
    }

    fn memset(&self, dst: DevicePtr, value: u8, len: usize) -> Result<(), DeviceError> {
        let mut state = self.lock();
        locate(&mut state.buffers, dst, len)?.fill(value);
        Ok(())
    }

    fn name(&self) -> &str {
        "host"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn buffers_do_not_overlap() {
        let device = HostDevice::new();
        let a = device.create_buffer(100).unwrap();
        let b = device.create_buffer(100).unwrap();
        assert!(!a.is_null());
        assert!(b.0 >= a.0 + 100);
        assert_eq!(a.0 % BASE_ALIGNMENT, 0);
        assert_eq!(b.0 % BASE_ALIGNMENT, 0);
    }

    #[test]
    fn copy_then_read_round_trips() {
        let device = HostDevice::new();
        let buf = device.create_buffer(16).unwrap();
        device.copy_host_to_device(buf.byte_add(4), &[1, 2, 3]).unwrap();
        assert_eq!(device.read(buf, 8).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn memset_fills_range() {
        let device = HostDevice::new();
        let buf = device.create_buffer(8).unwrap();
        device.copy_host_to_device(buf, &[9; 8]).unwrap();
        device.memset(buf.byte_add(2), 0, 4).unwrap();
        assert_eq!(device.read(buf, 8).unwrap(), vec![9, 9, 0, 0, 0, 0, 9, 9]);
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let device = HostDevice::new();
        let buf = device.create_buffer(8).unwrap();
        let err = device.copy_host_to_device(buf.byte_add(4), &[0; 8]).unwrap_err();
        assert_eq!(
            err,
            DeviceError::OutOfBounds {
                ptr: buf.byte_add(4),
                len: 8
            }
        );
    }

    #[test]
    fn unknown_pointer_is_rejected() {
        let device = HostDevice::new();
        assert_eq!(
            device.read(DevicePtr(0x10), 1),
            Err(DeviceError::InvalidPointer {
                ptr: DevicePtr(0x10)
            })
        );
        let buf = device.create_buffer(8).unwrap();
        // Inside the guard gap after the buffer.
        assert!(device.read(buf.byte_add(100), 1).is_err());
    }

    #[test]
    fn capacity_limit_reports_out_of_memory() {
        let device = HostDevice::with_capacity(128);
        device.create_buffer(100).unwrap();
        let err = device.create_buffer(64).unwrap_err();
        assert_eq!(
            err,
            DeviceError::OutOfMemory {
                requested: 64,
                available: 28
            }
        );
    }

    #[test]
    fn free_releases_capacity() {
        let device = HostDevice::with_capacity(128);
        let a = device.create_buffer(100).unwrap();
        device.free_buffer(a).unwrap();
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.bytes_in_use(), 0);
        assert!(device.create_buffer(128).is_ok());
    }

    #[test]
    fn double_free_is_rejected() {
        let device = HostDevice::new();
        let a = device.create_buffer(8).unwrap();
        device.free_buffer(a).unwrap();
        assert_eq!(
            device.free_buffer(a),
            Err(DeviceError::InvalidPointer { ptr: a })
        );
    }

    proptest! {
        #[test]
        fn copy_read_round_trips_at_any_offset(
            size in 1usize..512,
            data in prop::collection::vec(any::<u8>(), 0..64),
            offset_seed in any::<usize>(),
        ) {
            prop_assume!(data.len() <= size);
            let offset = offset_seed % (size - data.len() + 1);
            let device = HostDevice::new();
            let buf = device.create_buffer(size).unwrap();
            let dst = buf.byte_add(offset);
            device.copy_host_to_device(dst, &data).unwrap();

            prop_assert_eq!(device.read(dst, data.len()).unwrap(), data.clone());
            let whole = device.read(buf, size).unwrap();
            prop_assert!(whole[..offset].iter().all(|&b| b == 0));
            prop_assert!(whole[offset + data.len()..].iter().all(|&b| b == 0));
        }
    }
}
