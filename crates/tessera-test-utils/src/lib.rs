//! Test utilities and fault-injecting devices for Tessera development.
//!
//! Provides [`FaultyDevice`], a [`DeviceRuntime`] that records every call
//! and fails on demand, plus byte-pattern and config fixtures shared by
//! the integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use indexmap::IndexMap;
use tessera_core::{DeviceError, DevicePtr};
use tessera_device::{DeviceRuntime, HostDevice};

pub use fixtures::{pattern, small_config};

/// Host-backed device that counts calls and injects failures.
///
/// Buffer creation succeeds `succeed_creates` times, then reports
/// [`DeviceError::OutOfMemory`]. Copies and memsets fail while their
/// switches are on. Live buffers are tracked in creation order so tests
/// can check that every buffer is freed exactly once.
pub struct FaultyDevice {
    inner: HostDevice,
    succeed_creates: AtomicUsize,
    fail_copies: AtomicBool,
    fail_memsets: AtomicBool,
    live: Mutex<IndexMap<DevicePtr, usize>>,
    creates: AtomicUsize,
    frees: AtomicUsize,
    copies: AtomicUsize,
    memsets: AtomicUsize,
}

impl FaultyDevice {
    /// A device that never fails until told to.
    pub fn new() -> Self {
        Self::failing_after(usize::MAX)
    }

    /// A device whose buffer creation fails after `succeed_creates` successes.
    pub fn failing_after(succeed_creates: usize) -> Self {
        Self {
            inner: HostDevice::new(),
            succeed_creates: AtomicUsize::new(succeed_creates),
            fail_copies: AtomicBool::new(false),
            fail_memsets: AtomicBool::new(false),
            live: Mutex::new(IndexMap::new()),
            creates: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            copies: AtomicUsize::new(0),
            memsets: AtomicUsize::new(0),
        }
    }

    /// Allow `n` more successful buffer creations.
    pub fn allow_creates(&self, n: usize) {
        self.succeed_creates.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_copies(&self, fail: bool) {
        self.fail_copies.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_memsets(&self, fail: bool) {
        self.fail_memsets.store(fail, Ordering::SeqCst);
    }

    /// The host memory behind the device, for reading results back.
    pub fn host(&self) -> &HostDevice {
        &self.inner
    }

    /// Live buffers as `(base, size)`, oldest first.
    pub fn live_buffers(&self) -> Vec<(DevicePtr, usize)> {
        let live = self.live.lock().unwrap();
        live.iter().map(|(&ptr, &size)| (ptr, size)).collect()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn memsets(&self) -> usize {
        self.memsets.load(Ordering::SeqCst)
    }
}

impl Default for FaultyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRuntime for FaultyDevice {
    fn create_buffer(&self, size: usize) -> Result<DevicePtr, DeviceError> {
        let remaining = self.succeed_creates.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(DeviceError::OutOfMemory {
                requested: size,
                available: 0,
            });
        }
        self.succeed_creates.store(remaining - 1, Ordering::SeqCst);
        let ptr = self.inner.create_buffer(size)?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.live.lock().unwrap().insert(ptr, size);
        Ok(ptr)
    }

    fn free_buffer(&self, ptr: DevicePtr) -> Result<(), DeviceError> {
        self.inner.free_buffer(ptr)?;
        self.frees.fetch_add(1, Ordering::SeqCst);
        self.live.lock().unwrap().shift_remove(&ptr);
        Ok(())
    }

    fn copy_host_to_device(&self, dst: DevicePtr, src: &[u8]) -> Result<(), DeviceError> {
        if self.fail_copies.load(Ordering::SeqCst) {
            return Err(DeviceError::InvalidPointer { ptr: dst });
        }
        self.copies.fetch_add(1, Ordering::SeqCst);
        self.inner.copy_host_to_device(dst, src)
    }

    fn memset(&self, dst: DevicePtr, value: u8, len: usize) -> Result<(), DeviceError> {
        if self.fail_memsets.load(Ordering::SeqCst) {
            return Err(DeviceError::OutOfBounds { ptr: dst, len });
        }
        self.memsets.fetch_add(1, Ordering::SeqCst);
        self.inner.memset(dst, value, len)
    }

    fn name(&self) -> &str {
        "faulty-host"
    }
}
