//! The [`DeviceRuntime`] trait.

use std::sync::Arc;

use tessera_core::{DeviceError, DevicePtr};

/// Operations the memory manager needs from an accelerator runtime.
///
/// # Thread Safety
///
/// `Send + Sync` is required because zero-initialising workspace
/// primitives call [`memset`](DeviceRuntime::memset) at execution time,
/// possibly from several scheduler worker threads at once.
pub trait DeviceRuntime: Send + Sync + 'static {
    /// Create a device buffer of `size` bytes and return its base address.
    fn create_buffer(&self, size: usize) -> Result<DevicePtr, DeviceError>;

    /// Release a buffer previously returned by
    /// [`create_buffer`](DeviceRuntime::create_buffer).
    fn free_buffer(&self, ptr: DevicePtr) -> Result<(), DeviceError>;

    /// Copy `src` into device memory starting at `dst`.
    fn copy_host_to_device(&self, dst: DevicePtr, src: &[u8]) -> Result<(), DeviceError>;

    /// Fill `len` bytes of device memory starting at `dst` with `value`.
    fn memset(&self, dst: DevicePtr, value: u8, len: usize) -> Result<(), DeviceError>;

    /// Short human-readable name used in diagnostics.
    fn name(&self) -> &str {
        "device"
    }
}

/// Shared handle to a device runtime.
///
/// The manager and every primitive that zero-fills workspace hold one.
pub type SharedDevice = Arc<dyn DeviceRuntime>;
