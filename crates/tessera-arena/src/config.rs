//! Memory manager configuration parameters.

use tessera_core::ConfigError;

/// Configuration for a device memory manager.
///
/// Controls the alignment applied to every reservation and the initial
/// size of the host staging buffer. Validated at manager construction;
/// immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Alignment in bytes of every argspace and workspace offset, and of
    /// every committed buffer size.
    ///
    /// Default: 8. Must be a nonzero power of two.
    pub alignment: usize,

    /// Initial capacity of the host staging buffer in bytes.
    ///
    /// Default: 10 MiB. The buffer doubles whenever a write would overflow
    /// it and returns to this size after every commit. Must be nonzero.
    pub staging_capacity: usize,
}

impl MemoryConfig {
    /// Default reservation alignment in bytes.
    pub const DEFAULT_ALIGNMENT: usize = 8;

    /// Default initial staging capacity: 10 MiB.
    pub const DEFAULT_STAGING_CAPACITY: usize = 10 * 1024 * 1024;

    /// Create a config with the given alignment and default staging capacity.
    pub fn new(alignment: usize) -> Self {
        Self {
            alignment,
            staging_capacity: Self::DEFAULT_STAGING_CAPACITY,
        }
    }

    /// Builder-style override of the initial staging capacity.
    pub fn with_staging_capacity(mut self, bytes: usize) -> Self {
        self.staging_capacity = bytes;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alignment.is_power_of_two() {
            return Err(ConfigError::AlignmentNotPowerOfTwo {
                alignment: self.alignment,
            });
        }
        if self.staging_capacity == 0 {
            return Err(ConfigError::ZeroStagingCapacity);
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALIGNMENT)
    }
}
