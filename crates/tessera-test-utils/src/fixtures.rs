//! Byte-pattern and configuration fixtures.

use tessera_arena::MemoryConfig;

/// `len` bytes of a deterministic, seed-dependent pattern.
///
/// Distinct seeds give distinct contents, so tests can tell apart data
/// staged by different reservations after it lands in device memory.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed).rotate_left(3))
        .collect()
}

/// A config with the given alignment and a small staging buffer, so that
/// tests exercise staging growth without megabyte-sized payloads.
pub fn small_config(alignment: usize) -> MemoryConfig {
    MemoryConfig::new(alignment).with_staging_capacity(64)
}
