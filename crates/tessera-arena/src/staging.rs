//! Host-side staging of argument bytes awaiting bulk transfer.
//!
//! [`StagingBuffer`] is a bump allocator over a `Vec<u8>`. Every write is
//! padded to the configured alignment, so every offset it returns is
//! aligned. When a write would overflow, the backing storage doubles until
//! it fits; existing bytes keep their offsets. On commit the manager
//! drains the buffer and copies its contents to the device in one
//! transfer, so an offset returned here is also the offset of the same
//! bytes inside the committed device buffer.

use crate::align::align_up;

/// Growable host buffer accumulating argument bytes for one commit.
pub struct StagingBuffer {
    /// Backing storage. Its length is the current capacity; bytes past
    /// `cursor` are zero.
    data: Vec<u8>,
    /// Write cursor: total aligned bytes staged so far.
    cursor: usize,
    /// Capacity restored by [`drain`](Self::drain).
    initial_capacity: usize,
    alignment: usize,
}

impl StagingBuffer {
    /// Create an empty staging buffer.
    ///
    /// `alignment` must be a nonzero power of two. A zero
    /// `initial_capacity` is bumped to one byte so doubling can make
    /// progress.
    pub fn new(initial_capacity: usize, alignment: usize) -> Self {
        let initial_capacity = initial_capacity.max(1);
        Self {
            data: vec![0; initial_capacity],
            cursor: 0,
            initial_capacity,
            alignment,
        }
    }

    /// Append `bytes` and return the offset they were written at.
    ///
    /// The cursor advances by `bytes.len()` rounded up to the alignment;
    /// the padding is left zeroed. An empty write returns the current
    /// cursor without advancing it.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let aligned_size = align_up(bytes.len(), self.alignment);
        let new_cursor = self
            .cursor
            .checked_add(aligned_size)
            .expect("staging buffer size overflows usize");

        let mut capacity = self.data.len();
        while capacity < new_cursor {
            capacity = capacity.checked_mul(2).unwrap_or(new_cursor);
        }
        if capacity > self.data.len() {
            self.data.resize(capacity, 0);
        }

        let offset = self.cursor;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.cursor = new_cursor;
        offset
    }

    /// Take the staged bytes, leaving a fresh empty buffer behind.
    ///
    /// The returned vector holds exactly [`len`](Self::len) bytes with
    /// every previously returned offset still pointing at its data. The
    /// buffer returns to its initial capacity with the cursor at zero.
    pub fn drain(&mut self) -> Vec<u8> {
        let mut staged = std::mem::replace(&mut self.data, vec![0; self.initial_capacity]);
        staged.truncate(self.cursor);
        self.cursor = 0;
        staged
    }

    /// Read back staged bytes at `offset`.
    ///
    /// Returns `None` if the range lies beyond the write cursor.
    pub fn get(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > self.cursor {
            return None;
        }
        Some(&self.data[offset..end])
    }

    /// All staged bytes, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Total aligned bytes staged since the last drain.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Whether nothing has been staged since the last drain.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Current capacity of the backing storage in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Alignment applied to every write.
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}
