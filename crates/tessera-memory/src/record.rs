//! Buffer records: write-once slots for committed device buffers.
//!
//! A [`BufferRecord`] starts "open" (no address, size 0). Reservations made
//! while it is open capture an `Arc` to it together with their byte offset.
//! At commit the manager fills the record exactly once; from then on every
//! captured reference observes the address. Records are never removed or
//! relocated, and the `OnceLock` publishing the address provides the
//! happens-before edge between the commit and any later invocation on
//! another thread.

use std::sync::{Arc, OnceLock};

use tessera_core::{DevicePtr, Generation, MemoryError, MemorySpace, RecordId};

/// Address and size of a materialized device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Committed {
    /// Base address of the buffer.
    pub ptr: DevicePtr,
    /// Size of the buffer in bytes.
    pub size: usize,
}

/// One argspace or workspace buffer, possibly not yet materialized.
#[derive(Debug)]
pub struct BufferRecord {
    id: RecordId,
    generation: Generation,
    committed: OnceLock<Committed>,
}

impl BufferRecord {
    fn open(id: RecordId, generation: Generation) -> Self {
        Self {
            id,
            generation,
            committed: OnceLock::new(),
        }
    }

    /// Stable identity of this record.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Generation whose reservations target this record.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The committed buffer, if the record has been materialized.
    pub fn committed(&self) -> Option<Committed> {
        self.committed.get().copied()
    }

    /// Base address, or `None` while the record is open.
    pub fn ptr(&self) -> Option<DevicePtr> {
        self.committed.get().map(|c| c.ptr)
    }

    /// Committed size in bytes; 0 while the record is open.
    pub fn size(&self) -> usize {
        self.committed.get().map_or(0, |c| c.size)
    }

    /// Whether the record has a device buffer.
    pub fn is_materialized(&self) -> bool {
        self.committed.get().is_some()
    }

    /// Address `offset` bytes into the committed buffer.
    pub fn resolve(&self, offset: usize) -> Result<DevicePtr, MemoryError> {
        self.ptr()
            .map(|base| base.byte_add(offset))
            .ok_or(MemoryError::Unallocated { record: self.id })
    }

    fn materialize(&self, committed: Committed) {
        assert!(
            self.committed.set(committed).is_ok(),
            "buffer record {} materialized twice",
            self.id,
        );
    }
}

/// Append-only sequence of buffer records for one memory space.
///
/// Invariant: the last record is always open; every other record is
/// materialized.
#[derive(Debug)]
pub struct RecordList {
    space: MemorySpace,
    records: Vec<Arc<BufferRecord>>,
}

impl RecordList {
    /// Create a list holding a single open record for generation 0.
    pub fn new(space: MemorySpace) -> Self {
        let mut list = Self {
            space,
            records: Vec::new(),
        };
        list.push_open(Generation::default());
        list
    }

    fn push_open(&mut self, generation: Generation) {
        let id = RecordId {
            space: self.space,
            index: self.records.len() as u32,
        };
        self.records.push(Arc::new(BufferRecord::open(id, generation)));
    }

    /// The trailing open record that new reservations target.
    pub fn open_record(&self) -> &Arc<BufferRecord> {
        self.records
            .last()
            .expect("record list always holds an open record")
    }

    /// Materialize the open record and append a fresh one for `next`.
    pub(crate) fn commit(&mut self, committed: Committed, next: Generation) {
        self.open_record().materialize(committed);
        self.push_open(next);
    }

    /// Which memory space this list belongs to.
    pub fn space(&self) -> MemorySpace {
        self.space
    }

    /// All records, oldest first. The last one is open.
    pub fn iter(&self) -> impl Iterator<Item = &BufferRecord> {
        self.records.iter().map(Arc::as_ref)
    }

    /// Record at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&BufferRecord> {
        self.records.get(index).map(Arc::as_ref)
    }

    /// Number of records, including the open one.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`: the open record is never removed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Buffers materialized so far.
    pub fn committed_buffers(&self) -> impl Iterator<Item = Committed> + '_ {
        self.records.iter().filter_map(|r| r.committed())
    }

    /// Number of materialized buffers.
    pub fn committed_count(&self) -> usize {
        self.committed_buffers().count()
    }

    /// Total size of materialized buffers in bytes.
    pub fn committed_bytes(&self) -> usize {
        self.committed_buffers().map(|c| c.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_has_one_open_record() {
        let list = RecordList::new(MemorySpace::Argspace);
        assert_eq!(list.len(), 1);
        let open = list.open_record();
        assert!(!open.is_materialized());
        assert_eq!(open.size(), 0);
        assert_eq!(open.generation(), Generation(0));
        assert_eq!(list.committed_bytes(), 0);
    }

    #[test]
    fn commit_fills_record_and_appends_open() {
        let mut list = RecordList::new(MemorySpace::Workspace);
        let captured = Arc::clone(list.open_record());
        list.commit(
            Committed {
                ptr: DevicePtr(0x1000),
                size: 64,
            },
            Generation(1),
        );

        // The reference captured before the commit observes the address.
        assert_eq!(captured.resolve(8), Ok(DevicePtr(0x1008)));
        assert_eq!(list.len(), 2);
        assert!(!list.open_record().is_materialized());
        assert_eq!(list.open_record().generation(), Generation(1));
        assert_eq!(list.open_record().id().index, 1);
        assert_eq!(list.committed_count(), 1);
        assert_eq!(list.committed_bytes(), 64);
    }

    #[test]
    fn resolving_open_record_is_unallocated() {
        let list = RecordList::new(MemorySpace::Argspace);
        let err = list.open_record().resolve(0).unwrap_err();
        assert_eq!(
            err,
            MemoryError::Unallocated {
                record: RecordId {
                    space: MemorySpace::Argspace,
                    index: 0
                }
            }
        );
    }

    #[test]
    fn only_trailing_record_is_open() {
        let mut list = RecordList::new(MemorySpace::Argspace);
        for i in 0..3u64 {
            list.commit(
                Committed {
                    ptr: DevicePtr(0x1000 * (i + 1)),
                    size: 16,
                },
                Generation(i as u32 + 1),
            );
        }
        let open: Vec<bool> = list.iter().map(|r| !r.is_materialized()).collect();
        assert_eq!(open, vec![false, false, false, true]);
    }
}
