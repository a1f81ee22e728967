//! LIFO offset allocator sizing the workspace buffer of one commit.
//!
//! [`WorkspaceArena`] never owns memory. It hands out byte offsets into a
//! logical region whose required size, the high-water mark, becomes the
//! size of the device buffer created at commit time. Offsets are released
//! in strict stack order: the allocator scopes that reserve workspace are
//! themselves nested, so the most recent reservation is always the first
//! one released. Releasing rewinds the cursor, letting sibling scopes
//! reuse the same bytes.

use smallvec::SmallVec;
use tessera_core::Generation;

use crate::align::align_up;

/// One live reservation on the arena stack.
#[derive(Clone, Copy, Debug)]
struct ActiveSlot {
    /// Offset returned to the caller.
    offset: usize,
    /// Cursor value before this reservation, restored on release.
    prev_cursor: usize,
}

/// Stack-discipline offset allocator with high-water-mark tracking.
#[derive(Debug, Default)]
pub struct WorkspaceArena {
    /// Top of the stack: first byte past the newest live reservation.
    cursor: usize,
    /// Largest value `cursor` has reached since the last reset.
    high_water: usize,
    active: SmallVec<[ActiveSlot; 16]>,
    generation: Generation,
}

impl WorkspaceArena {
    /// Create an empty arena at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `size` bytes aligned to `alignment` and return their offset.
    ///
    /// The offset is the cursor rounded up to `alignment`; the cursor then
    /// advances by `size` rounded up to `alignment`. A zero `size` returns
    /// a valid offset and pushes a zero-length slot that must still be
    /// freed.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> usize {
        let offset = align_up(self.cursor, alignment);
        let prev_cursor = self.cursor;
        self.cursor = offset
            .checked_add(align_up(size, alignment))
            .expect("workspace size overflows usize");
        self.high_water = self.high_water.max(self.cursor);
        self.active.push(ActiveSlot {
            offset,
            prev_cursor,
        });
        offset
    }

    /// Release the most recent live reservation, which must be `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the arena has no live reservation or if `offset` is not
    /// the most recent one. Releasing out of order would desynchronise
    /// every later offset computation.
    pub fn free(&mut self, offset: usize) {
        let Some(top) = self.active.last() else {
            panic!("workspace free of offset {offset} with no live reservation");
        };
        assert!(
            top.offset == offset,
            "workspace free out of LIFO order: freeing offset {offset}, most recent is {}",
            top.offset,
        );
        self.cursor = top.prev_cursor;
        self.active.pop();
    }

    /// Offset of the most recent live reservation, if any.
    pub fn top(&self) -> Option<usize> {
        self.active.last().map(|slot| slot.offset)
    }

    /// Bytes the workspace buffer must hold for this generation.
    pub fn max_allocated(&self) -> usize {
        self.high_water
    }

    /// Start a new generation with no reservations and a zero high-water mark.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.high_water = 0;
        self.active.clear();
        self.generation = self.generation.next();
    }

    /// Current top-of-stack position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of live (not yet freed) reservations.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether no reservation is live.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of resets performed so far.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sizes_round_up_to_alignment() {
        let mut arena = WorkspaceArena::new();
        assert_eq!(arena.allocate(10, 16), 0);
        assert_eq!(arena.allocate(5, 16), 16);
        assert_eq!(arena.max_allocated(), 32);
    }

    #[test]
    fn top_tracks_most_recent_reservation() {
        let mut arena = WorkspaceArena::new();
        assert_eq!(arena.top(), None);
        let a = arena.allocate(8, 8);
        let b = arena.allocate(8, 8);
        assert_eq!(arena.top(), Some(b));
        arena.free(b);
        assert_eq!(arena.top(), Some(a));
    }

    #[test]
    fn free_rewinds_cursor_for_reuse() {
        let mut arena = WorkspaceArena::new();
        let a = arena.allocate(64, 8);
        let b = arena.allocate(128, 8);
        assert_eq!((a, b), (0, 64));
        arena.free(b);
        assert_eq!(arena.allocate(64, 8), 64);
        assert_eq!(arena.max_allocated(), 192);
    }

    #[test]
    fn mixed_alignment_restores_exact_cursor() {
        let mut arena = WorkspaceArena::new();
        arena.allocate(3, 1);
        let b = arena.allocate(8, 64);
        assert_eq!(b, 64);
        arena.free(b);
        assert_eq!(arena.cursor(), 3);
    }

    #[test]
    fn zero_size_consumes_nothing() {
        let mut arena = WorkspaceArena::new();
        arena.allocate(16, 8);
        let z = arena.allocate(0, 8);
        assert_eq!(z, 16);
        assert_eq!(arena.max_allocated(), 16);
        arena.free(z);
    }

    #[test]
    #[should_panic(expected = "out of LIFO order")]
    fn out_of_order_free_panics() {
        let mut arena = WorkspaceArena::new();
        let a = arena.allocate(8, 8);
        arena.allocate(8, 8);
        arena.free(a);
    }

    #[test]
    #[should_panic(expected = "no live reservation")]
    fn free_on_empty_arena_panics() {
        let mut arena = WorkspaceArena::new();
        arena.free(0);
    }

    #[test]
    fn reset_starts_fresh_generation() {
        let mut arena = WorkspaceArena::new();
        arena.allocate(100, 8);
        arena.reset();
        assert_eq!(arena.max_allocated(), 0);
        assert!(arena.is_idle());
        assert_eq!(arena.cursor(), 0);
        assert_eq!(arena.generation(), Generation(1));
    }

    proptest! {
        #[test]
        fn release_then_replay_yields_identical_offsets(
            sizes in proptest::collection::vec(0usize..4096, 1..32),
        ) {
            let mut arena = WorkspaceArena::new();
            let first: Vec<usize> = sizes.iter().map(|&s| arena.allocate(s, 16)).collect();
            let peak = arena.max_allocated();
            for &off in first.iter().rev() {
                arena.free(off);
            }
            prop_assert!(arena.is_idle());
            prop_assert_eq!(arena.cursor(), 0);

            let second: Vec<usize> = sizes.iter().map(|&s| arena.allocate(s, 16)).collect();
            prop_assert_eq!(first, second);
            prop_assert_eq!(arena.max_allocated(), peak);
        }
    }
}
