//! Alignment arithmetic shared by the staging buffer and workspace arena.

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a nonzero power of two; [`MemoryConfig::validate`]
/// guarantees this for every alignment the memory manager uses.
///
/// # Panics
///
/// Panics in debug builds if `alignment` is not a power of two, and in all
/// builds if the rounded value overflows `usize`.
///
/// [`MemoryConfig::validate`]: crate::MemoryConfig::validate
pub fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(
        alignment.is_power_of_two(),
        "alignment {alignment} is not a power of two"
    );
    let mask = alignment - 1;
    value
        .checked_add(mask)
        .expect("aligned size overflows usize")
        & !mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_up_to_alignment() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(10, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 8), 24);
    }

    #[test]
    fn alignment_one_is_identity() {
        assert_eq!(align_up(13, 1), 13);
    }

    proptest! {
        #[test]
        fn result_is_smallest_aligned_value(value in 0usize..1 << 40, shift in 0u32..12) {
            let alignment = 1usize << shift;
            let aligned = align_up(value, alignment);
            prop_assert_eq!(aligned % alignment, 0);
            prop_assert!(aligned >= value);
            prop_assert!(aligned - value < alignment);
        }
    }
}
