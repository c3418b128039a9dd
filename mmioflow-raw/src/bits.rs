//! Mask-and-shift extraction and insertion of bit fields
//!
//! Single ranges follow the usual formulas:
//!
//! ```text
//! extract(s)    = (s >> lower) & mask(width)
//! insert(v, s)  = (s & !(mask(width) << lower)) | (v << lower)
//! ```
//!
//! A discontiguous field concatenates its ranges in declared order: the first
//! range holds the low-order bits of the logical value, and each following
//! range is shifted up by the combined width of the ranges before it.
//!
//! Inserting a value wider than its field is a logic error and panics.

use crate::bit_range::BitRange;
use crate::storage::RegisterStorage;

#[inline(always)]
fn assert_within<S: RegisterStorage>(range: &BitRange) {
    assert!(
        range.upper() <= S::BITS,
        "bit range {} extends outside storage of bit width {}",
        range,
        S::BITS
    );
}

/// Read the bits of `range` from `storage`, shifted down to bit 0
#[inline]
pub fn extract<S: RegisterStorage>(storage: S, range: &BitRange) -> S {
    assert_within::<S>(range);
    if range.is_empty() {
        return S::ZERO;
    }
    (storage >> range.lower()) & S::mask(range.width())
}

/// Replace the bits of `range` in `storage` with `value`
///
/// # Panics
///
/// Panics if `value` has bits set above the width of `range`.
#[inline]
pub fn insert<S: RegisterStorage>(storage: &mut S, range: &BitRange, value: S) {
    assert_within::<S>(range);
    let mask = S::mask(range.width());
    assert!(
        value & !mask == S::ZERO,
        "value {:#x} does not fit in bit range {}",
        value,
        range
    );
    if range.is_empty() {
        return;
    }
    *storage = (*storage & !(mask << range.lower())) | ((value & mask) << range.lower());
}

/// Total number of bits covered by `ranges`
pub fn total_width(ranges: &[BitRange]) -> u32 {
    ranges.iter().map(BitRange::width).sum()
}

fn assert_total_width<S: RegisterStorage>(ranges: &[BitRange]) -> u32 {
    let width = total_width(ranges);
    assert!(
        width <= S::BITS,
        "field of bit width {} does not fit in storage of bit width {}",
        width,
        S::BITS
    );
    width
}

/// Read a (possibly discontiguous) field made of `ranges`
///
/// # Panics
///
/// Panics if a range extends outside `S` or the ranges cover more than
/// `S::BITS` bits in total.
#[inline]
pub fn extract_ranges<S: RegisterStorage>(storage: S, ranges: &[BitRange]) -> S {
    assert_total_width::<S>(ranges);
    let mut value = S::ZERO;
    let mut shift = 0;
    for range in ranges {
        if range.is_empty() {
            continue;
        }
        let slice = extract(storage, range);
        value = value | (slice << shift);
        shift += range.width();
    }
    value
}

/// Write a (possibly discontiguous) field made of `ranges`
///
/// # Panics
///
/// Panics if `value` does not fit in the combined width of `ranges`, or
/// under the same conditions as [`extract_ranges`].
#[inline]
pub fn insert_ranges<S: RegisterStorage>(storage: &mut S, ranges: &[BitRange], value: S) {
    let width = assert_total_width::<S>(ranges);
    assert!(
        value & !S::mask(width) == S::ZERO,
        "value {:#x} does not fit in field of bit width {}",
        value,
        width
    );

    let mut remaining = value;
    for range in ranges {
        if range.is_empty() {
            continue;
        }
        let slice = remaining & S::mask(range.width());
        insert(storage, range, slice);
        remaining = if range.width() >= S::BITS {
            S::ZERO
        } else {
            remaining >> range.width()
        };
    }
}

/// Whether `value` fits in a field of `width` bits
pub fn fits<S: RegisterStorage>(value: S, width: u32) -> bool {
    value & !S::mask(width) == S::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn range(lower: u32, upper: u32) -> BitRange {
        BitRange::new(lower, upper).unwrap()
    }

    /// Build an in-bounds, non-empty range for storage `S` from arbitrary input
    fn arbitrary_range<S: RegisterStorage>(a: u8, b: u8) -> BitRange {
        let a = a as u32 % S::BITS;
        let b = b as u32 % S::BITS;
        range(a.min(b), a.max(b) + 1)
    }

    #[test]
    fn test_extract_single_range() {
        let storage: u32 = 0xABCD_1234;
        assert_eq!(extract(storage, &range(0, 4)), 0x4);
        assert_eq!(extract(storage, &range(16, 32)), 0xABCD);
        assert_eq!(extract(storage, &range(0, 32)), 0xABCD_1234);
        assert_eq!(extract(storage, &range(8, 8)), 0);
    }

    #[test]
    fn test_insert_single_range() {
        let mut storage: u16 = 0xFFFF;
        insert(&mut storage, &range(4, 8), 0x0);
        assert_eq!(storage, 0xFF0F);
        insert(&mut storage, &range(0, 16), 0x1234);
        assert_eq!(storage, 0x1234);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_insert_rejects_wide_value() {
        let mut storage: u8 = 0;
        insert(&mut storage, &range(0, 2), 0b100);
    }

    #[test]
    #[should_panic(expected = "extends outside storage")]
    fn test_extract_rejects_out_of_bounds_range() {
        extract(0u8, &range(6, 10));
    }

    #[test]
    fn test_discontiguous_concatenation_order() {
        let ranges = [range(0, 2), range(8, 10)];
        let mut storage: u16 = 0;
        insert_ranges(&mut storage, &ranges, 0b1011);
        assert_eq!(extract(storage, &range(0, 2)), 0b11);
        assert_eq!(extract(storage, &range(8, 10)), 0b10);
        assert_eq!(storage, 0b10_0000_0011);
        assert_eq!(extract_ranges(storage, &ranges), 0b1011);
    }

    #[test]
    fn test_discontiguous_declared_order_is_respected() {
        // High storage bits declared first hold the low logical bits.
        let ranges = [range(8, 10), range(0, 2)];
        let mut storage: u16 = 0;
        insert_ranges(&mut storage, &ranges, 0b1011);
        assert_eq!(extract(storage, &range(8, 10)), 0b11);
        assert_eq!(extract(storage, &range(0, 2)), 0b10);
        assert_eq!(extract_ranges(storage, &ranges), 0b1011);
    }

    #[test]
    fn test_full_width_discontiguous_field() {
        let ranges = [range(32, 64), range(0, 32)];
        let mut storage: u64 = 0;
        insert_ranges(&mut storage, &ranges, u64::MAX);
        assert_eq!(storage, u64::MAX);
        insert_ranges(&mut storage, &ranges, 0x1111_2222_3333_4444);
        assert_eq!(storage, 0x3333_4444_1111_2222);
        assert_eq!(extract_ranges(storage, &ranges), 0x1111_2222_3333_4444);
    }

    #[test]
    #[should_panic(expected = "does not fit in field of bit width 4")]
    fn test_insert_ranges_rejects_wide_value() {
        let mut storage: u32 = 0;
        insert_ranges(&mut storage, &[range(0, 2), range(4, 6)], 0b1_0000);
    }

    #[test]
    #[should_panic(expected = "field of bit width 9 does not fit in storage of bit width 8")]
    fn test_extract_ranges_rejects_fields_wider_than_storage() {
        extract_ranges(0xFFu8, &[range(0, 8), range(0, 1)]);
    }

    #[test]
    #[should_panic(expected = "field of bit width 9 does not fit in storage of bit width 8")]
    fn test_insert_ranges_rejects_fields_wider_than_storage() {
        let mut storage: u8 = 0;
        insert_ranges(&mut storage, &[range(0, 8), range(0, 1)], 0);
    }

    #[test]
    fn test_fits() {
        assert!(fits(0b111u8, 3));
        assert!(!fits(0b1000u8, 3));
        assert!(fits(u64::MAX, 64));
        assert!(fits(0u32, 0));
    }

    #[quickcheck]
    fn round_trip_u8(storage: u8, value: u8, a: u8, b: u8) -> bool {
        let r = arbitrary_range::<u8>(a, b);
        let value = value & u8::mask(r.width());
        let mut s = storage;
        insert(&mut s, &r, value);
        extract(s, &r) == value
    }

    #[quickcheck]
    fn round_trip_u64(storage: u64, value: u64, a: u8, b: u8) -> bool {
        let r = arbitrary_range::<u64>(a, b);
        let value = value & u64::mask(r.width());
        let mut s = storage;
        insert(&mut s, &r, value);
        extract(s, &r) == value
    }

    #[quickcheck]
    fn insert_does_not_touch_other_bits_u32(storage: u32, value: u32, a: u8, b: u8) -> bool {
        let r = arbitrary_range::<u32>(a, b);
        let value = value & u32::mask(r.width());
        let mut s = storage;
        insert(&mut s, &r, value);
        let outside = !(u32::mask(r.width()) << r.lower());
        s & outside == storage & outside
    }

    #[quickcheck]
    fn insert_does_not_touch_other_bits_u16(storage: u16, value: u16, a: u8, b: u8) -> bool {
        let r = arbitrary_range::<u16>(a, b);
        let value = value & u16::mask(r.width());
        let mut s = storage;
        insert(&mut s, &r, value);
        (0..16)
            .filter(|bit| !r.contains_bit(*bit))
            .all(|bit| (s >> bit) & 1 == (storage >> bit) & 1)
    }

    #[quickcheck]
    fn discontiguous_round_trip_u32(storage: u32, value: u32, split: u8) -> bool {
        // The low logical bits live above the high ones in storage.
        let split = 1 + (split as u32 % 15);
        let ranges = [range(16, 16 + split), range(0, 8)];
        let value = value & u32::mask(split + 8);
        let mut s = storage;
        insert_ranges(&mut s, &ranges, value);
        extract_ranges(s, &ranges) == value
    }
}
