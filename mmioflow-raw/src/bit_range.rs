//! Bit positions of a field within a register storage word
//!
//! Every range is stored in one canonical half-open form, `[lower, upper)`,
//! regardless of whether the schema spelled it as an inclusive
//! least/most-significant-bit pair or as an offset and a width.

use std::cmp::{max, min};
use std::fmt;
use std::ops::{Range, RangeInclusive};

/// Errors produced while canonicalizing a bit range
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitRangeError {
    #[error("bit range upper bound {upper} is below lower bound {lower}")]
    Inverted { lower: u32, upper: u32 },

    #[error("bit range at offset {offset} has zero width")]
    ZeroWidth { offset: u32 },

    #[error("bit range starting at {lower} with width {width} overflows")]
    Overflow { lower: u32, width: u32 },
}

/// A half-open interval of bit positions, `lower..upper`
///
/// Ordering is by `lower`, then by `upper`, which is the order the overlap
/// validator sweeps in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitRange {
    lower: u32,
    upper: u32,
}

impl BitRange {
    /// Create a range from half-open bounds
    ///
    /// An empty range (`lower == upper`) is accepted here so that a schema can
    /// carry it to the validator, which reports it with its own diagnostic.
    pub const fn new(lower: u32, upper: u32) -> Result<Self, BitRangeError> {
        if upper < lower {
            return Err(BitRangeError::Inverted { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Canonicalize an inclusive `(lsb, msb)` pair
    pub const fn from_lsb_msb(lsb: u32, msb: u32) -> Result<Self, BitRangeError> {
        if msb < lsb {
            return Err(BitRangeError::Inverted {
                lower: lsb,
                upper: msb,
            });
        }
        match msb.checked_add(1) {
            Some(upper) => Ok(Self { lower: lsb, upper }),
            None => Err(BitRangeError::Overflow {
                lower: lsb,
                width: msb - lsb,
            }),
        }
    }

    /// Canonicalize an `(offset, width)` pair
    pub const fn from_offset_width(offset: u32, width: u32) -> Result<Self, BitRangeError> {
        if width == 0 {
            return Err(BitRangeError::ZeroWidth { offset });
        }
        match offset.checked_add(width) {
            Some(upper) => Ok(Self {
                lower: offset,
                upper,
            }),
            None => Err(BitRangeError::Overflow {
                lower: offset,
                width,
            }),
        }
    }

    pub const fn lower(&self) -> u32 {
        self.lower
    }

    pub const fn upper(&self) -> u32 {
        self.upper
    }

    /// Number of bits covered
    pub const fn width(&self) -> u32 {
        self.upper - self.lower
    }

    pub const fn is_empty(&self) -> bool {
        self.lower == self.upper
    }

    /// Inclusive most significant bit, `None` for an empty range
    pub const fn msb(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.upper - 1)
        }
    }

    /// Whether both `lower` and `upper - 1` fall inside `0..bit_width`
    pub const fn contains_within(&self, bit_width: u32) -> bool {
        match self.msb() {
            Some(msb) => self.lower < bit_width && msb < bit_width,
            None => self.lower <= bit_width,
        }
    }

    /// Whether the bit at `position` is covered by this range
    pub const fn contains_bit(&self, position: u32) -> bool {
        self.lower <= position && position < self.upper
    }

    /// The intersecting sub-range of `self` and `other`, if any bit is shared
    pub fn overlap(&self, other: &BitRange) -> Option<BitRange> {
        let lower = max(self.lower, other.lower);
        let upper = min(self.upper, other.upper);
        if lower < upper {
            Some(BitRange { lower, upper })
        } else {
            None
        }
    }

    /// Convert back into a standard library range
    pub const fn as_range(&self) -> Range<u32> {
        self.lower..self.upper
    }
}

impl TryFrom<Range<u32>> for BitRange {
    type Error = BitRangeError;

    fn try_from(range: Range<u32>) -> Result<Self, Self::Error> {
        Self::new(range.start, range.end)
    }
}

impl TryFrom<RangeInclusive<u32>> for BitRange {
    type Error = BitRangeError;

    fn try_from(range: RangeInclusive<u32>) -> Result<Self, Self::Error> {
        Self::from_lsb_msb(*range.start(), *range.end())
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lower, self.upper)
    }
}
