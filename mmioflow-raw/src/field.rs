//! Named bit fields and their access kinds

use std::fmt;

use crate::bit_range::BitRange;
use crate::bits;
use crate::storage::RegisterStorage;

/// How software may access a bit field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Present in storage, never exposed through a typed view
    Reserved,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessKind {
    pub const fn is_readable(self) -> bool {
        matches!(self, AccessKind::ReadOnly | AccessKind::ReadWrite)
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, AccessKind::WriteOnly | AccessKind::ReadWrite)
    }

    /// Whether this kind allows the merged read-write view
    pub const fn is_symmetric(self) -> bool {
        matches!(self, AccessKind::Reserved | AccessKind::ReadWrite)
    }

    pub const fn name(self) -> &'static str {
        match self {
            AccessKind::Reserved => "reserved",
            AccessKind::ReadOnly => "read-only",
            AccessKind::WriteOnly => "write-only",
            AccessKind::ReadWrite => "read-write",
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to a field of a validated layout, by declaration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub(crate) usize);

impl FieldId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A named group of one or more bit ranges sharing an access kind
///
/// More than one range makes the field discontiguous; its logical value is
/// the concatenation of the ranges in declared order, first range lowest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    name: String,
    access: AccessKind,
    ranges: Vec<BitRange>,
    projection: Option<u32>,
}

impl BitField {
    pub fn new(
        name: impl Into<String>,
        access: AccessKind,
        ranges: impl IntoIterator<Item = BitRange>,
    ) -> Self {
        Self {
            name: name.into(),
            access,
            ranges: ranges.into_iter().collect(),
            projection: None,
        }
    }

    pub fn reserved(name: impl Into<String>, ranges: impl IntoIterator<Item = BitRange>) -> Self {
        Self::new(name, AccessKind::Reserved, ranges)
    }

    pub fn read_only(name: impl Into<String>, ranges: impl IntoIterator<Item = BitRange>) -> Self {
        Self::new(name, AccessKind::ReadOnly, ranges)
    }

    pub fn write_only(name: impl Into<String>, ranges: impl IntoIterator<Item = BitRange>) -> Self {
        Self::new(name, AccessKind::WriteOnly, ranges)
    }

    pub fn read_write(name: impl Into<String>, ranges: impl IntoIterator<Item = BitRange>) -> Self {
        Self::new(name, AccessKind::ReadWrite, ranges)
    }

    /// Declare the bit width of the type this field is projected to
    ///
    /// The width is checked against the field width on projected access, not
    /// here.
    pub fn with_projection(mut self, bit_width: u32) -> Self {
        self.projection = Some(bit_width);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> AccessKind {
        self.access
    }

    pub fn ranges(&self) -> &[BitRange] {
        &self.ranges
    }

    pub fn projection(&self) -> Option<u32> {
        self.projection
    }

    pub fn is_discontiguous(&self) -> bool {
        self.ranges.len() > 1
    }

    /// Logical width: the sum of the range widths
    pub fn bit_width(&self) -> u32 {
        bits::total_width(&self.ranges)
    }

    /// Storage mask of every bit this field occupies
    pub fn mask<S: RegisterStorage>(&self) -> S {
        self.ranges
            .iter()
            .filter(|range| !range.is_empty())
            .fold(S::ZERO, |mask, range| {
                mask | (S::mask(range.width()) << range.lower())
            })
    }

    pub fn extract<S: RegisterStorage>(&self, storage: S) -> S {
        match self.ranges.as_slice() {
            [range] => bits::extract(storage, range),
            ranges => bits::extract_ranges(storage, ranges),
        }
    }

    /// # Panics
    ///
    /// Panics if `value` does not fit in [`Self::bit_width`] bits.
    pub fn insert<S: RegisterStorage>(&self, storage: &mut S, value: S) {
        match self.ranges.as_slice() {
            [range] => bits::insert(storage, range, value),
            ranges => bits::insert_ranges(storage, ranges, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(lower: u32, upper: u32) -> BitRange {
        BitRange::new(lower, upper).unwrap()
    }

    #[test]
    fn test_access_kind_capabilities() {
        assert!(AccessKind::ReadWrite.is_readable() && AccessKind::ReadWrite.is_writable());
        assert!(AccessKind::ReadOnly.is_readable() && !AccessKind::ReadOnly.is_writable());
        assert!(!AccessKind::WriteOnly.is_readable() && AccessKind::WriteOnly.is_writable());
        assert!(!AccessKind::Reserved.is_readable() && !AccessKind::Reserved.is_writable());
        assert!(AccessKind::Reserved.is_symmetric());
        assert!(!AccessKind::ReadOnly.is_symmetric());
    }

    #[test]
    fn test_field_width_and_mask() {
        let field = BitField::read_write("split", [range(0, 2), range(8, 10)]);
        assert!(field.is_discontiguous());
        assert_eq!(field.bit_width(), 4);
        assert_eq!(field.mask::<u16>(), 0b11_0000_0011);
    }

    #[test]
    fn test_field_extract_insert() {
        let field = BitField::read_only("mode", [range(4, 7)]);
        let mut storage: u32 = 0xFFFF_FFFF;
        field.insert(&mut storage, 0b010);
        assert_eq!(storage, 0xFFFF_FFAF);
        assert_eq!(field.extract(storage), 0b010);
    }
}
