//! Register layouts: a storage width plus an ordered list of bit fields

use crate::diagnostic::ValidationError;
use crate::field::{BitField, FieldId};
use crate::storage::RegisterWidth;
use crate::validate;
use crate::view::{self, RegisterViews};

/// Errors building a layout from loosely typed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unsupported register bit width {0}, expected 8, 16, 32 or 64")]
    UnsupportedWidth(u32),
}

/// Unvalidated description of a register
///
/// Nothing can be read or written through a `RegisterLayout` directly; call
/// [`RegisterLayout::validate`] to obtain a [`ValidatedLayout`].
///
/// # Example
///
/// ```
/// use mmioflow_raw::{BitField, BitRange, RegisterLayout, RegisterWidth};
///
/// let layout = RegisterLayout::new("CTRL", RegisterWidth::W32)
///     .with_field(BitField::read_write("en", [BitRange::from_offset_width(0, 1)?]))
///     .with_field(BitField::reserved("rsvd", [BitRange::from_lsb_msb(1, 31)?]))
///     .validate()?;
///
/// assert!(layout.is_symmetric());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterLayout {
    name: String,
    width: RegisterWidth,
    fields: Vec<BitField>,
}

impl RegisterLayout {
    pub fn new(name: impl Into<String>, width: RegisterWidth) -> Self {
        Self {
            name: name.into(),
            width,
            fields: Vec::new(),
        }
    }

    /// Create a layout from a bit count, rejecting widths other than 8/16/32/64
    pub fn with_bit_width(name: impl Into<String>, bits: u32) -> Result<Self, LayoutError> {
        let width = RegisterWidth::try_from(bits).map_err(LayoutError::UnsupportedWidth)?;
        Ok(Self::new(name, width))
    }

    pub fn with_field(mut self, field: BitField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push_field(&mut self, field: BitField) {
        self.fields.push(field);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> RegisterWidth {
        self.width
    }

    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// True iff every field is reserved or read-write
    pub fn is_symmetric(&self) -> bool {
        self.fields.iter().all(|field| field.access().is_symmetric())
    }

    /// Check bounds and overlaps, then synthesize the register views
    pub fn validate(self) -> Result<ValidatedLayout, ValidationError> {
        validate::validate_layout(&self)?;
        let views = view::synthesize(&self);
        Ok(ValidatedLayout {
            layout: self,
            views,
        })
    }
}

/// A layout that passed validation, together with its synthesized views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLayout {
    layout: RegisterLayout,
    views: RegisterViews,
}

impl ValidatedLayout {
    pub fn name(&self) -> &str {
        self.layout.name()
    }

    pub fn width(&self) -> RegisterWidth {
        self.layout.width()
    }

    pub fn fields(&self) -> &[BitField] {
        self.layout.fields()
    }

    pub fn is_symmetric(&self) -> bool {
        self.views.is_symmetric()
    }

    pub fn views(&self) -> &RegisterViews {
        &self.views
    }

    pub fn layout(&self) -> &RegisterLayout {
        &self.layout
    }

    /// Look up a field by name, regardless of its access kind
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.layout
            .fields()
            .iter()
            .position(|field| field.name() == name)
            .map(FieldId)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this layout.
    pub fn field(&self, id: FieldId) -> &BitField {
        match self.layout.fields().get(id.0) {
            Some(field) => field,
            None => panic!(
                "field index {} out of bounds for register '{}' with {} fields",
                id.0,
                self.name(),
                self.layout.fields().len()
            ),
        }
    }

    /// Every field together with its handle, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &BitField)> {
        self.layout
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| (FieldId(index), field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_range::BitRange;
    use crate::field::AccessKind;

    fn range(lower: u32, upper: u32) -> BitRange {
        BitRange::new(lower, upper).unwrap()
    }

    #[test]
    fn test_symmetric_determination() {
        let symmetric = RegisterLayout::new("A", RegisterWidth::W8)
            .with_field(BitField::read_write("en", [range(0, 1)]))
            .with_field(BitField::reserved("rsvd", [range(1, 8)]));
        assert!(symmetric.is_symmetric());

        let asymmetric = RegisterLayout::new("B", RegisterWidth::W8)
            .with_field(BitField::read_only("status", [range(0, 1)]))
            .with_field(BitField::read_write("en", [range(1, 2)]));
        assert!(!asymmetric.is_symmetric());
    }

    #[test]
    fn test_unsupported_width() {
        assert_eq!(
            RegisterLayout::with_bit_width("X", 12),
            Err(LayoutError::UnsupportedWidth(12))
        );
        let layout = RegisterLayout::with_bit_width("X", 64).unwrap();
        assert_eq!(layout.width(), RegisterWidth::W64);
    }

    #[test]
    fn test_field_lookup() {
        let layout = RegisterLayout::new("CTRL", RegisterWidth::W16)
            .with_field(BitField::write_only("go", [range(0, 1)]))
            .with_field(BitField::read_only("busy", [range(1, 2)]))
            .validate()
            .unwrap();

        let busy = layout.field_id("busy").unwrap();
        assert_eq!(busy.index(), 1);
        assert_eq!(layout.field(busy).access(), AccessKind::ReadOnly);
        assert!(layout.field_id("missing").is_none());
        assert_eq!(layout.iter().count(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds for register 'CTRL'")]
    fn test_foreign_field_id_panics() {
        let layout = RegisterLayout::new("CTRL", RegisterWidth::W8)
            .validate()
            .unwrap();
        layout.field(FieldId(3));
    }
}
