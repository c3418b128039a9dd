//! Synthesis of the typed views of a register
//!
//! A register whose fields are all reserved or read-write is *symmetric* and
//! gets a single read-write view. Any read-only or write-only field makes it
//! *asymmetric*: reads and writes then go through separate views, each
//! exposing only the fields legal in that direction. The raw view always
//! exposes every field.

use std::fmt;

use crate::field::{AccessKind, FieldId};
use crate::layout::RegisterLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Raw,
    Read,
    Write,
    ReadWrite,
}

impl ViewKind {
    pub const fn name(self) -> &'static str {
        match self {
            ViewKind::Raw => "raw",
            ViewKind::Read => "read",
            ViewKind::Write => "write",
            ViewKind::ReadWrite => "read-write",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which fields one view exposes, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    kind: ViewKind,
    fields: Vec<FieldId>,
}

impl ViewDescriptor {
    fn collect(kind: ViewKind, layout: &RegisterLayout, exposed: impl Fn(AccessKind) -> bool) -> Self {
        let fields = layout
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| exposed(field.access()))
            .map(|(index, _)| FieldId(index))
            .collect();
        Self { kind, fields }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn exposes(&self, id: FieldId) -> bool {
        self.fields.binary_search(&id).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewShape {
    Symmetric {
        read_write: ViewDescriptor,
    },
    Asymmetric {
        read: ViewDescriptor,
        write: ViewDescriptor,
    },
}

/// The raw view plus either one read-write view or a read/write pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterViews {
    raw: ViewDescriptor,
    shape: ViewShape,
}

impl RegisterViews {
    pub fn raw(&self) -> &ViewDescriptor {
        &self.raw
    }

    /// The view used for reads; the read-write view when symmetric
    pub fn read(&self) -> &ViewDescriptor {
        match &self.shape {
            ViewShape::Symmetric { read_write } => read_write,
            ViewShape::Asymmetric { read, .. } => read,
        }
    }

    /// The view used for writes; the read-write view when symmetric
    pub fn write(&self) -> &ViewDescriptor {
        match &self.shape {
            ViewShape::Symmetric { read_write } => read_write,
            ViewShape::Asymmetric { write, .. } => write,
        }
    }

    pub fn read_write(&self) -> Option<&ViewDescriptor> {
        match &self.shape {
            ViewShape::Symmetric { read_write } => Some(read_write),
            ViewShape::Asymmetric { .. } => None,
        }
    }

    pub fn shape(&self) -> &ViewShape {
        &self.shape
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self.shape, ViewShape::Symmetric { .. })
    }
}

pub fn synthesize(layout: &RegisterLayout) -> RegisterViews {
    let raw = ViewDescriptor::collect(ViewKind::Raw, layout, |_| true);
    let shape = if layout.is_symmetric() {
        ViewShape::Symmetric {
            read_write: ViewDescriptor::collect(ViewKind::ReadWrite, layout, |access| {
                access == AccessKind::ReadWrite
            }),
        }
    } else {
        ViewShape::Asymmetric {
            read: ViewDescriptor::collect(ViewKind::Read, layout, AccessKind::is_readable),
            write: ViewDescriptor::collect(ViewKind::Write, layout, AccessKind::is_writable),
        }
    };
    RegisterViews { raw, shape }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_range::BitRange;
    use crate::field::BitField;
    use crate::storage::RegisterWidth;

    fn range(lower: u32, upper: u32) -> BitRange {
        BitRange::new(lower, upper).unwrap()
    }

    #[test]
    fn test_symmetric_layout_gets_one_view() {
        let layout = RegisterLayout::new("CR", RegisterWidth::W32)
            .with_field(BitField::read_write("en", [range(0, 1)]))
            .with_field(BitField::reserved("rsvd", [range(1, 32)]));
        let views = synthesize(&layout);

        assert!(views.is_symmetric());
        assert_eq!(views.read(), views.write());
        assert_eq!(views.read().kind(), ViewKind::ReadWrite);
        assert_eq!(views.read().fields(), &[FieldId(0)]);
        assert_eq!(views.raw().fields(), &[FieldId(0), FieldId(1)]);
    }

    #[test]
    fn test_asymmetric_layout_splits_views() {
        let layout = RegisterLayout::new("SR", RegisterWidth::W16)
            .with_field(BitField::read_only("busy", [range(0, 1)]))
            .with_field(BitField::read_write("en", [range(1, 2)]))
            .with_field(BitField::write_only("clear", [range(2, 3)]))
            .with_field(BitField::reserved("rsvd", [range(3, 16)]));
        let views = synthesize(&layout);

        assert!(!views.is_symmetric());
        assert!(views.read_write().is_none());
        assert_eq!(views.read().fields(), &[FieldId(0), FieldId(1)]);
        assert_eq!(views.write().fields(), &[FieldId(1), FieldId(2)]);
        assert!(!views.write().exposes(FieldId(0)));
        assert!(!views.read().exposes(FieldId(3)));
        assert!(views.raw().exposes(FieldId(3)));
    }

    #[test]
    fn test_empty_layout_is_symmetric() {
        let views = synthesize(&RegisterLayout::new("NONE", RegisterWidth::W8));
        assert!(views.is_symmetric());
        assert!(views.read().fields().is_empty());
    }
}
