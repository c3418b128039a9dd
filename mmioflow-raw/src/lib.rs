//! # mmioflow-raw
//!
//! Validated bit-field layouts and volatile access for memory-mapped
//! registers.
//!
//! A register is a fixed-width storage word (8, 16, 32 or 64 bits) split into
//! named fields. Each field has an access kind and one or more bit ranges;
//! several ranges make it discontiguous, concatenated low range first.
//!
//! Layouts go through [`RegisterLayout::validate`] before anything can touch
//! memory. Validation reports every out-of-bounds, zero-width and overlapping
//! range in one go, and synthesizes the views: a single read-write view when
//! all fields are reserved or read-write, separate read and write views
//! otherwise.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use mmioflow_raw::{BitField, BitRange, Register, RegisterLayout, RegisterWidth, TracingInterposer};
//!
//! let layout = RegisterLayout::new("SR", RegisterWidth::W32)
//!     .with_field(BitField::read_only("busy", [BitRange::from_offset_width(0, 1)?]))
//!     .with_field(BitField::write_only("clear", [BitRange::from_offset_width(1, 1)?]))
//!     .with_field(BitField::read_write("irq_en", [BitRange::new(8, 9)?]))
//!     .validate()?;
//! assert!(!layout.is_symmetric());
//!
//! let busy = layout.field_id("busy").unwrap();
//! let clear = layout.field_id("clear").unwrap();
//!
//! // Tests attach an interposer; real code uses the unsafe `Register::new`.
//! let memory = Arc::new(TracingInterposer::new());
//! let sr = Register::<u32>::with_interposer(&layout, 0x4000_1000, memory.clone());
//!
//! let was_busy = sr.modify(|read, write| {
//!     write.set(clear, 1);
//!     read.get_as::<bool>(busy)
//! });
//! assert!(!was_busy);
//! assert_eq!(memory.trace().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod array;
pub mod bit_range;
pub mod bits;
pub mod block;
pub mod diagnostic;
pub mod field;
pub mod interposer;
pub mod layout;
pub mod projection;
pub mod register;
pub mod storage;
pub mod validate;
pub mod value;
pub mod view;

pub use array::RegisterArray;
pub use bit_range::{BitRange, BitRangeError};
pub use block::RegisterBlock;
pub use diagnostic::{Diagnostic, DiagnosticKind, Location, Note, ValidationError};
pub use field::{AccessKind, BitField, FieldId};
pub use interposer::{Interposer, InterposerEvent, TracingInterposer};
pub use layout::{LayoutError, RegisterLayout, ValidatedLayout};
pub use projection::BitFieldProjectable;
pub use register::Register;
pub use storage::{RegisterStorage, RegisterWidth};
pub use value::{RawValue, ReadValue, ReadWriteValue, WriteValue};
pub use view::{RegisterViews, ViewDescriptor, ViewKind, ViewShape};
