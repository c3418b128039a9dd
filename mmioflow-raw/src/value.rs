//! Storage words seen through a register view
//!
//! Every view is a storage word plus a reference to its [`ValidatedLayout`].
//! Fields are addressed by [`FieldId`], looked up once with `field(name)`.
//! Touching a field the view does not expose panics: `field(name)` returns
//! `None` for those, so callers can check first.
//!
//! | View               | Exposes                               | Get | Set |
//! |--------------------|---------------------------------------|-----|-----|
//! | [`RawValue`]       | every field                           | yes | yes |
//! | [`ReadValue`]      | read-only and read-write fields       | yes | no  |
//! | [`WriteValue`]     | write-only and read-write fields      | yes | yes |
//! | [`ReadWriteValue`] | read-write fields (symmetric layouts) | yes | yes |

use std::any::type_name;
use std::fmt;

use crate::field::{BitField, FieldId};
use crate::layout::ValidatedLayout;
use crate::projection::BitFieldProjectable;
use crate::storage::RegisterStorage;
use crate::view::ViewDescriptor;

pub(crate) fn assert_storage_width<S: RegisterStorage>(layout: &ValidatedLayout) {
    assert!(
        S::WIDTH == layout.width(),
        "register '{}' of bit width {} cannot be accessed through storage of bit width {}",
        layout.name(),
        layout.width().bits(),
        S::BITS
    );
}

fn exposed<'l>(layout: &'l ValidatedLayout, view: &ViewDescriptor, id: FieldId) -> &'l BitField {
    let field = layout.field(id);
    assert!(
        view.exposes(id),
        "field '{}' of '{}' is not exposed by the {} view",
        field.name(),
        layout.name(),
        view.kind()
    );
    field
}

fn check_projection<P: BitFieldProjectable>(layout: &ValidatedLayout, field: &BitField) {
    assert!(
        P::BIT_WIDTH == field.bit_width(),
        "projected type '{}' of bit width {} does not match field '{}.{}' of bit width {}",
        type_name::<P>(),
        P::BIT_WIDTH,
        layout.name(),
        field.name(),
        field.bit_width()
    );
    if let Some(declared) = field.projection() {
        assert!(
            declared == P::BIT_WIDTH,
            "field '{}.{}' declares a projection of bit width {} but was accessed as '{}'",
            layout.name(),
            field.name(),
            declared,
            type_name::<P>()
        );
    }
}

fn debug_fields<S: RegisterStorage>(
    f: &mut fmt::Formatter<'_>,
    layout: &ValidatedLayout,
    view: &ViewDescriptor,
    storage: S,
) -> fmt::Result {
    let mut out = f.debug_struct(layout.name());
    for id in view.fields() {
        let field = layout.field(*id);
        out.field(field.name(), &format_args!("{:#x}", field.extract(storage)));
    }
    out.finish()
}

/// Every field of a register, readable and writable
///
/// Bypasses access kinds entirely. Meant for tests, bring-up and tools.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawValue<'l, S: RegisterStorage> {
    layout: &'l ValidatedLayout,
    storage: S,
}

impl<'l, S: RegisterStorage> RawValue<'l, S> {
    /// # Panics
    ///
    /// Panics if the layout width differs from `S::BITS`.
    pub fn new(layout: &'l ValidatedLayout, storage: S) -> Self {
        assert_storage_width::<S>(layout);
        Self { layout, storage }
    }

    pub fn zeroed(layout: &'l ValidatedLayout) -> Self {
        Self::new(layout, S::ZERO)
    }

    pub fn layout(&self) -> &'l ValidatedLayout {
        self.layout
    }

    pub fn storage(&self) -> S {
        self.storage
    }

    pub fn set_storage(&mut self, storage: S) {
        self.storage = storage;
    }

    fn parts(&self) -> (&'l ValidatedLayout, &'l ViewDescriptor, S) {
        (self.layout, self.layout.views().raw(), self.storage)
    }
}

impl<S: RegisterStorage> fmt::Debug for RawValue<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (layout, view, storage) = self.parts();
        debug_fields(f, layout, view, storage)
    }
}

/// The readable fields of a register as last loaded
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReadValue<'l, S: RegisterStorage> {
    raw: RawValue<'l, S>,
    view: &'l ViewDescriptor,
}

impl<'l, S: RegisterStorage> ReadValue<'l, S> {
    pub fn from_raw(raw: RawValue<'l, S>) -> Self {
        Self {
            raw,
            view: raw.layout.views().read(),
        }
    }
}

/// The writable fields of a register, as they will be stored
///
/// Getters on a write view return the pending value, not what the hardware
/// holds.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WriteValue<'l, S: RegisterStorage> {
    raw: RawValue<'l, S>,
    view: &'l ViewDescriptor,
}

impl<'l, S: RegisterStorage> WriteValue<'l, S> {
    pub fn from_raw(raw: RawValue<'l, S>) -> Self {
        Self {
            raw,
            view: raw.layout.views().write(),
        }
    }

    /// Start a write from a value just read
    ///
    /// The whole storage word is copied, including bits of read-only and
    /// reserved fields, so a read-modify-write stores back whatever those
    /// bits read as. Build from [`WriteValue::zeroed`] or use
    /// [`raw_mut`](Self::raw_mut) when the hardware wants them written
    /// differently.
    pub fn from_read(read: &ReadValue<'l, S>) -> Self {
        Self::from_raw(read.raw)
    }

    pub fn zeroed(layout: &'l ValidatedLayout) -> Self {
        Self::from_raw(RawValue::zeroed(layout))
    }
}

/// Both roles at once, for symmetric layouts
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReadWriteValue<'l, S: RegisterStorage> {
    raw: RawValue<'l, S>,
    view: &'l ViewDescriptor,
}

impl<'l, S: RegisterStorage> ReadWriteValue<'l, S> {
    /// # Panics
    ///
    /// Panics if the layout is asymmetric.
    pub fn from_raw(raw: RawValue<'l, S>) -> Self {
        let layout = raw.layout;
        match layout.views().read_write() {
            Some(view) => Self { raw, view },
            None => panic!(
                "register '{}' is asymmetric and has no read-write view",
                layout.name()
            ),
        }
    }

    pub fn into_write(self) -> WriteValue<'l, S> {
        WriteValue::from_raw(self.raw)
    }
}

macro_rules! view_common {
    ($($view:ident),*) => {
        $(
            impl<'l, S: RegisterStorage> $view<'l, S> {
                pub fn layout(&self) -> &'l ValidatedLayout {
                    self.raw.layout
                }

                pub fn storage(&self) -> S {
                    self.raw.storage
                }

                pub fn descriptor(&self) -> &'l ViewDescriptor {
                    self.view
                }

                pub fn raw(&self) -> RawValue<'l, S> {
                    self.raw
                }

                pub fn raw_mut(&mut self) -> &mut RawValue<'l, S> {
                    &mut self.raw
                }

                fn parts(&self) -> (&'l ValidatedLayout, &'l ViewDescriptor, S) {
                    (self.raw.layout, self.view, self.raw.storage)
                }
            }

            impl<S: RegisterStorage> fmt::Debug for $view<'_, S> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let (layout, view, storage) = self.parts();
                    debug_fields(f, layout, view, storage)
                }
            }
        )*
    };
}

macro_rules! view_getters {
    ($($view:ident),*) => {
        $(
            impl<'l, S: RegisterStorage> $view<'l, S> {
                /// Handle of an exposed field, `None` if absent or not exposed
                pub fn field(&self, name: &str) -> Option<FieldId> {
                    let (layout, view, _) = self.parts();
                    let id = layout.field_id(name)?;
                    view.exposes(id).then_some(id)
                }

                /// # Panics
                ///
                /// Panics if this view does not expose `id`.
                pub fn get(&self, id: FieldId) -> S {
                    let (layout, view, storage) = self.parts();
                    exposed(layout, view, id).extract(storage)
                }

                /// # Panics
                ///
                /// Panics if this view does not expose `id` or `P` has a
                /// different bit width than the field.
                pub fn get_as<P: BitFieldProjectable>(&self, id: FieldId) -> P {
                    let (layout, view, storage) = self.parts();
                    let field = exposed(layout, view, id);
                    check_projection::<P>(layout, field);
                    P::from_storage(field.extract(storage))
                }

                /// Every exposed field with its current value
                pub fn iter(&self) -> impl Iterator<Item = (FieldId, &'l BitField, S)> {
                    let (layout, view, storage) = self.parts();
                    view.fields().iter().map(move |id| {
                        let field = layout.field(*id);
                        (*id, field, field.extract(storage))
                    })
                }
            }
        )*
    };
}

macro_rules! view_setters {
    ($($view:ident { $($storage:ident).+ }),*) => {
        $(
            impl<'l, S: RegisterStorage> $view<'l, S> {
                fn storage_mut(&mut self) -> &mut S {
                    &mut self$(.$storage)+
                }

                /// # Panics
                ///
                /// Panics if this view does not expose `id` or `value` does
                /// not fit in the field.
                pub fn set(&mut self, id: FieldId, value: S) -> &mut Self {
                    let (layout, view, _) = self.parts();
                    exposed(layout, view, id).insert(self.storage_mut(), value);
                    self
                }

                /// # Panics
                ///
                /// Panics if this view does not expose `id` or `P` has a
                /// different bit width than the field.
                pub fn set_as<P: BitFieldProjectable>(&mut self, id: FieldId, value: P) -> &mut Self {
                    let (layout, view, _) = self.parts();
                    let field = exposed(layout, view, id);
                    check_projection::<P>(layout, field);
                    field.insert(self.storage_mut(), value.into_storage());
                    self
                }
            }
        )*
    };
}

view_common!(ReadValue, WriteValue, ReadWriteValue);
view_getters!(RawValue, ReadValue, WriteValue, ReadWriteValue);
view_setters!(
    RawValue { storage },
    WriteValue { raw.storage },
    ReadWriteValue { raw.storage }
);
