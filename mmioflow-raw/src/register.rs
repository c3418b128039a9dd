//! Registers bound to an address
//!
//! A [`Register`] pairs a [`ValidatedLayout`] with an address and performs
//! exactly one volatile load or store of the storage width per access. When an
//! [`Interposer`] is attached, the access goes to it instead; the choice is
//! made again on every access, so an interposer can be swapped between calls.
//!
//! Nothing here serializes accesses. A [`Register::modify`] is a load followed
//! by a store; callers that share a register across contexts own the mutual
//! exclusion.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::interposer::Interposer;
use crate::layout::ValidatedLayout;
use crate::storage::RegisterStorage;
use crate::value::{assert_storage_width, RawValue, ReadValue, ReadWriteValue, WriteValue};

/// A hardware register of storage type `S` at a fixed address
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use mmioflow_raw::{BitField, BitRange, Register, RegisterLayout, RegisterWidth, TracingInterposer};
///
/// let layout = RegisterLayout::new("CTRL", RegisterWidth::W32)
///     .with_field(BitField::read_write("en", [BitRange::from_offset_width(0, 1)?]))
///     .with_field(BitField::read_write("div", [BitRange::from_lsb_msb(4, 7)?]))
///     .validate()?;
/// let en = layout.field_id("en").unwrap();
/// let div = layout.field_id("div").unwrap();
///
/// let memory = Arc::new(TracingInterposer::new());
/// let ctrl = Register::<u32>::with_interposer(&layout, 0x4000_0000, memory.clone());
///
/// ctrl.modify_read_write(|rw| {
///     rw.set_as(en, true).set(div, 0x3);
/// });
/// assert_eq!(ctrl.read_raw().storage(), 0x31);
/// assert_eq!(memory.store_count(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Register<'l, S: RegisterStorage> {
    address: usize,
    layout: &'l ValidatedLayout,
    interposer: Option<Arc<dyn Interposer>>,
    _storage: PhantomData<S>,
}

impl<'l, S: RegisterStorage> Register<'l, S> {
    /// Bind `layout` to `address`
    ///
    /// # Safety
    ///
    /// `address` must be valid for volatile reads and writes of `S` for as
    /// long as the register is used without an interposer.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not aligned for `S` or the layout width differs
    /// from `S::BITS`.
    pub unsafe fn new(layout: &'l ValidatedLayout, address: usize) -> Self {
        Self::bind(layout, address, None)
    }

    /// Bind `layout` to `address`, routing every access through `interposer`
    ///
    /// # Panics
    ///
    /// Same conditions as [`Register::new`].
    pub fn with_interposer(
        layout: &'l ValidatedLayout,
        address: usize,
        interposer: Arc<dyn Interposer>,
    ) -> Self {
        Self::bind(layout, address, Some(interposer))
    }

    pub(crate) fn bind(
        layout: &'l ValidatedLayout,
        address: usize,
        interposer: Option<Arc<dyn Interposer>>,
    ) -> Self {
        assert_storage_width::<S>(layout);
        assert!(
            address % std::mem::align_of::<S>() == 0,
            "misaligned address {:#x} for register '{}' of bit width {}",
            address,
            layout.name(),
            S::BITS
        );
        Self {
            address,
            layout,
            interposer,
            _storage: PhantomData,
        }
    }

    /// The bound address. Dereferencing it bypasses the layout.
    pub fn unsafe_address(&self) -> usize {
        self.address
    }

    pub fn layout(&self) -> &'l ValidatedLayout {
        self.layout
    }

    pub fn interposer(&self) -> Option<&Arc<dyn Interposer>> {
        self.interposer.as_ref()
    }

    pub fn set_interposer(&mut self, interposer: Arc<dyn Interposer>) {
        self.interposer = Some(interposer);
    }

    /// Detach the interposer so accesses hit memory again
    ///
    /// # Safety
    ///
    /// Same contract as [`Register::new`]: the bound address must be valid
    /// for volatile access of `S`.
    pub unsafe fn clear_interposer(&mut self) {
        self.interposer = None;
    }

    #[inline]
    fn load(&self) -> S {
        match &self.interposer {
            Some(interposer) => S::from_u64_truncating(interposer.load(self.address, S::WIDTH)),
            // SAFETY: validity was promised by the caller of `new` or
            // `clear_interposer`; alignment was checked in `bind`.
            None => unsafe { S::load_volatile(self.address) },
        }
    }

    #[inline]
    fn store(&self, value: S) {
        match &self.interposer {
            Some(interposer) => interposer.store(self.address, S::WIDTH, value.to_u64()),
            // SAFETY: as in `load`
            None => unsafe { S::store_volatile(self.address, value) },
        }
    }

    /// One load, seen through the read view
    pub fn read(&self) -> ReadValue<'l, S> {
        ReadValue::from_raw(self.read_raw())
    }

    /// One load, with every field exposed
    pub fn read_raw(&self) -> RawValue<'l, S> {
        RawValue::new(self.layout, self.load())
    }

    fn assert_own_layout(&self, layout: &ValidatedLayout) {
        assert!(
            std::ptr::eq(layout, self.layout),
            "value of register '{}' cannot be written to register '{}': layouts differ",
            layout.name(),
            self.layout.name()
        );
    }

    /// One store of `value`
    ///
    /// # Panics
    ///
    /// Panics if `value` was built from a different layout than this register.
    pub fn write(&self, value: WriteValue<'l, S>) {
        self.assert_own_layout(value.layout());
        self.store(value.storage());
    }

    /// # Panics
    ///
    /// Same conditions as [`Register::write`].
    pub fn write_raw(&self, value: RawValue<'l, S>) {
        self.assert_own_layout(value.layout());
        self.store(value.storage());
    }

    /// Build a write from zero with `f`, then store it once
    pub fn write_with<T>(&self, f: impl FnOnce(&mut WriteValue<'l, S>) -> T) -> T {
        let mut value = WriteValue::zeroed(self.layout);
        let result = f(&mut value);
        self.write(value);
        result
    }

    /// Read, let `f` edit a write view seeded from the read, then store
    ///
    /// Exactly one load and one store. The write view starts as a copy of the
    /// whole word read (see [`WriteValue::from_read`]).
    pub fn modify<T>(&self, f: impl FnOnce(&ReadValue<'l, S>, &mut WriteValue<'l, S>) -> T) -> T {
        let read = self.read();
        let mut write = WriteValue::from_read(&read);
        let result = f(&read, &mut write);
        self.write(write);
        result
    }

    /// Read-modify-write through the merged read-write view
    ///
    /// # Panics
    ///
    /// Panics, before touching the register, if the layout is asymmetric.
    pub fn modify_read_write<T>(&self, f: impl FnOnce(&mut ReadWriteValue<'l, S>) -> T) -> T {
        assert!(
            self.layout.is_symmetric(),
            "modify_read_write on asymmetric register '{}'; use modify",
            self.layout.name()
        );
        let mut value = ReadWriteValue::from_raw(self.read_raw());
        let result = f(&mut value);
        self.store(value.storage());
        result
    }
}

impl<S: RegisterStorage> Clone for Register<'_, S> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            layout: self.layout,
            interposer: self.interposer.clone(),
            _storage: PhantomData,
        }
    }
}

impl<S: RegisterStorage> fmt::Debug for Register<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("name", &self.layout.name())
            .field("address", &format_args!("{:#x}", self.address))
            .field("bits", &S::BITS)
            .field("interposed", &self.interposer.is_some())
            .finish()
    }
}
