//! Evenly spaced registers sharing one layout

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::interposer::Interposer;
use crate::layout::ValidatedLayout;
use crate::register::Register;
use crate::storage::RegisterStorage;
use crate::value::assert_storage_width;

/// `count` registers of one layout, `stride` bytes apart
pub struct RegisterArray<'l, S: RegisterStorage> {
    address: usize,
    stride: usize,
    count: usize,
    layout: &'l ValidatedLayout,
    interposer: Option<Arc<dyn Interposer>>,
    _storage: PhantomData<S>,
}

impl<'l, S: RegisterStorage> RegisterArray<'l, S> {
    /// # Safety
    ///
    /// Every element address must be valid for volatile reads and writes of
    /// `S` for as long as the array and the registers it hands out are used.
    ///
    /// # Panics
    ///
    /// Panics if `address` or `stride` is not aligned for `S`, or the layout
    /// width differs from `S::BITS`.
    pub unsafe fn new(
        layout: &'l ValidatedLayout,
        address: usize,
        stride: usize,
        count: usize,
    ) -> Self {
        Self::bind(layout, address, stride, count, None)
    }

    pub fn with_interposer(
        layout: &'l ValidatedLayout,
        address: usize,
        stride: usize,
        count: usize,
        interposer: Arc<dyn Interposer>,
    ) -> Self {
        Self::bind(layout, address, stride, count, Some(interposer))
    }

    pub(crate) fn bind(
        layout: &'l ValidatedLayout,
        address: usize,
        stride: usize,
        count: usize,
        interposer: Option<Arc<dyn Interposer>>,
    ) -> Self {
        assert_storage_width::<S>(layout);
        let align = std::mem::align_of::<S>();
        assert!(
            address % align == 0,
            "misaligned base address {:#x} for register array '{}' of bit width {}",
            address,
            layout.name(),
            S::BITS
        );
        assert!(
            stride % align == 0,
            "misaligned stride {:#x} for register array '{}' of bit width {}",
            stride,
            layout.name(),
            S::BITS
        );
        Self {
            address,
            stride,
            count,
            layout,
            interposer,
            _storage: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn unsafe_address(&self) -> usize {
        self.address
    }

    pub fn layout(&self) -> &'l ValidatedLayout {
        self.layout
    }

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn get(&self, index: usize) -> Register<'l, S> {
        assert!(
            index < self.count,
            "index {} out of bounds for register array '{}' of length {}",
            index,
            self.layout.name(),
            self.count
        );
        let address = index
            .checked_mul(self.stride)
            .and_then(|offset| self.address.checked_add(offset));
        match address {
            Some(address) => Register::bind(self.layout, address, self.interposer.clone()),
            None => panic!(
                "address of element {} of register array '{}' overflows",
                index,
                self.layout.name()
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Register<'l, S>> + '_ {
        (0..self.count).map(move |index| self.get(index))
    }
}

impl<S: RegisterStorage> fmt::Debug for RegisterArray<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterArray")
            .field("name", &self.layout.name())
            .field("address", &format_args!("{:#x}", self.address))
            .field("stride", &self.stride)
            .field("count", &self.count)
            .field("interposed", &self.interposer.is_some())
            .finish()
    }
}
