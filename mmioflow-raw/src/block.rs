//! A base address grouping registers at fixed offsets
//!
//! Peripherals are usually described as a block of registers relative to one
//! base. A [`RegisterBlock`] hands its interposer, if any, to every register,
//! array and sub-block it produces.

use std::fmt;
use std::sync::Arc;

use crate::array::RegisterArray;
use crate::interposer::Interposer;
use crate::layout::ValidatedLayout;
use crate::register::Register;
use crate::storage::RegisterStorage;

#[derive(Clone)]
pub struct RegisterBlock {
    address: usize,
    interposer: Option<Arc<dyn Interposer>>,
}

impl RegisterBlock {
    /// # Safety
    ///
    /// Every register later produced from this block must sit at memory valid
    /// for volatile access of its storage width while it is used.
    pub unsafe fn new(address: usize) -> Self {
        Self {
            address,
            interposer: None,
        }
    }

    pub fn with_interposer(address: usize, interposer: Arc<dyn Interposer>) -> Self {
        Self {
            address,
            interposer: Some(interposer),
        }
    }

    pub fn unsafe_address(&self) -> usize {
        self.address
    }

    pub fn interposer(&self) -> Option<&Arc<dyn Interposer>> {
        self.interposer.as_ref()
    }

    fn offset(&self, offset: usize) -> usize {
        match self.address.checked_add(offset) {
            Some(address) => address,
            None => panic!(
                "offset {:#x} overflows register block at {:#x}",
                offset, self.address
            ),
        }
    }

    /// # Panics
    ///
    /// Panics on misalignment or a layout width other than `S::BITS`.
    pub fn register<'l, S: RegisterStorage>(
        &self,
        layout: &'l ValidatedLayout,
        offset: usize,
    ) -> Register<'l, S> {
        Register::bind(layout, self.offset(offset), self.interposer.clone())
    }

    pub fn array<'l, S: RegisterStorage>(
        &self,
        layout: &'l ValidatedLayout,
        offset: usize,
        stride: usize,
        count: usize,
    ) -> RegisterArray<'l, S> {
        RegisterArray::bind(
            layout,
            self.offset(offset),
            stride,
            count,
            self.interposer.clone(),
        )
    }

    pub fn sub_block(&self, offset: usize) -> RegisterBlock {
        RegisterBlock {
            address: self.offset(offset),
            interposer: self.interposer.clone(),
        }
    }
}

impl fmt::Debug for RegisterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterBlock")
            .field("address", &format_args!("{:#x}", self.address))
            .field("interposed", &self.interposer.is_some())
            .finish()
    }
}
