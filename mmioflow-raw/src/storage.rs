//! Fixed-width unsigned storage words and their volatile accessors

use std::fmt::{Debug, LowerHex};
use std::ops::{BitAnd, BitOr, Not, Shl, Shr};

/// Bit width of a register storage word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegisterWidth {
    W8,
    W16,
    W32,
    W64,
}

impl RegisterWidth {
    pub const fn bits(self) -> u32 {
        match self {
            RegisterWidth::W8 => 8,
            RegisterWidth::W16 => 16,
            RegisterWidth::W32 => 32,
            RegisterWidth::W64 => 64,
        }
    }

    /// Size of the storage word in bytes
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// All-ones mask of this width, widened to `u64`
    pub const fn mask(self) -> u64 {
        u64::MAX >> (64 - self.bits())
    }
}

impl TryFrom<u32> for RegisterWidth {
    type Error = u32;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(RegisterWidth::W8),
            16 => Ok(RegisterWidth::W16),
            32 => Ok(RegisterWidth::W32),
            64 => Ok(RegisterWidth::W64),
            other => Err(other),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// An unsigned integer usable as the storage word of a register
///
/// Implemented for `u8`, `u16`, `u32` and `u64` only: these are the widths for
/// which a single volatile load or store is one bus transaction.
pub trait RegisterStorage:
    sealed::Sealed
    + Copy
    + Eq
    + Default
    + Debug
    + LowerHex
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const BITS: u32;
    const WIDTH: RegisterWidth;
    const ZERO: Self;
    const ONES: Self;

    /// Widen to `u64` without loss
    fn to_u64(self) -> u64;

    /// Narrow from `u64`, discarding bits above `Self::BITS`
    fn from_u64_truncating(value: u64) -> Self;

    /// Mask with the low `width` bits set
    ///
    /// `width == 0` yields zero and `width >= BITS` yields all ones, so no
    /// shift ever reaches the storage width.
    #[inline(always)]
    fn mask(width: u32) -> Self {
        if width == 0 {
            Self::ZERO
        } else if width >= Self::BITS {
            Self::ONES
        } else {
            Self::ONES >> (Self::BITS - width)
        }
    }

    /// Perform a single volatile load
    ///
    /// # Safety
    ///
    /// `address` must be valid for reads of `Self` and aligned for `Self`.
    #[inline(always)]
    unsafe fn load_volatile(address: usize) -> Self {
        // SAFETY: upheld by the caller
        unsafe { core::ptr::read_volatile(address as *const Self) }
    }

    /// Perform a single volatile store
    ///
    /// # Safety
    ///
    /// `address` must be valid for writes of `Self` and aligned for `Self`.
    #[inline(always)]
    unsafe fn store_volatile(address: usize, value: Self) {
        // SAFETY: upheld by the caller
        unsafe { core::ptr::write_volatile(address as *mut Self, value) }
    }
}

macro_rules! register_storage {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl RegisterStorage for $ty {
                const BITS: u32 = <$ty>::BITS;
                const WIDTH: RegisterWidth = RegisterWidth::$width;
                const ZERO: Self = 0;
                const ONES: Self = <$ty>::MAX;

                #[inline(always)]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline(always)]
                fn from_u64_truncating(value: u64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

register_storage! {
    u8 => W8,
    u16 => W16,
    u32 => W32,
    u64 => W64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_edges() {
        assert_eq!(u8::mask(0), 0);
        assert_eq!(u8::mask(3), 0b111);
        assert_eq!(u8::mask(8), 0xFF);
        assert_eq!(u32::mask(32), u32::MAX);
        assert_eq!(u64::mask(64), u64::MAX);
        assert_eq!(u64::mask(63), u64::MAX >> 1);
    }

    #[test]
    fn test_width_conversions() {
        assert_eq!(RegisterWidth::try_from(16), Ok(RegisterWidth::W16));
        assert_eq!(RegisterWidth::try_from(24), Err(24));
        assert_eq!(RegisterWidth::W64.bytes(), 8);
        assert_eq!(RegisterWidth::W8.mask(), 0xFF);
        assert_eq!(<u16 as RegisterStorage>::WIDTH, RegisterWidth::W16);
    }

    #[test]
    fn test_volatile_round_trip_on_stack() {
        let mut word: u32 = 0;
        let address = &mut word as *mut u32 as usize;
        unsafe {
            u32::store_volatile(address, 0xDEAD_BEEF);
            assert_eq!(u32::load_volatile(address), 0xDEAD_BEEF);
        }
        assert_eq!(word, 0xDEAD_BEEF);
    }

    #[test]
    fn test_truncating_narrow() {
        assert_eq!(u8::from_u64_truncating(0x1234), 0x34);
        assert_eq!(u16::from_u64_truncating(0xABCD_1234), 0x1234);
        assert_eq!(0xFFu8.to_u64(), 0xFF);
    }
}
