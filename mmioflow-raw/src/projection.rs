//! Typed projections of field values
//!
//! A field read through [`ReadValue::get_as`](crate::ReadValue::get_as) is
//! converted with [`BitFieldProjectable::from_storage`]; the projected type's
//! [`BIT_WIDTH`](BitFieldProjectable::BIT_WIDTH) must equal the field width.
//! Enums can opt in with [`projectable_enum!`](crate::projectable_enum).

use crate::storage::RegisterStorage;

pub trait BitFieldProjectable: Sized {
    const BIT_WIDTH: u32;

    /// Build a value from field bits already shifted down to bit 0
    fn from_storage<S: RegisterStorage>(storage: S) -> Self;

    /// Field bits for this value, at bit 0
    fn into_storage<S: RegisterStorage>(self) -> S;
}

impl BitFieldProjectable for bool {
    const BIT_WIDTH: u32 = 1;

    fn from_storage<S: RegisterStorage>(storage: S) -> Self {
        storage != S::ZERO
    }

    fn into_storage<S: RegisterStorage>(self) -> S {
        S::from_u64_truncating(self as u64)
    }
}

#[inline(always)]
fn assert_storage_holds<S: RegisterStorage>(type_name: &str, bit_width: u32) {
    assert!(
        S::BITS >= bit_width,
        "value type '{}' of bit width {} does not fit in storage of bit width {}",
        type_name,
        bit_width,
        S::BITS
    );
}

macro_rules! projectable_integer {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl BitFieldProjectable for $ty {
                const BIT_WIDTH: u32 = <$ty>::BITS;

                fn from_storage<S: RegisterStorage>(storage: S) -> Self {
                    assert_storage_holds::<S>(stringify!($ty), Self::BIT_WIDTH);
                    storage.to_u64() as $unsigned as $ty
                }

                fn into_storage<S: RegisterStorage>(self) -> S {
                    assert_storage_holds::<S>(stringify!($ty), Self::BIT_WIDTH);
                    S::from_u64_truncating(self as $unsigned as u64)
                }
            }
        )*
    };
}

projectable_integer! {
    u8 => u8,
    u16 => u16,
    u32 => u32,
    u64 => u64,
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_projection() {
        assert!(bool::from_storage(1u32));
        assert!(!bool::from_storage(0u8));
        assert_eq!(true.into_storage::<u16>(), 1);
    }

    #[test]
    fn test_signed_projection_keeps_field_bits() {
        assert_eq!(i8::from_storage(0xFFu32), -1);
        assert_eq!((-1i8).into_storage::<u32>(), 0xFF);
        assert_eq!((-2i16).into_storage::<u64>(), 0xFFFE);
    }

    #[test]
    #[should_panic(expected = "does not fit in storage of bit width 16")]
    fn test_projection_wider_than_storage() {
        u32::from_storage(0u16);
    }
}
