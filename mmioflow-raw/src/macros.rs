//! Declarative macros for projecting fields onto user types

/// Define an enum that can be read from and written to a bit field
///
/// # Example
/// ```
/// use mmioflow_raw::{projectable_enum, BitFieldProjectable};
///
/// projectable_enum! {
///     pub enum Mode: 2 {
///         Off = 0b00,
///         Single = 0b01,
///         Continuous = 0b11,
///     }
/// }
///
/// assert_eq!(Mode::from_storage(0b11u32), Mode::Continuous);
/// assert_eq!(Mode::Single.into_storage::<u8>(), 0b01);
/// assert_eq!(Mode::from_raw_value(0b10), None);
/// ```
///
/// Expands to:
/// - An enum with Debug, Clone, Copy, PartialEq, Eq, Hash derives
/// - `raw_value(self) -> u64` and `from_raw_value(u64) -> Option<Self>`
/// - A [`BitFieldProjectable`](crate::BitFieldProjectable) impl of the given
///   bit width, whose `from_storage` panics on a value with no variant
#[macro_export]
macro_rules! projectable_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $bits:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            pub const fn raw_value(self) -> u64 {
                match self {
                    $($name::$variant => $value,)*
                }
            }

            pub const fn from_raw_value(value: u64) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl $crate::BitFieldProjectable for $name {
            const BIT_WIDTH: u32 = $bits;

            fn from_storage<S: $crate::RegisterStorage>(storage: S) -> Self {
                let value = $crate::RegisterStorage::to_u64(storage);
                match Self::from_raw_value(value) {
                    Some(variant) => variant,
                    None => panic!(
                        "illegal value {:#x} for '{}': no variant has this raw value",
                        value,
                        stringify!($name)
                    ),
                }
            }

            fn into_storage<S: $crate::RegisterStorage>(self) -> S {
                <S as $crate::RegisterStorage>::from_u64_truncating(self.raw_value())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::BitFieldProjectable;

    projectable_enum! {
        /// Clock source selection
        enum Source: 2 {
            Internal = 0,
            External = 2,
        }
    }

    #[test]
    fn test_projectable_enum_round_trip() {
        assert_eq!(Source::BIT_WIDTH, 2);
        assert_eq!(Source::from_storage(2u16), Source::External);
        assert_eq!(Source::Internal.into_storage::<u64>(), 0);
        assert_eq!(Source::External.raw_value(), 2);
    }

    #[test]
    #[should_panic(expected = "illegal value 0x1 for 'Source'")]
    fn test_projectable_enum_rejects_unknown_value() {
        Source::from_storage(1u8);
    }
}
