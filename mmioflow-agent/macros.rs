//! Declarative macros to reduce boilerplate across the mmioflow codebase

/// Run a block once with the storage type matching a runtime register width
///
/// # Example
/// ```
/// use mmioflow::with_storage;
/// use mmioflow::raw::{RegisterStorage, RegisterWidth};
///
/// fn bits_of<S: RegisterStorage>() -> u32 {
///     S::BITS
/// }
///
/// let width = RegisterWidth::W16;
/// let bits = with_storage!(width, S => bits_of::<S>());
/// assert_eq!(bits, 16);
/// ```
///
/// Expands to a `match` over [`RegisterWidth`](mmioflow_raw::RegisterWidth)
/// with `S` bound to `u8`, `u16`, `u32` or `u64` in each arm.
#[macro_export]
macro_rules! with_storage {
    ($width:expr, $storage:ident => $body:expr) => {
        match $width {
            $crate::raw::RegisterWidth::W8 => {
                type $storage = u8;
                $body
            }
            $crate::raw::RegisterWidth::W16 => {
                type $storage = u16;
                $body
            }
            $crate::raw::RegisterWidth::W32 => {
                type $storage = u32;
                $body
            }
            $crate::raw::RegisterWidth::W64 => {
                type $storage = u64;
                $body
            }
        }
    };
}
