pub mod devmem;
pub mod parse;

pub use devmem::{DevMem, MappedRegister, DEVMEM_ENV};
pub use parse::{parse_assignment, parse_u64};
