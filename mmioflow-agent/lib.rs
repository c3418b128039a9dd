// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod report;

pub use mmioflow_raw as raw;

pub use config::{RegisterSpec, SchemaFile};
pub use error::{MmioflowError, Result};
