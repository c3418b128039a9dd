use std::io;
use thiserror::Error;

use mmioflow_raw::{BitRangeError, LayoutError, ValidationError};

#[derive(Error, Debug)]
pub enum MmioflowError {
    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    #[error("Unknown field '{field}' in register '{register}'")]
    UnknownField { register: String, field: String },

    #[error("Field '{field}' of register '{register}' is not writable")]
    FieldNotWritable { register: String, field: String },

    #[error("Value {value:#x} does not fit in field '{field}' of bit width {bit_width}")]
    ValueTooWide {
        field: String,
        value: u64,
        bit_width: u32,
    },

    #[error("Register '{0}' has no address; pass --address")]
    MissingAddress(String),

    #[error("Address {address:#x} is not aligned for a {bit_width}-bit register")]
    MisalignedAddress { address: u64, bit_width: u32 },

    #[error("Memory mapping failed: {0}")]
    MappingError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("{}", .0.render())]
    Validation(#[from] ValidationError),

    #[error("Invalid bit range: {0}")]
    BitRange(#[from] BitRangeError),

    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Nix error: {0}")]
    NixError(#[from] nix::Error),
}

pub type Result<T> = std::result::Result<T, MmioflowError>;
