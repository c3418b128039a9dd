//! The operations behind each CLI subcommand
//!
//! Every function returns the text to print, so the binary stays a thin
//! dispatcher and the operations can be tested against scratch memory.

use mmioflow_raw::{FieldId, RawValue, RegisterStorage, RegisterWidth, ValidatedLayout};

use crate::common::DevMem;
use crate::config::{RegisterSpec, SchemaFile};
use crate::error::{MmioflowError, Result};
use crate::report;

/// Validation outcome of one register
#[derive(Debug)]
pub struct CheckEntry {
    pub register: String,
    pub error: Option<MmioflowError>,
}

#[derive(Debug)]
pub struct CheckReport {
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }

    pub fn is_ok(&self) -> bool {
        self.failures() == 0
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            match &entry.error {
                None => out.push_str(&format!("{}: ok\n", entry.register)),
                Some(error) => {
                    out.push_str(&format!("{}: failed\n", entry.register));
                    out.push_str(&report::indent(&error.to_string(), 2));
                }
            }
        }
        out.push_str(&format!(
            "{} registers checked, {} failed\n",
            self.entries.len(),
            self.failures()
        ));
        out
    }
}

/// Validate every register of a schema, never stopping at the first failure
pub fn check(schema: &SchemaFile) -> CheckReport {
    let entries = schema
        .registers
        .iter()
        .map(|spec| {
            let error = spec.validate().err();
            match &error {
                Some(e) => tracing::warn!("Register {} failed validation: {}", spec.name, e),
                None => tracing::debug!("Register {} is valid", spec.name),
            }
            CheckEntry {
                register: spec.name.clone(),
                error,
            }
        })
        .collect();
    CheckReport { entries }
}

fn check_fits_register(width: RegisterWidth, value: u64) -> Result<()> {
    if value & !width.mask() != 0 {
        return Err(MmioflowError::ParseError(format!(
            "Value {value:#x} does not fit in a {}-bit register",
            width.bits()
        )));
    }
    Ok(())
}

/// Decode a raw storage word through the raw view
pub fn decode(spec: &RegisterSpec, value: u64) -> Result<String> {
    let layout = spec.validate()?;
    check_fits_register(layout.width(), value)?;

    Ok(with_storage!(layout.width(), S => {
        let raw = RawValue::new(&layout, S::from_u64_truncating(value));
        report::render_fields(layout.name(), raw.storage(), raw.iter())
    }))
}

fn resolve_address(spec: &RegisterSpec, address: Option<u64>) -> Result<u64> {
    address
        .or(spec.address)
        .ok_or_else(|| MmioflowError::MissingAddress(spec.name.clone()))
}

/// One volatile read, shown through the read view
pub fn read(devmem: &DevMem, spec: &RegisterSpec, address: Option<u64>) -> Result<String> {
    let layout = spec.validate()?;
    let address = resolve_address(spec, address)?;

    with_storage!(layout.width(), S => {
        let register = devmem.register::<S>(&layout, address)?;
        let value = register.read();
        tracing::debug!(
            "Read {} at 0x{:x} = {}",
            layout.name(),
            address,
            report::hex(value.storage())
        );
        Ok(report::render_fields(layout.name(), value.storage(), value.iter()))
    })
}

/// Map each `field=value` to a write-view field, rejecting bad ones up front
fn resolve_assignments(
    layout: &ValidatedLayout,
    assignments: &[(String, u64)],
) -> Result<Vec<(FieldId, u64)>> {
    assignments
        .iter()
        .map(|(name, value)| {
            let id = layout
                .field_id(name)
                .ok_or_else(|| MmioflowError::UnknownField {
                    register: layout.name().to_string(),
                    field: name.clone(),
                })?;
            if !layout.views().write().exposes(id) {
                return Err(MmioflowError::FieldNotWritable {
                    register: layout.name().to_string(),
                    field: name.clone(),
                });
            }
            let bit_width = layout.field(id).bit_width();
            if bit_width < 64 && value >> bit_width != 0 {
                return Err(MmioflowError::ValueTooWide {
                    field: name.clone(),
                    value: *value,
                    bit_width,
                });
            }
            Ok((id, *value))
        })
        .collect()
}

/// One read-modify-write through the write view
pub fn modify(
    devmem: &DevMem,
    spec: &RegisterSpec,
    address: Option<u64>,
    assignments: &[(String, u64)],
) -> Result<String> {
    let layout = spec.validate()?;
    let address = resolve_address(spec, address)?;
    let writes = resolve_assignments(&layout, assignments)?;

    with_storage!(layout.width(), S => {
        let register = devmem.register::<S>(&layout, address)?;
        let (before, after) = register.modify(|read, write| {
            for (id, value) in &writes {
                write.set(*id, S::from_u64_truncating(*value));
            }
            (read.storage(), *write)
        });
        tracing::info!(
            "Modified {} at 0x{:x}: {} -> {}",
            layout.name(),
            address,
            report::hex(before),
            report::hex(after.storage())
        );
        Ok(format!(
            "{} -> {}\n{}",
            report::hex(before),
            report::hex(after.storage()),
            report::render_fields(layout.name(), after.storage(), after.iter())
        ))
    })
}
