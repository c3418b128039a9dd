use serde::{Deserialize, Serialize};
use std::path::Path;

use mmioflow_raw::{AccessKind, BitField, BitRange, RegisterLayout, ValidatedLayout};

use crate::error::{MmioflowError, Result};

/// A register schema file: a list of register descriptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    pub registers: Vec<RegisterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSpec {
    pub name: String,
    pub bit_width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u64>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub access: AccessSpec,
    pub bits: Vec<BitRangeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSpec {
    Reserved,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl From<AccessSpec> for AccessKind {
    fn from(access: AccessSpec) -> Self {
        match access {
            AccessSpec::Reserved => AccessKind::Reserved,
            AccessSpec::ReadOnly => AccessKind::ReadOnly,
            AccessSpec::WriteOnly => AccessKind::WriteOnly,
            AccessSpec::ReadWrite => AccessKind::ReadWrite,
        }
    }
}

/// One bit range in any of the accepted spellings
///
/// `"4..8"` (half-open), `"4..=7"` (inclusive), `{"lsb": 4, "msb": 7}` or
/// `{"offset": 4, "width": 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BitRangeSpec {
    Text(String),
    LsbMsb { lsb: u32, msb: u32 },
    OffsetWidth { offset: u32, width: u32 },
}

impl BitRangeSpec {
    pub fn to_bit_range(&self) -> Result<BitRange> {
        match self {
            BitRangeSpec::Text(text) => parse_range_text(text),
            BitRangeSpec::LsbMsb { lsb, msb } => Ok(BitRange::from_lsb_msb(*lsb, *msb)?),
            BitRangeSpec::OffsetWidth { offset, width } => {
                Ok(BitRange::from_offset_width(*offset, *width)?)
            }
        }
    }
}

/// Parse "a..b" or "a..=b"
fn parse_range_text(text: &str) -> Result<BitRange> {
    let bound = |s: &str| -> Result<u32> {
        s.trim().parse::<u32>().map_err(|e| {
            MmioflowError::SchemaError(format!("Invalid bit range '{text}': {e}"))
        })
    };

    if let Some((lower, upper)) = text.split_once("..=") {
        Ok(BitRange::from_lsb_msb(bound(lower)?, bound(upper)?)?)
    } else if let Some((lower, upper)) = text.split_once("..") {
        Ok(BitRange::new(bound(lower)?, bound(upper)?)?)
    } else {
        Err(MmioflowError::SchemaError(format!(
            "Invalid bit range '{text}': expected 'a..b' or 'a..=b'"
        )))
    }
}

impl FieldSpec {
    pub fn to_field(&self) -> Result<BitField> {
        let ranges = self
            .bits
            .iter()
            .map(BitRangeSpec::to_bit_range)
            .collect::<Result<Vec<_>>>()?;
        let field = BitField::new(self.name.clone(), self.access.into(), ranges);
        Ok(match self.projection {
            Some(width) => field.with_projection(width),
            None => field,
        })
    }
}

impl RegisterSpec {
    /// Build the layout without validating it
    pub fn to_layout(&self) -> Result<RegisterLayout> {
        let mut layout = RegisterLayout::with_bit_width(self.name.clone(), self.bit_width)?;
        for field in &self.fields {
            layout.push_field(field.to_field().map_err(|e| {
                MmioflowError::SchemaError(format!(
                    "Field '{}' of register '{}': {}",
                    field.name, self.name, e
                ))
            })?);
        }
        Ok(layout)
    }

    pub fn validate(&self) -> Result<ValidatedLayout> {
        Ok(self.to_layout()?.validate()?)
    }
}

impl SchemaFile {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MmioflowError::SchemaError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let schema = Self::from_json(&text)?;
        tracing::info!(
            "Loaded {} registers from {}",
            schema.registers.len(),
            path.display()
        );
        Ok(schema)
    }

    pub fn register(&self, name: &str) -> Result<&RegisterSpec> {
        self.registers
            .iter()
            .find(|register| register.name == name)
            .ok_or_else(|| MmioflowError::UnknownRegister(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmioflow_raw::DiagnosticKind;

    const SCHEMA: &str = r#"{
        "registers": [
            {
                "name": "CTRL",
                "bit_width": 32,
                "address": 1073741824,
                "fields": [
                    { "name": "en",   "access": "read_write", "bits": ["0..1"], "projection": 1 },
                    { "name": "mode", "access": "write_only", "bits": [{ "lsb": 4, "msb": 6 }] },
                    { "name": "irq",  "access": "read_only",  "bits": [{ "offset": 8, "width": 2 }, "12..14"] },
                    { "name": "rsvd", "access": "reserved",   "bits": ["16..=31"] }
                ]
            },
            {
                "name": "BAD",
                "bit_width": 8,
                "fields": [
                    { "name": "a", "access": "read_write", "bits": ["0..4"] },
                    { "name": "b", "access": "read_write", "bits": ["3..9"] }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_schema() {
        let schema = SchemaFile::from_json(SCHEMA).unwrap();
        assert_eq!(schema.registers.len(), 2);

        let ctrl = schema.register("CTRL").unwrap();
        assert_eq!(ctrl.address, Some(0x4000_0000));
        assert_eq!(ctrl.fields[1].access, AccessSpec::WriteOnly);
        assert_eq!(
            ctrl.fields[2].bits,
            vec![
                BitRangeSpec::OffsetWidth {
                    offset: 8,
                    width: 2
                },
                BitRangeSpec::Text("12..14".to_string()),
            ]
        );
        assert!(schema.register("NOPE").is_err());
    }

    #[test]
    fn test_every_range_spelling_agrees() {
        let spellings = [
            BitRangeSpec::Text("4..8".to_string()),
            BitRangeSpec::Text("4..=7".to_string()),
            BitRangeSpec::LsbMsb { lsb: 4, msb: 7 },
            BitRangeSpec::OffsetWidth {
                offset: 4,
                width: 4,
            },
        ];
        for spelling in &spellings {
            assert_eq!(spelling.to_bit_range().unwrap(), BitRange::new(4, 8).unwrap());
        }
    }

    #[test]
    fn test_bad_range_text() {
        assert!(BitRangeSpec::Text("4-8".to_string()).to_bit_range().is_err());
        assert!(BitRangeSpec::Text("8..4".to_string()).to_bit_range().is_err());
        assert!(BitRangeSpec::Text("a..4".to_string()).to_bit_range().is_err());
        assert!(matches!(
            BitRangeSpec::OffsetWidth {
                offset: 3,
                width: 0
            }
            .to_bit_range(),
            Err(MmioflowError::BitRange(_))
        ));
    }

    #[test]
    fn test_build_and_validate() {
        let schema = SchemaFile::from_json(SCHEMA).unwrap();

        let ctrl = schema.register("CTRL").unwrap().validate().unwrap();
        assert!(!ctrl.is_symmetric());
        let irq = ctrl.field(ctrl.field_id("irq").unwrap());
        assert!(irq.is_discontiguous());
        assert_eq!(irq.bit_width(), 4);

        match schema.register("BAD").unwrap().validate() {
            Err(MmioflowError::Validation(err)) => {
                assert_eq!(err.of_kind(DiagnosticKind::OutOfBounds).count(), 1);
                assert_eq!(err.of_kind(DiagnosticKind::OverlappingBitRanges).count(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_width() {
        let schema = SchemaFile::from_json(
            r#"{ "registers": [ { "name": "ODD", "bit_width": 24, "fields": [] } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            schema.registers[0].to_layout(),
            Err(MmioflowError::Layout(_))
        ));
    }
}
