//! Plain-text rendering of register values and check results

use std::fmt::Write;

use mmioflow_raw::{BitField, FieldId, RegisterStorage};

/// Zero-padded hex of a full storage word
pub fn hex<S: RegisterStorage>(value: S) -> String {
    let digits = (S::BITS / 4) as usize + 2;
    format!("{:#0digits$x}", value.to_u64())
}

pub fn format_ranges(field: &BitField) -> String {
    field
        .ranges()
        .iter()
        .map(|range| range.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One header line plus a row per field: name, access, bit ranges, value
pub fn render_fields<'a, S: RegisterStorage>(
    register: &str,
    storage: S,
    fields: impl IntoIterator<Item = (FieldId, &'a BitField, S)>,
) -> String {
    let rows: Vec<(&str, &str, String, S)> = fields
        .into_iter()
        .map(|(_, field, value)| (field.name(), field.access().name(), format_ranges(field), value))
        .collect();

    let name_width = rows.iter().map(|row| row.0.len()).max().unwrap_or(0);
    let access_width = rows.iter().map(|row| row.1.len()).max().unwrap_or(0);
    let bits_width = rows.iter().map(|row| row.2.len()).max().unwrap_or(0);

    let mut out = format!("{register} = {}\n", hex(storage));
    for (name, access, bits, value) in rows {
        let _ = writeln!(
            out,
            "  {name:<name_width$}  {access:<access_width$}  {bits:<bits_width$}  {value:#x}"
        );
    }
    out
}

/// Indent every line of `text` by `spaces`
pub fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{pad}{line}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmioflow_raw::{BitRange, RawValue, RegisterLayout, RegisterWidth};

    #[test]
    fn test_hex_padding() {
        assert_eq!(hex(0x31u32), "0x00000031");
        assert_eq!(hex(0xAu8), "0x0a");
        assert_eq!(hex(u64::MAX), "0xffffffffffffffff");
    }

    #[test]
    fn test_render_fields() {
        let layout = RegisterLayout::new("CTRL", RegisterWidth::W16)
            .with_field(BitField::read_write("en", [BitRange::new(0, 1).unwrap()]))
            .with_field(BitField::read_only(
                "status",
                [BitRange::new(4, 6).unwrap(), BitRange::new(8, 10).unwrap()],
            ))
            .validate()
            .unwrap();
        let raw = RawValue::new(&layout, 0x0331u16);

        assert_eq!(
            render_fields(layout.name(), raw.storage(), raw.iter()),
            "CTRL = 0x0331\n  \
             en      read-write  0..1         0x1\n  \
             status  read-only   4..6, 8..10  0xf\n"
        );
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\nb", 2), "  a\n  b\n");
    }
}
