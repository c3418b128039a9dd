use crate::error::{MmioflowError, Result};

/// Parse a number like "42", "0x2A", "0b101010" or "0o52"
///
/// Underscores between digits are ignored, so "0xFFFF_0000" works.
pub fn parse_u64(text: &str) -> Result<u64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();

    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (oct, 8)
    } else {
        (lower.as_str(), 10)
    };

    if digits.is_empty() {
        return Err(MmioflowError::ParseError(format!(
            "Empty number: '{text}'"
        )));
    }

    u64::from_str_radix(digits, radix)
        .map_err(|e| MmioflowError::ParseError(format!("Invalid number '{text}': {e}")))
}

/// Parse a "field=value" assignment
pub fn parse_assignment(text: &str) -> Result<(String, u64)> {
    let (field, value) = text.split_once('=').ok_or_else(|| {
        MmioflowError::ParseError(format!("Expected field=value, got '{text}'"))
    })?;

    let field = field.trim();
    if field.is_empty() {
        return Err(MmioflowError::ParseError(format!(
            "Missing field name in '{text}'"
        )));
    }

    Ok((field.to_string(), parse_u64(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_radixes() {
        assert_eq!(parse_u64("42").unwrap(), 42);
        assert_eq!(parse_u64("0x2A").unwrap(), 42);
        assert_eq!(parse_u64("0b10_1010").unwrap(), 42);
        assert_eq!(parse_u64("0o52").unwrap(), 42);
        assert_eq!(parse_u64(" 0xFFFF_0000 ").unwrap(), 0xFFFF_0000);
        assert_eq!(parse_u64("0xffffffffffffffff").unwrap(), u64::MAX);
    }

    #[test]
    fn test_parse_u64_rejects_garbage() {
        assert!(parse_u64("").is_err());
        assert!(parse_u64("0x").is_err());
        assert!(parse_u64("12ab").is_err());
        assert!(parse_u64("0x1_0000_0000_0000_0000").is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("mode=0b11").unwrap(),
            ("mode".to_string(), 3)
        );
        assert_eq!(parse_assignment(" en = 1").unwrap(), ("en".to_string(), 1));
        assert!(parse_assignment("mode").is_err());
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("mode=").is_err());
    }
}
