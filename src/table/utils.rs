/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Markers pandas writes for absent values.
const MISSING_MARKERS: &[&str] = &["", "nan", "NaN", "NA", "N/A", "null"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    Missing,
    /// Present but not a number.
    Invalid,
}

/// Parse one numeric cell of the balance sheet.
pub fn parse_cell(raw: &str) -> Cell {
    let c = clean_str(raw);
    if MISSING_MARKERS.contains(&c.as_str()) {
        return Cell::Missing;
    }
    match c.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        Ok(_) => Cell::Missing,
        Err(_) => Cell::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_spaces() {
        assert_eq!(clean_str("  \"Assets\" "), "Assets");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str("Deposit facility"), "Deposit facility");
    }

    #[test]
    fn parse_cell_kinds() {
        assert_eq!(parse_cell("693.5"), Cell::Value(693.5));
        assert_eq!(parse_cell(" \"12\" "), Cell::Value(12.0));
        assert_eq!(parse_cell(""), Cell::Missing);
        assert_eq!(parse_cell("NaN"), Cell::Missing);
        assert_eq!(parse_cell("inf"), Cell::Missing);
        assert_eq!(parse_cell("n.a."), Cell::Invalid);
    }
}
