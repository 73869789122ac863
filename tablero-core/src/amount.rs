//! Amount parsing for spreadsheet cells exported with `.`/`,` European
//! separators ("1.234,56", "12.500") or as plain numbers ("-1234.5").

/// Parse a cell into a float. Unparsable and empty cells become `0.0`.
pub fn parse_locale_amount(raw: &str) -> f64 {
    try_parse_locale_amount(raw).unwrap_or(0.0)
}

/// Like [`parse_locale_amount`] but reports cells that are not numbers.
/// Empty cells are a valid "no amount" and yield `Some(0.0)`.
pub fn try_parse_locale_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_matches('"')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Some(0.0);
    }

    // A lone dot followed by anything but three digits is a decimal point.
    let plain = match cleaned.split_once('.') {
        Some((_, frac)) if !cleaned.contains(',') => {
            !frac.contains('.') && !(frac.len() == 3 && frac.bytes().all(|b| b.is_ascii_digit()))
        }
        _ => false,
    };
    let normalized = if plain {
        cleaned
    } else {
        cleaned.replace('.', "").replace(',', ".")
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
