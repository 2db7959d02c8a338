//! Memory quantities as printed by programs ("9718 MB", "4 GB").

/// Parse a memory quantity to megabytes.
///
/// Values without a unit are taken as MB. Returns None for empty strings,
/// placeholder values and unknown units.
pub fn parse_memory_mb(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return None;
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().ok()?;
    let unit = unit.trim().to_uppercase();

    match unit.as_str() {
        "TB" | "T" => Some((value * 1024.0 * 1024.0) as u64),
        "GB" | "G" => Some((value * 1024.0) as u64),
        "MB" | "M" | "" => Some(value as u64),
        "KB" | "K" => Some((value / 1024.0) as u64),
        _ => None,
    }
}
