//! Human-readable byte counts.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count with one decimal place.
///
/// Values past the GB range stay in GB rather than running off the
/// unit table.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    format!("{:.1} {}", bytes as f64 / 1024f64.powi(exp as i32), UNITS[exp])
}

/// Formats a transfer rate as `<size>/s`.
pub fn format_speed(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second as u64))
}
