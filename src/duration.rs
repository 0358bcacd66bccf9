/// Render an elapsed-seconds value at a human scale.
///
/// Buckets are half-open: exactly 1 second, 60 seconds, and 3600 seconds
/// each land in the next unit up. NaN renders as `"N/A"`.
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_nan() {
        return "N/A".to_string();
    }
    if seconds < 1.0 {
        format!("{:.2}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{seconds:.2}s")
    } else if seconds < 3600.0 {
        format!("{:.2}m", seconds / 60.0)
    } else {
        format!("{:.2}h", seconds / 3600.0)
    }
}
