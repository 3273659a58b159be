use std::fs;
use std::path::Path;

pub const FLOAT_PRECISION: usize = 5;

pub fn format_float_cell(value: f64) -> String {
    format!("{value:.precision$}", precision = FLOAT_PRECISION)
}

pub fn format_integer_cell(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format_float_cell(value)
    }
}

/// Writes `bytes` as given; quoted cells keep their own line breaks.
pub fn write_binary_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}

/// Byte-for-byte copy; an existing target is overwritten.
pub fn copy_binary_artifact(source: &Path, target: &Path) -> std::io::Result<u64> {
    fs::copy(source, target)
}
