//! Concrete diagnostic checks
//!
//! Each module exposes a parameterless `metadata()` and a `build()` that
//! constructs the check from [`CheckDeps`](crate::registry::CheckDeps).
//! Check structs are generic over the narrow gateway role they query, so
//! tests can drive them with an in-memory gateway.

pub mod connection_headroom;
pub mod partition_usage;
pub mod pg_version;
pub mod sequential_scans;
pub mod shared_buffers;

/// Human-readable byte size using binary units
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(128 * 1024 * 1024), "128.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 / 2), "1.5 GiB");
    }
}
