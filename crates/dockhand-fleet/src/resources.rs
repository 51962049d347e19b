//! Resource limit unit conversion.
//!
//! The daemon speaks bytes and nanocpus (10^9 = one full core); operators
//! speak strings like `512M` and `1.5`. Conversion happens exactly once, at
//! this boundary, and the canonical values are the source of truth
//! afterwards.

use crate::error::{FleetError, FleetResult};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Nanocpus per whole CPU core.
pub const NANOS_PER_CPU: u64 = 1_000_000_000;

/// Parse a human memory string (`512M`, `1G`, `1.5G`, `2048`) into bytes.
///
/// Units are 1024-based, case-insensitive; a bare number means bytes.
///
/// # Errors
///
/// Returns [`FleetError::InvalidMemory`] for unrecognized suffixes or
/// non-numeric values.
pub fn parse_memory(input: &str) -> FleetResult<u64> {
    let trimmed = input.trim().to_ascii_uppercase();
    let invalid = || FleetError::InvalidMemory(input.to_string());

    let (number_part, multiplier) = match trimmed.as_bytes().last() {
        Some(b'B') => (&trimmed[..trimmed.len() - 1], 1),
        Some(b'K') => (&trimmed[..trimmed.len() - 1], KIB),
        Some(b'M') => (&trimmed[..trimmed.len() - 1], MIB),
        Some(b'G') => (&trimmed[..trimmed.len() - 1], GIB),
        Some(_) => (trimmed.as_str(), 1),
        None => return Err(invalid()),
    };

    let value: f64 = number_part.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok((value * multiplier as f64) as u64)
}

/// Parse a human CPU count (`1`, `2`, `0.5`, `1.5`) into nanocpus.
///
/// # Errors
///
/// Returns [`FleetError::InvalidCpus`] unless the value parses as a
/// positive finite number.
pub fn parse_cpus(input: &str) -> FleetResult<u64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| FleetError::InvalidCpus(input.to_string()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(FleetError::InvalidCpus(input.to_string()));
    }
    Ok((value * NANOS_PER_CPU as f64).round() as u64)
}

/// Format a byte count as the nearest clean human unit.
///
/// Prefers G over M over K over B: the first unit where the value is at
/// least 1. Zero means no limit.
#[must_use]
pub fn format_memory(bytes: u64) -> String {
    if bytes == 0 {
        return "unlimited".to_string();
    }
    for (unit, divisor) in [("G", GIB), ("M", MIB), ("K", KIB)] {
        if bytes >= divisor {
            return format!("{:.1}{unit}", bytes as f64 / divisor as f64);
        }
    }
    format!("{bytes}B")
}

/// Format a nanocpu count as a CPU core count.
///
/// Whole counts render without decimals. Zero means no limit.
#[must_use]
pub fn format_cpus(nano_cpus: u64) -> String {
    if nano_cpus == 0 {
        return "unlimited".to_string();
    }
    let cpus = nano_cpus as f64 / NANOS_PER_CPU as f64;
    if cpus.fract() == 0.0 {
        format!("{}", cpus as u64)
    } else {
        format!("{cpus:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("512M", 536_870_912; "mebibytes")]
    #[test_case("1G", 1_073_741_824; "gibibytes")]
    #[test_case("1.5G", 1_610_612_736; "fractional gibibytes")]
    #[test_case("2048K", 2_097_152; "kibibytes")]
    #[test_case("100B", 100; "explicit bytes")]
    #[test_case("2048", 2048; "bare number is bytes")]
    #[test_case(" 512m ", 536_870_912; "lowercase with whitespace")]
    fn test_parse_memory(input: &str, expected: u64) {
        assert_eq!(parse_memory(input).expect("valid memory"), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("12Q"; "unknown unit")]
    #[test_case("G"; "unit without number")]
    #[test_case("-1G"; "negative")]
    #[test_case("lots"; "not a number")]
    fn test_parse_memory_invalid(input: &str) {
        assert!(matches!(
            parse_memory(input),
            Err(FleetError::InvalidMemory(_))
        ));
    }

    #[test_case("1", 1_000_000_000; "one core")]
    #[test_case("1.5", 1_500_000_000; "fractional")]
    #[test_case("0.5", 500_000_000; "half core")]
    #[test_case("2", 2_000_000_000; "two cores")]
    fn test_parse_cpus(input: &str, expected: u64) {
        assert_eq!(parse_cpus(input).expect("valid cpus"), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("0"; "zero is not positive")]
    #[test_case("-1"; "negative")]
    #[test_case("many"; "not a number")]
    #[test_case("inf"; "infinite")]
    fn test_parse_cpus_invalid(input: &str) {
        assert!(matches!(parse_cpus(input), Err(FleetError::InvalidCpus(_))));
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(536_870_912), "512.0M");
        assert_eq!(format_memory(1_073_741_824), "1.0G");
        assert_eq!(format_memory(1_610_612_736), "1.5G");
        assert_eq!(format_memory(2048), "2.0K");
        assert_eq!(format_memory(100), "100B");
        assert_eq!(format_memory(0), "unlimited");
    }

    #[test]
    fn test_format_cpus() {
        assert_eq!(format_cpus(1_000_000_000), "1");
        assert_eq!(format_cpus(1_500_000_000), "1.50");
        assert_eq!(format_cpus(500_000_000), "0.50");
        assert_eq!(format_cpus(0), "unlimited");
    }

    #[test]
    fn test_round_trip_clean_values() {
        let bytes = parse_memory("512M").expect("parse");
        assert_eq!(format_memory(bytes), "512.0M");
        let nanos = parse_cpus("1.5").expect("parse");
        assert_eq!(format_cpus(nanos), "1.50");
    }
}
