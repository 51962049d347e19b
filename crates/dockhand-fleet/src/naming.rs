//! Sequence naming for managed instances.
//!
//! Instance names are `<prefix><n>` with a monotonically increasing numeric
//! suffix derived on demand from the live container list. The scan itself
//! is not atomic; the manager serializes allocation and retries on
//! daemon-side name conflicts.

/// Next free name under a prefix: the maximum numeric suffix among existing
/// names plus one, starting at 1.
///
/// Names that are not `prefix` followed by only digits are ignored, so
/// unrelated containers (or oddly named ones like `desk-old`) never
/// influence the sequence.
#[must_use]
pub fn next_name<I, S>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = existing
        .into_iter()
        .filter_map(|name| numeric_suffix(prefix, name.as_ref()))
        .max()
        .unwrap_or(0);
    // Saturate at the numeric limit; the daemon's name conflict handling
    // catches the resulting collision.
    format!("{prefix}{}", max.saturating_add(1))
}

/// Numeric suffix of `name` under `prefix`, if it has one.
fn numeric_suffix(prefix: &str, name: &str) -> Option<u64> {
    let suffix = name.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fleet_starts_at_one() {
        let existing: Vec<&str> = Vec::new();
        assert_eq!(next_name("desk", existing), "desk1");
    }

    #[test]
    fn test_non_numeric_suffixes_ignored() {
        let existing = ["inst1", "inst3", "instX"];
        assert_eq!(next_name("inst", existing), "inst4");
    }

    #[test]
    fn test_gaps_are_not_reused() {
        let existing = ["desk1", "desk5"];
        assert_eq!(next_name("desk", existing), "desk6");
    }

    #[test]
    fn test_unrelated_names_ignored() {
        let existing = ["desk2", "relay", "desk-old", "desk", "other9"];
        assert_eq!(next_name("desk", existing), "desk3");
    }

    #[test]
    fn test_multi_digit_suffixes() {
        let existing = ["desk9", "desk10", "desk11"];
        assert_eq!(next_name("desk", existing), "desk12");
    }

    #[test]
    fn test_suffix_at_numeric_limit_does_not_panic() {
        let existing = [format!("desk{}", u64::MAX)];
        assert_eq!(next_name("desk", &existing), format!("desk{}", u64::MAX));
    }

    #[test]
    fn test_numeric_suffix_rejects_mixed() {
        assert_eq!(numeric_suffix("desk", "desk12a"), None);
        assert_eq!(numeric_suffix("desk", "desk"), None);
        assert_eq!(numeric_suffix("desk", "desk07"), Some(7));
    }
}
