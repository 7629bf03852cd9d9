//! Dot-separated version comparison.
//!
//! Components compare numerically, left to right: `10.0.0 > 9.0.0`,
//! `1.9.0 < 2.0.0`. A component contributes its leading digits (`3-rc1`
//! counts as `3`); a component with no leading digits counts as zero, as do
//! missing trailing components (`1.2 == 1.2.0`).

use std::cmp::Ordering;

/// Strip an optional `v`/`V` prefix.
pub fn normalize_version(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn components(version: &str) -> Vec<u64> {
    normalize_version(version.trim())
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

/// Compare two versions field by field.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = components(a);
    let right = components(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

/// Whether two version strings name the same release, ignoring a `v` prefix.
pub fn same_version(a: &str, b: &str) -> bool {
    normalize_version(a.trim()) == normalize_version(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare_versions("10.0.0", "9.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.9.0", "2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn test_prefix_and_suffixes() {
        assert_eq!(compare_versions("v2.0.0", "2.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("3.0.0-rc1", "2.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_same_version() {
        assert!(same_version("v2.3.45", "2.3.45"));
        assert!(same_version("V1.0.0", "v1.0.0"));
        assert!(!same_version("1.0.0", "1.0.1"));
    }
}
