//! Version comparison utilities.
//!
//! Store path versions are not semver: they look like `2.39.2`, `1.2.3pre4`,
//! `unstable-2024-01-01` or `5.15.0-rc1`. Ordering follows the rules the
//! package set itself uses when picking the newer of two versions.

use std::cmp::Ordering;

/// Compare two version strings component by component.
///
/// Components are split at `.` and `-`, and at every boundary between a run
/// of digits and a run of non-digits. Numbers compare numerically, an empty
/// component sorts before a number, `pre` sorts before anything else, a number
/// sorts after any other string, and remaining strings compare lexically.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = VersionComponents::new(a);
    let mut right = VersionComponents::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let l = l.unwrap_or("");
                let r = r.unwrap_or("");
                if component_less(l, r) {
                    return Ordering::Less;
                }
                if component_less(r, l) {
                    return Ordering::Greater;
                }
            }
        }
    }
}

fn component_less(c1: &str, c2: &str) -> bool {
    let n1 = parse_number(c1);
    let n2 = parse_number(c2);

    match (n1, n2) {
        (Some(a), Some(b)) => a < b,
        _ if c1.is_empty() && n2.is_some() => true,
        _ if c1 == "pre" && c2 != "pre" => true,
        _ if c2 == "pre" => false,
        // `2.3a` < `2.3.1`
        (_, Some(_)) => true,
        (Some(_), _) => false,
        _ => c1 < c2,
    }
}

fn parse_number(component: &str) -> Option<u128> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Absurdly long digit runs saturate rather than fail
    Some(component.parse().unwrap_or(u128::MAX))
}

/// Iterator over the comparable components of a version string.
struct VersionComponents<'a> {
    rest: &'a str,
}

impl<'a> VersionComponents<'a> {
    const fn new(version: &'a str) -> Self {
        Self { rest: version }
    }
}

impl<'a> Iterator for VersionComponents<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start_matches(['.', '-']);
        if trimmed.is_empty() {
            self.rest = trimmed;
            return None;
        }

        let first_is_digit = trimmed.as_bytes()[0].is_ascii_digit();
        let end = trimmed
            .char_indices()
            .find(|&(_, c)| c == '.' || c == '-' || c.is_ascii_digit() != first_is_digit)
            .map_or(trimmed.len(), |(i, _)| i);

        let (component, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.0.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_numeric_components_compare_numerically() {
        assert_eq!(compare_versions("1.9", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("2.39.2", "2.4"), Ordering::Greater);
    }

    #[test]
    fn test_missing_component_sorts_first() {
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_pre_sorts_before_release() {
        assert_eq!(compare_versions("1.2pre3", "1.2"), Ordering::Less);
        assert_eq!(compare_versions("1.2pre3", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn test_letters_sort_before_numbers() {
        assert_eq!(compare_versions("2.3a", "2.3.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0rc1", "1.0rc2"), Ordering::Less);
    }

    #[test]
    fn test_components_split_on_digit_boundaries() {
        let parts: Vec<_> = VersionComponents::new("5.15.0-rc1").collect();
        assert_eq!(parts, vec!["5", "15", "0", "rc", "1"]);
    }

    #[test]
    fn test_empty_versions_are_equal() {
        assert_eq!(compare_versions("", ""), Ordering::Equal);
        assert_eq!(compare_versions("", "1"), Ordering::Less);
    }
}
