//! Version directory names
//!
//! Installed packages live in one directory per version, named after the
//! version itself: `1.2.3`, `0.183.0`, `2.0.0-beta`. Up to six numeric
//! components are allowed, optionally followed by a `-tag` pre-release suffix.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Version directory grammar. `Regex::is_match` keeps no state between calls.
static VERSION_DIRECTORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+\.?){1,6}(-\w+)?$").expect("version directory pattern is valid")
});

/// A parsed version directory name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    name: String,
    components: Vec<u64>,
    pre_release: Option<String>,
}

/// Whether `name` follows the version directory grammar.
///
/// A matching name can still fail [`InstalledVersion::parse`] when a
/// numeric component does not fit in a `u64`.
pub fn is_version_name(name: &str) -> bool {
    VERSION_DIRECTORY_RE.is_match(name)
}

impl InstalledVersion {
    /// Parse a directory name, returning None if it is not a version directory
    pub fn parse(name: &str) -> Option<Self> {
        if !is_version_name(name) {
            return None;
        }

        let (numbers, pre_release) = match name.split_once('-') {
            Some((numbers, tag)) => (numbers, Some(tag.to_string())),
            None => (name, None),
        };

        let components = numbers
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            name: name.to_string(),
            components,
            pre_release,
        })
    }

    /// The directory name this version was parsed from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// Compare numeric components left to right, padding the shorter side with zeros.
    pub fn cmp_components(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let ours = self.components.get(i).copied().unwrap_or(0);
                let theirs = other.components.get(i).copied().unwrap_or(0);
                ours.cmp(&theirs)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Whether this version should replace `current` as the latest one.
    ///
    /// A numerically greater version always wins. On numeric equality a stable
    /// version beats a pre-release, and with `include_pre_release` two
    /// pre-releases are ordered by plain string comparison of their tags.
    pub fn supersedes(&self, current: &Self, include_pre_release: bool) -> bool {
        match self.cmp_components(current) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match (&self.pre_release, &current.pre_release) {
                (None, Some(_)) => true,
                (Some(ours), Some(theirs)) => include_pre_release && ours > theirs,
                _ => false,
            },
        }
    }
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", vec![1], None)]
    #[case("1.2.3", vec![1, 2, 3], None)]
    #[case("0.183.0", vec![0, 183, 0], None)]
    #[case("1.2.3.4.5.6", vec![1, 2, 3, 4, 5, 6], None)]
    #[case("2.0.0-beta", vec![2, 0, 0], Some("beta"))]
    #[case("2.0.0-rc_1", vec![2, 0, 0], Some("rc_1"))]
    #[case("1.", vec![1], None)]
    fn parse_accepts_version_directories(
        #[case] name: &str,
        #[case] components: Vec<u64>,
        #[case] pre_release: Option<&str>,
    ) {
        let version = InstalledVersion::parse(name).unwrap();

        assert_eq!(version.components(), components.as_slice());
        assert_eq!(version.pre_release(), pre_release);
        assert_eq!(version.to_string(), name);
    }

    #[rstest]
    #[case("")]
    #[case("not-a-version")]
    #[case("v1.2.3")]
    #[case("1.2.3.4.5.6.7")]
    #[case("1..2")]
    #[case("1.2.3-beta-2")]
    #[case("1.2.3-")]
    fn parse_rejects_other_names(#[case] name: &str) {
        assert!(!is_version_name(name));
        assert_eq!(InstalledVersion::parse(name), None);
    }

    #[test]
    fn parse_rejects_out_of_range_components() {
        let name = "99999999999999999999999";

        assert!(is_version_name(name));
        assert_eq!(InstalledVersion::parse(name), None);
    }

    #[test]
    fn parse_is_repeatable() {
        // A matcher that kept state between calls would fail every other call.
        for _ in 0..4 {
            assert!(InstalledVersion::parse("1.0.0").is_some());
        }
    }

    #[rstest]
    #[case("1.10.0", "1.2.0", Ordering::Greater)]
    #[case("1.2", "1.2.0", Ordering::Equal)]
    #[case("1.2", "1.2.0.1", Ordering::Less)]
    #[case("2", "1.9.9", Ordering::Greater)]
    #[case("0.183.0", "0.183.0", Ordering::Equal)]
    fn cmp_components_pads_missing_parts(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        let left = InstalledVersion::parse(left).unwrap();
        let right = InstalledVersion::parse(right).unwrap();

        assert_eq!(left.cmp_components(&right), expected);
    }

    #[rstest]
    #[case("1.10.0", "1.9.0", false, true)]
    #[case("1.9.0", "1.10.0", false, false)]
    #[case("1.0.0", "1.0.0", false, false)]
    #[case("1.0.0", "1.0.0-beta", false, true)]
    // Stable wins a numeric tie regardless of directory order, so a stable
    // candidate also replaces a pre-release that was seen first.
    #[case("1.0.0", "1.0.0-beta", true, true)]
    #[case("1.0.0-beta", "1.0.0", true, false)]
    #[case("1.0.0-beta", "1.0.0-alpha", true, true)]
    #[case("1.0.0-alpha", "1.0.0-beta", true, false)]
    #[case("1.0.0-beta", "1.0.0-alpha", false, false)]
    // Tags compare as plain strings: "beta10" sorts before "beta9".
    #[case("1.0.0-beta10", "1.0.0-beta9", true, false)]
    fn supersedes_follows_tie_break_rules(
        #[case] candidate: &str,
        #[case] current: &str,
        #[case] include_pre_release: bool,
        #[case] expected: bool,
    ) {
        let candidate = InstalledVersion::parse(candidate).unwrap();
        let current = InstalledVersion::parse(current).unwrap();

        assert_eq!(candidate.supersedes(&current, include_pre_release), expected);
    }
}
