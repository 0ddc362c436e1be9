//! Version ordering for model rows (§4.4 of the expanded specification).
//!
//! Not the full SemVer 2.0 comparison algorithm: pre-release tag comparison
//! here is plain lexicographic, and unparsable strings sort below every
//! valid version instead of being rejected. This matches the original
//! service's comparator rather than the upstream spec, since model version
//! strings are operator-supplied and the catalog must still produce a total
//! order over whatever it's given.

use std::cmp::Ordering;

/// A parsed `MAJOR.MINOR.PATCH[-PRERELEASE]` version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<String>,
}

impl Version {
    pub fn parse(s: &str) -> Option<Self> {
        let (core, pre_release) = match s.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (s, None),
        };
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
            pre_release,
        })
    }
}

/// Orders two raw version strings for `versions_by_name` (newest first when
/// used with `.sort_by(|a, b| compare(a, b).reverse())`) and `latest_by_name`.
///
/// - Two parsable versions compare numerically, then by pre-release tag,
///   where an absent (stable) pre-release sorts *greater* than any present one.
/// - An unparsable string sorts below every parsable version.
/// - Two unparsable strings compare alphabetically.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Some(va), Some(vb)) => compare_parsed(&va, &vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn compare_parsed(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| match (&a.pre_release, &b.pre_release) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(pa), Some(pb)) => pa.cmp(pb),
        })
}

/// Sort versions newest-first, matching `versions_by_name`'s contract.
pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(a, b).reverse());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_and_prerelease() {
        let v = Version::parse("1.2.3-beta").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
        assert_eq!(v.pre_release.as_deref(), Some("beta"));
    }

    #[test]
    fn rejects_malformed() {
        assert!(Version::parse("1.2").is_none());
        assert!(Version::parse("not-a-version").is_none());
    }

    #[test]
    fn stable_beats_prerelease_of_same_numeric_version() {
        assert_eq!(compare("1.0.0", "1.0.0-beta"), Ordering::Greater);
    }

    #[test]
    fn unparsable_sorts_below_all_valid_versions() {
        assert_eq!(compare("garbage", "0.0.1"), Ordering::Less);
        assert_eq!(compare("0.0.1", "garbage"), Ordering::Greater);
    }

    #[test]
    fn scenario_3_ordering() {
        let mut versions = vec![
            "1.0.0".to_string(),
            "1.10.0".to_string(),
            "1.9.0".to_string(),
            "2.0.0".to_string(),
            "1.0.0-beta".to_string(),
        ];
        sort_newest_first(&mut versions);
        assert_eq!(
            versions,
            vec!["2.0.0", "1.10.0", "1.9.0", "1.0.0", "1.0.0-beta"]
        );
    }
}
