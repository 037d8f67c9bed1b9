//! Version matching.

pub mod range;

pub use range::{RangeSet, parse_version};

/// Picks versions that satisfy a constraint expression.
///
/// Pure: no I/O, deterministic for a given input.
pub trait VersionMatcher {
    /// Highest version in `available` satisfying `constraint`, returned as
    /// written in `available`.
    fn best_match(&self, available: &[String], constraint: &str) -> Option<String>;

    fn satisfies(&self, version: &str, constraint: &str) -> bool {
        self.best_match(&[version.to_string()], constraint).is_some()
    }
}

/// `VersionMatcher` over the `semver` crate with npm-style range syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverMatcher;

impl VersionMatcher for SemverMatcher {
    fn best_match(&self, available: &[String], constraint: &str) -> Option<String> {
        let range = match RangeSet::parse(constraint) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!("Cannot parse version constraint \"{}\": {}", constraint, e);
                return None;
            }
        };

        available
            .iter()
            .filter_map(|raw| parse_version(raw).map(|version| (version, raw)))
            .filter(|(version, _)| range.matches(version))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, raw)| raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_best_match_picks_highest_satisfying() {
        let available = catalog(&["15.1.0", "14.2.0", "14.1.3", "12.22.12"]);
        let best = SemverMatcher.best_match(&available, ">=14.0 <15.0");
        assert_eq!(best.as_deref(), Some("14.2.0"));
    }

    #[test]
    fn test_best_match_keeps_original_spelling() {
        let available = catalog(&["v16.0.0", "v16.3.1"]);
        let best = SemverMatcher.best_match(&available, "^16.0");
        assert_eq!(best.as_deref(), Some("v16.3.1"));
    }

    #[test]
    fn test_best_match_none_when_unsatisfiable() {
        let available = catalog(&["14.2.0", "15.1.0"]);
        assert_eq!(SemverMatcher.best_match(&available, ">=99"), None);
    }

    #[test]
    fn test_unparseable_constraint_matches_nothing() {
        let available = catalog(&["14.2.0"]);
        assert_eq!(SemverMatcher.best_match(&available, "not-a-range"), None);
    }

    #[test]
    fn test_unparseable_catalog_entries_are_skipped() {
        let available = catalog(&["garbage", "18.0.0"]);
        assert_eq!(
            SemverMatcher.best_match(&available, "*").as_deref(),
            Some("18.0.0")
        );
    }

    #[test]
    fn test_satisfies() {
        assert!(SemverMatcher.satisfies("16.0.0", "^16.0"));
        assert!(!SemverMatcher.satisfies("17.0.0", "^16.0"));
        assert!(SemverMatcher.satisfies("18.19.0", "*"));
    }
}
