//! npm-style range expressions on top of `semver::VersionReq`.
//!
//! Grammar of a merged expression:
//!
//! ```text
//! expr        := conjunct ("," conjunct)*        all must hold
//! conjunct    := alternative ("||" alternative)* any must hold
//! alternative := comparator (ws comparator)*     all must hold
//!              | version ws "-" ws version       inclusive range
//! ```
//!
//! Commas therefore always mean AND, which is what the constraint merger
//! relies on when it joins declarations with `", "`.

use semver::{Version, VersionReq};

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// A parsed range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    conjuncts: Vec<Vec<VersionReq>>,
}

impl RangeSet {
    pub fn parse(expr: &str) -> Result<Self, semver::Error> {
        let mut conjuncts = Vec::new();
        for conjunct in expr.split(',') {
            let conjunct = conjunct.trim();
            if conjunct.is_empty() {
                continue;
            }
            let alternatives = conjunct
                .split("||")
                .map(|alt| VersionReq::parse(&normalize_alternative(alt)))
                .collect::<Result<Vec<_>, _>>()?;
            conjuncts.push(alternatives);
        }
        Ok(Self { conjuncts })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.conjuncts
            .iter()
            .all(|alternatives| alternatives.iter().any(|req| req.matches(version)))
    }
}

/// Parse a release version, tolerating a leading `v`.
pub fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    Version::parse(raw.strip_prefix('v').unwrap_or(raw)).ok()
}

/// Rewrite one npm-style alternative into `semver` syntax.
fn normalize_alternative(alt: &str) -> String {
    let tokens = join_operators(alt.split_whitespace().collect());

    if tokens.len() == 3 && tokens[1] == "-" {
        let (lower, upper) = (strip_v(&tokens[0]), strip_v(&tokens[2]));
        let mut bounds = Vec::new();
        if !is_full_wildcard(lower) {
            bounds.push(format!(">={}", strip_wildcards(lower)));
        }
        if !is_full_wildcard(upper) {
            bounds.push(format!("<={}", strip_wildcards(upper)));
        }
        return if bounds.is_empty() {
            "*".to_string()
        } else {
            bounds.join(", ")
        };
    }

    let comparators: Vec<String> = tokens
        .iter()
        .filter(|token| !is_full_wildcard(token))
        .map(|token| normalize_comparator(token))
        .collect();

    if comparators.is_empty() {
        "*".to_string()
    } else {
        comparators.join(", ")
    }
}

/// `>= 14` is written with a space by some authors; glue it back.
fn join_operators(tokens: Vec<&str>) -> Vec<String> {
    let mut joined = Vec::with_capacity(tokens.len());
    let mut pending = String::new();
    for token in tokens {
        if token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending.push_str(token);
            continue;
        }
        joined.push(format!("{}{}", pending, token));
        pending.clear();
    }
    joined
}

fn normalize_comparator(token: &str) -> String {
    let split = token
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(split);
    let version = strip_v(version);

    if op.is_empty() {
        // A bare version is exact in npm; `semver` would read it as caret.
        if has_wildcard(version) {
            version.to_string()
        } else {
            format!("={}", version)
        }
    } else {
        format!("{}{}", op, strip_wildcards(version))
    }
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn is_wildcard_part(part: &str) -> bool {
    matches!(part, "*" | "x" | "X")
}

fn is_full_wildcard(token: &str) -> bool {
    !token.is_empty() && token.split('.').all(is_wildcard_part)
}

fn has_wildcard(version: &str) -> bool {
    version.split('.').any(is_wildcard_part)
}

/// `>=14.x` means `>=14`; operators do not combine with wildcards in `semver`.
fn strip_wildcards(version: &str) -> &str {
    let mut rest = version;
    while let Some((head, last)) = rest.rsplit_once('.') {
        if !is_wildcard_part(last) {
            break;
        }
        rest = head;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[test]
    fn test_normalize_space_separated_range() {
        assert_eq!(normalize_alternative(">=14.0 <15.0"), ">=14.0, <15.0");
        assert_eq!(normalize_alternative(">= 14.0  < 15.0"), ">=14.0, <15.0");
    }

    #[test]
    fn test_normalize_bare_and_wildcards() {
        assert_eq!(normalize_alternative("16.0.0"), "=16.0.0");
        assert_eq!(normalize_alternative("v16.0.0"), "=16.0.0");
        assert_eq!(normalize_alternative("14.x"), "14.x");
        assert_eq!(normalize_alternative("*"), "*");
        assert_eq!(normalize_alternative(""), "*");
        assert_eq!(normalize_alternative(">=14.x"), ">=14");
    }

    #[test]
    fn test_normalize_hyphen_range() {
        assert_eq!(normalize_alternative("14.0.0 - 16"), ">=14.0.0, <=16");
        assert_eq!(normalize_alternative("14.x - 16.x"), ">=14, <=16");
    }

    #[test]
    fn test_hyphen_range_with_wildcard_bound() {
        assert_eq!(normalize_alternative("x - 16"), "<=16");
        assert_eq!(normalize_alternative("14 - *"), ">=14");
        assert_eq!(normalize_alternative("* - x"), "*");

        let range = RangeSet::parse("x - 16").unwrap();
        assert!(range.matches(&v("10.0.0")));
        assert!(range.matches(&v("16.3.0")));
        assert!(!range.matches(&v("17.0.0")));
    }

    #[test]
    fn test_strip_wildcards() {
        assert_eq!(strip_wildcards("14.x"), "14");
        assert_eq!(strip_wildcards("14.2.*"), "14.2");
        assert_eq!(strip_wildcards("14.2.1"), "14.2.1");
    }

    #[test]
    fn test_commas_are_conjunctions() {
        let range = RangeSet::parse("^14.0, >=14.5").unwrap();
        assert!(range.matches(&v("14.6.0")));
        assert!(!range.matches(&v("14.2.0")));
        assert!(!range.matches(&v("16.0.0")));
    }

    #[test]
    fn test_or_inside_conjunct() {
        let range = RangeSet::parse("^14 || ^16, >=14.5").unwrap();
        assert!(range.matches(&v("16.1.0")));
        assert!(range.matches(&v("14.9.0")));
        assert!(!range.matches(&v("14.1.0")));
        assert!(!range.matches(&v("15.0.0")));
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let range = RangeSet::parse("*").unwrap();
        assert!(range.matches(&v("0.10.48")));
        assert!(range.matches(&v("22.1.0")));
    }

    #[test]
    fn test_parse_version_strips_prefix() {
        assert_eq!(parse_version("v20.11.1"), Some(v("20.11.1")));
        assert_eq!(parse_version("20.11.1\n"), Some(v("20.11.1")));
        assert_eq!(parse_version("latest"), None);
    }
}
