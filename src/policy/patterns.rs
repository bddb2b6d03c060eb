//! Conflict pattern matching
//!
//! Compiles the operator's conflict patterns once at startup and classifies
//! role lists against them. Patterns are regex fragments matched
//! case-insensitively as substrings: `prod` matches `production-admin` and
//! `non-prod-reader` alike. Operators who need anchored matching supply
//! their own anchors.

use regex::Regex;

use crate::error::ConfigError;

/// Compiled conflict-pattern matcher
#[derive(Debug)]
pub struct ConflictMatcher {
    patterns: Vec<CompiledPattern>,
}

#[derive(Debug)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

/// Roles matched by one configured pattern.
///
/// `pattern` is the operator's original string, so diagnostics name exactly
/// what was configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRoles {
    pub pattern: String,
    pub roles: Vec<String>,
}

impl ConflictMatcher {
    /// Compile the configured patterns. Compile failure aborts startup.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let regex = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }
            })?;

            compiled.push(CompiledPattern {
                source: pattern.clone(),
                regex,
            });
        }

        Ok(Self { patterns: compiled })
    }

    /// Classify roles into populated `(pattern, matching roles)` pairs.
    ///
    /// Pairs come back in configured pattern order, roles in their original
    /// order. A role matching several patterns counts for each of them.
    pub fn classify(&self, roles: &[String]) -> Vec<PatternRoles> {
        let mut matches = Vec::new();

        for pattern in &self.patterns {
            let matching: Vec<String> = roles
                .iter()
                .filter(|role| pattern.regex.is_match(role))
                .cloned()
                .collect();

            if !matching.is_empty() {
                matches.push(PatternRoles {
                    pattern: pattern.source.clone(),
                    roles: matching,
                });
            }
        }

        matches
    }

    /// A conflict exists iff at least two distinct patterns match.
    pub fn is_conflict(&self, roles: &[String]) -> bool {
        self.classify(roles).len() >= 2
    }

    /// Whether any role matches any configured pattern
    pub fn matches_any(&self, roles: &[String]) -> bool {
        roles
            .iter()
            .any(|role| self.patterns.iter().any(|p| p.regex.is_match(role)))
    }

    /// The configured pattern strings, in order
    pub fn sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.source.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Render classification results for diagnostics: `prod: [a b], research: [c]`
pub fn conflict_summary(matches: &[PatternRoles]) -> String {
    matches
        .iter()
        .map(|m| format!("{}: [{}]", m.pattern, m.roles.join(" ")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> ConflictMatcher {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ConflictMatcher::new(&patterns).unwrap()
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_substring_semantics() {
        let m = matcher(&["prod"]);
        assert!(m.matches_any(&roles(&["production-admin"])));
        assert!(m.matches_any(&roles(&["non-prod-reader"])));
        assert!(!m.matches_any(&roles(&["staging-admin"])));
    }

    #[test]
    fn test_case_insensitive() {
        let m = matcher(&["prod"]);
        assert!(m.matches_any(&roles(&["PROD-admin"])));
        assert!(m.matches_any(&roles(&["Production"])));
    }

    #[test]
    fn test_single_pattern_is_not_a_conflict() {
        let m = matcher(&["prod", "research"]);
        assert!(!m.is_conflict(&roles(&["prod-admin", "prod-reader"])));
    }

    #[test]
    fn test_two_patterns_conflict() {
        let m = matcher(&["prod", "research"]);
        assert!(m.is_conflict(&roles(&["prod-admin", "research-lab"])));
    }

    #[test]
    fn test_classify_preserves_configured_order() {
        let m = matcher(&["prod", "research", "staging"]);
        let matches = m.classify(&roles(&["staging-x", "research-lab", "prod-admin"]));

        let patterns: Vec<_> = matches.iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(patterns, ["prod", "research", "staging"]);
    }

    #[test]
    fn test_classify_preserves_role_order() {
        let m = matcher(&["prod"]);
        let matches = m.classify(&roles(&["prod-b", "prod-a"]));
        assert_eq!(matches[0].roles, vec!["prod-b", "prod-a"]);
    }

    #[test]
    fn test_role_counts_for_each_matching_pattern() {
        let m = matcher(&["prod", "admin"]);
        let matches = m.classify(&roles(&["prod-admin"]));

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].roles, vec!["prod-admin"]);
        assert_eq!(matches[1].roles, vec!["prod-admin"]);
        // One role matching two patterns is itself a conflict.
        assert!(m.is_conflict(&roles(&["prod-admin"])));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ConflictMatcher::new(&["[invalid".to_string()]);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_conflict_summary_format() {
        let m = matcher(&["prod", "research"]);
        let matches = m.classify(&roles(&["prod-admin", "prod-reader", "research-lab"]));

        assert_eq!(
            conflict_summary(&matches),
            "prod: [prod-admin prod-reader], research: [research-lab]"
        );
    }
}
