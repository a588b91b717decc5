//! Glob patterns used for bulk invalidation

use std::fmt;

use regex::Regex;

use crate::domain::DomainError;

/// A glob pattern over cache keys
///
/// `*` matches any run of characters (including `:`), `?` matches exactly one
/// character. Everything else is literal, so regex metacharacters inside key
/// values never widen the match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern(String);

impl KeyPattern {
    pub fn new(glob: impl Into<String>) -> Self {
        Self(glob.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compile into an anchored regex
    pub fn to_regex(&self) -> Result<Regex, DomainError> {
        let mut expr = String::with_capacity(self.0.len() + 8);
        expr.push('^');

        let mut literal = String::new();
        for ch in self.0.chars() {
            match ch {
                '*' | '?' => {
                    if !literal.is_empty() {
                        expr.push_str(&regex::escape(&literal));
                        literal.clear();
                    }
                    expr.push_str(if ch == '*' { ".*" } else { "." });
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            expr.push_str(&regex::escape(&literal));
        }
        expr.push('$');

        Regex::new(&expr)
            .map_err(|e| DomainError::cache(format!("Invalid key pattern '{}': {}", self.0, e)))
    }

    /// True when the pattern has no wildcard and names a single key
    pub fn is_exact(&self) -> bool {
        !self.0.contains(['*', '?'])
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for KeyPattern {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, key: &str) -> bool {
        KeyPattern::new(pattern).to_regex().unwrap().is_match(key)
    }

    #[test]
    fn test_star_spans_segments() {
        assert!(matches("equipment:filters*", "equipment:filters"));
        assert!(matches("equipment:filters*", "equipment:filters:cat:CARDIO:limit:20"));
        assert!(!matches("equipment:filters*", "exercise:filters"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        assert!(matches("user:?", "user:1"));
        assert!(!matches("user:?", "user:12"));
    }

    #[test]
    fn test_pattern_is_anchored() {
        assert!(!matches("user:1:*", "x-user:1:rel:-"));
        assert!(!matches("user", "user:1"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("plan:filters:q:a.b*", "plan:filters:q:a.b:limit:5"));
        assert!(!matches("plan:filters:q:a.b*", "plan:filters:q:aXb:limit:5"));
        assert!(matches("x(1)+*", "x(1)+tail"));
    }

    #[test]
    fn test_is_exact() {
        assert!(KeyPattern::new("user:email:a@b.c").is_exact());
        assert!(!KeyPattern::new("user:*").is_exact());
        assert!(!KeyPattern::new("user:?").is_exact());
    }
}
