//! Topic pattern matching.
//!
//! # Responsibilities
//! - Match concrete topics against mapping topic patterns
//! - Support `+` (exactly one level) and trailing `#` (everything after)
//!
//! # Design Decisions
//! - Exact equality always matches, wildcards or not
//! - `#` is a plain string-prefix test on the text before it; no `/`
//!   boundary is required, so `a#` matches `abc`
//! - `+` patterns compare level by level and need equal level counts
//! - No regex, no allocation beyond the level split

/// A compiled topic pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicFilter {
    /// No wildcard; only equal topics match.
    Exact(String),
    /// Trailing `#`; stores the literal prefix before it.
    Prefix { pattern: String, prefix: String },
    /// Contains `+`; stores the pattern levels.
    Levels { pattern: String, levels: Vec<String> },
}

impl TopicFilter {
    pub fn parse(pattern: &str) -> Self {
        if let Some(prefix) = pattern.strip_suffix('#') {
            TopicFilter::Prefix {
                pattern: pattern.to_string(),
                prefix: prefix.to_string(),
            }
        } else if pattern.contains('+') {
            TopicFilter::Levels {
                pattern: pattern.to_string(),
                levels: pattern.split('/').map(str::to_string).collect(),
            }
        } else {
            TopicFilter::Exact(pattern.to_string())
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            TopicFilter::Exact(pattern) => pattern,
            TopicFilter::Prefix { pattern, .. } => pattern,
            TopicFilter::Levels { pattern, .. } => pattern,
        }
    }

    pub fn matches(&self, topic: &str) -> bool {
        if self.pattern() == topic {
            return true;
        }

        match self {
            TopicFilter::Exact(_) => false,
            TopicFilter::Prefix { prefix, .. } => topic.starts_with(prefix.as_str()),
            TopicFilter::Levels { levels, .. } => {
                let topic_levels: Vec<&str> = topic.split('/').collect();
                topic_levels.len() == levels.len()
                    && levels
                        .iter()
                        .zip(topic_levels)
                        .all(|(p, t)| p == "+" || p == t)
            }
        }
    }
}

/// Returns true if `topic` matches `pattern`.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    TopicFilter::parse(pattern).matches(topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(topic_matches("sensors/gate1", "sensors/gate1"));
        assert!(!topic_matches("sensors/gate1", "sensors/gate2"));
        assert!(!topic_matches("sensors/gate1", "sensors/gate1/extra"));
        assert!(!topic_matches("sensors", "Sensors"));
    }

    #[test]
    fn test_multi_level_wildcard() {
        assert!(topic_matches("a/b/#", "a/b/c"));
        assert!(topic_matches("a/b/#", "a/b/c/d/e"));
        assert!(topic_matches("a/b/#", "a/b/"));
        assert!(topic_matches("a/b/#", "a/b/#"));
        assert!(!topic_matches("a/b/#", "a/bx"));
        assert!(!topic_matches("a/b/#", "a/b"));
        assert!(topic_matches("#", "anything/at/all"));
    }

    #[test]
    fn test_hash_without_level_boundary() {
        assert!(topic_matches("a#", "abc"));
        assert!(topic_matches("sensor#", "sensor12/state"));
    }

    #[test]
    fn test_single_level_wildcard() {
        assert!(topic_matches("a/+/c", "a/x/c"));
        assert!(topic_matches("a/+/c", "a//c"));
        assert!(!topic_matches("a/+/c", "a/x/y/c"));
        assert!(!topic_matches("a/+/c", "a/b/d"));
        assert!(topic_matches("+/+", "x/y"));
        assert!(!topic_matches("+/+", "x"));
    }

    #[test]
    fn test_plus_inside_level_is_literal() {
        assert!(!topic_matches("a/b+/c", "a/bx/c"));
        assert!(topic_matches("a/b+/c", "a/b+/c"));
    }

    #[test]
    fn test_parse_variants() {
        assert!(matches!(TopicFilter::parse("a/b"), TopicFilter::Exact(_)));
        assert!(matches!(TopicFilter::parse("a/+/#"), TopicFilter::Prefix { .. }));
        assert!(matches!(TopicFilter::parse("a/+"), TopicFilter::Levels { .. }));
        assert_eq!(TopicFilter::parse("a/+").pattern(), "a/+");
    }
}
