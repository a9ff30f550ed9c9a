//! Route matching logic.
//!
//! # Design Decisions
//! - Path matching is a plain, case-sensitive string prefix test
//! - No regex or host matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` starts with this matcher's prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(matcher.matches("/api/v1"));
        assert!(matcher.matches("/api"));
        // Plain string prefix, not segment-aware.
        assert!(matcher.matches("/apiary"));
        assert!(!matcher.matches("/images"));
        assert!(!matcher.matches("/API/v1"));
    }
}
