//! Common types for the version discovery layer

/// One raw record from an upstream feed, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Raw tag name as published upstream
    pub tag: String,
    /// Upstream marked this record as a prerelease
    pub prerelease: bool,
    /// Upstream marked this record as a draft
    pub draft: bool,
}

impl ReleaseRecord {
    /// A plain stable record; tag feeds carry no prerelease/draft flags
    pub fn stable(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            prerelease: false,
            draft: false,
        }
    }
}

/// The normalized version candidates for one ecosystem, newest first.
///
/// The primary list is never empty: resolution falls back to the
/// ecosystem's last-known-good version when the feed cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet {
    pub primary: Vec<String>,
    /// Present only for ecosystems pinning a companion component
    pub secondary: Option<Vec<String>>,
}

impl VersionSet {
    pub fn single(primary: Vec<String>) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn paired(primary: Vec<String>, secondary: Vec<String>) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// The newest primary candidate
    pub fn latest(&self) -> Option<&str> {
        self.primary.first().map(String::as_str)
    }

    /// The newest companion candidate, if the ecosystem has one
    pub fn latest_secondary(&self) -> Option<&str> {
        self.secondary
            .as_ref()
            .and_then(|versions| versions.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_returns_first_candidate() {
        let set = VersionSet::single(vec!["1.76.0".to_string(), "1.75.0".to_string()]);
        assert_eq!(set.latest(), Some("1.76.0"));
        assert_eq!(set.latest_secondary(), None);
    }

    #[test]
    fn paired_set_exposes_both_components() {
        let set = VersionSet::paired(
            vec!["1.18.3".to_string()],
            vec!["27.3.3".to_string(), "26.2.5".to_string()],
        );
        assert_eq!(set.latest(), Some("1.18.3"));
        assert_eq!(set.latest_secondary(), Some("27.3.3"));
    }
}
