//! Ecosystem descriptors: which upstream feed to read, how to turn its tags
//! into version candidates, and which files carry the pinned version marker.

use std::path::PathBuf;

/// One supported language toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Php,
    DotNet,
    Java,
    Gcc,
    Elixir,
    Python,
    Rust,
    Node,
    Ruby,
}

/// All ecosystems with a builtin configuration
pub const ALL: [Ecosystem; 9] = [
    Ecosystem::Php,
    Ecosystem::DotNet,
    Ecosystem::Java,
    Ecosystem::Gcc,
    Ecosystem::Elixir,
    Ecosystem::Python,
    Ecosystem::Rust,
    Ecosystem::Node,
    Ecosystem::Ruby,
];

impl Ecosystem {
    /// Returns the string representation of the ecosystem
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Php => "php",
            Ecosystem::DotNet => "dotnet",
            Ecosystem::Java => "java",
            Ecosystem::Gcc => "gcc",
            Ecosystem::Elixir => "elixir",
            Ecosystem::Python => "python",
            Ecosystem::Rust => "rust",
            Ecosystem::Node => "node",
            Ecosystem::Ruby => "ruby",
        }
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "php" => Ok(Ecosystem::Php),
            "dotnet" => Ok(Ecosystem::DotNet),
            "java" => Ok(Ecosystem::Java),
            "gcc" => Ok(Ecosystem::Gcc),
            "elixir" => Ok(Ecosystem::Elixir),
            "python" => Ok(Ecosystem::Python),
            "rust" => Ok(Ecosystem::Rust),
            "node" => Ok(Ecosystem::Node),
            "ruby" => Ok(Ecosystem::Ruby),
            _ => Err(()),
        }
    }
}

/// Shape of the upstream feed an ecosystem publishes its versions through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// GitHub releases API: records carry `tag_name`, `prerelease` and `draft`
    Releases,
    /// GitHub tags API: records carry `name` only
    Tags,
}

/// How a raw tag name is accepted and turned into a version candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRule {
    /// Tag must start with the prefix; the remainder is the candidate
    /// (`php-8.3.1` -> `8.3.1`, `releases/gcc-13.2.0` -> `13.2.0`)
    Prefix(&'static str),
    /// Like [`TagRule::Prefix`], but underscore separators become dots
    /// (`v3_4_1` -> `3.4.1`)
    UnderscorePrefix(&'static str),
    /// Tag must begin with a digit and is taken verbatim (`1.76.0`)
    Bare,
}

impl TagRule {
    /// Extracts a version candidate from a tag name, or rejects the tag
    pub fn extract(&self, tag: &str) -> Option<String> {
        match self {
            TagRule::Prefix(prefix) => tag.strip_prefix(prefix).map(str::to_string),
            TagRule::UnderscorePrefix(prefix) => {
                tag.strip_prefix(prefix).map(|rest| rest.replace('_', "."))
            }
            TagRule::Bare => {
                let starts_numeric = tag.chars().next().is_some_and(|c| c.is_ascii_digit());
                starts_numeric.then(|| tag.to_string())
            }
        }
    }
}

/// One independently versioned component of an ecosystem
#[derive(Debug, Clone)]
pub struct ComponentConfig {
    /// Upstream feed URL for this component
    pub source_url: String,
    /// Shape of the feed at `source_url`
    pub feed: FeedKind,
    /// Tag acceptance and stripping rule
    pub rule: TagRule,
    /// Marker key rewritten in target files (e.g. `RUST_VERSION`)
    pub marker_key: String,
    /// Last-known-good version used when the feed cannot be read
    pub fallback: String,
    /// How many candidates to keep after sorting
    pub retain: usize,
}

/// Immutable descriptor for one ecosystem, created once at startup
#[derive(Debug, Clone)]
pub struct EcosystemConfig {
    pub id: Ecosystem,
    pub primary: ComponentConfig,
    /// A companion component pinned alongside the primary one
    /// (Elixir images also pin the OTP release they run on)
    pub secondary: Option<ComponentConfig>,
    /// Files carrying the marker, relative to the run root
    pub targets: Vec<PathBuf>,
}

fn github_tags(repo: &str) -> String {
    format!("https://api.github.com/repos/{repo}/tags?per_page=100")
}

fn github_releases(repo: &str) -> String {
    format!("https://api.github.com/repos/{repo}/releases?per_page=100")
}

/// The builtin ecosystem table
pub fn builtin() -> Vec<EcosystemConfig> {
    vec![
        EcosystemConfig {
            id: Ecosystem::Php,
            primary: ComponentConfig {
                source_url: github_tags("php/php-src"),
                feed: FeedKind::Tags,
                rule: TagRule::Prefix("php-"),
                marker_key: "PHP_VERSION".to_string(),
                fallback: "8.4.6".to_string(),
                retain: 15,
            },
            secondary: None,
            targets: vec![PathBuf::from("php/Dockerfile")],
        },
        EcosystemConfig {
            id: Ecosystem::DotNet,
            primary: ComponentConfig {
                source_url: github_releases("dotnet/sdk"),
                feed: FeedKind::Releases,
                rule: TagRule::Prefix("v"),
                marker_key: "DOTNET_VERSION".to_string(),
                fallback: "9.0.203".to_string(),
                retain: 10,
            },
            secondary: None,
            targets: vec![PathBuf::from("dotnet/Dockerfile")],
        },
        EcosystemConfig {
            id: Ecosystem::Java,
            primary: ComponentConfig {
                source_url: github_tags("openjdk/jdk"),
                feed: FeedKind::Tags,
                rule: TagRule::Prefix("jdk-"),
                marker_key: "JAVA_VERSION".to_string(),
                fallback: "24.0.1".to_string(),
                retain: 10,
            },
            secondary: None,
            targets: vec![PathBuf::from("java/Dockerfile")],
        },
        EcosystemConfig {
            id: Ecosystem::Gcc,
            primary: ComponentConfig {
                source_url: github_tags("gcc-mirror/gcc"),
                feed: FeedKind::Tags,
                rule: TagRule::Prefix("releases/gcc-"),
                marker_key: "GCC_VERSION".to_string(),
                fallback: "15.1.0".to_string(),
                retain: 10,
            },
            secondary: None,
            targets: vec![PathBuf::from("cpp/Dockerfile")],
        },
        EcosystemConfig {
            id: Ecosystem::Elixir,
            primary: ComponentConfig {
                source_url: github_releases("elixir-lang/elixir"),
                feed: FeedKind::Releases,
                rule: TagRule::Prefix("v"),
                marker_key: "ELIXIR_VERSION".to_string(),
                fallback: "1.18.3".to_string(),
                retain: 10,
            },
            secondary: Some(ComponentConfig {
                source_url: github_tags("erlang/otp"),
                feed: FeedKind::Tags,
                rule: TagRule::Prefix("OTP-"),
                marker_key: "OTP_VERSION".to_string(),
                fallback: "27.3.3".to_string(),
                retain: 10,
            }),
            targets: vec![PathBuf::from("elixir/Dockerfile")],
        },
        EcosystemConfig {
            id: Ecosystem::Python,
            primary: ComponentConfig {
                source_url: github_tags("python/cpython"),
                feed: FeedKind::Tags,
                rule: TagRule::Prefix("v"),
                marker_key: "PYTHON_VERSION".to_string(),
                fallback: "3.13.3".to_string(),
                retain: 20,
            },
            secondary: None,
            targets: vec![PathBuf::from("python/Dockerfile")],
        },
        EcosystemConfig {
            id: Ecosystem::Rust,
            primary: ComponentConfig {
                source_url: github_releases("rust-lang/rust"),
                feed: FeedKind::Releases,
                rule: TagRule::Bare,
                marker_key: "RUST_VERSION".to_string(),
                fallback: "1.87.0".to_string(),
                retain: 15,
            },
            secondary: None,
            targets: vec![
                PathBuf::from("rust/Dockerfile"),
                PathBuf::from("rust/Dockerfile.slim"),
            ],
        },
        EcosystemConfig {
            id: Ecosystem::Node,
            primary: ComponentConfig {
                source_url: github_releases("nodejs/node"),
                feed: FeedKind::Releases,
                rule: TagRule::Prefix("v"),
                marker_key: "NODE_VERSION".to_string(),
                fallback: "22.15.0".to_string(),
                retain: 20,
            },
            secondary: None,
            targets: vec![
                PathBuf::from("node/Dockerfile"),
                PathBuf::from("node/Dockerfile.alpine"),
            ],
        },
        EcosystemConfig {
            id: Ecosystem::Ruby,
            primary: ComponentConfig {
                source_url: github_tags("ruby/ruby"),
                feed: FeedKind::Tags,
                rule: TagRule::UnderscorePrefix("v"),
                marker_key: "RUBY_VERSION".to_string(),
                fallback: "3.4.3".to_string(),
                retain: 15,
            },
            secondary: None,
            targets: vec![PathBuf::from("ruby/Dockerfile")],
        },
    ]
}

/// Looks up the builtin configuration for an ecosystem
pub fn find(id: Ecosystem) -> Option<EcosystemConfig> {
    builtin().into_iter().find(|config| config.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TagRule::Prefix("php-"), "php-8.3.1", Some("8.3.1"))]
    #[case(TagRule::Prefix("php-"), "v8.3.1", None)]
    #[case(TagRule::Prefix("releases/gcc-"), "releases/gcc-13.2.0", Some("13.2.0"))]
    #[case(TagRule::Prefix("releases/gcc-"), "basepoints/gcc-14", None)]
    #[case(TagRule::Prefix("OTP-"), "OTP-26.2.5", Some("26.2.5"))]
    #[case(TagRule::Prefix("jdk-"), "jdk-21.0.2", Some("21.0.2"))]
    #[case(TagRule::UnderscorePrefix("v"), "v3_4_1", Some("3.4.1"))]
    #[case(TagRule::UnderscorePrefix("v"), "v2_6_0_preview1", Some("2.6.0.preview1"))]
    #[case(TagRule::UnderscorePrefix("v"), "snapshot", None)]
    #[case(TagRule::Bare, "1.76.0", Some("1.76.0"))]
    #[case(TagRule::Bare, "release-1.76.0", None)]
    fn extract_applies_tag_rule(
        #[case] rule: TagRule,
        #[case] tag: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(rule.extract(tag), expected.map(str::to_string));
    }

    #[test]
    fn ecosystem_round_trips_through_string_form() {
        for ecosystem in ALL {
            assert_eq!(ecosystem.as_str().parse::<Ecosystem>(), Ok(ecosystem));
        }
    }

    #[test]
    fn builtin_table_covers_all_ecosystems() {
        let configs = builtin();
        assert_eq!(configs.len(), ALL.len());
        for ecosystem in ALL {
            assert!(configs.iter().any(|c| c.id == ecosystem));
        }
    }

    #[test]
    fn every_builtin_config_has_targets_and_a_valid_fallback() {
        for config in builtin() {
            assert!(!config.targets.is_empty(), "{} has no targets", config.id.as_str());
            assert!(
                crate::version::normalize::is_strict_version(&config.primary.fallback),
                "{} fallback {} is malformed",
                config.id.as_str(),
                config.primary.fallback
            );
            if let Some(secondary) = &config.secondary {
                assert!(crate::version::normalize::is_strict_version(&secondary.fallback));
            }
        }
    }

    #[test]
    fn elixir_pins_a_companion_otp_release() {
        let config = find(Ecosystem::Elixir).unwrap();
        let secondary = config.secondary.expect("elixir pairs an OTP component");
        assert_eq!(secondary.marker_key, "OTP_VERSION");
    }
}
