//! Tag-to-candidate pipeline and version resolution
//!
//! Raw feed records go through a fixed pipeline: prerelease/draft filtering,
//! the ecosystem tag rule, a strict numeric format gate, component-wise
//! descending sort, and truncation. Resolution wraps the pipeline with the
//! cache in front and the hard-coded fallback behind, so the result always
//! carries at least one candidate.

use std::sync::OnceLock;

use regex::Regex;
use semver::Version;
use tracing::warn;

use crate::ecosystem::{ComponentConfig, EcosystemConfig, TagRule};
use crate::version::cache::VersionCache;
use crate::version::source::ReleaseSource;
use crate::version::types::{ReleaseRecord, VersionSet};

/// Strict `major.minor[.patch]` format gate applied to every candidate
pub fn is_strict_version(candidate: &str) -> bool {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT
        .get_or_init(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("version pattern is valid"))
        .is_match(candidate)
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros, so
/// comparison is component-wise numeric rather than lexicographic.
fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Runs the normalization pipeline over raw feed records.
///
/// Records flagged prerelease or draft, tags rejected by the rule, and
/// candidates failing the strict format gate are dropped silently. The
/// survivors come back newest first, truncated to `retain`.
pub fn normalize(records: &[ReleaseRecord], rule: &TagRule, retain: usize) -> Vec<String> {
    let mut candidates: Vec<(Version, String)> = records
        .iter()
        .filter(|record| !record.prerelease && !record.draft)
        .filter_map(|record| rule.extract(&record.tag))
        .filter(|candidate| is_strict_version(candidate))
        .filter_map(|candidate| parse_version(&candidate).map(|parsed| (parsed, candidate)))
        .collect();

    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates.dedup_by(|a, b| a.0 == b.0);
    candidates.truncate(retain);

    candidates
        .into_iter()
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Fetches and normalizes one component's version list.
///
/// Returns the list plus whether it came from a successful fetch; any
/// failure or an empty pipeline result degrades to the component fallback.
async fn fetch_component(
    component: &ComponentConfig,
    source: &dyn ReleaseSource,
) -> (Vec<String>, bool) {
    match source.fetch(&component.source_url, component.feed).await {
        Ok(records) => {
            let versions = normalize(&records, &component.rule, component.retain);
            if versions.is_empty() {
                warn!(
                    "feed {} produced no usable versions, falling back to {}",
                    component.source_url, component.fallback
                );
                (vec![component.fallback.clone()], false)
            } else {
                (versions, true)
            }
        }
        Err(e) => {
            warn!(
                "failed to fetch {}: {}, falling back to {}",
                component.source_url, e, component.fallback
            );
            (vec![component.fallback.clone()], false)
        }
    }
}

/// Resolves the version candidates for an ecosystem.
///
/// A fresh cache entry wins outright. Otherwise each component is fetched
/// and normalized (both components concurrently for paired ecosystems), and
/// the entry is persisted only when every component fetch succeeded, so a
/// fallback value never masquerades as upstream data. The primary list of
/// the returned set is never empty.
pub async fn resolve(
    config: &EcosystemConfig,
    source: &dyn ReleaseSource,
    cache: &VersionCache,
) -> VersionSet {
    let id = config.id.as_str();

    if let Some(set) = cache.read(id) {
        return set;
    }

    let (set, fetched) = match &config.secondary {
        None => {
            let (versions, fetched) = fetch_component(&config.primary, source).await;
            (VersionSet::single(versions), fetched)
        }
        Some(secondary) => {
            let ((primary, primary_ok), (companion, companion_ok)) = tokio::join!(
                fetch_component(&config.primary, source),
                fetch_component(secondary, source)
            );
            (
                VersionSet::paired(primary, companion),
                primary_ok && companion_ok,
            )
        }
    };

    if fetched {
        if let Err(e) = cache.write(id, &set) {
            warn!("failed to persist version cache for {}: {}", id, e);
        }
    }

    set
}
