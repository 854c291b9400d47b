//! Durable per-ecosystem version cache
//!
//! One JSON file per ecosystem under the cache directory, holding the last
//! normalized version list and its fetch timestamp. Entries older than the
//! TTL, and entries that cannot be read or parsed, count as cache misses.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::version::error::CacheError;
use crate::version::types::VersionSet;

#[derive(Debug)]
pub struct VersionCache {
    dir: PathBuf,
    ttl_ms: i64,
}

/// On-disk record layout. Paired ecosystems persist both component lists.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    #[serde(flatten)]
    versions: StoredVersions,
    timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredVersions {
    Paired {
        primary: Vec<String>,
        secondary: Vec<String>,
    },
    Single {
        versions: Vec<String>,
    },
}

impl From<&VersionSet> for StoredVersions {
    fn from(set: &VersionSet) -> Self {
        match &set.secondary {
            Some(secondary) => StoredVersions::Paired {
                primary: set.primary.clone(),
                secondary: secondary.clone(),
            },
            None => StoredVersions::Single {
                versions: set.primary.clone(),
            },
        }
    }
}

impl From<StoredVersions> for VersionSet {
    fn from(stored: StoredVersions) -> Self {
        match stored {
            StoredVersions::Paired { primary, secondary } => VersionSet::paired(primary, secondary),
            StoredVersions::Single { versions } => VersionSet::single(versions),
        }
    }
}

impl VersionCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_ms: i64) -> Self {
        Self {
            dir: dir.into(),
            ttl_ms,
        }
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Loads the cached version set for an ecosystem if it is still fresh.
    ///
    /// A missing, stale, unreadable or unparsable entry all come back as
    /// `None`; corruption is never fatal.
    pub fn read(&self, id: &str) -> Option<VersionSet> {
        let path = self.entry_path(id);
        let raw = std::fs::read_to_string(&path).ok()?;

        let entry: CacheFile = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("discarding corrupt cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp;
        if age_ms > self.ttl_ms {
            debug!("cache entry for {} is stale ({}ms old)", id, age_ms);
            return None;
        }

        debug!("cache hit for {} ({}ms old)", id, age_ms);
        Some(entry.versions.into())
    }

    /// Overwrites the persisted entry for an ecosystem with the current
    /// timestamp. Callers treat a write failure as non-fatal.
    pub fn write(&self, id: &str, set: &VersionSet) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;

        let entry = CacheFile {
            versions: set.into(),
            timestamp: Utc::now().timestamp_millis(),
        };

        std::fs::write(self.entry_path(id), serde_json::to_string_pretty(&entry)?)?;
        Ok(())
    }
}
