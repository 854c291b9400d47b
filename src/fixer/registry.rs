//! Building executable fixers from discovered version candidates

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::ecosystem::EcosystemConfig;
use crate::patch::{self, PatchOutcome, PatchResult};
use crate::version::types::VersionSet;

/// One marker rewrite: which key becomes which value
#[derive(Debug, Clone)]
struct Marker {
    key: String,
    version: String,
}

/// A registered fixer. Ephemeral: built fresh per run from the current
/// candidate list and never persisted.
#[derive(Debug, Clone)]
pub struct Fixer {
    pub name: String,
    pub description: String,
    targets: Vec<PathBuf>,
    primary: Marker,
    secondary: Option<Marker>,
}

impl Fixer {
    /// Patches every target file concurrently and reports each file's
    /// outcome. One file's failure never prevents attempting the others.
    pub async fn execute_detailed(&self) -> Vec<PatchResult> {
        let patches = self.targets.iter().map(|target| self.patch_file(target));
        join_all(patches).await.into_iter().flatten().collect()
    }

    /// Registration surface consumed by an external fixer runner:
    /// true if any target file changed
    pub async fn execute(&self) -> bool {
        self.execute_detailed().await.iter().any(PatchResult::changed)
    }

    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    pub fn marker_key(&self) -> &str {
        &self.primary.key
    }

    pub fn version(&self) -> &str {
        &self.primary.version
    }

    async fn patch_file(&self, target: &Path) -> Vec<PatchResult> {
        let mut results = vec![patch::apply(target, &self.primary.key, &self.primary.version).await];
        if let Some(secondary) = &self.secondary {
            // Second marker in the same file: sequential within the file,
            // still concurrent across files
            results.push(patch::apply(target, &secondary.key, &secondary.version).await);
        }
        for result in &results {
            log_result(result);
        }
        results
    }
}

fn log_result(result: &PatchResult) {
    let path = result.path.display();
    match &result.outcome {
        PatchOutcome::Updated => info!(
            "{}: {} -> {}, backup at {}",
            path,
            result.previous.as_deref().unwrap_or("?"),
            result.new_value,
            result
                .backup
                .as_ref()
                .map(|backup| backup.display().to_string())
                .unwrap_or_default(),
        ),
        PatchOutcome::AlreadyCurrent => info!("{}: already at {}", path, result.new_value),
        PatchOutcome::FileMissing => warn!("{}: target file missing", path),
        PatchOutcome::MarkerNotFound => warn!("{}: marker not found", path),
        PatchOutcome::Failed(cause) => error!("{}: patch failed: {}", path, cause),
    }
}

/// Builds one fixer per primary candidate, newest first.
///
/// When the ecosystem pins a companion component, every fixer pairs its
/// primary version with the single latest companion version.
pub fn build_fixers(config: &EcosystemConfig, root: &Path, versions: &VersionSet) -> Vec<Fixer> {
    let secondary = config.secondary.as_ref().and_then(|component| {
        versions.latest_secondary().map(|version| Marker {
            key: component.marker_key.clone(),
            version: version.to_string(),
        })
    });
    let targets: Vec<PathBuf> = config.targets.iter().map(|target| root.join(target)).collect();

    versions
        .primary
        .iter()
        .map(|version| {
            let description = match &secondary {
                Some(marker) => format!(
                    "Update {} to {} and {} to {}",
                    config.primary.marker_key, version, marker.key, marker.version
                ),
                None => format!("Update {} to {}", config.primary.marker_key, version),
            };
            Fixer {
                name: format!("{}-{}", config.id.as_str(), version),
                description,
                targets: targets.clone(),
                primary: Marker {
                    key: config.primary.marker_key.clone(),
                    version: version.clone(),
                },
                secondary: secondary.clone(),
            }
        })
        .collect()
}
