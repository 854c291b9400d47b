//! Top-level orchestration of one ecosystem run

use std::path::Path;

use anyhow::{Context, bail};
use tracing::{debug, error, info};

use crate::ecosystem::{Ecosystem, EcosystemConfig};
use crate::fixer::registry::build_fixers;
use crate::patch::{self, PatchOutcome, PatchResult};
use crate::version::cache::VersionCache;
use crate::version::normalize::{is_strict_version, resolve};
use crate::version::source::ReleaseSource;

/// Aggregate result of one ecosystem run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one target file was rewritten
    Updated,
    /// Every reachable target already carries the requested version
    UpToDate,
    /// No target could be updated because of errors
    Failed,
}

#[derive(Debug)]
pub struct RunSummary {
    pub ecosystem: Ecosystem,
    pub version: String,
    pub outcome: RunOutcome,
}

/// Resolves the candidates for one ecosystem and drives its newest fixer.
///
/// Per-file patch failures are logged and folded into the summary; the only
/// fatal path is a candidate that fails the defensive format re-check, so a
/// malformed version can never reach the target files.
pub async fn run_ecosystem(
    config: &EcosystemConfig,
    root: &Path,
    source: &dyn ReleaseSource,
    cache: &VersionCache,
) -> anyhow::Result<RunSummary> {
    let versions = resolve(config, source, cache).await;
    let fixers = build_fixers(config, root, &versions);
    let fixer = fixers
        .first()
        .with_context(|| format!("no version candidates for {}", config.id.as_str()))?;

    let target_version = fixer.version().to_string();
    // The normalizer only emits validated candidates; re-check anyway before
    // letting anything near the target files
    if !is_strict_version(&target_version) {
        bail!(
            "refusing to patch {} with malformed version {:?}",
            config.id.as_str(),
            target_version
        );
    }

    for target in fixer.targets() {
        match patch::current_value(target, fixer.marker_key()).await {
            Some(current) => info!(
                "{}: {} {} -> {}",
                target.display(),
                fixer.marker_key(),
                current,
                target_version
            ),
            None => debug!(
                "{}: no current {} value",
                target.display(),
                fixer.marker_key()
            ),
        }
    }

    let results = fixer.execute_detailed().await;
    let outcome = summarize(&results);
    match outcome {
        RunOutcome::Updated => info!("{}: updated to {}", config.id.as_str(), target_version),
        RunOutcome::UpToDate => info!("{}: no updates needed", config.id.as_str()),
        RunOutcome::Failed => error!("{}: no target could be updated", config.id.as_str()),
    }

    Ok(RunSummary {
        ecosystem: config.id,
        version: target_version,
        outcome,
    })
}

/// A run failed only when errors prevented every update; targets that were
/// already current make the whole run a no-op instead.
fn summarize(results: &[PatchResult]) -> RunOutcome {
    if results.iter().any(PatchResult::changed) {
        RunOutcome::Updated
    } else if results.is_empty()
        || results
            .iter()
            .any(|result| result.outcome == PatchOutcome::AlreadyCurrent)
    {
        RunOutcome::UpToDate
    } else {
        RunOutcome::Failed
    }
}
