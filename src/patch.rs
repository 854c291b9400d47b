//! Format-preserving file patch engine
//!
//! Rewrites the value of a `KEY[=][ ]["]VALUE["]` marker in a text file,
//! touching nothing but the value token of the first matching occurrence.
//! A timestamped backup of the untouched content is written before the
//! rewrite and the result is re-read to confirm the file actually changed.
//!
//! Nothing in this module returns an error: every failure mode folds into
//! the [`PatchResult`] so one bad file can never abort a multi-file run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use regex::Regex;
use tokio::fs;
use tracing::debug;

/// What happened to one target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The marker value was rewritten and the write verified
    Updated,
    /// The file already carries the requested value
    AlreadyCurrent,
    /// The target file does not exist
    FileMissing,
    /// No occurrence of the marker key was found
    MarkerNotFound,
    /// An I/O or verification failure, with the underlying cause
    Failed(String),
}

/// Per-file outcome of one patch attempt
#[derive(Debug, Clone)]
pub struct PatchResult {
    pub path: PathBuf,
    /// Value the marker carried before the patch, when one was found
    pub previous: Option<String>,
    pub new_value: String,
    pub outcome: PatchOutcome,
    /// Backup written before a rewrite; never removed on success
    pub backup: Option<PathBuf>,
}

impl PatchResult {
    pub fn changed(&self) -> bool {
        matches!(self.outcome, PatchOutcome::Updated)
    }

    fn skipped(path: &Path, new_value: &str, outcome: PatchOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            previous: None,
            new_value: new_value.to_string(),
            outcome,
            backup: None,
        }
    }
}

/// Pattern matching the four marker styles:
/// `KEY="value"`, `KEY=value`, `KEY= value` and `KEY value`.
/// Only the value token is captured, so a substitution preserves the
/// surrounding punctuation by construction.
fn marker_pattern(key: &str) -> Regex {
    let pattern = format!(
        r#"(?m)\b{}(?:[ \t]*=[ \t]*|[ \t]+)"?(?P<value>[^"\s]+)"#,
        regex::escape(key)
    );
    Regex::new(&pattern).expect("marker pattern is valid")
}

/// Reads the marker's current value without touching the file
pub async fn current_value(path: &Path, key: &str) -> Option<String> {
    let content = fs::read_to_string(path).await.ok()?;
    marker_pattern(key)
        .captures(&content)
        .and_then(|captures| captures.name("value"))
        .map(|value| value.as_str().to_string())
}

fn backup_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!(
        "{}.backup.{}",
        path.display(),
        Utc::now().timestamp_millis()
    ))
}

/// Writes the full new content to a sibling temp file, then renames it over
/// the original, so the target never holds a partially written state.
async fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await
}

/// Rewrites the first occurrence of `key`'s value to `new_value`.
///
/// Fails closed with no side effect when the file is missing, the marker is
/// not found, or the value is already current. On a rewrite, the pre-patch
/// content is kept as `<path>.backup.<unix millis>`.
pub async fn apply(path: &Path, key: &str, new_value: &str) -> PatchResult {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{}: missing, skipping {}", path.display(), key);
            return PatchResult::skipped(path, new_value, PatchOutcome::FileMissing);
        }
        Err(e) => {
            return PatchResult::skipped(path, new_value, PatchOutcome::Failed(e.to_string()));
        }
    };

    let Some(value) = marker_pattern(key)
        .captures(&content)
        .and_then(|captures| captures.name("value"))
    else {
        debug!("{}: no {} marker found", path.display(), key);
        return PatchResult::skipped(path, new_value, PatchOutcome::MarkerNotFound);
    };

    let previous = value.as_str().to_string();
    if previous == new_value {
        return PatchResult {
            path: path.to_path_buf(),
            previous: Some(previous),
            new_value: new_value.to_string(),
            outcome: PatchOutcome::AlreadyCurrent,
            backup: None,
        };
    }

    let mut updated = String::with_capacity(content.len() + new_value.len());
    updated.push_str(&content[..value.start()]);
    updated.push_str(new_value);
    updated.push_str(&content[value.end()..]);

    let backup = backup_path_for(path);
    if let Err(e) = fs::write(&backup, &content).await {
        return PatchResult {
            path: path.to_path_buf(),
            previous: Some(previous),
            new_value: new_value.to_string(),
            outcome: PatchOutcome::Failed(format!("backup failed: {e}")),
            backup: None,
        };
    }

    if let Err(e) = write_atomic(path, &updated).await {
        // The backup stays behind for manual recovery
        return PatchResult {
            path: path.to_path_buf(),
            previous: Some(previous),
            new_value: new_value.to_string(),
            outcome: PatchOutcome::Failed(format!("write failed: {e}")),
            backup: Some(backup),
        };
    }

    // Confirm the write actually changed the file; a pattern that matched
    // but substituted nothing must not leave a dangling backup
    match fs::read_to_string(path).await {
        Ok(after) if after != content => PatchResult {
            path: path.to_path_buf(),
            previous: Some(previous),
            new_value: new_value.to_string(),
            outcome: PatchOutcome::Updated,
            backup: Some(backup),
        },
        Ok(_) => {
            let _ = fs::remove_file(&backup).await;
            PatchResult {
                path: path.to_path_buf(),
                previous: Some(previous),
                new_value: new_value.to_string(),
                outcome: PatchOutcome::Failed("substitution produced no change".to_string()),
                backup: None,
            }
        }
        Err(e) => PatchResult {
            path: path.to_path_buf(),
            previous: Some(previous),
            new_value: new_value.to_string(),
            outcome: PatchOutcome::Failed(format!("verification read failed: {e}")),
            backup: Some(backup),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn backups_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.to_string_lossy().contains(".backup."))
            .collect()
    }

    #[rstest]
    #[case(r#"RUST_VERSION="1.74.0""#, r#"RUST_VERSION="1.76.0""#)]
    #[case("RUST_VERSION=1.74.0", "RUST_VERSION=1.76.0")]
    #[case("RUST_VERSION= 1.74.0", "RUST_VERSION= 1.76.0")]
    #[case("RUST_VERSION 1.74.0", "RUST_VERSION 1.76.0")]
    #[tokio::test]
    async fn patch_preserves_each_marker_style(#[case] line: &str, #[case] expected: &str) {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        let content = format!("FROM scratch\nARG {line}\nCMD [\"sh\"]\n");
        std::fs::write(&target, &content).unwrap();

        let result = apply(&target, "RUST_VERSION", "1.76.0").await;

        assert!(result.changed(), "unexpected outcome: {:?}", result.outcome);
        assert_eq!(result.previous.as_deref(), Some("1.74.0"));
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            format!("FROM scratch\nARG {expected}\nCMD [\"sh\"]\n")
        );
    }

    #[tokio::test]
    async fn patch_is_idempotent_and_leaves_no_backup_when_current() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        std::fs::write(&target, "JAVA_VERSION=21\n").unwrap();

        let result = apply(&target, "JAVA_VERSION", "21").await;

        assert_eq!(result.outcome, PatchOutcome::AlreadyCurrent);
        assert_eq!(result.previous.as_deref(), Some("21"));
        assert!(result.backup.is_none());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "JAVA_VERSION=21\n");
        assert!(backups_in(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn patch_fails_closed_when_the_file_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");

        let result = apply(&target, "RUST_VERSION", "1.76.0").await;

        assert_eq!(result.outcome, PatchOutcome::FileMissing);
        assert!(!result.changed());
        assert!(backups_in(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn patch_fails_closed_when_the_marker_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        std::fs::write(&target, "FROM scratch\n").unwrap();

        let result = apply(&target, "RUST_VERSION", "1.76.0").await;

        assert_eq!(result.outcome, PatchOutcome::MarkerNotFound);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "FROM scratch\n");
        assert!(backups_in(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn successful_patch_keeps_a_backup_with_the_pre_patch_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        let original = "FROM scratch\nARG RUST_VERSION=\"1.74.0\"\n";
        std::fs::write(&target, original).unwrap();

        let result = apply(&target, "RUST_VERSION", "1.76.0").await;

        let backup = result.backup.expect("a backup path");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(backups_in(temp_dir.path()), vec![backup]);
    }

    #[tokio::test]
    async fn patch_only_touches_the_first_occurrence() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        std::fs::write(
            &target,
            "NODE_VERSION=20.0.0\n# mirror of NODE_VERSION=20.0.0\n",
        )
        .unwrap();

        let result = apply(&target, "NODE_VERSION", "22.15.0").await;

        assert!(result.changed());
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "NODE_VERSION=22.15.0\n# mirror of NODE_VERSION=20.0.0\n"
        );
    }

    #[tokio::test]
    async fn patch_does_not_match_a_key_embedded_in_a_longer_word() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        std::fs::write(&target, "XNODE_VERSION=20.0.0\n").unwrap();

        let result = apply(&target, "NODE_VERSION", "22.15.0").await;

        assert_eq!(result.outcome, PatchOutcome::MarkerNotFound);
    }

    #[tokio::test]
    async fn current_value_probes_without_modifying() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        let content = "ARG PHP_VERSION=\"8.3.1\"\n";
        std::fs::write(&target, content).unwrap();

        assert_eq!(
            current_value(&target, "PHP_VERSION").await.as_deref(),
            Some("8.3.1")
        );
        assert_eq!(current_value(&target, "RUBY_VERSION").await, None);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), content);
    }

    #[tokio::test]
    async fn patch_leaves_unrelated_lines_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("Dockerfile");
        let original = "# builder image\t \nFROM debian:bookworm\nENV GCC_VERSION 13.2.0\nRUN apt-get update\n";
        std::fs::write(&target, original).unwrap();

        apply(&target, "GCC_VERSION", "15.1.0").await;

        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "# builder image\t \nFROM debian:bookworm\nENV GCC_VERSION 15.1.0\nRUN apt-get update\n"
        );
    }
}
