use std::path::PathBuf;

// =============================================================================
// Time-related constants
// =============================================================================

/// How long a cached version list stays fresh (24 hours, in milliseconds)
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Timeout applied to every upstream feed request
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every upstream request
pub const USER_AGENT: &str = concat!("toolfix/", env!("CARGO_PKG_VERSION"));

/// Returns the directory where per-ecosystem version caches are stored.
/// Uses $XDG_CACHE_HOME/toolfix if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/toolfix,
/// or ./toolfix if neither is available.
pub fn cache_dir() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));

    cache_dir.join("toolfix")
}
