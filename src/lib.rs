//! Keeps pinned toolchain versions in build definition files up to date.
//!
//! For each supported ecosystem the crate discovers the latest stable
//! upstream releases, registers one fixer per discovered version, and on
//! invocation rewrites the ecosystem's version marker in every configured
//! target file with a backup and post-write verification.

pub mod config;
pub mod ecosystem;
pub mod fixer;
pub mod patch;
pub mod version;
