//! Fixer registration and top-level orchestration
//!
//! A fixer is one named, described, independently executable unit of work:
//! "pin every target file of this ecosystem to version X". One fixer is
//! registered per discovered version candidate; the runner picks the newest
//! and drives it.

pub mod registry;
pub mod runner;
