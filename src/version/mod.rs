//! Version discovery layer
//!
//! This module turns a noisy upstream release/tag feed into a small ordered
//! list of stable version candidates, with a durable cache in front of the
//! network and a hard-coded fallback behind it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Normalize  │────▶│  Candidates │
//! │  (fetch)    │     │ (filter/sort)│    │ (non-empty) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   │
//!        │                   ▼
//!  ┌─────────────┐     ┌─────────────┐
//!  │   upstream  │     │    Cache    │
//!  │  feed (HTTP)│     │ (TTL file)  │
//!  └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`source`]: feed adapter trait and the GitHub implementation
//! - [`cache`]: per-ecosystem TTL-bound version cache files
//! - [`normalize`]: the tag-to-candidate pipeline and fallback resolution
//! - [`error`]: error types for source and cache operations
//! - [`types`]: common types like [`types::VersionSet`]

pub mod cache;
pub mod error;
pub mod normalize;
pub mod source;
pub mod types;
