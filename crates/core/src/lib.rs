//! Client-side data-integrity and resilience layer for the strategic
//! indicator management dashboard.
//!
//! Everything here is synchronous, pure computation over in-memory state.
//! The HTTP client, the UI, and persistence live elsewhere and call into
//! these modules.

pub mod audit;
pub mod canonical;
pub mod config;
pub mod dashboard;
pub mod diff;
pub mod error;
pub mod fallback;
pub mod hashing;
pub mod idempotency;
pub mod indicator;
pub mod types;
pub mod validation;
