//! A crate to ensure consistent usage of tracing levels and output
//! across the workspace.
//!
//! Downstream crates should depend on this crate rather than on
//! `tracing` directly so that the whole workspace tracks one
//! `tracing` version and one set of default features.

/// Reexports the `tracing` crate and macros for consistent usage.
pub use tracing;
