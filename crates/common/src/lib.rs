//! # Common
//!
//! Shared infrastructure for the pillar portal crates: the error taxonomy
//! every component reports through, and the layered configuration loader
//! with the config sections shared between the service and its clients.
//!
//! ## Design Principles
//! - Minimal dependencies to avoid bloat in dependent crates
//! - Library errors via `thiserror`, application errors via `anyhow`
//! - Serde support for everything that crosses a config or network boundary

pub mod config;
pub mod error;

// Re-export commonly used types at the crate root for convenience
pub use config::*;
pub use error::*;
