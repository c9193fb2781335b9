//! VidSplice Common Utilities
//!
//! Shared infrastructure for all VidSplice crates:
//! - Error types and result aliases
//! - Simulated export clock
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
