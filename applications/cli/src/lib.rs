//! Cadence CLI Library
//!
//! Configuration loading and interactive controls for the `cadence` binary.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod controls;

// Re-export commonly used types for convenience
pub use config::{CliConfig, ConfigError};
pub use controls::{Control, Halt, QueueWatcher};
