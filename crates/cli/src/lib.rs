//! Scenario driver for bounded-load consistent hashing.
//!
//! Provides commands for:
//! - Checking that placement is stable under replay
//! - Measuring churn caused by load changes
//! - Measuring churn caused by adding a node at a capacity threshold

pub mod commands;
pub mod config;
pub mod trials;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
