//! Shared utilities for the Nexus bot
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and typed access to environment configuration.

pub mod config;
pub mod logging;

pub use config::{EnvError, EnvReader};
pub use logging::{LogConfig, init_tracing, init_tracing_with};
