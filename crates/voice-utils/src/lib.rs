//! Shared utilities for voice-tools
//!
//! This crate provides common functionality used across the voice-tools workspace:
//! logging setup and small helpers for reading configuration from the environment.

pub mod env;
pub mod logging;

pub use env::{env_list, env_parse, env_var};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
