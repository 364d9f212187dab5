//! Tool management and execution framework for voice-tools
//!
//! This crate provides the seam between the conversation agent and the tool
//! implementations: the [`Tool`] trait every callable tool implements, a
//! [`ToolRegistry`] to look tools up by name, and the [`Error`] type tools report.

pub mod error;
pub mod registry;
pub mod tool;

pub use error::{Error, Result};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolDefinition};
