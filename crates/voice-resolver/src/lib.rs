//! Tool resolution engine for voice agents
//!
//! This crate sits between "the agent invoked a tool" and "a normalized,
//! provider-agnostic result came back". It includes:
//!
//! - Provider clients for Brave, SearXNG, Google Custom Search, YouTube,
//!   Wikipedia, Home Assistant weather entities, Finnhub and CoinGecko
//! - A stampede-safe TTL cache so concurrent identical lookups cost one
//!   upstream call
//! - Normalization of every provider payload into one result schema per tool
//! - Deterministic disambiguation of crypto vs equity symbols and of relative
//!   forecast days against the forecast horizon
//! - Auto-display vs list-display classification of result sets
//! - [`voice_tools::Tool`] implementations exposing all of the above to an agent
//!
//! # Example
//!
//! ```rust,ignore
//! use voice_resolver::{EngineConfig, ToolCall, ToolDispatcher, ToolKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = ToolDispatcher::from_config(EngineConfig::from_env()?)?;
//!
//!     let resolution = dispatcher
//!         .resolve(ToolCall::Search {
//!             kind: ToolKind::ImageSearch,
//!             query: "golden retrievers".to_string(),
//!             num_results: Some(3),
//!             singular: false,
//!         })
//!         .await?;
//!
//!     println!("{:?}: {} items", resolution.display, resolution.result.item_count());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod tools;

// Re-export main types for convenience
pub use cache::{CacheKey, StampedeCache};
pub use config::{ArticleDetail, EngineConfig, EngineConfigBuilder, ProviderConfig, SafeSearch};
pub use engine::{
    CanonicalResult, DisplayMode, ToolCall, ToolDispatcher, ToolKind, ToolResolution,
};
pub use error::{ErrorKind, ResolveError, Result};
pub use tools::build_registry;
