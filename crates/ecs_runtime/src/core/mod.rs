//! # Core Runtime Module
//!
//! Shared runtime records that the façade and the host binary agree on.
//!
//! ## Organization
//!
//! - **Config**: engine behavior and start-up parameters

pub mod config;

pub use config::{Config, ConfigError, DiscoveryFlags, EngineConfig, RuntimeConfig, StartParameters};
