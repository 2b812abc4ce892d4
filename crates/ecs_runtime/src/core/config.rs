//! # Runtime Configuration
//!
//! Configuration records for the engine loop and for plugin discovery. All of
//! them can be stored as TOML or RON through [`Config`].
//!
//! ```toml
//! [engine]
//! log_level = "debug"
//! max_ticks = 600
//! tick_rate = 60.0
//!
//! [start]
//! systems_dir = "plugins"
//! recursive = true
//! log_loading = false
//! follow_symlinks = false
//! module_args = ["3"]
//! ```

use crate::plugin::ModuleArgs;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::config::{Config, ConfigError};

bitflags! {
    /// Directory discovery options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DiscoveryFlags: u8 {
        /// Descend into subdirectories
        const RECURSIVE = 1 << 0;
        /// Log every visited entry
        const LOG = 1 << 1;
        /// Follow symbolic links
        const FOLLOW_SYMLINKS = 1 << 2;
    }
}

/// # Engine Configuration
///
/// Core loop behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Upper bound on ticks; `None` runs until shutdown
    pub max_ticks: Option<u64>,
    /// Target ticks per second; `None` runs as fast as possible
    pub tick_rate: Option<f32>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_ticks: None,
            tick_rate: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Stop after `ticks` ticks
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Pace the loop to `rate` ticks per second
    pub fn with_tick_rate(mut self, rate: f32) -> Self {
        self.tick_rate = Some(rate);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Start Parameters
///
/// Where to discover system modules and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartParameters {
    /// Root directory scanned for modules
    pub systems_dir: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Log every visited entry
    pub log_loading: bool,
    /// Follow symbolic links during discovery
    pub follow_symlinks: bool,
    /// Arguments passed to every discovered module
    pub module_args: ModuleArgs,
}

impl StartParameters {
    /// Parameters for discovering modules under `systems_dir`
    pub fn new(systems_dir: impl Into<PathBuf>) -> Self {
        Self {
            systems_dir: systems_dir.into(),
            ..Self::default()
        }
    }

    /// Discovery options as flags
    pub fn discovery_flags(&self) -> DiscoveryFlags {
        let mut flags = DiscoveryFlags::empty();
        flags.set(DiscoveryFlags::RECURSIVE, self.recursive);
        flags.set(DiscoveryFlags::LOG, self.log_loading);
        flags.set(DiscoveryFlags::FOLLOW_SYMLINKS, self.follow_symlinks);
        flags
    }
}

impl Default for StartParameters {
    fn default() -> Self {
        Self {
            systems_dir: PathBuf::from("systems"),
            recursive: false,
            log_loading: false,
            follow_symlinks: false,
            module_args: ModuleArgs::default(),
        }
    }
}

/// # Runtime Configuration
///
/// Everything the host binary reads from its configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Engine loop behavior
    pub engine: EngineConfig,
    /// Plugin discovery
    pub start: StartParameters,
}

impl Config for RuntimeConfig {}
