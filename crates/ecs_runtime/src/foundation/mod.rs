//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the runtime:
//! - Math type aliases
//! - Frame timing
//! - Logging setup
//! - Cooperative cancellation and interrupt handling

pub mod math;
pub mod time;
pub mod logging;
pub mod cancel;
pub mod signal;
