//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system with a default filter
///
/// `RUST_LOG` still takes precedence over `default_filter` when set.
pub fn init(default_filter: &str) {
    if try_init(default_filter).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Initialize the logging system, reporting whether a logger was already set
pub fn try_init(default_filter: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
}

/// Initialize logging for unit tests (captured output, debug level)
#[cfg(test)]
pub fn init_for_tests() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
