//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honors `RUST_LOG` like any `env_logger` setup.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default filter
///
/// `RUST_LOG` still wins when it is set; otherwise `default_level`
/// (e.g. `"info"` or `"instance_pool=trace"`) is used.
pub fn init_with_level(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (tests, embedding apps) is not an error worth surfacing.
    let _ = env_logger::Builder::from_env(env).try_init();
}
