//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system. Respects `RUST_LOG`; falls back to the
/// given filter when the variable is unset.
pub fn init(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
