//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize logging with a default level, still overridable through `RUST_LOG`
pub fn init_with_level(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();
}
