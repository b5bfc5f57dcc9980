//! Logger setup
//!
//! Browser builds log to the devtools console, native builds to stderr via
//! `env_logger` (`RUST_LOG` overrides the configured level). Calling `init`
//! more than once keeps the first logger.

use log::LevelFilter;

#[cfg(target_arch = "wasm32")]
pub fn init(level: LevelFilter) {
    console_error_panic_hook::set_once();
    if let Some(level) = level.to_level() {
        if console_log::init_with_level(level).is_err() {
            log::debug!("Logger already initialized");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}
