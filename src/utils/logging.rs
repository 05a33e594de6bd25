//! Logger setup plus a debug macro gated by a module-level `ENABLE_LOGS`
//! flag, for chatty loops that should stay quiet even at debug level.
//!
//! ```rust,ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::log_debug;
//!
//! log_debug!("only printed when ENABLE_LOGS is true");
//! ```

use log::LevelFilter;

/// Install the global logger. `RUST_LOG` still wins over `level`.
/// Safe to call more than once; later calls are no-ops.
pub fn init(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// `log::debug!` that only fires when the calling module defines
/// `const ENABLE_LOGS: bool = true;`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}
