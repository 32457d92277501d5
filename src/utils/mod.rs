//! Utility modules

pub mod async_helpers;
pub mod logging;

// Re-export commonly used items
pub use async_helpers::{panic_message, settle_all};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
