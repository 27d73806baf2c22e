//! everHome Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other everHome crates:
//! - Client configuration (base URL, token, timeout, retry policy)
//! - The unified error type and the API error kind
//! - Structured logging with tracing
//! - Platform directory lookup
//! - Common constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{ApiError, EhError, EhResult};
pub use logging::init_logging;
