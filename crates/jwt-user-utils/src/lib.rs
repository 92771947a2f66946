//! Shared bootstrap for jwt-user binaries

pub mod config;
pub mod logging;

pub use config::load_env;
pub use logging::init_tracing;
