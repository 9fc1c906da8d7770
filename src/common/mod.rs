//! # Common Components
//!
//! - [`config`]: TOML configuration parsing
//! - [`logging`]: `env_logger` setup shared by the binaries

pub mod config;
pub mod logging;
