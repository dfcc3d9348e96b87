//! dbcheck Core Library
//!
//! This crate provides the pieces shared by the dbcheck parser, linter and
//! command-line driver: the error type and the checker configuration.

pub mod config;
pub mod error;

pub use config::{CheckConfig, ConfigLoader, LoggingConfig};
pub use error::{Error, Result};

/// dbcheck version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
