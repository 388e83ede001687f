//! Startup check that resolves `user`, `pass` and `code` from the configured
//! providers and prints a fixed confirmation report.

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod provider;
pub mod reporter;
pub mod startup;

pub use config::{ConfigError, SecretTriple};
pub use error::Error;
