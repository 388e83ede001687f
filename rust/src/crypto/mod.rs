//! Sealing helpers for configuration values kept in the JSON config file.

pub mod vault;
