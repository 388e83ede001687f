use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::vault::VaultError;

/// Everything that can stop `vault-check` before or while it prints.
#[derive(Debug, Error)]
pub enum Error {
    #[error("startup configuration failed: {0}")]
    Config(#[from] ConfigError),
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("could not write report: {0}")]
    Io(#[from] io::Error),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
