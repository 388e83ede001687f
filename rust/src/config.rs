//! Configuration model and the JSON file provider. Plaintext values and sealed
//! values live side by side in the file; sealed ones are opened in-memory with
//! the `ValueVault` described by the `vault` block.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroize;

use crate::crypto::vault::{SealedValue, ValueVault, VaultError};
use crate::provider::ConfigProvider;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required configuration value `{0}` was not supplied by any provider")]
    MissingValue(String),
    #[error("config file {path} unreadable: {reason}")]
    Io { path: PathBuf, reason: String },
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("`{0}` appears in both values and sealedValues")]
    DuplicateKey(String),
    #[error("no vault key source configured (key_env, key_path or passphrase_env)")]
    MissingKeySource,
    #[error("passphrase_env ${0} is set but salt_b64 is missing")]
    MissingSalt(String),
    #[error("passphrase unreadable from ${var}: {reason}")]
    Passphrase { var: String, reason: String },
    #[error("salt_b64 is not valid base64: {0}")]
    Salt(String),
    #[error("sealed value `{key}` could not be opened: {source}")]
    Sealed { key: String, source: VaultError },
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("override #{position} {problem}; expected key=value")]
    InvalidOverride { position: usize, problem: &'static str },
    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// The three values the startup report confirms. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretTriple {
    pub user: String,
    pub pass: String,
    pub code: String,
}

impl SecretTriple {
    pub fn new(user: impl Into<String>, pass: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            code: code.into(),
        }
    }
}

impl fmt::Debug for SecretTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretTriple")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("code", &"<redacted>")
            .finish()
    }
}

impl Drop for SecretTriple {
    fn drop(&mut self) {
        self.user.zeroize();
        self.pass.zeroize();
        self.code.zeroize();
    }
}

/// Where the key for `sealedValues` comes from. The first populated source wins.
#[derive(Debug, Default, Deserialize)]
pub struct VaultConfig {
    /// Environment variable holding a base64 32 byte key.
    pub key_env: Option<String>,
    /// File holding a base64 32 byte key.
    pub key_path: Option<PathBuf>,
    /// Environment variable holding a passphrase for Argon2id.
    pub passphrase_env: Option<String>,
    /// Base64 salt used with the passphrase.
    pub salt_b64: Option<String>,
}

impl VaultConfig {
    pub fn build_vault(&self) -> Result<ValueVault, ConfigError> {
        if let Some(var) = &self.key_env {
            return Ok(ValueVault::from_env_var(var)?);
        }
        if let Some(path) = &self.key_path {
            return Ok(ValueVault::from_key_file(path)?);
        }
        if let Some(pass_env) = &self.passphrase_env {
            let salt_b64 = self
                .salt_b64
                .as_ref()
                .ok_or_else(|| ConfigError::MissingSalt(pass_env.clone()))?;
            let mut passphrase = std::env::var(pass_env).map_err(|e| ConfigError::Passphrase {
                var: pass_env.clone(),
                reason: e.to_string(),
            })?;
            let salt = STANDARD_NO_PAD
                .decode(salt_b64.as_bytes())
                .map_err(|e| ConfigError::Salt(e.to_string()))?;
            let vault = ValueVault::from_passphrase(&passphrase, &salt);
            passphrase.zeroize();
            return Ok(vault?);
        }
        Err(ConfigError::MissingKeySource)
    }
}

#[derive(Debug, Deserialize)]
struct RawConfigFile {
    #[serde(default)]
    vault: Option<VaultConfig>,
    #[serde(default)]
    values: HashMap<String, String>,
    #[serde(default, rename = "sealedValues")]
    sealed_values: HashMap<String, SealedValue>,
}

/// Values read from a JSON config file, with sealed entries already opened.
pub struct FileProvider {
    name: String,
    values: HashMap<String, String>,
}

impl FileProvider {
    /// Reads and parses the file and opens every sealed value. Nothing is
    /// looked up lazily, so a broken file fails startup as a whole.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw_json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let raw: RawConfigFile =
            serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut values = raw.values;
        if !raw.sealed_values.is_empty() {
            let vault = raw
                .vault
                .as_ref()
                .ok_or(ConfigError::MissingKeySource)?
                .build_vault()?;
            for (key, sealed) in &raw.sealed_values {
                if values.contains_key(key) {
                    return Err(ConfigError::DuplicateKey(key.clone()));
                }
                let opened = vault.open(sealed).map_err(|source| ConfigError::Sealed {
                    key: key.clone(),
                    source,
                })?;
                values.insert(key.clone(), opened);
            }
        }

        debug!(
            path = %path.display(),
            plain = values.len() - raw.sealed_values.len(),
            sealed = raw.sealed_values.len(),
            "config file loaded"
        );
        Ok(Self {
            name: format!("file:{}", path.display()),
            values,
        })
    }
}

impl ConfigProvider for FileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }
}

impl Drop for FileProvider {
    fn drop(&mut self) {
        for value in self.values.values_mut() {
            value.zeroize();
        }
    }
}
