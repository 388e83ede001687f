//! Sealing of individual configuration values with ChaCha20-Poly1305.
//! A sealed value is stored as nonce + ciphertext + auth tag so a config file
//! can carry `pass` or `code` without holding the plaintext.

use std::fs;
use std::path::Path;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

const TAG_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

// Argon2id cost for passphrase-derived keys.
const KDF_MEMORY_KIB: u32 = 19 * 1024;
const KDF_ITERATIONS: u32 = 3;
const KDF_LANES: u32 = 1;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("key must be 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("key source {source_name} unreadable: {reason}")]
    KeySource { source_name: String, reason: String },
    #[error("invalid base64 in {field}: {reason}")]
    Base64 { field: &'static str, reason: String },
    #[error("nonce must be 12 bytes, got {0}")]
    NonceLength(usize),
    #[error("sealing failed: {0}")]
    Seal(String),
    #[error("value could not be opened (wrong key or tampered data)")]
    Open,
    #[error("opened value is not valid UTF-8")]
    NotUtf8,
}

/// A sealed configuration value. Every field is base64 without padding so the
/// envelope embeds directly in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SealedValue {
    pub nonce: String,
    pub ciphertext: String,
    pub tag: String,
}

/// Holds the symmetric key used to seal and open configuration values.
pub struct ValueVault {
    key: Key,
}

impl ValueVault {
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, VaultError> {
        if key_bytes.len() != KEY_LEN {
            return Err(VaultError::KeyLength(key_bytes.len()));
        }
        let mut key = Key::default();
        key.copy_from_slice(key_bytes);
        Ok(Self { key })
    }

    /// Reads a base64 key from the named environment variable.
    pub fn from_env_var(var: &str) -> Result<Self, VaultError> {
        let mut encoded = std::env::var(var).map_err(|e| VaultError::KeySource {
            source_name: format!("${var}"),
            reason: e.to_string(),
        })?;
        let vault = Self::from_base64_key(encoded.trim(), "key_env");
        encoded.zeroize();
        vault
    }

    /// Reads a base64 key from a file; surrounding whitespace is ignored.
    pub fn from_key_file(path: &Path) -> Result<Self, VaultError> {
        let mut content = fs::read_to_string(path).map_err(|e| VaultError::KeySource {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let vault = Self::from_base64_key(content.trim(), "key_path");
        content.zeroize();
        vault
    }

    /// Derives the key from a passphrase with Argon2id. The salt should be
    /// unique per deployment and lives next to the sealed values.
    pub fn from_passphrase(passphrase: &str, salt: &[u8]) -> Result<Self, VaultError> {
        let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_LANES, Some(KEY_LEN))
            .map_err(|e| VaultError::Derivation(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut derived = [0u8; KEY_LEN];
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut derived)
            .map_err(|e| VaultError::Derivation(e.to_string()))?;

        let vault = Self::from_key_bytes(&derived);
        derived.zeroize();
        vault
    }

    fn from_base64_key(encoded: &str, field: &'static str) -> Result<Self, VaultError> {
        let mut decoded = decode(encoded, field)?;
        let vault = Self::from_key_bytes(&decoded);
        decoded.zeroize();
        vault
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedValue, VaultError> {
        let cipher = ChaCha20Poly1305::new(&self.key);
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

        let mut sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Seal(e.to_string()))?;
        if sealed.len() < TAG_LEN {
            return Err(VaultError::Seal("output shorter than auth tag".to_string()));
        }
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(SealedValue {
            nonce: STANDARD_NO_PAD.encode(nonce),
            ciphertext: STANDARD_NO_PAD.encode(&sealed),
            tag: STANDARD_NO_PAD.encode(tag),
        })
    }

    pub fn open(&self, sealed: &SealedValue) -> Result<String, VaultError> {
        let nonce = decode(&sealed.nonce, "nonce")?;
        if nonce.len() != NONCE_LEN {
            return Err(VaultError::NonceLength(nonce.len()));
        }
        let mut combined = decode(&sealed.ciphertext, "ciphertext")?;
        combined.extend_from_slice(&decode(&sealed.tag, "tag")?);

        let cipher = ChaCha20Poly1305::new(&self.key);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), combined.as_ref())
            .map_err(|_| VaultError::Open)?;
        String::from_utf8(plaintext).map_err(|e| {
            e.into_bytes().zeroize();
            VaultError::NotUtf8
        })
    }
}

impl Drop for ValueVault {
    fn drop(&mut self) {
        self.key.as_mut_slice().zeroize();
    }
}

fn decode(encoded: &str, field: &'static str) -> Result<Vec<u8>, VaultError> {
    STANDARD_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| VaultError::Base64 {
            field,
            reason: e.to_string(),
        })
}
