//! Configuration providers and the chain that resolves `user`, `pass` and
//! `code` from them. Providers are consulted in order; the first one that
//! knows a key wins.

use std::collections::HashMap;
use std::env::{self, VarError};

use tracing::{debug, info};
use zeroize::Zeroize;

use crate::config::{ConfigError, SecretTriple};

pub const USER_KEY: &str = "user";
pub const PASS_KEY: &str = "pass";
pub const CODE_KEY: &str = "code";

/// A named source of string configuration values.
pub trait ConfigProvider {
    fn name(&self) -> &str;

    /// `Ok(None)` means this provider does not know the key and the next one
    /// should be asked. Errors abort resolution.
    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

/// `key=value` pairs given on the command line.
#[derive(Default)]
pub struct OverrideProvider {
    values: HashMap<String, String>,
}

impl OverrideProvider {
    /// Parses `key=value` pairs. Only the first `=` splits, so values may
    /// themselves contain `=`. Later pairs replace earlier ones.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = HashMap::new();
        for (index, pair) in pairs.into_iter().enumerate() {
            let position = index + 1;
            let Some((key, value)) = pair.as_ref().split_once('=') else {
                return Err(ConfigError::InvalidOverride {
                    position,
                    problem: "has no `=`",
                });
            };
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidOverride {
                    position,
                    problem: "has an empty key",
                });
            }
            values.insert(key.trim().to_string(), value.to_string());
        }
        Ok(Self { values })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigProvider for OverrideProvider {
    fn name(&self) -> &str {
        "overrides"
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }
}

impl Drop for OverrideProvider {
    fn drop(&mut self) {
        for value in self.values.values_mut() {
            value.zeroize();
        }
    }
}

/// Process environment, optionally behind a prefix. For key `code` and
/// prefix `app_` the variables `app_code` and `APP_CODE` are tried in order.
#[derive(Debug, Default)]
pub struct EnvProvider {
    prefix: String,
}

impl EnvProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn candidates(&self, key: &str) -> Vec<String> {
        let exact = format!("{}{}", self.prefix, key);
        let upper = exact.to_uppercase();
        if upper == exact {
            vec![exact]
        } else {
            vec![exact, upper]
        }
    }
}

impl ConfigProvider for EnvProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        for var in self.candidates(key) {
            match env::var(&var) {
                Ok(value) => {
                    debug!(key, var = %var, "resolved from environment");
                    return Ok(Some(value));
                }
                Err(VarError::NotPresent) => continue,
                Err(VarError::NotUnicode(_)) => return Err(ConfigError::NotUnicode(var)),
            }
        }
        Ok(None)
    }
}

/// Ordered list of providers, highest precedence first.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn push(&mut self, provider: Box<dyn ConfigProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        for provider in &self.providers {
            if let Some(value) = provider.lookup(key)? {
                debug!(key, provider = provider.name(), "value resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.lookup(key)?
            .ok_or_else(|| ConfigError::MissingValue(key.to_string()))
    }
}

/// Resolves `user`, `pass` and `code` in that order. The first key that no
/// provider supplies is reported; nothing partial is returned.
pub fn resolve_triple(chain: &ProviderChain) -> Result<SecretTriple, ConfigError> {
    let user = chain.require(USER_KEY)?;
    let pass = chain.require(PASS_KEY)?;
    let code = chain.require(CODE_KEY)?;
    info!(providers = chain.len(), "all startup values resolved");
    Ok(SecretTriple { user, pass, code })
}
