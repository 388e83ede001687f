//! The startup command: build the provider chain, resolve the three values,
//! then print the report. Resolution finishes before anything is written.

use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{ConfigError, FileProvider};
use crate::error::Error;
use crate::provider::{resolve_triple, EnvProvider, OverrideProvider, ProviderChain};
use crate::reporter::write_report;

/// Inputs for the startup command, usually filled in from the CLI.
#[derive(Debug, Default, Clone)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub env_prefix: String,
    pub overrides: Vec<String>,
}

/// Overrides first, then the environment, then the config file if one was given.
pub fn build_chain(options: &StartupOptions) -> Result<ProviderChain, ConfigError> {
    let mut chain = ProviderChain::new();

    let overrides = OverrideProvider::from_pairs(&options.overrides)?;
    if !overrides.is_empty() {
        chain.push(Box::new(overrides));
    }
    chain.push(Box::new(EnvProvider::new(options.env_prefix.clone())));
    if let Some(path) = &options.config_path {
        chain.push(Box::new(FileProvider::load(path)?));
    }

    debug!(providers = chain.len(), "provider chain ready");
    Ok(chain)
}

/// Runs once per process. Either the full report reaches `out` or nothing does.
pub fn run_startup<W: Write>(chain: &ProviderChain, out: &mut W) -> Result<(), Error> {
    let secrets = resolve_triple(chain)?;
    write_report(out, &secrets)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{build_chain, run_startup, StartupOptions};
    use crate::config::ConfigError;
    use crate::error::Error;
    use serde_json::json;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn prints_report_for_resolved_values() {
        let options = StartupOptions {
            env_prefix: "VCSTARTA_".to_string(),
            overrides: vec!["user=alice".into(), "pass=s3cr3t".into(), "code=123456".into()],
            ..StartupOptions::default()
        };
        let chain = build_chain(&options).unwrap();

        let mut out = Vec::new();
        run_startup(&chain, &mut out).expect("startup should succeed");
        let report = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[3], "Username: alice");
        assert_eq!(lines[4], "Password: s3cr3t");
        assert_eq!(lines[5], "Code: 123456");
    }

    #[test]
    fn missing_value_prints_nothing() {
        let options = StartupOptions {
            env_prefix: "VCSTARTB_".to_string(),
            overrides: vec!["user=alice".into(), "pass=s3cr3t".into()],
            ..StartupOptions::default()
        };
        let chain = build_chain(&options).unwrap();

        let mut out = Vec::new();
        let err = run_startup(&chain, &mut out).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingValue(ref key)) if key == "code"));
        assert!(out.is_empty());
    }

    #[test]
    fn file_is_lowest_precedence() {
        std::env::set_var("VCSTARTC_PASS", "env-pass");
        let file = NamedTempFile::new().expect("temp file");
        let payload = json!({ "values": { "user": "file-user", "pass": "file-pass", "code": "" } });
        fs::write(file.path(), serde_json::to_vec(&payload).unwrap()).unwrap();

        let options = StartupOptions {
            config_path: Some(file.path().to_path_buf()),
            env_prefix: "VCSTARTC_".to_string(),
            overrides: vec!["user=cli-user".into()],
        };
        let chain = build_chain(&options).unwrap();

        let mut out = Vec::new();
        run_startup(&chain, &mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("Username: cli-user\n"));
        assert!(report.contains("Password: env-pass\n"));
        assert!(report.contains("Code: \n"));
    }

    #[test]
    fn broken_config_file_fails_chain_construction() {
        let options = StartupOptions {
            config_path: Some("/definitely/not/here.json".into()),
            ..StartupOptions::default()
        };
        assert!(matches!(build_chain(&options), Err(ConfigError::Io { .. })));
    }
}
