//! `vault-check` CLI. With no subcommand it runs the startup report; `seal`
//! produces envelopes for the `sealedValues` block of a config file.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};
use vault_check::config::VaultConfig;
use vault_check::startup::{build_chain, run_startup, StartupOptions};
use vault_check::{logging, Error};

#[derive(Parser)]
#[command(
    name = "vault-check",
    version,
    about = "Confirm that user, pass and code resolve at startup",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve user, pass and code and print the confirmation report (default)
    Report(ReportArgs),
    /// Seal a value for the `sealedValues` block of a config file
    Seal(SealArgs),
}

#[derive(Args, Clone, Default)]
struct ReportArgs {
    /// JSON config file consulted after overrides and the environment
    #[arg(long, env = "VAULT_CHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Prefix prepended to keys before reading environment variables
    #[arg(long, default_value = "")]
    env_prefix: String,

    /// Highest precedence `key=value` override; may be repeated
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("key_source")
        .required(true)
        .args(["key_env", "key_file", "passphrase_env"])
))]
struct SealArgs {
    /// Environment variable holding a base64 32 byte key
    #[arg(long)]
    key_env: Option<String>,

    /// File holding a base64 32 byte key
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Environment variable holding a passphrase for Argon2id
    #[arg(long, requires = "salt_b64")]
    passphrase_env: Option<String>,

    /// Base64 salt used with --passphrase-env
    #[arg(long, requires = "passphrase_env")]
    salt_b64: Option<String>,

    /// Value to seal
    plaintext: String,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Report(args)) => report(args),
        Some(Command::Seal(args)) => seal(args),
        None => report(cli.report),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vault-check failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn report(args: ReportArgs) -> Result<(), Error> {
    let options = StartupOptions {
        config_path: args.config,
        env_prefix: args.env_prefix,
        overrides: args.overrides,
    };
    let chain = build_chain(&options)?;
    let stdout = io::stdout();
    run_startup(&chain, &mut stdout.lock())
}

fn seal(args: SealArgs) -> Result<(), Error> {
    let key_source = VaultConfig {
        key_env: args.key_env,
        key_path: args.key_file,
        passphrase_env: args.passphrase_env,
        salt_b64: args.salt_b64,
    };
    let vault = key_source.build_vault()?;
    let sealed = vault.seal(&args.plaintext)?;
    println!("{}", serde_json::to_string_pretty(&sealed)?);
    Ok(())
}
