use crate::{DEFAULT_COLLECTION, DEFAULT_INPUT, DEFAULT_OUTPUT, OutputFormat, RunContext};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main CLI structure for the vault-env application.
///
/// Without a subcommand, the selected collection is resolved and written out.
#[derive(Parser, Debug)]
#[command(name = "vault-env")]
#[command(about = "Retrieve HashiCorp Vault secrets in a CI pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// The input file to parse
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,
    /// The default vault token to use when no login is requested
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// The collection of secrets to pull
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,
    /// The default file output
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// The address of the vault instance
    #[arg(long = "vault-addr", visible_alias = "vaultAddr", env = "VAULT_ADDR")]
    vault_addr: Option<String>,
    /// The output format to use. Use `WINDOWS` for .bat compatible output
    #[arg(long, value_enum, ignore_case = true, default_value = "FILE")]
    format: OutputFormat,
    /// Sets the output to be verbose
    #[arg(long)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Retrieves version information
    Version,
}

impl Cli {
    fn context(&self) -> RunContext {
        RunContext {
            vault_address: self.vault_addr.clone().unwrap_or_default(),
            input_file: self.input.clone(),
            collection: self.collection.clone(),
            default_output: self.output.clone(),
            default_token: self.token.clone(),
            format: self.format,
        }
    }
}

/// Installs the stderr log subscriber.
///
/// Standard output carries the emitted assignments, so logs never go there.
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "vaultenv=trace,vaultenv_core=trace,warn"
    } else {
        "error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Main entry point for the vault-env CLI application.
///
/// # Returns
///
/// * `Ok(())` - If the command executed successfully
/// * `Err` - If any error occurred; the process then exits with status 1
pub fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => {
            init_tracing(cli.verbose);
            let ctx = cli.context();
            let count = crate::run(&ctx).wrap_err("Failed to retrieve secrets")?;
            if cli.verbose {
                eprintln!(
                    "{} Retrieved {} value(s) from collection '{}'",
                    "✓".green(),
                    count,
                    ctx.collection
                );
            }
            Ok(())
        }
    }
}
