//! vault-env - Pull secrets from HashiCorp Vault into a pipeline
//!
//! This library reads a declarative `.vault-env.yml`, resolves the secrets of
//! one named collection against a secret store and emits them either as
//! `NAME="VALUE"` lines on standard output or appended to env files.
//!
//! # Features
//!
//! - **Declarative Configuration**: Secrets grouped into collections in one YAML file
//! - **Engine Aware**: kv-v2 versioned reads, AWS credential renaming, any other engine generically
//! - **Aliases**: Rename emitted fields per secret
//! - **Namespaces**: Direct individual secrets into Vault Enterprise namespaces
//! - **Two Formats**: POSIX `NAME="VALUE"` or batch `set NAME="VALUE"`
//!
//! # Example
//!
//! ```no_run
//! use vaultenv::{OutputFormat, RunContext};
//!
//! let ctx = RunContext {
//!     vault_address: "https://vault.example.com:8200".to_string(),
//!     collection: "deploy".to_string(),
//!     default_token: std::env::var("VAULT_TOKEN").ok(),
//!     format: OutputFormat::Nix,
//!     ..Default::default()
//! };
//!
//! vaultenv::run(&ctx)?;
//! # Ok::<(), vaultenv::VaultEnvError>(())
//! ```

// Internal modules
mod error;
mod output;
mod path;
mod resolver;
mod secrets;

pub mod store;

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

pub use vaultenv_core::{
    Alias, Collection, Config, ConfigFile, Engine, ParseError, SecretDeclaration, SecretKind,
};

// Public API exports
pub use error::{Result, VaultEnvError};
pub use output::{OutputFormat, OutputWriter, format_line};
pub use path::format_path;
pub use resolver::{NIL_VALUE, ResolvedValue, resolve, stringify};
pub use secrets::{
    DEFAULT_COLLECTION, DEFAULT_INPUT, DEFAULT_OUTPUT, RunContext, VaultEnv, run,
};
