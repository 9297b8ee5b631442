//! Run orchestration: load config, resolve one collection, write output

use crate::Result;
use crate::output::{OutputFormat, OutputWriter};
use crate::resolver::{ResolvedValue, resolve};
use crate::store::{SecretStore, VaultClient};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use vaultenv_core::Config;

/// Config file read when none is given.
pub const DEFAULT_INPUT: &str = ".vault-env.yml";

/// Destination for `FILE` secrets when neither the secret nor the config names one.
pub const DEFAULT_OUTPUT: &str = "./.vault-env.env";

/// Collection selected when none is given.
pub const DEFAULT_COLLECTION: &str = "default";

/// Caller-supplied inputs for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Address of the Vault server; empty for the client default
    pub vault_address: String,
    pub input_file: PathBuf,
    /// Name of the collection to resolve
    pub collection: String,
    pub default_output: PathBuf,
    /// Token set on the store before the first read
    pub default_token: Option<String>,
    pub format: OutputFormat,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            vault_address: String::new(),
            input_file: PathBuf::from(DEFAULT_INPUT),
            collection: DEFAULT_COLLECTION.to_string(),
            default_output: PathBuf::from(DEFAULT_OUTPUT),
            default_token: None,
            format: OutputFormat::default(),
        }
    }
}

/// A loaded, normalized configuration together with the file it came from.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use vaultenv::{VaultEnv, store::VaultClient};
///
/// let app = VaultEnv::load(Path::new(".vault-env.yml"))?;
/// let mut client = VaultClient::new("https://vault.example.com:8200")?;
/// let values = app.retrieve("default", Some("s.xxxxx"), &mut client)?;
/// println!("resolved {} values", values.len());
/// # Ok::<(), vaultenv::VaultEnvError>(())
/// ```
pub struct VaultEnv {
    config: Config,
    input_file: PathBuf,
}

impl VaultEnv {
    pub fn new(config: Config, input_file: impl Into<PathBuf>) -> Self {
        Self {
            config,
            input_file: input_file.into(),
        }
    }

    /// Loads and normalizes the config at `input_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails validation.
    pub fn load(input_file: &Path) -> Result<Self> {
        let config = Config::try_from(input_file)?;
        Ok(Self::new(config, input_file))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    /// Resolves every secret of `collection` in declared order.
    ///
    /// A collection that does not exist yields no values and is not an error.
    /// The store's token is set once before the first read; a declaration
    /// with a `namespace` switches the store into it before its own read, and
    /// the switch stays in effect for the declarations after it.
    ///
    /// # Errors
    ///
    /// Stops at the first declaration that fails to resolve.
    pub fn retrieve<S>(
        &self,
        collection: &str,
        token: Option<&str>,
        store: &mut S,
    ) -> Result<Vec<ResolvedValue>>
    where
        S: SecretStore + ?Sized,
    {
        let Some(collection) = self.config.collection(collection) else {
            trace!(collection, "No applicable secrets detected");
            return Ok(Vec::new());
        };

        store.set_token(token.unwrap_or_default());

        debug!("Found {} secret(s) to retrieve", collection.secrets.len());
        let mut values = Vec::new();
        for secret in &collection.secrets {
            if let Some(namespace) = &secret.namespace {
                store.set_namespace(namespace);
            }
            values.extend(resolve(secret, &*store)?);
        }

        Ok(values)
    }

    /// Writes `values` to `stdout` and their destination files.
    pub fn write<W: Write>(
        &self,
        values: &[ResolvedValue],
        format: OutputFormat,
        default_output: &Path,
        stdout: W,
    ) -> Result<()> {
        let mut writer = OutputWriter::new(format, &self.input_file, default_output, stdout);
        writer.write_all(values)
    }

    /// Resolves the context's collection against `store` and writes the result.
    ///
    /// Returns the number of values resolved.
    pub fn run_with<S, W>(&self, ctx: &RunContext, store: &mut S, stdout: W) -> Result<usize>
    where
        S: SecretStore + ?Sized,
        W: Write,
    {
        let values = self.retrieve(&ctx.collection, ctx.default_token.as_deref(), store)?;
        self.write(&values, ctx.format, &ctx.default_output, stdout)?;
        Ok(values.len())
    }
}

/// Runs vault-env end to end against a Vault server.
///
/// The config is loaded and validated before the client is built, so an
/// invalid document never reaches the network.
pub fn run(ctx: &RunContext) -> Result<usize> {
    let app = VaultEnv::load(&ctx.input_file)?;
    let mut client = VaultClient::new(&ctx.vault_address)?;
    app.run_with(ctx, &mut client, io::stdout().lock())
}
