//! # Secret Store
//!
//! The store module defines the query capability secrets are resolved
//! against. Resolution only ever needs three things from a backend: a read
//! of one path with optional query parameters, and switching the token and
//! namespace subsequent reads run under.
//!
//! The capability is an explicit object handed to the resolver by
//! reference. Token and namespace are mutable state on that object, so the
//! orchestrator decides when they change and every call site sees the
//! handle it is working with.
//!
//! ## Available Stores
//!
//! - [`VaultClient`]: HashiCorp Vault over its HTTP API
//!
//! ## Example
//!
//! ```rust,no_run
//! use vaultenv::store::{QueryParams, SecretStore, VaultClient};
//!
//! let mut client = VaultClient::new("https://vault.example.com:8200")?;
//! client.set_token("s.xxxxx");
//! client.set_namespace("team-a");
//!
//! if let Some(secret) = client.read("secret/data/app", &QueryParams::new())? {
//!     println!("{} keys", secret.data.len());
//! }
//! # Ok::<(), vaultenv::VaultEnvError>(())
//! ```

use crate::Result;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub mod vault;


pub use vault::VaultClient;

/// Query parameters sent along with a read, e.g. `version=3`.
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// The payload of a successful read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SecretData {
    /// Top-level data map returned by the backend
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl SecretData {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

/// Trait defining the query capability of a secret store.
///
/// # Thread Safety
///
/// Stores must be `Send + Sync` even though a run is sequential, so a
/// configured client can be moved into whatever owns the run.
pub trait SecretStore: Send + Sync {
    /// Reads the secret at `path`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(data))` if the backend returned a secret
    /// - `Ok(None)` if nothing exists at the path
    /// - `Err` for transport, authentication or backend failures
    fn read(&self, path: &str, params: &QueryParams) -> Result<Option<SecretData>>;

    /// Sets the token used for subsequent reads. An empty token clears it.
    fn set_token(&mut self, token: &str);

    /// Directs subsequent reads into `namespace`.
    fn set_namespace(&mut self, namespace: &str);

    /// Returns the name of this store for display purposes.
    fn name(&self) -> &'static str;
}
