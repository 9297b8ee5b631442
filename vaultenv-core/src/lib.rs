//! # vault-env Core
//!
//! This crate provides the core type definitions, parsing and defaulting logic
//! for the vault-env configuration file.
//!
//! vault-env reads a declarative YAML document describing which secrets to pull
//! from a Vault-compatible secret store. Secrets are grouped into named
//! collections so a single file can serve several pipeline jobs; the caller
//! selects one collection per run.
//!
//! ## Configuration Structure
//!
//! ```yaml
//! secrets:
//!   version: 1.0.0
//!   output: ./.vault-env.env      # default file for FILE secrets
//!   collections:
//!     - name: default
//!       values:
//!         - engine: kv-v2
//!           root: /secret
//!           path: /app/database
//!           field: password
//!           type: ENV
//!           aliases:
//!             - field: password
//!               name: DB_PASSWORD
//!         - engine: aws
//!           path: aws/creds/deploy
//!           namespace: team-a
//! ```
//!
//! Parsing a document always runs [`Config::normalize`], which rejects invalid
//! documents and fills in defaults so the rest of the pipeline works on a fully
//! resolved tree.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// The only configuration schema version this release understands.
pub const SUPPORTED_VERSION: &str = "1.0.0";

/// Name of the versioned key/value engine.
pub const KV_V2_ENGINE: &str = "kv-v2";

/// Name of the AWS credential engine.
pub const AWS_ENGINE: &str = "aws";

/// The document as it appears on disk.
///
/// Everything of interest lives under the top-level `secrets` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub secrets: Config,
}

impl ConfigFile {
    /// Parse a document without normalizing it.
    ///
    /// Environment variable references are expanded before the YAML is read.
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let expanded = expand_env(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }
}

/// The `secrets` section of a config file.
///
/// The same type is used before and after [`Config::normalize`]; after
/// normalization every declaration carries a concrete [`SecretKind`] and,
/// where applicable, the default output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Schema version, must be exactly [`SUPPORTED_VERSION`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Default destination for `FILE` secrets without an explicit `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Named groups of secrets, selected by name at run time
    #[serde(default)]
    pub collections: Vec<Collection>,
}

impl Config {
    /// Validate the configuration and return a fully defaulted copy.
    ///
    /// Validation stops at the first failure. Normalizing an already
    /// normalized configuration yields an identical tree.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if:
    /// - `version` is missing or not [`SUPPORTED_VERSION`]
    /// - a collection has no name
    /// - a declaration's aliases are invalid or not unique
    pub fn normalize(&self) -> Result<Config, ParseError> {
        let version = match &self.version {
            None => return Err(ParseError::MissingVersion),
            Some(v) if v != SUPPORTED_VERSION => {
                return Err(ParseError::UnsupportedVersion(v.clone()));
            }
            Some(v) => v.clone(),
        };

        let collections = self
            .collections
            .iter()
            .map(|collection| collection.normalize(self))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            version: Some(version),
            output: self.output.clone(),
            collections,
        })
    }

    /// Find a collection by name.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
    }
}

impl FromStr for Config {
    type Err = ParseError;

    /// Parse and normalize configuration from a YAML string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigFile::parse(s)?.secrets.normalize()
    }
}

impl TryFrom<&Path> for Config {
    type Error = ParseError;

    /// Load, parse and normalize configuration from a file path.
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParseError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;
        content.parse()
    }
}

/// A named group of secret declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declarations in retrieval and output order
    #[serde(default, rename = "values")]
    pub secrets: Vec<SecretDeclaration>,
}

impl Collection {
    /// Validate the collection and normalize each of its declarations.
    pub fn normalize(&self, config: &Config) -> Result<Collection, ParseError> {
        let name = match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => return Err(ParseError::MissingCollectionName),
        };

        let secrets = self
            .secrets
            .iter()
            .map(|secret| secret.normalize(config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Collection {
            name: Some(name),
            secrets,
        })
    }

    /// The collection name, empty if unset.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Where a resolved secret ends up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretKind {
    /// Printed to standard output
    #[serde(rename = "ENV")]
    Environment,
    /// Appended to a destination file
    #[default]
    #[serde(rename = "FILE")]
    File,
}

impl SecretKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::Environment => "ENV",
            SecretKind::File => "FILE",
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret-store backend kinds with engine-specific behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Engine {
    /// Versioned key/value store; payloads nest the values under `data`
    KvV2,
    /// AWS credential generator; well known keys are renamed on output
    Aws,
    /// Any other engine, read as a flat key/value map
    Generic(String),
}

impl Engine {
    pub fn as_str(&self) -> &str {
        match self {
            Engine::KvV2 => KV_V2_ENGINE,
            Engine::Aws => AWS_ENGINE,
            Engine::Generic(name) => name.as_str(),
        }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(self, Engine::KvV2)
    }
}

impl From<&str> for Engine {
    fn from(s: &str) -> Self {
        match s {
            KV_V2_ENGINE => Engine::KvV2,
            AWS_ENGINE => Engine::Aws,
            other => Engine::Generic(other.to_string()),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single secret to fetch from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// When set, only this key is emitted; otherwise the whole map is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SecretKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Only honoured by the kv-v2 engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Alias>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SecretDeclaration {
    /// Validate the declaration and fill in its defaults.
    ///
    /// The kind defaults to [`SecretKind::File`]; a `FILE` declaration
    /// without a `file` inherits the config's `output`.
    pub fn normalize(&self, config: &Config) -> Result<SecretDeclaration, ParseError> {
        let kind = self.kind.unwrap_or_default();

        if let Some(field) = &self.field {
            if self.aliases.len() > 1 {
                return Err(ParseError::TooManyAliases(field.clone()));
            }
        }

        let file = match (&self.file, kind) {
            (None, SecretKind::File) => config.output.clone(),
            (file, _) => file.clone(),
        };

        let mut names = HashSet::new();
        let mut fields = HashSet::new();
        for alias in &self.aliases {
            let (field, name) = alias.validate()?;
            if !names.insert(name) {
                return Err(ParseError::DuplicateAliasName(name.to_string()));
            }
            if !fields.insert(field) {
                return Err(ParseError::DuplicateAliasField(field.to_string()));
            }
        }

        Ok(SecretDeclaration {
            kind: Some(kind),
            file,
            ..self.clone()
        })
    }

    pub fn engine(&self) -> Engine {
        Engine::from(self.engine.as_deref().unwrap_or_default())
    }

    pub fn kind(&self) -> SecretKind {
        self.kind.unwrap_or_default()
    }

    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or_default()
    }
}

/// Renames a field of a secret on output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// The key to match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The name to emit instead; may be empty but must be present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Alias {
    pub fn new(field: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            name: Some(name.into()),
        }
    }

    /// Check that both halves of the alias are present.
    ///
    /// Returns `(field, name)` on success.
    pub fn validate(&self) -> Result<(&str, &str), ParseError> {
        let field = match self.field.as_deref() {
            Some(field) if !field.is_empty() => field,
            _ => return Err(ParseError::MissingAliasField),
        };
        let name = self.name.as_deref().ok_or(ParseError::MissingAliasName)?;
        Ok((field, name))
    }
}

/// Expand `$VAR` and `${VAR}` references from the process environment.
///
/// Unset variables expand to the empty string.
pub fn expand_env(content: &str) -> Cow<'_, str> {
    expand_env_with(content, |var| env::var(var).ok())
}

fn expand_env_with<F>(content: &str, mut lookup: F) -> Cow<'_, str>
where
    F: FnMut(&str) -> Option<String>,
{
    shellexpand::env_with_context_no_errors(content, |var| {
        Some(lookup(var).unwrap_or_default())
    })
}

/// Errors that can occur when loading a vault-env configuration file.
#[derive(Debug)]
pub enum ParseError {
    /// I/O error when reading the configuration file
    Io(io::Error),
    /// YAML syntax or shape error
    Yaml(serde_yaml::Error),
    /// `version` key absent
    MissingVersion,
    /// `version` present but not supported
    UnsupportedVersion(String),
    /// Collection without a (non-empty) name
    MissingCollectionName,
    /// Single-field declaration with more than one alias
    TooManyAliases(String),
    /// Two aliases of one declaration share a name
    DuplicateAliasName(String),
    /// Two aliases of one declaration share a field
    DuplicateAliasField(String),
    MissingAliasField,
    MissingAliasName,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(e) => write!(f, "I/O error: {}", e),
            ParseError::Yaml(e) => write!(f, "YAML parsing error: {}", e),
            ParseError::MissingVersion => write!(f, "`version` must be provided"),
            ParseError::UnsupportedVersion(v) => write!(
                f,
                "Unsupported version '{}'. Only version '{}' is supported",
                v, SUPPORTED_VERSION
            ),
            ParseError::MissingCollectionName => {
                write!(f, "Collection `name` must be provided. None detected")
            }
            ParseError::TooManyAliases(field) => write!(
                f,
                "Secret field '{}' has more than one alias. A single field value may only have one alias",
                field
            ),
            ParseError::DuplicateAliasName(name) => {
                write!(f, "Non-unique alias name '{}' detected", name)
            }
            ParseError::DuplicateAliasField(field) => {
                write!(f, "Non-unique alias field '{}' detected", field)
            }
            ParseError::MissingAliasField => {
                write!(f, "Alias `field` must be provided. None detected")
            }
            ParseError::MissingAliasName => {
                write!(f, "Alias `name` must be provided. None detected")
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(e: serde_yaml::Error) -> Self {
        ParseError::Yaml(e)
    }
}
