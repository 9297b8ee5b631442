//! Secret resolution: fetch one declaration and turn it into named values

use crate::path::format_path;
use crate::store::{QueryParams, SecretStore};
use crate::{Result, VaultEnvError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};
use vaultenv_core::{Engine, SecretDeclaration, SecretKind};

/// Text emitted for values the backend reports as absent.
pub const NIL_VALUE: &str = "<nil>";

/// Keys the AWS engine renames to the variables the AWS CLI reads.
const AWS_RENAMES: [(&str, &str); 3] = [
    ("ACCESS_KEY", "AWS_ACCESS_KEY_ID"),
    ("SECRET_KEY", "AWS_SECRET_ACCESS_KEY"),
    ("SECURITY_TOKEN", "AWS_SESSION_TOKEN"),
];

/// Lease metadata the AWS engine never emits.
const AWS_DROPPED: [&str; 3] = ["LEASE_ID", "LEASE_DURATION", "LEASE_RENEWABLE"];

const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// A final name/value pair ready for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Display name after renames and aliases
    pub name: String,
    pub value: String,
    /// Inherited from the originating declaration
    pub kind: SecretKind,
    /// Declared destination file, resolved by the output writer
    pub file: Option<String>,
}

/// Fetch `secret` from `store` and classify the payload.
///
/// With a `field`, exactly one value is produced. Without one, every key of
/// the secret's map becomes a value, in key order.
///
/// # Errors
///
/// - [`VaultEnvError::SecretNotFound`] when the store has nothing at the path
/// - [`VaultEnvError::MalformedResponse`] when a kv-v2 payload has no `data` map
/// - any error returned by the store itself
pub fn resolve<S>(secret: &SecretDeclaration, store: &S) -> Result<Vec<ResolvedValue>>
where
    S: SecretStore + ?Sized,
{
    let engine = secret.engine();
    let mut params = QueryParams::new();

    let path = if engine.is_versioned() {
        if let Some(version) = secret.version {
            params.insert("version".to_string(), vec![version.to_string()]);
        }
        format_path(&engine, secret.root(), secret.path())
    } else {
        if let Some(field) = &secret.field {
            params.insert("field".to_string(), vec![field.clone()]);
        }
        format_path(&engine, "", secret.path())
    };

    debug!(store = store.name(), %engine, path = %path, "resolving secret");

    let mut response = store
        .read(&path, &params)?
        .ok_or_else(|| VaultEnvError::SecretNotFound(path.clone()))?;

    let data = if engine.is_versioned() {
        match response.data.remove("data") {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(VaultEnvError::MalformedResponse {
                    path,
                    reason: "no `data` map in kv-v2 payload (deleted or destroyed version?)"
                        .to_string(),
                });
            }
        }
    } else {
        response.data
    };

    Ok(match &secret.field {
        Some(field) => vec![single_value(secret, field, &data, &path)],
        None => multi_value(secret, &engine, &data),
    })
}

fn single_value(
    secret: &SecretDeclaration,
    field: &str,
    data: &Map<String, Value>,
    path: &str,
) -> ResolvedValue {
    // A single value takes the first alias regardless of its `field`
    let name = secret
        .aliases
        .first()
        .and_then(|alias| alias.name.clone())
        .unwrap_or_else(|| field.to_uppercase());

    let value = match data.get(field) {
        Some(value) => stringify(value),
        None => {
            warn!(field, path, "field not present in secret");
            NIL_VALUE.to_string()
        }
    };

    ResolvedValue {
        name,
        value,
        kind: secret.kind(),
        file: secret.file.clone(),
    }
}

fn multi_value(
    secret: &SecretDeclaration,
    engine: &Engine,
    data: &Map<String, Value>,
) -> Vec<ResolvedValue> {
    let aliases: HashMap<&str, &str> = secret
        .aliases
        .iter()
        .filter_map(|alias| Some((alias.field.as_deref()?, alias.name.as_deref()?)))
        .collect();

    data.iter()
        .filter_map(|(key, raw)| {
            let value = stringify(raw);
            let mut name = key.to_uppercase();

            if *engine == Engine::Aws {
                if AWS_DROPPED.contains(&name.as_str()) {
                    return None;
                }
                if let Some((_, renamed)) = AWS_RENAMES.iter().find(|(from, _)| *from == name) {
                    name = renamed.to_string();
                }
                if name == AWS_SESSION_TOKEN && value == NIL_VALUE {
                    return None;
                }
            }

            if let Some(alias) = aliases.get(name.as_str()) {
                name = alias.to_string();
            }

            Some(ResolvedValue {
                name,
                value,
                kind: secret.kind(),
                file: secret.file.clone(),
            })
        })
        .collect()
}

/// Render any JSON value as text.
///
/// Strings are emitted verbatim, `null` as [`NIL_VALUE`] and structured
/// values as compact JSON. Numbers keep the exact text the backend sent.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NIL_VALUE.to_string(),
        other => other.to_string(),
    }
}
