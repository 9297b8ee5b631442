use super::{QueryParams, SecretData, SecretStore};
use crate::{Result, VaultEnvError};
use http::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

/// Address used when none is configured, matching the Vault CLI default.
pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";

const TOKEN_HEADER: &str = "x-vault-token";
const NAMESPACE_HEADER: &str = "x-vault-namespace";

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// A blocking client for the Vault HTTP API.
///
/// Reads are `GET {address}/v1/{path}` requests. The token and namespace are
/// sent as headers on every request once set.
pub struct VaultClient {
    address: Url,
    token: Option<String>,
    namespace: Option<String>,
    http: Client,
}

impl VaultClient {
    /// Creates a client bound to `address`.
    ///
    /// An empty address falls back to [`DEFAULT_ADDRESS`].
    pub fn new(address: &str) -> Result<Self> {
        let address = if address.is_empty() {
            DEFAULT_ADDRESS
        } else {
            address
        };
        let address = Url::parse(address)?;
        if address.cannot_be_a_base() {
            return Err(VaultEnvError::Address(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(Self {
            address,
            token: None,
            namespace: None,
            http: Client::new(),
        })
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    fn endpoint(&self, path: &str, params: &QueryParams) -> Url {
        let mut url = self.address.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("v1").extend(path.split('/'));
        }
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, values) in params {
                for value in values {
                    query.append_pair(key, value);
                }
            }
        }
        url
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            headers.insert(TOKEN_HEADER, value);
        }
        if let Some(namespace) = &self.namespace {
            headers.insert(NAMESPACE_HEADER, HeaderValue::from_str(namespace)?);
        }
        Ok(headers)
    }
}

impl SecretStore for VaultClient {
    fn read(&self, path: &str, params: &QueryParams) -> Result<Option<SecretData>> {
        let url = self.endpoint(path, params);
        debug!(path, namespace = ?self.namespace, "reading secret");

        let response = self.http.get(url).headers(self.headers()?).send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join(", "),
                _ => body,
            };
            return Err(VaultEnvError::Store {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body: ReadResponse = response.json()?;
        Ok(Some(SecretData::new(body.data.unwrap_or_default())))
    }

    fn set_token(&mut self, token: &str) {
        self.token = (!token.is_empty()).then(|| token.to_string());
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.namespace = (!namespace.is_empty()).then(|| namespace.to_string());
    }

    fn name(&self) -> &'static str {
        "vault"
    }
}
