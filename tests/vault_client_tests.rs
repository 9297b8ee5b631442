mod common;

use serde_json::Value;
use vaultenv::store::{QueryParams, SecretData, SecretStore, VaultClient};
use vaultenv::{RunContext, VaultEnv, VaultEnvError, stringify};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The client is blocking, so it runs off the async worker threads.
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

fn read(
    address: String,
    token: &str,
    namespace: &str,
    path: &str,
) -> vaultenv::Result<Option<SecretData>> {
    let mut client = VaultClient::new(&address)?;
    client.set_token(token);
    client.set_namespace(namespace);
    client.read(path, &QueryParams::new())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_sends_token_and_namespace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/app"))
        .and(query_param("version", "3"))
        .and(header("x-vault-token", "s.token"))
        .and(header("x-vault-namespace", "team-a"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"request_id":"1","lease_id":"","data":{"data":{"password":"hunter2"},"metadata":{"version":3}}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let address = server.uri();
    let secret = blocking(move || {
        let mut client = VaultClient::new(&address).unwrap();
        client.set_token("s.token");
        client.set_namespace("team-a");

        let mut params = QueryParams::new();
        params.insert("version".to_string(), vec!["3".to_string()]);
        client.read("secret/data/app", &params).unwrap().unwrap()
    })
    .await;

    assert_eq!(secret.data["data"]["password"], "hunter2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_without_token_sends_no_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"data":{"a":"1"}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let address = server.uri();
    let secret = blocking(move || read(address, "", "", "kv/app")).await.unwrap();
    assert_eq!(secret.unwrap().data["a"], "1");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
    assert!(requests[0].headers.get("x-vault-token").is_none());
    assert!(requests[0].headers.get("x-vault-namespace").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(r#"{"errors":[]}"#, "application/json"))
        .mount(&server)
        .await;

    let address = server.uri();
    let secret = blocking(move || read(address, "s.token", "", "kv/missing")).await;
    assert!(secret.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_surfaces_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_raw(r#"{"errors":["permission denied"]}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let address = server.uri();
    match blocking(move || read(address, "s.bad", "", "kv/app")).await {
        Err(VaultEnvError::Store {
            path,
            status,
            message,
        }) => {
            assert_eq!(path, "kv/app");
            assert_eq!(status, 403);
            assert_eq!(message, "permission denied");
        }
        other => panic!("expected a store error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_numbers_keep_their_source_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/limits"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"data":{"ratio":1.50,"big":123456789012345678901234,"exp":1e3,"port":8200}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let address = server.uri();
    let secret = blocking(move || read(address, "s.token", "", "kv/limits"))
        .await
        .unwrap()
        .unwrap();

    let text = |key: &str| stringify(secret.data.get(key).unwrap_or(&Value::Null));
    assert_eq!(text("ratio"), "1.50");
    assert_eq!(text("big"), "123456789012345678901234");
    assert_eq!(text("exp"), "1e3");
    assert_eq!(text("port"), "8200");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/database/creds/readonly"))
        .and(query_param("field", "password"))
        .and(header("x-vault-token", "s.ro"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"lease_id":"database/creds/readonly/x","data":{"username":"v-ro","password":"pw"}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let address = server.uri();
    let stdout = blocking(move || {
        let fixture = common::TestFixture::new();
        let input = fixture.write_config(
            ".",
            r#"
secrets:
  version: 1.0.0
  collections:
    - name: default
      values:
        - engine: database
          path: /database/creds/readonly
          field: password
          type: ENV
"#,
        );

        let app = VaultEnv::load(&input).unwrap();
        let ctx = RunContext {
            vault_address: address,
            input_file: input.clone(),
            default_token: Some("s.ro".to_string()),
            ..Default::default()
        };
        let mut client = VaultClient::new(&ctx.vault_address).unwrap();
        let mut stdout = Vec::new();
        app.run_with(&ctx, &mut client, &mut stdout).unwrap();
        String::from_utf8(stdout).unwrap()
    })
    .await;

    assert_eq!(stdout, "PASSWORD=\"pw\"\n");
}
