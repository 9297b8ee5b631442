#![allow(dead_code)]

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vaultenv::store::{QueryParams, SecretData, SecretStore};

/// Test helper for creating temporary directories with test configs
pub struct TestFixture {
    _temp_dir: TempDir,
    pub base_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            base_path,
        }
    }

    /// Write `content` as `.vault-env.yml` under `dir` (relative to the fixture)
    pub fn write_config(&self, dir: &str, content: &str) -> PathBuf {
        let config_dir = self.base_path.join(dir);
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(".vault-env.yml");
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.base_path.join(relative)).unwrap()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory store keyed by path, recording the token each read ran under.
#[derive(Default)]
pub struct StaticStore {
    secrets: HashMap<String, Map<String, Value>>,
    token: String,
    namespace: String,
    pub reads: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl StaticStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, data: Value) -> Self {
        let Value::Object(map) = data else {
            panic!("secret data must be an object");
        };
        self.secrets.insert(path.to_string(), map);
        self
    }

    /// (path, token, namespace) of every read so far
    pub fn reads(&self) -> Vec<(String, String, String)> {
        self.reads.lock().unwrap().clone()
    }
}

impl SecretStore for StaticStore {
    fn read(&self, path: &str, _params: &QueryParams) -> vaultenv::Result<Option<SecretData>> {
        self.reads.lock().unwrap().push((
            path.to_string(),
            self.token.clone(),
            self.namespace.clone(),
        ));
        Ok(self.secrets.get(path).cloned().map(SecretData::new))
    }

    fn set_token(&mut self, token: &str) {
        self.token = token.to_string();
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
