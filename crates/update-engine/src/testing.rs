//! In-memory manifest source for unit tests

use async_trait::async_trait;
use loader_core::{LoaderError, Manifest, ManifestEntry, ManifestParameters, Result};
use manifest_client::ManifestSource;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StubSource {
    manifest: Manifest,
    files: HashMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
    manifest_requests: Mutex<Vec<ManifestParameters>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: &str, content_hash: &str) -> Self {
        self.manifest.entries.push(ManifestEntry {
            name: name.to_string(),
            content_hash: content_hash.to_string(),
        });
        self
    }

    pub fn with_file(mut self, name: &str, content: &[u8]) -> Self {
        self.files.insert(name.to_string(), content.to_vec());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }

    pub fn manifest_requests(&self) -> Vec<ManifestParameters> {
        self.manifest_requests.lock().clone()
    }
}

#[async_trait]
impl ManifestSource for StubSource {
    async fn fetch_manifest(&self, params: &ManifestParameters) -> Result<Manifest> {
        self.manifest_requests.lock().push(params.clone());
        Ok(self.manifest.clone())
    }

    async fn fetch_file(&self, name: &str, _params: &ManifestParameters) -> Result<Vec<u8>> {
        self.fetched.lock().push(name.to_string());
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| LoaderError::HttpStatus {
                url: format!("stub://manifest/fetch/{}", name),
                status: 404,
            })
    }
}
