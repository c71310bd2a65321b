//! HTTP manifest client

use crate::envelope;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use loader_core::{
    endpoints, FetchResponse, LoaderError, Manifest, ManifestParameters, Result,
};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Where the loader gets its "want" set and replacement files from.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// The authoritative manifest for the OS/arch/operator in `params`.
    /// Any `object` in `params` is ignored.
    async fn fetch_manifest(&self, params: &ManifestParameters) -> Result<Manifest>;

    /// Raw, decompressed content of the named file.
    async fn fetch_file(&self, name: &str, params: &ManifestParameters) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: ManifestSource + ?Sized> ManifestSource for Arc<T> {
    async fn fetch_manifest(&self, params: &ManifestParameters) -> Result<Manifest> {
        (**self).fetch_manifest(params).await
    }

    async fn fetch_file(&self, name: &str, params: &ManifestParameters) -> Result<Vec<u8>> {
        (**self).fetch_file(name, params).await
    }
}

/// Talks to the manifest service over HTTP.
///
/// Each call is attempted once. The service is expected to answer with a
/// resource envelope; see [`crate::envelope`].
#[derive(Debug, Clone)]
pub struct HttpManifestClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpManifestClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LoaderError::InvalidConfig {
                reason: format!("API URL must be http(s), got {:?}", base_url),
            });
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("fleet-loader/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| LoaderError::InvalidConfig {
            reason: format!("cannot build HTTP client: {}", e),
        })?;

        Ok(Self { base_url, http })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// POST `parameters=<json>` form-encoded and return the body of a 2xx
    /// answer.
    #[instrument(skip(self, params), fields(os = %params.os, arch = %params.arch))]
    async fn post_parameters(&self, endpoint: &str, params: &ManifestParameters) -> Result<Vec<u8>> {
        let url = self.endpoint_url(endpoint);
        let encoded = serde_json::to_string(params)?;
        debug!(%url, parameters = %encoded, "posting manifest request");

        let transport = |e: reqwest::Error| LoaderError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        };
        let response = self
            .http
            .post(&url)
            .form(&[("parameters", encoded.as_str())])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "manifest service answered");
        if !status.is_success() {
            return Err(LoaderError::HttpStatus {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ManifestSource for HttpManifestClient {
    async fn fetch_manifest(&self, params: &ManifestParameters) -> Result<Manifest> {
        let body = self
            .post_parameters(endpoints::MANIFEST, &params.without_object())
            .await?;
        envelope::decode_first(&body)
    }

    async fn fetch_file(&self, name: &str, params: &ManifestParameters) -> Result<Vec<u8>> {
        let body = self
            .post_parameters(endpoints::MANIFEST_FETCH, &params.for_object(name))
            .await?;
        let response: FetchResponse = envelope::decode_first(&body)?;
        decompress(&response.compressed_bytes)
    }
}

/// Fully inflate a gzip stream into memory.
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| LoaderError::Decode {
            reason: format!("cannot decompress payload: {}", e),
        })?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use loader_core::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_endpoint_urls() {
        let with_slash = HttpManifestClient::new("https://api.example/api/v1/").unwrap();
        let without = HttpManifestClient::new("https://api.example/api/v1").unwrap();
        assert_eq!(
            with_slash.endpoint_url(endpoints::MANIFEST),
            "https://api.example/api/v1/manifest"
        );
        assert_eq!(
            without.endpoint_url(endpoints::MANIFEST_FETCH),
            "https://api.example/api/v1/manifest/fetch"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        let err = HttpManifestClient::new("ftp://api.example").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_decompress() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"agent binary").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decompress(&compressed).unwrap(), b"agent binary");
    }

    #[test]
    fn test_decompress_garbage_is_decode_error() {
        let err = decompress(b"plainly not gzip").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
