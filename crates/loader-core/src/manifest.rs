//! Manifest wire types exchanged with the manifest service

use crate::platform::Platform;
use crate::DEFAULT_OPERATOR;
use serde::{Deserialize, Serialize};

/// Request descriptor sent as the `parameters` form field.
///
/// `Object` is only present on single-file fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestParameters {
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "Arch")]
    pub arch: String,
    #[serde(rename = "Operator")]
    pub operator: String,
    #[serde(rename = "Object", default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl ManifestParameters {
    /// Parameters for a manifest request. An empty or missing operator tag
    /// falls back to [`DEFAULT_OPERATOR`].
    pub fn new(platform: &Platform, operator: Option<&str>) -> Self {
        let operator = match operator.map(str::trim) {
            Some(op) if !op.is_empty() => op.to_string(),
            _ => DEFAULT_OPERATOR.to_string(),
        };
        Self {
            os: platform.os.clone(),
            arch: platform.arch.clone(),
            operator,
            object: None,
        }
    }

    /// Same parameters, addressed at one named object.
    pub fn for_object(&self, name: &str) -> Self {
        Self {
            object: Some(name.to_string()),
            ..self.clone()
        }
    }

    /// Same parameters with any object removed.
    pub fn without_object(&self) -> Self {
        Self {
            object: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(rename = "sha256", alias = "SHA256")]
    pub content_hash: String,
}

/// The authoritative set of files for one OS/arch/operator combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, alias = "LoaderName", skip_serializing_if = "Option::is_none")]
    pub loader_name: Option<String>,
    /// Required: a payload without an entry list is not a manifest.
    #[serde(alias = "Entries")]
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn find(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// Payload of a single-file fetch: a gzip stream, base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(rename = "data", alias = "Data", with = "base64_bytes")]
    pub compressed_bytes: Vec<u8>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linux() -> Platform {
        Platform::new("linux", "amd64")
    }

    #[test]
    fn test_operator_defaults() {
        assert_eq!(ManifestParameters::new(&linux(), None).operator, "default");
        assert_eq!(ManifestParameters::new(&linux(), Some("  ")).operator, "default");
        assert_eq!(ManifestParameters::new(&linux(), Some("ops")).operator, "ops");
    }

    #[test]
    fn test_manifest_request_omits_object() {
        let params = ManifestParameters::new(&linux(), Some("ops"));
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({"OS": "linux", "Arch": "amd64", "Operator": "ops"})
        );
    }

    #[test]
    fn test_fetch_request_names_object() {
        let params = ManifestParameters::new(&linux(), None).for_object("agent");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["Object"], "agent");
        assert_eq!(params.without_object().object, None);
    }

    #[test]
    fn test_manifest_decodes_both_spellings() {
        let lower: Manifest = serde_json::from_value(json!({
            "loader_name": "loader-1",
            "entries": [{"name": "agent", "sha256": "aa"}]
        }))
        .unwrap();
        let upper: Manifest = serde_json::from_value(json!({
            "Entries": [{"Name": "agent", "SHA256": "aa"}]
        }))
        .unwrap();

        assert_eq!(lower.entries, upper.entries);
        assert_eq!(lower.find("agent").unwrap().content_hash, "aa");
        assert!(upper.find("config").is_none());
    }

    #[test]
    fn test_manifest_requires_entry_list() {
        assert!(serde_json::from_value::<Manifest>(json!({})).is_err());
        assert!(serde_json::from_value::<Manifest>(json!({"loader_name": "loader-1"})).is_err());

        let empty: Manifest = serde_json::from_value(json!({"entries": []})).unwrap();
        assert!(empty.entries.is_empty());
    }

    #[test]
    fn test_fetch_response_is_base64() {
        let resp: FetchResponse = serde_json::from_value(json!({"data": "AQID"})).unwrap();
        assert_eq!(resp.compressed_bytes, vec![1, 2, 3]);

        let bad = serde_json::from_value::<FetchResponse>(json!({"data": "not base64!"}));
        assert!(bad.is_err());
    }
}
