//! Loader configuration: command-line overrides layered over an optional
//! JSON file

use crate::driver::UpdateDriver;
use crate::inventory::{BundleSource, StaticBundle};
use crate::trigger::{CommandTrigger, NoopTrigger, Trigger};
use loader_core::{LoaderError, ManagedFile, ManifestParameters, Platform, Result};
use manifest_client::HttpManifestClient;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Contents of the optional JSON configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub bundle: Vec<ManagedFile>,
    #[serde(default)]
    pub trigger: Vec<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)
            .map_err(|e| LoaderError::filesystem("read configuration", path, e))?;
        serde_json::from_slice(&raw).map_err(|e| LoaderError::InvalidConfig {
            reason: format!("{}: {}", path.display(), e),
        })
    }

    /// The bundle this file defines, or the built-in layout for `platform`.
    pub fn bundle_source(&self, platform: &Platform) -> Result<StaticBundle> {
        bundle_for(&self.bundle, platform)
    }
}

fn bundle_for(files: &[ManagedFile], platform: &Platform) -> Result<StaticBundle> {
    if files.is_empty() {
        StaticBundle::builtin(&platform.os)
    } else {
        Ok(StaticBundle::new(files.to_vec()))
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub operator: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    pub api_url: String,
    pub operator: Option<String>,
    pub timeout: Option<Duration>,
    pub platform: Platform,
    pub bundle: Vec<ManagedFile>,
    pub trigger: Vec<String>,
}

impl LoaderSettings {
    /// Overrides win over the file. The API URL must come from one of them.
    pub fn resolve(overrides: Overrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let api_url = overrides
            .api_url
            .or(file.api_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| LoaderError::InvalidConfig {
                reason: "no API URL configured".to_string(),
            })?;
        let timeout = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            api_url,
            operator: overrides.operator.or(file.operator),
            timeout,
            platform: Platform::current(),
            bundle: file.bundle,
            trigger: file.trigger,
        })
    }

    pub fn parameters(&self) -> ManifestParameters {
        ManifestParameters::new(&self.platform, self.operator.as_deref())
    }

    /// The configured bundle, or the built-in layout for this OS.
    pub fn bundle_source(&self) -> Result<StaticBundle> {
        bundle_for(&self.bundle, &self.platform)
    }

    pub fn trigger(&self) -> Result<Box<dyn Trigger>> {
        if self.trigger.is_empty() {
            Ok(Box::new(NoopTrigger))
        } else {
            Ok(Box::new(CommandTrigger::from_argv(&self.trigger)?))
        }
    }

    pub fn manifest_client(&self) -> Result<HttpManifestClient> {
        HttpManifestClient::with_timeout(self.api_url.clone(), self.timeout)
    }

    pub fn into_driver(self) -> Result<UpdateDriver> {
        let bundle: Box<dyn BundleSource> = Box::new(self.bundle_source()?);
        Ok(UpdateDriver::new(
            bundle,
            Box::new(self.manifest_client()?),
            self.trigger()?,
            self.parameters(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loader_core::ErrorKind;

    fn file_config(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let file = file_config(
            r#"{"api_url": "http://file.example/api/v1/", "operator": "acme", "timeout_secs": 5}"#,
        );
        let overrides = Overrides {
            api_url: Some("http://cli.example/api/v1/".to_string()),
            operator: None,
            timeout_secs: Some(30),
        };

        let settings = LoaderSettings::resolve(overrides, Some(file)).unwrap();

        assert_eq!(settings.api_url, "http://cli.example/api/v1/");
        assert_eq!(settings.operator.as_deref(), Some("acme"));
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.parameters().operator, "acme");
    }

    #[test]
    fn test_missing_api_url_rejected() {
        let err = LoaderSettings::resolve(Overrides::default(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_unknown_file_fields_rejected() {
        let result: std::result::Result<FileConfig, _> =
            serde_json::from_str(r#"{"api_url": "http://x/", "interval": 60}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_bundle_and_trigger_from_file() {
        let file = file_config(
            r#"{
                "api_url": "http://127.0.0.1:1/api/v1/",
                "bundle": [{"name": "agent", "path": "/opt/agent/bin"}],
                "trigger": ["systemctl", "restart", "fleet-agent"]
            }"#,
        );
        let settings = LoaderSettings::resolve(Overrides::default(), Some(file)).unwrap();

        let files = settings.bundle_source().unwrap().managed_files().unwrap();
        assert_eq!(files, vec![ManagedFile::new("agent", "/opt/agent/bin")]);
        assert_eq!(settings.trigger().unwrap().describe(), "systemctl restart fleet-agent");
        assert_eq!(settings.parameters().operator, "default");
    }

    #[test]
    fn test_defaults_without_file_entries() {
        let overrides = Overrides {
            api_url: Some("http://127.0.0.1:1/api/v1/".to_string()),
            ..Overrides::default()
        };
        let settings = LoaderSettings::resolve(overrides, None).unwrap();

        assert_eq!(settings.timeout, None);
        assert_eq!(settings.trigger().unwrap().describe(), "no trigger");
        assert!(settings.into_driver().is_ok());
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = FileConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(
            FileConfig::load(&dir.path().join("absent.json")).unwrap_err().kind(),
            ErrorKind::Filesystem
        );
    }
}
