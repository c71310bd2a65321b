//! Secure install pipeline
//!
//! fetch -> stage -> re-hash -> compare -> rename. The live file is only
//! ever touched by the final rename, and only after the staged bytes hash to
//! the manifest's digest.

use crate::inventory::hash_path;
use event_log::EventLog;
use loader_core::digest::digests_match;
use loader_core::{BundleEntry, LoaderError, ManifestParameters, Result, Step, StepContext};
use manifest_client::ManifestSource;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Suffix appended to a managed path to form its staging path.
pub const STAGING_SUFFIX: &str = ".loader";

/// Staging path for `path`: same directory, so the final rename never
/// crosses a filesystem.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut staged: OsString = path.as_os_str().to_owned();
    staged.push(STAGING_SUFFIX);
    PathBuf::from(staged)
}

pub struct Installer<'a> {
    source: &'a dyn ManifestSource,
    params: &'a ManifestParameters,
    events: &'a EventLog,
}

impl<'a> Installer<'a> {
    pub fn new(
        source: &'a dyn ManifestSource,
        params: &'a ManifestParameters,
        events: &'a EventLog,
    ) -> Self {
        Self {
            source,
            params,
            events,
        }
    }

    /// Replace `entry.path` with the service's copy, provided it hashes to
    /// `expected`. On a mismatch the staged file stays behind for
    /// inspection and the live file is left as it was.
    #[instrument(skip_all, fields(name = %entry.name, path = %entry.path.display()))]
    pub async fn install(&self, entry: &BundleEntry, expected: &str) -> Result<()> {
        let bytes = self
            .source
            .fetch_file(&entry.name, self.params)
            .await
            .step(Step::FetchFile)?;

        let staged = staging_path(&entry.path);
        write_staged(&staged, &bytes).await.step(Step::Stage)?;

        self.events.info("validating staged file signature").await;
        let actual = hash_path(&staged)
            .await
            .map_err(|e| LoaderError::filesystem("hash staged file", &staged, e))
            .step(Step::Verify)?;
        if !digests_match(&actual, expected) {
            return Err(LoaderError::IntegrityMismatch {
                name: entry.name.clone(),
                expected: expected.to_string(),
                actual,
            })
            .step(Step::Verify);
        }

        self.events.info("installing staged file").await;
        tokio::fs::rename(&staged, &entry.path)
            .await
            .map_err(|e| LoaderError::filesystem("rename staged file", &entry.path, e))
            .step(Step::Install)?;

        info!(digest = %actual, "installed");
        Ok(())
    }
}

/// Write `bytes` to `path` with owner-only permissions and flush them to
/// disk before returning.
async fn write_staged(path: &Path, bytes: &[u8]) -> Result<()> {
    let fs_err =
        |operation: &'static str| move |e: std::io::Error| LoaderError::filesystem(operation, path, e);

    let mut options = tokio::fs::OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    options.mode(0o700);

    let mut file = options.open(path).await.map_err(fs_err("create staged file"))?;
    #[cfg(unix)]
    {
        // mode() only applies when the file is created.
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o700))
            .await
            .map_err(fs_err("restrict staged file"))?;
    }
    file.write_all(bytes).await.map_err(fs_err("write staged file"))?;
    file.sync_all().await.map_err(fs_err("sync staged file"))?;
    Ok(())
}
