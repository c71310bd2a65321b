//! Bundle inventory: the "have" side of a reconciliation

use event_log::EventLog;
use loader_core::digest::digest_file;
use loader_core::{BundleEntry, ContentHash, LoaderError, ManagedFile, Result};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Supplies the list of files an installation is made of.
pub trait BundleSource: Send + Sync {
    fn managed_files(&self) -> Result<Vec<ManagedFile>>;
}

/// A fixed bundle definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBundle {
    files: Vec<ManagedFile>,
}

impl StaticBundle {
    pub fn new(files: Vec<ManagedFile>) -> Self {
        Self { files }
    }

    /// The standard agent installation layout for `os`.
    pub fn builtin(os: &str) -> Result<Self> {
        let layout: &[(&str, &str)] = match os {
            "linux" => &[
                ("agent", "/sbin/fleet-agent"),
                ("configuration", "/etc/fleet/agent.cfg"),
                ("agentcert", "/etc/fleet/agent.crt"),
                ("agentkey", "/etc/fleet/agent.key"),
                ("cacert", "/etc/fleet/ca.crt"),
            ],
            "darwin" => &[
                ("agent", "/usr/local/bin/fleet-agent"),
                ("configuration", "/etc/fleet/agent.cfg"),
                ("agentcert", "/etc/fleet/agent.crt"),
                ("agentkey", "/etc/fleet/agent.key"),
                ("cacert", "/etc/fleet/ca.crt"),
            ],
            "windows" => &[
                ("agent", r"C:\Program Files\fleet\fleet-agent.exe"),
                ("configuration", r"C:\Program Files\fleet\agent.cfg"),
                ("agentcert", r"C:\Program Files\fleet\agent.crt"),
                ("agentkey", r"C:\Program Files\fleet\agent.key"),
                ("cacert", r"C:\Program Files\fleet\ca.crt"),
            ],
            other => {
                return Err(LoaderError::InvalidConfig {
                    reason: format!("no built-in bundle for operating system {}", other),
                })
            }
        };
        Ok(Self::new(
            layout
                .iter()
                .map(|(name, path)| ManagedFile::new(*name, *path))
                .collect(),
        ))
    }
}

impl BundleSource for StaticBundle {
    fn managed_files(&self) -> Result<Vec<ManagedFile>> {
        if self.files.is_empty() {
            return Err(LoaderError::InvalidConfig {
                reason: "bundle definition is empty".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for file in &self.files {
            if file.name.is_empty() || file.path.as_os_str().is_empty() {
                return Err(LoaderError::InvalidConfig {
                    reason: "bundle entries need a name and a path".to_string(),
                });
            }
            if !seen.insert(file.name.as_str()) {
                return Err(LoaderError::InvalidConfig {
                    reason: format!("bundle entry {} is listed twice", file.name),
                });
            }
        }
        Ok(self.files.clone())
    }
}

/// Hash a file off the async worker.
pub(crate) async fn hash_path(path: &Path) -> io::Result<String> {
    let owned: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || digest_file(&owned))
        .await
        .map_err(io::Error::other)?
}

/// Hash every managed file. Files that cannot be read are reported as
/// [`ContentHash::NotFound`]; only an unusable bundle definition fails.
pub async fn inventory(source: &dyn BundleSource, events: &EventLog) -> Result<Vec<BundleEntry>> {
    let files = source.managed_files()?;
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let content_hash = match hash_path(&file.path).await {
            Ok(digest) => ContentHash::Digest(digest),
            Err(e) => {
                events
                    .debug(format!("{} unreadable: {}", file.path.display(), e))
                    .await;
                ContentHash::NotFound
            }
        };
        entries.push(BundleEntry::new(file, content_hash));
    }

    events.info("initialized local bundle information").await;
    for entry in &entries {
        events
            .info(format!(
                "{} {} -> {}",
                entry.name,
                entry.path.display(),
                entry.content_hash
            ))
            .await;
    }
    Ok(entries)
}
