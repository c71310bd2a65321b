//! Reconciliation of the local bundle against the manifest

use crate::install::Installer;
use event_log::EventLog;
use loader_core::{BundleEntry, Manifest, Result, Step, StepContext};
use serde::Serialize;

/// What to do with one local entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The manifest does not know this entry; it is managed locally.
    NotManaged,
    /// Local content already matches the manifest.
    UpToDate { expected: String },
    /// Local content differs and must be replaced.
    Refresh { expected: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub entry: BundleEntry,
    pub decision: Decision,
}

pub fn decide(entry: &BundleEntry, want: &Manifest) -> Decision {
    match want.find(&entry.name) {
        None => Decision::NotManaged,
        Some(remote) if entry.content_hash.matches(&remote.content_hash) => Decision::UpToDate {
            expected: remote.content_hash.clone(),
        },
        Some(remote) => Decision::Refresh {
            expected: remote.content_hash.clone(),
        },
    }
}

/// Decisions for every local entry, in inventory order. No side effects.
pub fn plan(have: &[BundleEntry], want: &Manifest) -> Vec<PlannedAction> {
    have.iter()
        .map(|entry| PlannedAction {
            entry: entry.clone(),
            decision: decide(entry, want),
        })
        .collect()
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// At least one file was replaced.
    pub changed: bool,
    pub installed: Vec<String>,
    pub unchanged: Vec<String>,
    pub not_managed: Vec<String>,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "{} installed, {} unchanged, {} not in manifest",
            self.installed.len(),
            self.unchanged.len(),
            self.not_managed.len()
        )
    }
}

pub struct Reconciler<'a> {
    installer: Installer<'a>,
    events: &'a EventLog,
}

impl<'a> Reconciler<'a> {
    pub fn new(installer: Installer<'a>, events: &'a EventLog) -> Self {
        Self { installer, events }
    }

    /// Walk `have` in order and install every entry whose digest differs
    /// from the manifest. The first failure stops the walk; later entries
    /// are not looked at.
    pub async fn reconcile(&self, have: &[BundleEntry], want: &Manifest) -> Result<RunReport> {
        let mut report = RunReport::default();
        for action in plan(have, want) {
            self.check_entry(action, &mut report)
                .await
                .step(Step::CheckEntry)?;
        }
        Ok(report)
    }

    async fn check_entry(&self, action: PlannedAction, report: &mut RunReport) -> Result<()> {
        let entry = action.entry;
        self.events
            .info(format!("comparing {} {}", entry.name, entry.path.display()))
            .await;

        match action.decision {
            Decision::NotManaged => {
                self.events.info("entry not in manifest, ignoring").await;
                report.not_managed.push(entry.name);
            }
            Decision::UpToDate { expected } => {
                self.log_comparison(&entry, &expected).await;
                self.events.info("nothing to do here").await;
                report.unchanged.push(entry.name);
            }
            Decision::Refresh { expected } => {
                self.log_comparison(&entry, &expected).await;
                report.changed = true;
                self.events
                    .info(format!("refreshing {}", entry.name))
                    .await;
                self.installer.install(&entry, &expected).await?;
                report.installed.push(entry.name);
            }
        }
        Ok(())
    }

    async fn log_comparison(&self, entry: &BundleEntry, expected: &str) {
        self.events
            .info(format!("we have {}", entry.content_hash))
            .await;
        self.events.info(format!("they have {}", expected)).await;
    }
}
