//! Update driver: one complete loader run

use crate::install::Installer;
use crate::inventory::{inventory, BundleSource};
use crate::reconcile::{Reconciler, RunReport};
use crate::trigger::Trigger;
use event_log::EventLog;
use loader_core::{ManifestParameters, Result, Step, StepContext};
use manifest_client::ManifestSource;
use tracing::{info, instrument};

/// Runs inventory, manifest request, reconciliation and, when anything was
/// replaced, the trigger. Holds no state between runs.
pub struct UpdateDriver {
    bundle: Box<dyn BundleSource>,
    source: Box<dyn ManifestSource>,
    trigger: Box<dyn Trigger>,
    params: ManifestParameters,
}

impl std::fmt::Debug for UpdateDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDriver")
            .field("params", &self.params)
            .field("trigger", &self.trigger.describe())
            .finish()
    }
}

impl UpdateDriver {
    pub fn new(
        bundle: Box<dyn BundleSource>,
        source: Box<dyn ManifestSource>,
        trigger: Box<dyn Trigger>,
        params: ManifestParameters,
    ) -> Self {
        Self {
            bundle,
            source,
            trigger,
            params,
        }
    }

    pub fn params(&self) -> &ManifestParameters {
        &self.params
    }

    /// One full run. The trigger fires at most once, after every entry has
    /// been reconciled. A trigger failure is returned as the run's error;
    /// files installed before it stay installed.
    #[instrument(skip_all, fields(os = %self.params.os, arch = %self.params.arch, operator = %self.params.operator))]
    pub async fn run(&self, events: &EventLog) -> Result<RunReport> {
        let have = inventory(self.bundle.as_ref(), events)
            .await
            .step(Step::Inventory)?;

        events
            .info(format!(
                "requesting manifest for {}/{} operator {}",
                self.params.os, self.params.arch, self.params.operator
            ))
            .await;
        let want = self
            .source
            .fetch_manifest(&self.params)
            .await
            .step(Step::RequestManifest)?;
        if let Some(loader_name) = &want.loader_name {
            events
                .info(format!("manifest issued for loader {}", loader_name))
                .await;
        }

        let installer = Installer::new(self.source.as_ref(), &self.params, events);
        let report = Reconciler::new(installer, events)
            .reconcile(&have, &want)
            .await
            .step(Step::Reconcile)?;

        if report.changed {
            events
                .info(format!("changes installed, running {}", self.trigger.describe()))
                .await;
            self.trigger.fire().await.step(Step::Trigger)?;
        }

        info!(changed = report.changed, "{}", report.summary());
        Ok(report)
    }
}
