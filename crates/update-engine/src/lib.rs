//! # Update Engine
//!
//! Brings a local agent bundle in line with the manifest service: hash the
//! local files, ask for the manifest, replace every file whose digest
//! differs through a staged and verified install, then run the trigger once.

pub use loader_core;

pub mod config;
pub mod driver;
pub mod install;
pub mod inventory;
pub mod reconcile;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use config::{FileConfig, LoaderSettings, Overrides};
pub use driver::UpdateDriver;
pub use install::{staging_path, Installer, STAGING_SUFFIX};
pub use inventory::{inventory, BundleSource, StaticBundle};
pub use reconcile::{decide, plan, Decision, PlannedAction, Reconciler, RunReport};
pub use trigger::{CommandTrigger, FnTrigger, NoopTrigger, Trigger};

// Re-export core types for convenience
pub use loader_core::{BundleEntry, ErrorKind, LoaderError, Manifest, ManifestParameters, Result};
