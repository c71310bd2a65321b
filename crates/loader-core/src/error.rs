//! Error types for the Fleet Loader

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Pipeline step that produced a failure.
///
/// Every error that leaves a step is wrapped with the step's name, so the
/// final message reads as a chain such as
/// `reconcile -> check_entry -> verify -> staged file signature mismatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Configure,
    Inventory,
    RequestManifest,
    Reconcile,
    CheckEntry,
    FetchFile,
    Stage,
    Verify,
    Install,
    Trigger,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Configure => "configure",
            Step::Inventory => "inventory",
            Step::RequestManifest => "request_manifest",
            Step::Reconcile => "reconcile",
            Step::CheckEntry => "check_entry",
            Step::FetchFile => "fetch_file",
            Step::Stage => "stage",
            Step::Verify => "verify",
            Step::Install => "install",
            Step::Trigger => "trigger",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classes. Callers decide fatality from the kind, never from the
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request construction, network, non-2xx status, malformed envelope.
    Transport,
    /// Payload shape or compression stream is wrong.
    Decode,
    /// Recomputed digest differs from the manifest.
    Integrity,
    /// Staging, reading or renaming on the local filesystem.
    Filesystem,
    /// The post-update action failed.
    Trigger,
    /// Local configuration or bundle definition is unusable.
    Config,
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{step} -> {source}")]
    Step {
        step: Step,
        #[source]
        source: Box<LoaderError>,
    },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed response envelope: {reason}")]
    Envelope { reason: String },

    #[error("decode failed: {reason}")]
    Decode { reason: String },

    #[error("staged file signature mismatch for {name}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("{} on {} failed: {source}", .operation, .path.display())]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trigger failed: {reason}")]
    Trigger { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

impl LoaderError {
    pub fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        LoaderError::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap this error with the step that observed it.
    pub fn in_step(self, step: Step) -> Self {
        LoaderError::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The innermost error, below every step wrapper.
    pub fn root(&self) -> &LoaderError {
        match self {
            LoaderError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Steps this error passed through, outermost first.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut current = self;
        while let LoaderError::Step { step, source } = current {
            steps.push(*step);
            current = source;
        }
        steps
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoaderError::Step { source, .. } => source.kind(),
            LoaderError::Transport { .. }
            | LoaderError::HttpStatus { .. }
            | LoaderError::Envelope { .. } => ErrorKind::Transport,
            LoaderError::Decode { .. } | LoaderError::SerializationError { .. } => {
                ErrorKind::Decode
            }
            LoaderError::IntegrityMismatch { .. } => ErrorKind::Integrity,
            LoaderError::Filesystem { .. } => ErrorKind::Filesystem,
            LoaderError::Trigger { .. } => ErrorKind::Trigger,
            LoaderError::InvalidConfig { .. } => ErrorKind::Config,
        }
    }
}

/// Attach step context to a fallible result.
pub trait StepContext<T> {
    fn step(self, step: Step) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn step(self, step: Step) -> Result<T> {
        self.map_err(|e| e.in_step(step))
    }
}
