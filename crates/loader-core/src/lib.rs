//! # Loader Core
//!
//! Core types for the Fleet Loader, the self-update client that keeps an
//! agent installation in line with the manifest published by the fleet's
//! manifest service.
//!
//! ## Model
//! - [`BundleEntry`]: a local managed file and its current digest ("have")
//! - [`ManifestEntry`]: the service's expected digest for a file ("want")
//! - [`ManifestParameters`]: the OS/arch/operator key of a request
//!
//! ## Errors
//! Every failure is a [`LoaderError`] wrapped with the [`Step`] that produced
//! it and classified by [`ErrorKind`].

pub mod bundle;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod platform;

pub use bundle::{BundleEntry, ContentHash, ManagedFile, NOT_FOUND};
pub use error::{ErrorKind, LoaderError, Result, Step, StepContext};
pub use manifest::{FetchResponse, Manifest, ManifestEntry, ManifestParameters};
pub use platform::Platform;

/// Current Fleet Loader version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information for logs and debugging
pub const BUILD_INFO: &str = concat!(
    "Fleet Loader ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_NAME"),
    ")"
);

/// Operator tag used when the configuration leaves it unset
pub const DEFAULT_OPERATOR: &str = "default";

/// Manifest service endpoints, relative to the API base URL
pub mod endpoints {
    pub const MANIFEST: &str = "manifest";
    pub const MANIFEST_FETCH: &str = "manifest/fetch";
}
