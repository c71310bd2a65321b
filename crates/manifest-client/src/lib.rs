//! # Manifest Client
//!
//! Fetches the authoritative manifest and individual replacement files from
//! the fleet manifest service. The two calls stay separate: the manifest's
//! digest is what every fetched file is later checked against.

mod client;
pub mod envelope;

pub use client::{decompress, HttpManifestClient, ManifestSource};

// Re-export core types for convenience
pub use loader_core::{Manifest, ManifestEntry, ManifestParameters, Result};
