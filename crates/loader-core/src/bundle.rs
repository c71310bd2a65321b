//! Bundle types: the files one agent installation is made of

use crate::digest::digests_match;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Rendering of [`ContentHash::NotFound`].
pub const NOT_FOUND: &str = "not found";

/// Local content digest of a managed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentHash {
    /// Hex-encoded SHA-256 of the file content.
    Digest(String),
    /// The file is absent or could not be read.
    NotFound,
}

impl ContentHash {
    /// Whether the local content already equals the manifest digest.
    /// A missing file never matches.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            ContentHash::Digest(digest) => digests_match(digest, expected),
            ContentHash::NotFound => false,
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHash::Digest(digest) => f.write_str(digest),
            ContentHash::NotFound => f.write_str(NOT_FOUND),
        }
    }
}

/// A file the loader is responsible for, before it has been hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFile {
    pub name: String,
    pub path: PathBuf,
}

impl ManagedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One managed file together with its current local digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub name: String,
    pub path: PathBuf,
    pub content_hash: ContentHash,
}

impl BundleEntry {
    pub fn new(file: ManagedFile, content_hash: ContentHash) -> Self {
        Self {
            name: file.name,
            path: file.path,
            content_hash,
        }
    }
}
