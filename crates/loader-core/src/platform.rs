//! Host platform naming as the manifest service expects it

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system and architecture keys used in manifest requests.
///
/// The service keys manifests with the fleet's canonical names
/// (`linux`/`darwin`/`windows`, `amd64`/`386`/`arm64`/`arm`), which differ
/// from Rust's target naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    pub fn current() -> Self {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_target(os: &str, arch: &str) -> Self {
        Self::new(canonical_os(os), canonical_arch(arch))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn canonical_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn canonical_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
}
