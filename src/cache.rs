//! Output cache for incremental generation.
//!
//! Rewriting every generated file on each run touches their modification
//! times, which makes the host crate rebuild its bindings from scratch. The
//! generate stage consults this cache to leave unchanged files alone and to
//! find files written by an earlier run that are no longer produced.
//!
//! ## Cache keys
//!
//! Entries map an output path (relative to the output directory) to the
//! SHA-256 of the contents last written there. A file is current when:
//! 1. the manifest records the same hash for its path, and
//! 2. the file on disk still hashes to it (so hand edits are overwritten).
//!
//! ## Storage
//!
//! The manifest is a JSON file at `<output_dir>/.interop-cache.json`. Pass
//! `--no-cache` to `generate` to start from an empty manifest; every file is
//! then rewritten and nothing is pruned.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
pub const MANIFEST_FILENAME: &str = ".interop-cache.json";

/// Bump to invalidate existing manifests when the format changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub content_hash: String,
}

/// On-disk record of the files the last run wrote.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or the first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Whether `relative` already holds contents hashing to `content_hash`.
    pub fn is_current(&self, relative: &str, content_hash: &str, output_dir: &Path) -> bool {
        let Some(entry) = self.entries.get(relative) else {
            return false;
        };
        if entry.content_hash != content_hash {
            return false;
        }
        hash_file(&output_dir.join(relative)).is_ok_and(|on_disk| on_disk == content_hash)
    }

    pub fn insert(&mut self, relative: String, content_hash: String) {
        self.entries.insert(relative, CacheEntry { content_hash });
    }

    /// Paths recorded by the manifest that are not in `keep`.
    pub fn stale_paths<'a>(&'a self, keep: &[String]) -> Vec<&'a str> {
        self.entries
            .keys()
            .filter(|path| !keep.contains(path))
            .map(String::as_str)
            .collect()
    }

    pub fn remove(&mut self, relative: &str) {
        self.entries.remove(relative);
    }
}

/// SHA-256 of in-memory contents, as a hex string.
pub fn hash_contents(contents: &str) -> String {
    format!("{:x}", Sha256::digest(contents.as_bytes()))
}

/// SHA-256 of a file's contents, as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Summary of a generate run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub written: u32,
    pub unchanged: u32,
    pub pruned: u32,
}

impl CacheStats {
    pub fn write(&mut self) {
        self.written += 1;
    }

    pub fn skip(&mut self) {
        self.unchanged += 1;
    }

    pub fn prune(&mut self) {
        self.pruned += 1;
    }

    /// Files produced by the run, written or not.
    pub fn total(&self) -> u32 {
        self.written + self.unchanged
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unchanged > 0 {
            write!(
                f,
                "{} written, {} unchanged ({} total)",
                self.written,
                self.unchanged,
                self.total()
            )?;
        } else {
            write!(f, "{} written", self.written)?;
        }
        if self.pruned > 0 {
            write!(f, ", {} pruned", self.pruned)?;
        }
        Ok(())
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
