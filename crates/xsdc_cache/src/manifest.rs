//! Build manifest that records the inputs and dependency graph of one
//! compilation.
//!
//! The manifest is stored as `manifest.json` next to the compiled output.
//! It records the content digest of every schema file that went into the
//! build, plus the namespace-level dependency data needed to decide what
//! an edited file invalidates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xsdc_common::ContentHash;
use xsdc_state::DependencyTracker;

use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
const MANIFEST_FILE: &str = "manifest.json";

/// Top-level build manifest.
///
/// `BTreeMap` keeps the serialized form stable across runs, so a rebuild
/// that changes nothing produces a byte-identical manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Compiler version that produced this manifest. Invalidate on change.
    pub compiler_version: String,

    /// Name of the type system this build produced.
    pub system_name: String,

    /// Per-input-file state, keyed by source URL.
    pub files: BTreeMap<String, FileEntry>,

    /// Namespace URI → source files that contributed definitions to it.
    pub contributions: BTreeMap<String, Vec<String>>,

    /// Namespace URI → namespaces whose definitions referenced it.
    pub dependents: BTreeMap<String, Vec<String>>,
}

/// Recorded state of one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Content digest of the file when it was last compiled.
    pub digest: ContentHash,
}

impl BuildManifest {
    /// Creates an empty manifest for the given compiler version and system.
    pub fn new(compiler_version: &str, system_name: &str) -> Self {
        Self {
            compiler_version: compiler_version.to_string(),
            system_name: system_name.to_string(),
            files: BTreeMap::new(),
            contributions: BTreeMap::new(),
            dependents: BTreeMap::new(),
        }
    }

    /// Loads the manifest from the cache directory, returning `None` if
    /// the file doesn't exist or can't be parsed.
    ///
    /// Fail-safe: any error is a cache miss and triggers a full rebuild.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the manifest to the cache directory, creating it if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if this manifest was produced by a compatible
    /// compiler version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.compiler_version == current_version
    }

    /// Records the dependency data of a finished compilation.
    pub fn record_tracker(&mut self, tracker: &DependencyTracker) {
        self.contributions.clear();
        self.dependents.clear();
        for (ns, files) in tracker.contributions() {
            self.contributions.insert(ns.to_string(), files.to_vec());
        }
        for (target, deps) in tracker.dependent_edges() {
            self.dependents.insert(
                target.to_string(),
                deps.into_iter().map(str::to_string).collect(),
            );
        }
    }

    /// Rebuilds a [`DependencyTracker`] from the persisted dependency data.
    pub fn restore_tracker(&self) -> DependencyTracker {
        let mut tracker = DependencyTracker::new();
        for (ns, files) in &self.contributions {
            for f in files {
                tracker.register_contribution(ns, f);
            }
        }
        for (target, deps) in &self.dependents {
            for source in deps {
                tracker.register_dependency(source, target);
            }
        }
        tracker
    }
}
