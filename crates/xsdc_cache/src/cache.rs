//! High-level recompilation cache.
//!
//! Ties the build manifest, input hasher, and persisted dependency
//! tracker into one interface for the compile pipeline: load the previous
//! build's state, detect which inputs changed, and expand the change to
//! the full set of namespaces and files that must be recompiled.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use xsdc_common::ContentHash;
use xsdc_state::DependencyTracker;

use crate::error::CacheError;
use crate::hasher::{ChangeSet, InputHasher};
use crate::manifest::{BuildManifest, FileEntry};

/// What an incremental build has to redo.
#[derive(Debug)]
pub struct RebuildPlan {
    /// `true` when no previous state is usable and everything must be
    /// compiled from scratch.
    pub full_rebuild: bool,

    /// Namespaces invalidated by the change, including every namespace
    /// that transitively depends on a changed one.
    pub stale_namespaces: HashSet<String>,

    /// Source files that must be re-translated, sorted.
    pub files_to_recompile: Vec<String>,
}

impl RebuildPlan {
    /// A plan that redoes nothing.
    pub fn nothing() -> Self {
        Self {
            full_rebuild: false,
            stale_namespaces: HashSet::new(),
            files_to_recompile: Vec::new(),
        }
    }

    /// Returns `true` if nothing needs recompiling.
    pub fn is_empty(&self) -> bool {
        !self.full_rebuild && self.stale_namespaces.is_empty()
    }
}

/// Cache manager for incremental schema compilation.
///
/// Reads are fail-safe: a missing, corrupt, or version-incompatible
/// manifest means a full rebuild, never an error.
pub struct BuildCache {
    cache_dir: PathBuf,
    manifest: BuildManifest,
    had_previous_build: bool,
}

impl BuildCache {
    /// Loads the previous build's state or starts fresh.
    ///
    /// An existing manifest is used only if it was written by a
    /// compatible compiler version for the same type system.
    pub fn load_or_create(cache_dir: &Path, compiler_version: &str, system_name: &str) -> Self {
        let loaded = BuildManifest::load(cache_dir)
            .filter(|m| m.is_compatible(compiler_version) && m.system_name == system_name);
        let had_previous_build = loaded.is_some();
        Self {
            cache_dir: cache_dir.to_path_buf(),
            manifest: loaded
                .unwrap_or_else(|| BuildManifest::new(compiler_version, system_name)),
            had_previous_build,
        }
    }

    /// Compares the current input digests against the previous build.
    pub fn detect_changes(&self, current: &HashMap<String, ContentHash>) -> ChangeSet {
        InputHasher::detect_changes(current, &self.manifest)
    }

    /// Expands a change set into the namespaces and files to recompile.
    ///
    /// A changed file invalidates every namespace it contributed to, and
    /// the dependency closure pulls in every namespace whose definitions
    /// referenced an invalidated one.
    pub fn plan_rebuild(&self, changes: &ChangeSet) -> RebuildPlan {
        if !self.had_previous_build {
            return RebuildPlan {
                full_rebuild: true,
                stale_namespaces: HashSet::new(),
                files_to_recompile: Vec::new(),
            };
        }
        if changes.is_empty() {
            return RebuildPlan::nothing();
        }

        let tracker = self.manifest.restore_tracker();
        let seeds = tracker.namespaces_touched(changes.dirty());
        let stale_namespaces = tracker.transitive_closure(seeds.iter().map(String::as_str));

        let mut files =
            tracker.files_touched(stale_namespaces.iter().map(String::as_str));
        for f in &changes.new_files {
            if !files.contains(f) {
                files.push(f.clone());
            }
        }
        files.retain(|f| !changes.deleted_files.contains(f));
        files.sort();

        RebuildPlan {
            full_rebuild: false,
            stale_namespaces,
            files_to_recompile: files,
        }
    }

    /// Restores the previous build's dependency tracker, empty when there
    /// was no previous build.
    pub fn restore_tracker(&self) -> DependencyTracker {
        self.manifest.restore_tracker()
    }

    /// Records a finished build: the digests of every input that went in
    /// and the dependency tracker the compilation produced.
    pub fn record_build(
        &mut self,
        digests: &HashMap<String, ContentHash>,
        tracker: &DependencyTracker,
    ) {
        self.manifest.files = digests
            .iter()
            .map(|(url, &digest)| (url.clone(), FileEntry { digest }))
            .collect();
        self.manifest.record_tracker(tracker);
        self.had_previous_build = true;
    }

    /// Persists the manifest.
    pub fn save(&self) -> Result<(), CacheError> {
        self.manifest.save(&self.cache_dir)
    }

    /// The current manifest.
    pub fn manifest(&self) -> &BuildManifest {
        &self.manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digests(files: &[(&str, &[u8])]) -> HashMap<String, ContentHash> {
        files
            .iter()
            .map(|(url, content)| (url.to_string(), ContentHash::from_bytes(content)))
            .collect()
    }

    /// Previous build: a.xsd defines http://a, b.xsd defines http://b,
    /// and b's definitions referenced a's.
    fn seeded_cache(dir: &Path) -> BuildCache {
        let mut cache = BuildCache::load_or_create(dir, "0.1.0", "shipping");
        let mut tracker = DependencyTracker::new();
        tracker.register_contribution("http://a", "file:///a.xsd");
        tracker.register_contribution("http://b", "file:///b.xsd");
        tracker.register_dependency("http://b", "http://a");
        cache.record_build(
            &digests(&[("file:///a.xsd", b"a v1"), ("file:///b.xsd", b"b v1")]),
            &tracker,
        );
        cache.save().unwrap();
        BuildCache::load_or_create(dir, "0.1.0", "shipping")
    }

    #[test]
    fn first_build_is_full() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BuildCache::load_or_create(dir.path(), "0.1.0", "shipping");
        let changes = cache.detect_changes(&digests(&[("file:///a.xsd", b"a")]));
        assert!(cache.plan_rebuild(&changes).full_rebuild);
    }

    #[test]
    fn unchanged_inputs_rebuild_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path());
        let changes = cache.detect_changes(&digests(&[
            ("file:///a.xsd", b"a v1"),
            ("file:///b.xsd", b"b v1"),
        ]));
        assert!(cache.plan_rebuild(&changes).is_empty());
    }

    #[test]
    fn edit_propagates_through_dependency_closure() {
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path());
        let changes = cache.detect_changes(&digests(&[
            ("file:///a.xsd", b"a v2"),
            ("file:///b.xsd", b"b v1"),
        ]));
        let plan = cache.plan_rebuild(&changes);
        assert!(!plan.full_rebuild);
        // b depends on a, so editing a recompiles both
        assert!(plan.stale_namespaces.contains("http://a"));
        assert!(plan.stale_namespaces.contains("http://b"));
        assert_eq!(
            plan.files_to_recompile,
            vec!["file:///a.xsd", "file:///b.xsd"]
        );
    }

    #[test]
    fn independent_namespace_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path());
        let changes = cache.detect_changes(&digests(&[
            ("file:///a.xsd", b"a v1"),
            ("file:///b.xsd", b"b v2"),
        ]));
        let plan = cache.plan_rebuild(&changes);
        // nothing depends on b
        assert!(!plan.stale_namespaces.contains("http://a"));
        assert_eq!(plan.files_to_recompile, vec!["file:///b.xsd"]);
    }

    #[test]
    fn version_mismatch_forces_full_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        seeded_cache(dir.path());
        let cache = BuildCache::load_or_create(dir.path(), "0.2.0", "shipping");
        let changes = cache.detect_changes(&digests(&[("file:///a.xsd", b"a v1")]));
        assert!(cache.plan_rebuild(&changes).full_rebuild);
    }

    #[test]
    fn system_name_mismatch_forces_full_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        seeded_cache(dir.path());
        let cache = BuildCache::load_or_create(dir.path(), "0.1.0", "other-system");
        let changes = cache.detect_changes(&digests(&[("file:///a.xsd", b"a v1")]));
        assert!(cache.plan_rebuild(&changes).full_rebuild);
    }
}
