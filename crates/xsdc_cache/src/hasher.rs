//! Input digesting and change detection.
//!
//! Compares the content digests of the current input set against the
//! build manifest to identify which schema files are new, modified,
//! deleted, or unchanged since the last compilation.

use std::collections::HashMap;
use std::path::Path;

use xsdc_common::ContentHash;

use crate::error::CacheError;
use crate::manifest::BuildManifest;

/// Result of comparing current input digests against the build manifest.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    /// Files that are not present in the manifest.
    pub new_files: Vec<String>,

    /// Files whose content digest differs from the manifest.
    pub modified_files: Vec<String>,

    /// Files present in the manifest but not in the current input set.
    pub deleted_files: Vec<String>,

    /// Files whose content digest matches the manifest.
    pub unchanged_files: Vec<String>,
}

impl ChangeSet {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Iterates every file URL that invalidates cached state: new,
    /// modified, and deleted files alike.
    pub fn dirty(&self) -> impl Iterator<Item = &str> {
        self.new_files
            .iter()
            .chain(&self.modified_files)
            .chain(&self.deleted_files)
            .map(String::as_str)
    }
}

/// Digests input files and compares them against the manifest.
pub struct InputHasher;

impl InputHasher {
    /// Computes the content digest of a single local file.
    pub fn digest_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Compares current input digests (keyed by source URL) against the
    /// manifest.
    pub fn detect_changes(
        current: &HashMap<String, ContentHash>,
        manifest: &BuildManifest,
    ) -> ChangeSet {
        let mut new_files = Vec::new();
        let mut modified_files = Vec::new();
        let mut unchanged_files = Vec::new();

        for (url, digest) in current {
            match manifest.files.get(url) {
                Some(entry) if entry.digest == *digest => unchanged_files.push(url.clone()),
                Some(_) => modified_files.push(url.clone()),
                None => new_files.push(url.clone()),
            }
        }

        let mut deleted_files: Vec<String> = manifest
            .files
            .keys()
            .filter(|url| !current.contains_key(*url))
            .cloned()
            .collect();

        // Sort for deterministic ordering.
        new_files.sort();
        modified_files.sort();
        unchanged_files.sort();
        deleted_files.sort();

        ChangeSet {
            new_files,
            modified_files,
            deleted_files,
            unchanged_files,
        }
    }
}
