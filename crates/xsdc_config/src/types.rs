//! Configuration types deserialized from `xsdc.toml`.

use serde::Deserialize;

/// The top-level compiler configuration parsed from `xsdc.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CompilerConfig {
    /// Schema-compilation options (mdef policy, partial types).
    #[serde(default)]
    pub schema: SchemaOptions,
    /// Document download policy.
    #[serde(default)]
    pub download: DownloadConfig,
    /// Binary store layout.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Options governing symbol-table policy and error recovery.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SchemaOptions {
    /// Namespaces in which duplicate top-level definitions are downgraded
    /// to warnings (the later definition is discarded either way).
    ///
    /// Empty by default; duplicate definitions are hard errors unless a
    /// namespace is listed here or [`mdef_any`](Self::mdef_any) is set.
    #[serde(default)]
    pub mdef_namespaces: Vec<String>,

    /// Downgrades duplicate definitions to warnings in every namespace.
    #[serde(default)]
    pub mdef_any: bool,

    /// Allows a compile whose every error was recovered to yield an
    /// explicitly incomplete type system instead of failing.
    #[serde(default)]
    pub partial_types: bool,

    /// Asks the parser for line-number annotations on declarations.
    #[serde(default)]
    pub line_numbers: bool,
}

/// Policy for downloading referenced schema documents.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DownloadConfig {
    /// URL schemes for which downloads are disabled. When a reference to a
    /// disabled scheme names a namespace already represented by some
    /// loaded file, that file is reused silently.
    #[serde(default)]
    pub disabled_schemes: Vec<String>,

    /// Base URI used to absolutize relative locations that have no
    /// referencing document (i.e. the initial document set).
    #[serde(default)]
    pub base_uri: Option<String>,
}

impl DownloadConfig {
    /// Returns `true` if downloads are disabled for the given URL scheme.
    pub fn is_scheme_disabled(&self, scheme: &str) -> bool {
        self.disabled_schemes.iter().any(|s| s == scheme)
    }
}

/// Layout of the on-disk binary store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory (relative to the store root) that component units are
    /// written under: `<base_package>/<handle>.xsb`.
    #[serde(default = "default_base_package")]
    pub base_package: String,
}

fn default_base_package() -> String {
    "schema".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_package: default_base_package(),
        }
    }
}

impl SchemaOptions {
    /// Returns `true` if duplicate definitions in `namespace` are
    /// downgraded to warnings under the configured mdef policy.
    pub fn mdef_allows(&self, namespace: &str) -> bool {
        self.mdef_any || self.mdef_namespaces.iter().any(|ns| ns == namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let opts = SchemaOptions::default();
        assert!(!opts.mdef_allows("http://a"));
        assert!(!opts.partial_types);
    }

    #[test]
    fn mdef_listed_namespace() {
        let opts = SchemaOptions {
            mdef_namespaces: vec!["http://legacy".to_string()],
            ..Default::default()
        };
        assert!(opts.mdef_allows("http://legacy"));
        assert!(!opts.mdef_allows("http://other"));
    }

    #[test]
    fn mdef_any_is_blanket() {
        let opts = SchemaOptions {
            mdef_any: true,
            ..Default::default()
        };
        assert!(opts.mdef_allows("anything"));
    }

    #[test]
    fn scheme_disabled() {
        let dl = DownloadConfig {
            disabled_schemes: vec!["http".to_string(), "https".to_string()],
            ..Default::default()
        };
        assert!(dl.is_scheme_disabled("http"));
        assert!(!dl.is_scheme_disabled("file"));
    }
}
