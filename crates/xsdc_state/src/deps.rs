//! Namespace-level dependency tracking for incremental recompilation.

use std::collections::{HashMap, HashSet};
use xsdc_common::{Ident, Interner};

/// Records which files contributed to which namespaces and which
/// namespaces depend on which.
///
/// Dependency edges are stored in the reverse direction, `target →
/// {dependents}`, so the tracker directly answers "if this namespace
/// changes, who is affected." Namespace URIs are interned; the public API
/// is string-based.
pub struct DependencyTracker {
    interner: Interner,
    /// namespace → source files that contributed to it, in first-seen order.
    contributions: HashMap<Ident, Vec<String>>,
    /// target namespace → namespaces that depend on it.
    dependents: HashMap<Ident, HashSet<Ident>>,
}

impl DependencyTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            contributions: HashMap::new(),
            dependents: HashMap::new(),
        }
    }

    /// Records that translation in `source` looked up a component in
    /// `target` within this compilation.
    pub fn register_dependency(&mut self, source: &str, target: &str) {
        let source = self.interner.get_or_intern(source);
        let target = self.interner.get_or_intern(target);
        self.dependents.entry(target).or_default().insert(source);
    }

    /// Records that `file_url` contributed definitions to `namespace`.
    pub fn register_contribution(&mut self, namespace: &str, file_url: &str) {
        let ns = self.interner.get_or_intern(namespace);
        let files = self.contributions.entry(ns).or_default();
        if !files.iter().any(|f| f == file_url) {
            files.push(file_url.to_string());
        }
    }

    /// Computes the set of namespaces affected, directly or indirectly, by
    /// a change to the seed namespaces.
    ///
    /// The result is always a superset of the seeds and is a fixed point:
    /// re-running the closure on its own output returns the same set.
    pub fn transitive_closure<'a, I>(&self, seeds: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut closed: HashSet<Ident> = HashSet::new();
        let mut worklist: Vec<Ident> = Vec::new();
        for seed in seeds {
            let id = self.interner.get_or_intern(seed);
            if closed.insert(id) {
                worklist.push(id);
            }
        }
        while let Some(ns) = worklist.pop() {
            if let Some(deps) = self.dependents.get(&ns) {
                for &dep in deps {
                    if closed.insert(dep) {
                        worklist.push(dep);
                    }
                }
            }
        }
        closed
            .into_iter()
            .map(|id| self.interner.resolve(id).to_string())
            .collect()
    }

    /// Returns all files that contributed to any of the given namespaces,
    /// deduplicated and sorted.
    pub fn files_touched<'a, I>(&self, namespaces: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut files: Vec<String> = Vec::new();
        for ns in namespaces {
            if let Some(id) = self.interner.get(ns) {
                if let Some(contrib) = self.contributions.get(&id) {
                    for f in contrib {
                        if !files.contains(f) {
                            files.push(f.clone());
                        }
                    }
                }
            }
        }
        files.sort();
        files
    }

    /// Returns the namespaces any of the given files contributed to.
    pub fn namespaces_touched<'a, I>(&self, files: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let files: HashSet<&str> = files.into_iter().collect();
        let mut namespaces = HashSet::new();
        for (&ns, contrib) in &self.contributions {
            if contrib.iter().any(|f| files.contains(f.as_str())) {
                namespaces.insert(self.interner.resolve(ns).to_string());
            }
        }
        namespaces
    }

    /// Derives a tracker with the given namespaces excised.
    ///
    /// Contributions of excised namespaces and every edge touching one are
    /// dropped; unaffected dependency data is carried forward unchanged.
    /// Used when rebuilding only the changed namespaces.
    pub fn without_namespaces(&self, excised: &HashSet<String>) -> DependencyTracker {
        let mut derived = DependencyTracker::new();
        for (&ns, files) in &self.contributions {
            let ns = self.interner.resolve(ns);
            if excised.contains(ns) {
                continue;
            }
            for f in files {
                derived.register_contribution(ns, f);
            }
        }
        for (&target, sources) in &self.dependents {
            let target_s = self.interner.resolve(target);
            if excised.contains(target_s) {
                continue;
            }
            for &source in sources {
                let source_s = self.interner.resolve(source);
                if excised.contains(source_s) {
                    continue;
                }
                derived.register_dependency(source_s, target_s);
            }
        }
        derived
    }

    /// Iterates `(namespace, contributing files)` pairs for persistence.
    pub fn contributions(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.contributions
            .iter()
            .map(|(&ns, files)| (self.interner.resolve(ns), files.as_slice()))
    }

    /// Iterates `(target namespace, dependent namespaces)` pairs for
    /// persistence, dependents sorted for determinism.
    pub fn dependent_edges(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.dependents.iter().map(|(&target, sources)| {
            let mut deps: Vec<&str> = sources.iter().map(|&s| self.interner.resolve(s)).collect();
            deps.sort_unstable();
            (self.interner.resolve(target), deps)
        })
    }

    /// Absorbs the contents of another tracker (used when merging the
    /// carried-forward tracker with the edges of an incremental rebuild).
    pub fn absorb(&mut self, other: &DependencyTracker) {
        for (ns, files) in other.contributions() {
            for f in files {
                self.register_contribution(ns, f);
            }
        }
        for (target, sources) in other.dependent_edges() {
            for source in sources {
                self.register_dependency(source, target);
            }
        }
    }
}

impl Default for DependencyTracker {
    fn default() -> Self {
        Self::new()
    }
}
