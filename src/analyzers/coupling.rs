//! Efferent and afferent coupling estimated from import specifiers.
//!
//! Imports are not resolved. Each specifier is reduced to a candidate name
//! and every other file whose name matches it counts as imported. False
//! positives and negatives are accepted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Decides which files an import specifier refers to.
pub trait NameMatcher: Send + Sync {
    /// Candidate name derived from an import specifier.
    fn candidate<'a>(&self, specifier: &'a str) -> &'a str;

    /// Whether `file` is referred to by `candidate`.
    fn matches(&self, candidate: &str, file: &Path) -> bool;
}

/// Default matcher: the last `/` segment of the specifier, found anywhere in
/// the file name.
///
/// `./util` therefore matches `util.js`, `util.test.js` and `myutil.ts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasenameSubstringMatcher;

impl NameMatcher for BasenameSubstringMatcher {
    fn candidate<'a>(&self, specifier: &'a str) -> &'a str {
        specifier.rsplit('/').next().unwrap_or(specifier)
    }

    fn matches(&self, candidate: &str, file: &Path) -> bool {
        file.file_name()
            .map(|name| name.to_string_lossy().contains(candidate))
            .unwrap_or(false)
    }
}

/// Coupling counts of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupling {
    /// Imports made by the file.
    pub efferent: u32,
    /// Imports made by other files that match this file.
    pub afferent: u32,
}

/// Collects import specifiers per file, then computes coupling in one sweep.
pub struct CouplingEstimator {
    matcher: Box<dyn NameMatcher>,
    imports: BTreeMap<PathBuf, Vec<String>>,
}

impl Default for CouplingEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CouplingEstimator {
    pub fn new() -> Self {
        Self::with_matcher(BasenameSubstringMatcher)
    }

    pub fn with_matcher(matcher: impl NameMatcher + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
            imports: BTreeMap::new(),
        }
    }

    /// Record the import specifiers of `file`, in source order.
    pub fn record(&mut self, file: impl Into<PathBuf>, specifiers: Vec<String>) {
        self.imports.entry(file.into()).or_default().extend(specifiers);
    }

    /// Coupling for every file in `files`.
    ///
    /// Files without recorded imports still get an entry. A file never counts
    /// its own imports as afferent.
    pub fn estimate(&self, files: &[PathBuf]) -> BTreeMap<PathBuf, Coupling> {
        let mut result: BTreeMap<PathBuf, Coupling> = files
            .iter()
            .map(|f| (f.clone(), Coupling::default()))
            .collect();

        for (importer, specifiers) in &self.imports {
            result.entry(importer.clone()).or_default().efferent += specifiers.len() as u32;

            for specifier in specifiers {
                let candidate = self.matcher.candidate(specifier);
                for file in files {
                    if file != importer && self.matcher.matches(candidate, file) {
                        if let Some(coupling) = result.get_mut(file) {
                            coupling.afferent += 1;
                        }
                    }
                }
            }
        }

        result
    }
}
