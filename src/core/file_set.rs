//! File set for collecting JS/TS files to analyze.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::RegexSet;

use super::{Error, Result};
use crate::config::{Config, DiscoveryConfig};

/// Compiled form of [`DiscoveryConfig`].
#[derive(Debug, Clone)]
pub struct DiscoveryPolicy {
    extensions: Vec<String>,
    excluded_dir_fragments: Vec<String>,
    test_markers: Vec<String>,
    test_marker_exemptions: Vec<String>,
    skip_files: RegexSet,
    exclude: GlobSet,
    respect_gitignore: bool,
}

impl DiscoveryPolicy {
    /// Compile the policy, rejecting invalid regexes and globs.
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let skip_files = RegexSet::new(&config.skip_file_patterns)
            .map_err(|e| Error::config(format!("invalid skip_file_patterns: {e}")))?;

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("invalid exclude glob {pattern:?}: {e}")))?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|e| Error::config(format!("invalid exclude globs: {e}")))?;

        Ok(Self {
            extensions: config.extensions.clone(),
            excluded_dir_fragments: config.excluded_dir_fragments.clone(),
            test_markers: config
                .test_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            test_marker_exemptions: config
                .test_marker_exemptions
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            skip_files,
            exclude,
            respect_gitignore: config.respect_gitignore,
        })
    }

    /// Whether a directory with this name is descended into.
    pub fn accepts_dir(&self, name: &str) -> bool {
        if self
            .excluded_dir_fragments
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
        {
            return false;
        }
        !self.is_test_dir(name)
    }

    /// A directory is a test directory when its lowercased name contains a
    /// marker that is not directly preceded by an exemption.
    pub fn is_test_dir(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.test_markers.iter().any(|marker| {
            lower.match_indices(marker.as_str()).any(|(start, _)| {
                let before = &lower[..start];
                !self
                    .test_marker_exemptions
                    .iter()
                    .any(|exemption| before.ends_with(exemption.as_str()))
            })
        })
    }

    /// Whether a file with this name is analyzed.
    ///
    /// The extension is whatever follows the last dot and is matched exactly.
    pub fn accepts_file(&self, name: &str) -> bool {
        let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self.extensions.iter().any(|allowed| allowed == ext) {
            return false;
        }
        !self.skip_files.is_match(name)
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        !self.exclude.is_empty() && self.exclude.is_match(relative)
    }
}

/// A sorted set of source files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSet {
    /// Root directory.
    root: PathBuf,
    /// All files in the set.
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Create a file set from a directory path.
    pub fn from_path(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let policy = DiscoveryPolicy::new(&config.discovery)?;
        Self::with_policy(path, policy)
    }

    /// Create a file set from a directory path with the default policy.
    pub fn from_path_default(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path(path, &Config::default())
    }

    /// Walk `path` applying a compiled discovery policy.
    pub fn with_policy(path: impl AsRef<Path>, policy: DiscoveryPolicy) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::invalid_root(path, "path does not exist"));
        }
        if !path.is_dir() {
            return Err(Error::invalid_root(path, "not a directory"));
        }
        let root = path.canonicalize()?;

        let policy = Arc::new(policy);
        let dir_policy = Arc::clone(&policy);
        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(false)
            .git_ignore(policy.respect_gitignore)
            .git_exclude(policy.respect_gitignore)
            .ignore(policy.respect_gitignore)
            .require_git(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                match entry.file_type() {
                    Some(ft) if ft.is_dir() => dir_policy.accepts_dir(&entry.file_name().to_string_lossy()),
                    _ => true,
                }
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !policy.accepts_file(&name) {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if policy.is_excluded(relative) {
                tracing::debug!("Excluded by glob: {}", relative.display());
                continue;
            }
            files.push(entry.into_path());
        }

        // Sort for deterministic ordering
        files.sort();
        tracing::debug!("Discovered {} files under {}", files.len(), root.display());

        Ok(Self { root, files })
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get all files in the set.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over files.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Get relative path from root.
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
