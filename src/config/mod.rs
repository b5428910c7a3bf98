//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File discovery policy.
    pub discovery: DiscoveryConfig,
    /// Parser behaviour.
    pub parser: ParserConfig,
    /// Scoring configuration.
    pub score: ScoreConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `JSTS_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("JSTS_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from directory, looking for jsts.toml or .jsts/jsts.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `JSTS_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("jsts.toml")))
            .merge(Toml::file(dir.join(".jsts/jsts.toml")))
            .merge(Env::prefixed("JSTS_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Which directories and files are analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Allowed file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// A directory whose name contains any of these is not descended into.
    pub excluded_dir_fragments: Vec<String>,
    /// Markers of test directories, matched against the lowercased directory name.
    pub test_markers: Vec<String>,
    /// Prefixes that, directly preceding a test marker, cancel that occurrence
    /// (`createst`, `executest`).
    pub test_marker_exemptions: Vec<String>,
    /// Regex patterns for file names that are never analyzed.
    pub skip_file_patterns: Vec<String>,
    /// Extra glob patterns, matched against paths relative to the root.
    pub exclude: Vec<String>,
    /// Honour .gitignore and .ignore files.
    pub respect_gitignore: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: ["js", "ts", "cjs", "mjs", "es6", "jsx", "tsx", "es", "gs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_dir_fragments: [
                "node_modules",
                "instrumented",
                "bower_components",
                "fixture",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            test_markers: ["test", "spec", "cypress"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            test_marker_exemptions: ["crea", "execu"].iter().map(|s| s.to_string()).collect(),
            skip_file_patterns: [
                "babelrc",
                "eslintrc",
                "prettierrc",
                "commitlintrc",
                "Gruntfile",
                r"\.min",
                "fixture",
                r"\.conf",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude: Vec::new(),
            respect_gitignore: false,
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Retry a failed parse once with an alternative dialect.
    pub fallback: bool,
    /// Files larger than this many bytes are skipped (likely bundles).
    pub max_file_size: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            fallback: true,
            max_file_size: 1_000_000,
        }
    }
}

/// Score configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Reference dataset; the bundled one is used when unset.
    pub dataset: Option<PathBuf>,
    /// Minimum average score to pass.
    pub fail_under: Option<f64>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
    /// Color output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// Markdown format.
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(format!("Unknown format: {s}. Use 'text', 'json', or 'md'")),
        }
    }
}
