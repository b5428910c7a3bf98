//! Metrics pass: one [`FileRecord`] per discovered file.
//!
//! Each file is parsed once. The complexity report and tree metrics come
//! from that tree, and the import specifiers are kept for the coupling
//! sweep that runs after every file has been seen.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::aggregate::AggregateStat;
use super::complexity::{self, ComplexityAnalyzer, ComplexityReport, EscomplexAnalyzer};
use super::coupling::CouplingEstimator;
use super::tree_metrics;
use crate::config::Config;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Error, Result, SourceFile, Summary};
use crate::parser::{self, Parser, SourceParser};

/// A metric key. Serialized names are the keys of the reference dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "locM")]
    LocM,
    #[serde(rename = "loccM")]
    LoccM,
    #[serde(rename = "loclM")]
    LoclM,
    #[serde(rename = "ccM")]
    CcM,
    #[serde(rename = "hbugsM")]
    HbugsM,
    #[serde(rename = "hdiffM")]
    HdiffM,
    #[serde(rename = "heffortM")]
    HeffortM,
    #[serde(rename = "hlengthM")]
    HlengthM,
    #[serde(rename = "htimeM")]
    HtimeM,
    #[serde(rename = "hvocabM")]
    HvocabM,
    #[serde(rename = "hvolM")]
    HvolM,
    #[serde(rename = "paramM")]
    ParamM,
    #[serde(rename = "maintainM")]
    MaintainM,
    #[serde(rename = "noF")]
    NoF,
    #[serde(rename = "locF")]
    LocF,
    #[serde(rename = "loclF")]
    LoclF,
    #[serde(rename = "ccF")]
    CcF,
    #[serde(rename = "hbugsF")]
    HbugsF,
    #[serde(rename = "hdiffF")]
    HdiffF,
    #[serde(rename = "heffortF")]
    HeffortF,
    #[serde(rename = "hlengthF")]
    HlengthF,
    #[serde(rename = "htimeF")]
    HtimeF,
    #[serde(rename = "hvocabF")]
    HvocabF,
    #[serde(rename = "hvolF")]
    HvolF,
    #[serde(rename = "paramF")]
    ParamF,
    #[serde(rename = "nofM")]
    NofM,
    #[serde(rename = "dpM")]
    DpM,
    #[serde(rename = "dpF")]
    DpF,
    #[serde(rename = "mcM")]
    McM,
    #[serde(rename = "ecM")]
    EcM,
    #[serde(rename = "acM")]
    AcM,
}

impl Metric {
    /// Every metric, in record order.
    pub const ALL: [Metric; 31] = [
        Metric::LocM,
        Metric::LoccM,
        Metric::LoclM,
        Metric::CcM,
        Metric::HbugsM,
        Metric::HdiffM,
        Metric::HeffortM,
        Metric::HlengthM,
        Metric::HtimeM,
        Metric::HvocabM,
        Metric::HvolM,
        Metric::ParamM,
        Metric::MaintainM,
        Metric::NoF,
        Metric::LocF,
        Metric::LoclF,
        Metric::CcF,
        Metric::HbugsF,
        Metric::HdiffF,
        Metric::HeffortF,
        Metric::HlengthF,
        Metric::HtimeF,
        Metric::HvocabF,
        Metric::HvolF,
        Metric::ParamF,
        Metric::NofM,
        Metric::DpM,
        Metric::DpF,
        Metric::McM,
        Metric::EcM,
        Metric::AcM,
    ];

    /// The dataset key, e.g. `ccM`.
    pub fn key(self) -> &'static str {
        match self {
            Self::LocM => "locM",
            Self::LoccM => "loccM",
            Self::LoclM => "loclM",
            Self::CcM => "ccM",
            Self::HbugsM => "hbugsM",
            Self::HdiffM => "hdiffM",
            Self::HeffortM => "heffortM",
            Self::HlengthM => "hlengthM",
            Self::HtimeM => "htimeM",
            Self::HvocabM => "hvocabM",
            Self::HvolM => "hvolM",
            Self::ParamM => "paramM",
            Self::MaintainM => "maintainM",
            Self::NoF => "noF",
            Self::LocF => "locF",
            Self::LoclF => "loclF",
            Self::CcF => "ccF",
            Self::HbugsF => "hbugsF",
            Self::HdiffF => "hdiffF",
            Self::HeffortF => "heffortF",
            Self::HlengthF => "hlengthF",
            Self::HtimeF => "htimeF",
            Self::HvocabF => "hvocabF",
            Self::HvolF => "hvolF",
            Self::ParamF => "paramF",
            Self::NofM => "nofM",
            Self::DpM => "dpM",
            Self::DpF => "dpF",
            Self::McM => "mcM",
            Self::EcM => "ecM",
            Self::AcM => "acM",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Whether the metric is an [`AggregateStat`] over functions.
    pub fn is_per_function(self) -> bool {
        matches!(
            self,
            Self::LocF
                | Self::LoclF
                | Self::CcF
                | Self::HbugsF
                | Self::HdiffF
                | Self::HeffortF
                | Self::HlengthF
                | Self::HtimeF
                | Self::HvocabF
                | Self::HvolF
                | Self::ParamF
                | Self::DpF
        )
    }

    /// Accessor for the per-function complexity metrics. `DpF` comes from
    /// the tree, not the complexity report.
    fn function_value(self) -> Option<fn(&complexity::Metrics) -> f64> {
        let accessor: fn(&complexity::Metrics) -> f64 = match self {
            Self::LocF => |m| f64::from(m.sloc.physical),
            Self::LoclF => |m| f64::from(m.sloc.logical),
            Self::CcF => |m| f64::from(m.cyclomatic),
            Self::HbugsF => |m| m.halstead.bugs,
            Self::HdiffF => |m| m.halstead.difficulty,
            Self::HeffortF => |m| m.halstead.effort,
            Self::HlengthF => |m| f64::from(m.halstead.length),
            Self::HtimeF => |m| m.halstead.time,
            Self::HvocabF => |m| f64::from(m.halstead.vocabulary),
            Self::HvolF => |m| m.halstead.volume,
            Self::ParamF => |m| f64::from(m.param_count),
            _ => return None,
        };
        Some(accessor)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A metric value: a number, or a summary over functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Aggregate(AggregateStat),
}

/// All metrics of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Canonical absolute path.
    pub path: PathBuf,
    pub values: BTreeMap<Metric, MetricValue>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn set_scalar(&mut self, metric: Metric, value: f64) {
        self.values.insert(metric, MetricValue::Scalar(value));
    }

    pub fn set_aggregate(&mut self, metric: Metric, stat: AggregateStat) {
        self.values.insert(metric, MetricValue::Aggregate(stat));
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricValue> {
        self.values.get(&metric)
    }

    pub fn scalar(&self, metric: Metric) -> Option<f64> {
        match self.values.get(&metric) {
            Some(MetricValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn aggregate(&self, metric: Metric) -> Option<&AggregateStat> {
        match self.values.get(&metric) {
            Some(MetricValue::Aggregate(stat)) => Some(stat),
            _ => None,
        }
    }
}

/// A file left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of the metrics pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// One record per analyzed file, in path order.
    pub files: Vec<FileRecord>,
    /// Files that could not be read or parsed.
    pub skipped: Vec<SkippedFile>,
    pub summary: Summary,
}

/// Metrics of one file plus what the coupling sweep needs.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub record: FileRecord,
    /// Import specifiers, in source order.
    pub imports: Vec<String>,
}

/// Metrics analyzer.
pub struct Analyzer {
    parser: Box<dyn SourceParser>,
    complexity: Box<dyn ComplexityAnalyzer>,
    max_file_size: u64,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Create an analyzer with the tree-sitter parser and escomplex-style
    /// complexity.
    pub fn new() -> Self {
        Self {
            parser: Box::new(Parser::new()),
            complexity: Box::new(EscomplexAnalyzer::new()),
            max_file_size: crate::config::ParserConfig::default().max_file_size,
        }
    }

    pub fn with_parser(mut self, parser: impl SourceParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_complexity(mut self, complexity: impl ComplexityAnalyzer + 'static) -> Self {
        self.complexity = Box::new(complexity);
        self
    }

    /// Files larger than this are skipped. Larger files are likely minified
    /// bundles.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Analyze a single file from disk.
    pub fn analyze_file(&self, path: &Path) -> Result<FileAnalysis> {
        let size = std::fs::metadata(path)?.len();
        if size > self.max_file_size {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                message: format!("File too large: {size} bytes (max {})", self.max_file_size),
            });
        }
        let file = SourceFile::load(path)?;
        self.analyze_source(&file)
    }

    /// Analyze already loaded content. Coupling metrics are left at zero.
    pub fn analyze_source(&self, file: &SourceFile) -> Result<FileAnalysis> {
        let parsed = self.parser.parse(&file.content, &file.path)?;
        let report = self.complexity.analyze(&parsed)?;
        let root = parsed.root_node();

        let mut record = FileRecord::new(&file.path);
        record_complexity(&mut record, &report);
        record.set_scalar(
            Metric::LoccM,
            tree_metrics::comment_lines(&parsed.source_str()) as f64,
        );
        record.set_scalar(Metric::DpM, tree_metrics::depth(root) as f64);
        record.set_aggregate(
            Metric::DpF,
            tree_metrics::function_depths(root)
                .into_iter()
                .map(|d| d as f64)
                .collect(),
        );
        record.set_scalar(Metric::McM, tree_metrics::calls(root) as f64);
        record.set_scalar(Metric::EcM, 0.0);
        record.set_scalar(Metric::AcM, 0.0);

        Ok(FileAnalysis {
            record,
            imports: import_specifiers(&parsed),
        })
    }

    /// Import specifiers of a file whose metrics were dropped. Empty when the
    /// file cannot be read or parsed.
    fn imports_only(&self, path: &Path) -> Vec<String> {
        SourceFile::load(path)
            .and_then(|file| self.parser.parse(&file.content, &file.path))
            .map(|parsed| import_specifiers(&parsed))
            .unwrap_or_default()
    }
}

fn import_specifiers(parsed: &parser::ParseResult) -> Vec<String> {
    parser::extract_imports(parsed)
        .into_iter()
        .map(|import| import.path)
        .collect()
}

fn record_complexity(record: &mut FileRecord, report: &ComplexityReport) {
    let aggregate = &report.aggregate;
    let halstead = &aggregate.halstead;
    let function_count = report.functions.len() as f64;

    record.set_scalar(Metric::LocM, f64::from(aggregate.sloc.physical));
    record.set_scalar(Metric::LoclM, f64::from(aggregate.sloc.logical));
    record.set_scalar(Metric::CcM, f64::from(aggregate.cyclomatic));
    record.set_scalar(Metric::HbugsM, halstead.bugs);
    record.set_scalar(Metric::HdiffM, halstead.difficulty);
    record.set_scalar(Metric::HeffortM, halstead.effort);
    record.set_scalar(Metric::HlengthM, f64::from(halstead.length));
    record.set_scalar(Metric::HtimeM, halstead.time);
    record.set_scalar(Metric::HvocabM, f64::from(halstead.vocabulary));
    record.set_scalar(Metric::HvolM, halstead.volume);
    record.set_scalar(Metric::ParamM, f64::from(aggregate.param_count));
    record.set_scalar(Metric::MaintainM, report.maintainability);
    record.set_scalar(Metric::NoF, function_count);
    record.set_scalar(Metric::NofM, function_count);

    for metric in Metric::ALL {
        if let Some(value) = metric.function_value() {
            let stat = report.functions.iter().map(|f| value(&f.metrics)).collect();
            record.set_aggregate(metric, stat);
        }
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = Analysis;

    fn name(&self) -> &'static str {
        "metrics"
    }

    fn description(&self) -> &'static str {
        "Extract size, complexity, depth and coupling metrics per file"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        let start = Instant::now();
        let total = ctx.files.len();
        let mut files = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        let mut estimator = CouplingEstimator::new();

        for (index, path) in ctx.files.iter().enumerate() {
            match self.analyze_file(path) {
                Ok(analysis) => {
                    tracing::debug!(
                        "Analyzed {} ({} imports)",
                        path.display(),
                        analysis.imports.len()
                    );
                    estimator.record(path.clone(), analysis.imports);
                    files.push(analysis.record);
                }
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", path.display(), err);
                    estimator.record(path.clone(), self.imports_only(path));
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
            ctx.report_progress(index + 1, total);
        }

        let analyzed: Vec<PathBuf> = files.iter().map(|r: &FileRecord| r.path.clone()).collect();
        let coupling = estimator.estimate(&analyzed);
        for record in &mut files {
            if let Some(c) = coupling.get(&record.path) {
                record.set_scalar(Metric::EcM, f64::from(c.efferent));
                record.set_scalar(Metric::AcM, f64::from(c.afferent));
            }
        }

        let summary = Summary::new(total, files.len(), skipped.len());
        tracing::info!(
            "Metrics pass completed in {:?}: {} files analyzed, {} skipped",
            start.elapsed(),
            summary.files_analyzed,
            summary.files_skipped
        );

        Ok(Analysis {
            files,
            skipped,
            summary,
        })
    }

    fn configure(&mut self, config: &Config) -> Result<()> {
        self.parser.configure(&config.parser);
        self.max_file_size = config.parser.max_file_size;
        Ok(())
    }
}
