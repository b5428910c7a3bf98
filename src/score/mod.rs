//! Testability score analyzer.
//!
//! Every metric value of a file is ranked against the reference
//! distribution of that metric. The normalized ranks are averaged into an
//! accumulated rank per file; the score is `100 - accumulated_rank`, so a
//! higher score means the file sits lower in the reference distributions
//! and is easier to test.

pub mod dataset;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analyzers::metrics::{self, FileRecord, Metric, SkippedFile};
use crate::config::Config;
use crate::core::{AnalysisContext, Analyzer as AnalyzerTrait, Error, Result, Summary};

pub use dataset::{Distribution, ReferenceDataset};

/// Rank of `value` in the ascending sequence `sorted`.
///
/// On an exact match this is the first matching index plus one. Otherwise
/// it is the index of the first larger element, or the length when no
/// element is larger.
pub fn calc_rank(sorted: &[f64], value: f64) -> usize {
    if let Some(index) = sorted.iter().position(|v| *v == value) {
        return index + 1;
    }
    sorted
        .iter()
        .position(|v| *v > value)
        .unwrap_or(sorted.len())
}

/// Percentile of `value` in `sorted`, in `[0, 100]`.
///
/// Only exact matches are placed; a value that does not occur in the
/// distribution gets 0.
pub fn normalized_rank(sorted: &[f64], value: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let position = sorted
        .iter()
        .position(|v| *v == value)
        .map_or(0, |index| index + 1);
    position as f64 / sorted.len() as f64 * 100.0
}

/// Arithmetic mean of the file scores, `None` without files.
pub fn average(scores: &[FileScore]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64)
}

/// One metric value ranked against its distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMetric {
    /// Dataset key, e.g. `ccM` or `ccF_avg`.
    pub metric: String,
    pub value: f64,
    pub rank: usize,
    pub normalized_rank: f64,
}

/// Score of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileScore {
    pub file: PathBuf,
    /// Rank of the accumulated rank among the reference modules.
    pub rank: usize,
    pub metric_ranks: Vec<RankedMetric>,
    /// Mean of all normalized ranks.
    pub accumulated_rank: f64,
    /// `100 - accumulated_rank / max(moduleRanks) * 100`.
    pub relative_rank: f64,
    /// `100 - accumulated_rank`.
    pub score: f64,
}

/// Look up the value a dataset key refers to in a record.
///
/// `ccM` is a scalar; `ccF_avg` is the `avg` field of the `ccF` aggregate.
fn record_value(record: &FileRecord, key: &str) -> Option<f64> {
    if let Some(metric) = Metric::from_key(key) {
        return record.scalar(metric);
    }
    let (base, field) = key.rsplit_once('_')?;
    let metric = Metric::from_key(base)?;
    record.aggregate(metric)?.field(field)
}

/// Rank every metric of `record` listed in the dataset. Metrics the record
/// lacks, and summary fields that are `None`, are skipped.
pub fn rank_metrics(record: &FileRecord, dataset: &ReferenceDataset) -> Vec<RankedMetric> {
    dataset
        .metrics()
        .iter()
        .filter_map(|key| {
            let value = record_value(record, key)?;
            let sorted = dataset.distribution(key)?;
            Some(RankedMetric {
                metric: key.clone(),
                value,
                rank: calc_rank(sorted, value),
                normalized_rank: normalized_rank(sorted, value),
            })
        })
        .collect()
}

/// Score one record. `None` when no metric could be ranked.
pub fn score_record(record: &FileRecord, dataset: &ReferenceDataset) -> Option<FileScore> {
    let metric_ranks = rank_metrics(record, dataset);
    if metric_ranks.is_empty() {
        return None;
    }

    let accumulated_rank = metric_ranks.iter().map(|m| m.normalized_rank).sum::<f64>()
        / metric_ranks.len() as f64;

    Some(FileScore {
        file: record.path.clone(),
        rank: calc_rank(dataset.module_ranks(), accumulated_rank),
        metric_ranks,
        accumulated_rank,
        relative_rank: 100.0 - accumulated_rank / dataset.max_module_rank() * 100.0,
        score: 100.0 - accumulated_rank,
    })
}

/// Score all records, sorted by descending rank. Ties keep input order.
///
/// Returns the scores and the paths of records without any ranked metric.
pub fn score_records(
    records: &[FileRecord],
    dataset: &ReferenceDataset,
) -> (Vec<FileScore>, Vec<PathBuf>) {
    let mut scores = Vec::with_capacity(records.len());
    let mut unscored = Vec::new();

    for record in records {
        match score_record(record, dataset) {
            Some(score) => scores.push(score),
            None => {
                tracing::warn!(
                    "No reference metric applies to {}, leaving it unscored",
                    record.path.display()
                );
                unscored.push(record.path.clone());
            }
        }
    }

    scores.sort_by(|a, b| b.rank.cmp(&a.rank));
    (scores, unscored)
}

/// Score analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Scored files, by descending rank.
    pub files: Vec<FileScore>,
    /// Analyzed files without any ranked metric.
    pub unscored: Vec<PathBuf>,
    /// Files the metrics pass could not analyze.
    pub skipped: Vec<SkippedFile>,
    /// Mean score, `None` without scored files.
    pub average: Option<f64>,
    /// Dataset metric keys, in dataset order.
    pub metric_keys: Vec<String>,
    pub summary: Summary,
}

impl Analysis {
    /// True when no file was scored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Fails when the average score is below `minimum`.
    pub fn check_threshold(&self, minimum: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&minimum) {
            return Err(Error::InvalidArgument(format!(
                "minimum score must be between 0 and 100, got {minimum}"
            )));
        }
        match self.average {
            Some(average) if average < minimum => Err(Error::threshold_violation(
                format!("Average score {average:.2} is below minimum {minimum:.2}"),
                average,
            )),
            _ => Ok(()),
        }
    }
}

/// Score analyzer: runs the metrics pass and ranks its records.
pub struct Analyzer {
    metrics: metrics::Analyzer,
    dataset: ReferenceDataset,
}

impl Analyzer {
    /// Create a score analyzer with the given reference dataset.
    pub fn new(dataset: ReferenceDataset) -> Self {
        Self {
            metrics: metrics::Analyzer::new(),
            dataset,
        }
    }

    /// Create a score analyzer with the bundled reference dataset.
    pub fn bundled() -> Result<Self> {
        Ok(Self::new(ReferenceDataset::bundled()?))
    }

    pub fn with_metrics(mut self, metrics: metrics::Analyzer) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn dataset(&self) -> &ReferenceDataset {
        &self.dataset
    }

    /// Score records produced elsewhere.
    pub fn score(&self, metrics: metrics::Analysis) -> Analysis {
        let (files, unscored) = score_records(&metrics.files, &self.dataset);
        let average = average(&files);
        Analysis {
            files,
            unscored,
            skipped: metrics.skipped,
            average,
            metric_keys: self.dataset.metrics().to_vec(),
            summary: metrics.summary,
        }
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = Analysis;

    fn name(&self) -> &'static str {
        "score"
    }

    fn description(&self) -> &'static str {
        "Rank file metrics against a reference dataset and score testability"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        let metrics = self.metrics.analyze(ctx)?;
        let analysis = self.score(metrics);
        tracing::info!(
            "Scored {} files ({} unscored), average {:?}",
            analysis.files.len(),
            analysis.unscored.len(),
            analysis.average
        );
        Ok(analysis)
    }

    fn configure(&mut self, config: &Config) -> Result<()> {
        self.metrics.configure(config)?;
        if let Some(path) = &config.score.dataset {
            self.dataset = ReferenceDataset::from_file(path)?;
        }
        Ok(())
    }
}
