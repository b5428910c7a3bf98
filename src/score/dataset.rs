//! Reference dataset: sorted metric distributions from a corpus of real
//! modules, plus the sorted accumulated ranks of those modules.
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "metrics": ["locM", "ccF_max"],
//!   "values": { "locM": [1, 2, 3], "ccF": { "max": [1, 1, 2] } },
//!   "moduleRanks": [10.5, 20.0, 42.1]
//! }
//! ```
//!
//! Scalar metrics map to a flat sequence. Per-function metrics map to one
//! sequence per summary field and are listed as `<metric>_<field>`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

const BUNDLED: &str = include_str!("../../data/reference.json");

/// Distribution of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    Flat(Vec<f64>),
    BySuffix(BTreeMap<String, Vec<f64>>),
}

/// Immutable reference data for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataset {
    metrics: Vec<String>,
    values: BTreeMap<String, Distribution>,
    #[serde(rename = "moduleRanks")]
    module_ranks: Vec<f64>,
}

impl ReferenceDataset {
    /// Build and validate a dataset.
    pub fn new(
        metrics: Vec<String>,
        values: BTreeMap<String, Distribution>,
        module_ranks: Vec<f64>,
    ) -> Result<Self> {
        let dataset = Self {
            metrics,
            values,
            module_ranks,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Parse and validate a dataset from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(json)
            .map_err(|e| Error::dataset(format!("malformed JSON: {e}")))?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Load a dataset from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::dataset(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    /// Metric keys taking part in scoring, in dataset order.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Sorted distribution for a scalar key (`ccM`) or a composite
    /// per-function key (`ccF_avg`).
    pub fn distribution(&self, key: &str) -> Option<&[f64]> {
        if let Some(Distribution::Flat(values)) = self.values.get(key) {
            return Some(values);
        }
        let (base, suffix) = key.rsplit_once('_')?;
        match self.values.get(base) {
            Some(Distribution::BySuffix(by_suffix)) => by_suffix.get(suffix).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Sorted accumulated ranks of the reference modules.
    pub fn module_ranks(&self) -> &[f64] {
        &self.module_ranks
    }

    /// Largest module rank.
    pub fn max_module_rank(&self) -> f64 {
        self.module_ranks.last().copied().unwrap_or(0.0)
    }

    fn validate(&self) -> Result<()> {
        for key in &self.metrics {
            let values = self
                .distribution(key)
                .ok_or_else(|| Error::dataset(format!("no distribution for metric {key}")))?;
            check_sorted(key, values)?;
        }
        check_sorted("moduleRanks", &self.module_ranks)?;
        if self.max_module_rank() <= 0.0 {
            return Err(Error::dataset("largest module rank must be positive"));
        }
        Ok(())
    }
}

fn check_sorted(name: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::dataset(format!("{name} is empty")));
    }
    if values.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::dataset(format!("{name} is not sorted ascending")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metrics": ["locM", "ccF_max"],
        "values": {
            "locM": [1, 2, 2, 5],
            "ccF": { "max": [1, 3], "avg": [1.5] }
        },
        "moduleRanks": [10, 20, 40]
    }"#;

    #[test]
    fn test_from_json() {
        let dataset = ReferenceDataset::from_json(SAMPLE).unwrap();
        assert_eq!(dataset.metrics(), &["locM".to_string(), "ccF_max".to_string()]);
        assert_eq!(dataset.distribution("locM"), Some(&[1.0, 2.0, 2.0, 5.0][..]));
        assert_eq!(dataset.distribution("ccF_max"), Some(&[1.0, 3.0][..]));
        assert_eq!(dataset.distribution("ccF_avg"), Some(&[1.5][..]));
        assert_eq!(dataset.distribution("ccF_min"), None);
        assert_eq!(dataset.distribution("nope"), None);
        assert_eq!(dataset.max_module_rank(), 40.0);
    }

    #[test]
    fn test_bundled_dataset_is_valid() {
        let dataset = ReferenceDataset::bundled().unwrap();
        assert!(!dataset.metrics().is_empty());
        assert!(dataset.max_module_rank() > 0.0);
        for key in dataset.metrics() {
            assert!(dataset.distribution(key).is_some(), "{key}");
        }
    }

    #[test]
    fn test_missing_distribution_rejected() {
        let json = r#"{"metrics": ["ccM"], "values": {}, "moduleRanks": [1]}"#;
        let err = ReferenceDataset::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
        assert!(err.to_string().contains("ccM"));
    }

    #[test]
    fn test_unsorted_or_empty_rejected() {
        let unsorted = r#"{"metrics": ["ccM"], "values": {"ccM": [3, 1]}, "moduleRanks": [1]}"#;
        assert!(ReferenceDataset::from_json(unsorted)
            .unwrap_err()
            .to_string()
            .contains("not sorted"));

        let empty = r#"{"metrics": ["ccM"], "values": {"ccM": []}, "moduleRanks": [1]}"#;
        assert!(ReferenceDataset::from_json(empty).is_err());

        let no_ranks = r#"{"metrics": [], "values": {}, "moduleRanks": []}"#;
        assert!(ReferenceDataset::from_json(no_ranks).is_err());

        let zero_ranks = r#"{"metrics": [], "values": {}, "moduleRanks": [0, 0]}"#;
        assert!(ReferenceDataset::from_json(zero_ranks).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = ReferenceDataset::from_json("{").unwrap_err();
        assert!(err.to_string().starts_with("Reference dataset error: malformed JSON"));
    }

    #[test]
    fn test_missing_file() {
        let err = ReferenceDataset::from_file("/nonexistent/reference.json").unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }
}
