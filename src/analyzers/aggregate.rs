//! Summary statistics over per-function metric values.

use serde::{Deserialize, Serialize};

/// Summary of a sequence of per-function values.
///
/// Every summary field is `None` for an empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub total: Option<f64>,
    pub avg: Option<f64>,
    pub med: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// The raw values, in function order.
    pub values: Vec<f64>,
}

impl AggregateStat {
    /// Summary field names, in output order. `values` is not one of them.
    pub const FIELDS: [&'static str; 5] = ["total", "avg", "med", "min", "max"];

    pub fn from_values(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let total: f64 = values.iter().sum();
        let avg = total / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            total: Some(total),
            avg: Some(avg),
            med: median(&values),
            min: Some(min),
            max: Some(max),
            values,
        }
    }

    /// Summary field by name, see [`Self::FIELDS`].
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "total" => self.total,
            "avg" => self.avg,
            "med" => self.med,
            "min" => self.min,
            "max" => self.max,
            _ => None,
        }
    }

    /// Summary fields paired with their names, skipping `None`.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Self::FIELDS
            .iter()
            .filter_map(|name| self.field(name).map(|v| (*name, v)))
    }
}

impl<T: Into<f64>> FromIterator<T> for AggregateStat {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().map(Into::into).collect())
    }
}

/// Middle value of the sorted sequence, or the mean of the two middle values
/// for an even length.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
