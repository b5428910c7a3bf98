//! Code analyzers: structural, complexity and coupling metrics per file.

pub mod aggregate;
pub mod complexity;
pub mod coupling;
pub mod metrics;
pub mod tree_metrics;

// Re-export analyzer types for convenience
pub use metrics::Analyzer as MetricsAnalyzer;
