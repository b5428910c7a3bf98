//! Core types and traits for code analysis.

mod analyzer;
mod error;
mod file_set;
mod language;
pub mod progress;
mod source_file;

pub use analyzer::{AnalysisContext, Analyzer, Summary};
pub use error::{Error, Result};
pub use file_set::{DiscoveryPolicy, FileSet};
pub use language::Language;
pub use source_file::SourceFile;
