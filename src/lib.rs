//! JSTS - Static testability scores for JavaScript and TypeScript code bases.
//!
//! Every source file under a directory is parsed, measured (size, Halstead,
//! cyclomatic complexity, nesting depth, calls, coupling) and ranked against
//! a reference distribution of real-world modules. The result is a score
//! from 0 to 100 per file; higher means easier to test.
//!
//! # Supported Languages
//!
//! JavaScript, JSX, TypeScript, TSX, plus Flow-annotated JavaScript through
//! the dialect fallback.
//!
//! # Example
//!
//! ```no_run
//! use jsts::config::Config;
//! use jsts::core::{AnalysisContext, Analyzer, FileSet};
//! use jsts::score;
//!
//! let config = Config::default();
//! let files = FileSet::from_path("src", &config).unwrap();
//! let ctx = AnalysisContext::new(&files, &config, None);
//! let analyzer = score::Analyzer::bundled().unwrap();
//! let result = analyzer.analyze(&ctx).unwrap();
//! println!("Average score: {:?}", result.average);
//! ```

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod output;
pub mod parser;
pub mod score;

pub use core::{AnalysisContext, Analyzer, Error, FileSet, Result};
