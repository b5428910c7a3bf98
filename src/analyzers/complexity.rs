//! Complexity analyzer - cyclomatic complexity, Halstead metrics, SLOC and
//! maintainability.
//!
//! # Overview
//!
//! The analyzer works on a tree produced by [`crate::parser`] and reports
//! the same figures for the whole file and for every function in it:
//!
//! - **Cyclomatic Complexity**: 1 plus the number of decision points
//!   (`if`, loops, `case`, `catch`, `?:`, `&&`, `||`, `??`).
//!   Based on McCabe (1976) "A Complexity Measure", IEEE TSE SE-2(4).
//!
//! - **Halstead Metrics**: derived from distinct and total operator and
//!   operand counts. Based on Halstead (1977) "Elements of Software Science".
//!
//! - **SLOC**: physical lines spanned and logical lines (statements).
//!
//! - **Maintainability Index**: `171 - 3.42 ln(E) - 0.23 CC - 16.2 ln(LLOC)`
//!   over the per-function averages, clamped to `[0, 171]`.
//!
//! A function's figures exclude functions nested inside it; the file
//! figures cover everything.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use jsts::analyzers::complexity::{ComplexityAnalyzer, EscomplexAnalyzer};
//! use jsts::parser::{Parser, SourceParser};
//!
//! let parsed = Parser::new()
//!     .parse(b"function add(a, b) { return a + b; }", Path::new("add.js"))
//!     .unwrap();
//! let report = EscomplexAnalyzer::new().analyze(&parsed).unwrap();
//! println!("cyclomatic: {}", report.aggregate.cyclomatic);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::core::Result;
use crate::parser::queries::{
    is_function, is_statement, DECISION_NODE_TYPES, IGNORED_PUNCTUATION, LITERAL_OPERAND_TYPES,
    LOGICAL_OPERATORS, OPERAND_NODE_TYPES,
};
use crate::parser::{walk_tree, ParseResult};

/// Computes complexity figures for a parsed file.
pub trait ComplexityAnalyzer: Send + Sync {
    fn analyze(&self, parsed: &ParseResult) -> Result<ComplexityReport>;
}

/// Complexity of one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityReport {
    /// Figures over the whole file.
    pub aggregate: Metrics,
    /// Per-function figures, in source order.
    pub functions: Vec<FunctionReport>,
    /// Maintainability index of the file.
    pub maintainability: f64,
}

/// Per-function complexity result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionReport {
    /// Function name, `<anonymous>` when it has none.
    pub name: String,
    /// Start line (1-indexed).
    pub line: u32,
    /// Complexity metrics.
    pub metrics: Metrics,
}

/// Complexity metrics of a file or function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub sloc: Sloc,
    pub cyclomatic: u32,
    pub halstead: Halstead,
    pub param_count: u32,
}

/// Source lines of code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sloc {
    /// Lines spanned.
    pub physical: u32,
    /// Statements.
    pub logical: u32,
}

/// Halstead metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Halstead {
    /// Number of distinct operators (n1)
    pub distinct_operators: u32,
    /// Number of distinct operands (n2)
    pub distinct_operands: u32,
    /// Total number of operators (N1)
    pub total_operators: u32,
    /// Total number of operands (N2)
    pub total_operands: u32,
    /// Program length: N = N1 + N2
    pub length: u32,
    /// Vocabulary: n = n1 + n2
    pub vocabulary: u32,
    /// Volume: V = N * log2(n)
    pub volume: f64,
    /// Difficulty: D = (n1/2) * (N2/n2)
    pub difficulty: f64,
    /// Effort: E = D * V
    pub effort: f64,
    /// Time to program: T = E / 18 seconds
    pub time: f64,
    /// Estimated bugs: B = V / 3000
    pub bugs: f64,
}

impl Halstead {
    /// Derive all figures from the four base counts. Zero counts give zero
    /// instead of NaN.
    pub fn from_counts(n1: u32, n2: u32, total_n1: u32, total_n2: u32) -> Self {
        let vocabulary = n1 + n2;
        let length = total_n1 + total_n2;

        let volume = if vocabulary > 0 {
            f64::from(length) * f64::from(vocabulary).log2()
        } else {
            0.0
        };
        let difficulty = if n2 > 0 {
            (f64::from(n1) / 2.0) * (f64::from(total_n2) / f64::from(n2))
        } else {
            0.0
        };
        let effort = difficulty * volume;

        Self {
            distinct_operators: n1,
            distinct_operands: n2,
            total_operators: total_n1,
            total_operands: total_n2,
            length,
            vocabulary,
            volume,
            difficulty,
            effort,
            time: effort / 18.0,
            bugs: volume / 3000.0,
        }
    }
}

/// escomplex-style analyzer over the tree-sitter tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscomplexAnalyzer;

impl EscomplexAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl ComplexityAnalyzer for EscomplexAnalyzer {
    fn analyze(&self, parsed: &ParseResult) -> Result<ComplexityReport> {
        let root = parsed.root_node();
        let source = parsed.source.as_slice();

        let mut function_nodes = Vec::new();
        walk_tree(root, |node| {
            if is_function(node.kind()) {
                function_nodes.push(node);
            }
            true
        });

        let functions: Vec<FunctionReport> = function_nodes
            .iter()
            .map(|node| FunctionReport {
                name: function_name(node, source),
                line: node.start_position().row as u32 + 1,
                metrics: function_metrics(*node, source),
            })
            .collect();

        let tally = Tally::collect(root, source, false);
        let aggregate = Metrics {
            sloc: Sloc {
                physical: parsed.source_str().lines().count() as u32,
                logical: tally.statements,
            },
            cyclomatic: 1 + tally.decisions,
            halstead: tally.halstead(),
            param_count: functions.iter().map(|f| f.metrics.param_count).sum(),
        };

        let maintainability = maintainability(&aggregate, &functions);
        Ok(ComplexityReport {
            aggregate,
            functions,
            maintainability,
        })
    }
}

fn function_metrics(node: Node<'_>, source: &[u8]) -> Metrics {
    let tally = Tally::collect(node, source, true);
    Metrics {
        sloc: Sloc {
            physical: (node.end_position().row - node.start_position().row) as u32 + 1,
            logical: tally.statements,
        },
        cyclomatic: 1 + tally.decisions,
        halstead: tally.halstead(),
        param_count: param_count(&node),
    }
}

fn param_count(node: &Node<'_>) -> u32 {
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        return params
            .named_children(&mut cursor)
            .filter(|p| p.kind() != "comment")
            .count() as u32;
    }
    // `x => ...` has a single bare parameter.
    u32::from(node.child_by_field_name("parameter").is_some())
}

fn function_name(node: &Node<'_>, source: &[u8]) -> String {
    let named = node.child_by_field_name("name").or_else(|| {
        let parent = node.parent()?;
        match parent.kind() {
            "variable_declarator" | "public_field_definition" | "field_definition" => {
                parent.child_by_field_name("name")
            }
            "pair" => parent.child_by_field_name("key"),
            "assignment_expression" => parent.child_by_field_name("left"),
            _ => None,
        }
    });
    named
        .and_then(|n| n.utf8_text(source).ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "<anonymous>".to_string())
}

/// Averages over functions, or the file aggregate when there are none.
fn maintainability(aggregate: &Metrics, functions: &[FunctionReport]) -> f64 {
    let (effort, cyclomatic, logical) = if functions.is_empty() {
        (
            aggregate.halstead.effort,
            f64::from(aggregate.cyclomatic),
            f64::from(aggregate.sloc.logical),
        )
    } else {
        let n = functions.len() as f64;
        let mean = |value: fn(&Metrics) -> f64| {
            functions.iter().map(|r| value(&r.metrics)).sum::<f64>() / n
        };
        (
            mean(|m| m.halstead.effort),
            mean(|m| f64::from(m.cyclomatic)),
            mean(|m| f64::from(m.sloc.logical)),
        )
    };

    let mi = 171.0 - 3.42 * effort.max(1.0).ln() - 0.23 * cyclomatic - 16.2 * logical.max(1.0).ln();
    mi.clamp(0.0, 171.0)
}

/// Raw counts gathered in one traversal.
#[derive(Default)]
struct Tally<'s> {
    operators: HashSet<&'static str>,
    operands: HashSet<&'s str>,
    total_operators: u32,
    total_operands: u32,
    decisions: u32,
    statements: u32,
}

impl<'s> Tally<'s> {
    /// Count everything under `root`. With `skip_nested`, nested functions
    /// contribute only their statement line.
    fn collect(root: Node<'_>, source: &'s [u8], skip_nested: bool) -> Self {
        let mut tally = Self::default();
        walk_tree(root, |node| {
            let kind = node.kind();
            let is_root = node.id() == root.id();

            if !is_root && is_statement(kind) {
                tally.statements += 1;
            }
            if skip_nested && !is_root && is_function(kind) {
                return false;
            }
            if kind == "comment" {
                return false;
            }

            if DECISION_NODE_TYPES.contains(&kind) {
                tally.decisions += 1;
            } else if kind == "binary_expression" {
                let logical = node
                    .child_by_field_name("operator")
                    .is_some_and(|op| LOGICAL_OPERATORS.contains(&op.kind()));
                if logical {
                    tally.decisions += 1;
                }
            }

            if LITERAL_OPERAND_TYPES.contains(&kind) {
                tally.operand(node.utf8_text(source).unwrap_or(""));
                return false;
            }
            if node.child_count() == 0 {
                if node.is_named() {
                    if OPERAND_NODE_TYPES.contains(&kind) {
                        tally.operand(node.utf8_text(source).unwrap_or(""));
                    }
                } else if !IGNORED_PUNCTUATION.contains(&kind) {
                    tally.operators.insert(kind);
                    tally.total_operators += 1;
                }
            }
            true
        });
        tally
    }

    fn operand(&mut self, text: &'s str) {
        self.operands.insert(text);
        self.total_operands += 1;
    }

    fn halstead(&self) -> Halstead {
        Halstead::from_counts(
            self.operators.len() as u32,
            self.operands.len() as u32,
            self.total_operators,
            self.total_operands,
        )
    }
}
