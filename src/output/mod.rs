//! Output formatters for analysis results.
//!
//! Any serializable result can be written generically. Score results get
//! their own tables: one row per file plus an average, and optionally the
//! per-metric breakdown.

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::config::OutputFormat;
use crate::core::Result;
use crate::score::{self, FileScore};

/// Metrics per table in the metric breakdown.
const METRICS_PER_TABLE: usize = 10;

const NO_FILES: &str = "No files were found";

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    Markdown,
    #[default]
    Text,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Markdown => Format::Markdown,
            OutputFormat::Text => Format::Text,
        }
    }
}

/// Options for score rendering.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreOptions {
    /// Add the per-metric tables.
    pub metrics: bool,
    /// Colorize text output.
    pub color: bool,
}

impl Format {
    pub fn format_value<W: Write>(&self, value: &Value, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => format_json(value, writer),
            Format::Markdown => format_markdown(value, writer),
            Format::Text => format_text(value, writer),
        }
    }

    pub fn format<T: Serialize, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.format_value(&value, writer)
    }

    /// Write a score analysis. JSON carries the full analysis; text and
    /// markdown render tables.
    pub fn format_scores<W: Write>(
        &self,
        analysis: &score::Analysis,
        options: ScoreOptions,
        writer: &mut W,
    ) -> Result<()> {
        if *self == Format::Json {
            return self.format(analysis, writer);
        }
        if analysis.is_empty() {
            let message = match analysis.unscored.len() {
                0 => NO_FILES.to_string(),
                n => format!("{n} files analyzed, none could be scored"),
            };
            let message = if options.color && *self == Format::Text {
                message.red().to_string()
            } else {
                message
            };
            writeln!(writer, "{message}")?;
            return Ok(());
        }

        let mut tables = vec![score_table(analysis)];
        if options.metrics {
            tables.extend(metric_tables(analysis));
        }

        match self {
            Format::Markdown => {
                writeln!(writer, "# Testability analysis results\n")?;
                for table in &tables {
                    write_markdown_table(table, writer)?;
                }
            }
            _ => {
                let heading = "Testability analysis results";
                if options.color {
                    writeln!(writer, "{}\n", heading.yellow().bold().underline())?;
                } else {
                    writeln!(writer, "{heading}\n")?;
                }
                for table in &tables {
                    write_text_table(table, options.color, writer)?;
                }
            }
        }
        Ok(())
    }
}

/// Round to two decimals. Trailing zeros are dropped on display.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Longest common character prefix of all strings.
pub fn common_prefix<S: AsRef<str>>(items: &[S]) -> String {
    let Some(first) = items.first() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.as_ref().chars().collect();
    for item in &items[1..] {
        let common = prefix
            .iter()
            .zip(item.as_ref().chars())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(common);
    }
    prefix.into_iter().collect()
}

/// File paths with their common prefix removed. A single path is shown in
/// full.
pub fn display_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<String> {
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.as_ref().to_string_lossy().into_owned())
        .collect();
    if names.len() < 2 {
        return names;
    }
    let prefix = common_prefix(&names);
    names
        .iter()
        .map(|name| name[prefix.len()..].to_string())
        .collect()
}

enum Row {
    Cells(Vec<String>),
    Separator,
}

struct Table {
    title: String,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    fn cells(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| match row {
            Row::Cells(cells) => cells.clone(),
            Row::Separator => {
                let mut cells = vec!["_______".to_string()];
                cells.resize(self.headers.len(), "_____".to_string());
                cells
            }
        })
    }
}

fn file_names(files: &[FileScore]) -> Vec<String> {
    let paths: Vec<&Path> = files.iter().map(|f| f.file.as_path()).collect();
    display_paths(&paths)
}

fn score_table(analysis: &score::Analysis) -> Table {
    let mut rows: Vec<Row> = file_names(&analysis.files)
        .into_iter()
        .zip(&analysis.files)
        .map(|(name, file)| Row::Cells(vec![name, round2(file.score).to_string()]))
        .collect();

    if let Some(average) = analysis.average {
        rows.push(Row::Separator);
        rows.push(Row::Cells(vec![
            "AVERAGE".to_string(),
            round2(average).to_string(),
        ]));
    }

    Table {
        title: "Scores per file".to_string(),
        headers: vec!["FILE".to_string(), "SCORE".to_string()],
        rows,
    }
}

fn metric_tables(analysis: &score::Analysis) -> Vec<Table> {
    let names = file_names(&analysis.files);
    let chunks: Vec<&[String]> = analysis.metric_keys.chunks(METRICS_PER_TABLE).collect();
    let count = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, keys)| {
            let rows = names
                .iter()
                .zip(&analysis.files)
                .map(|(name, file)| {
                    let mut cells = vec![name.clone()];
                    cells.extend(keys.iter().map(|key| {
                        file.metric_ranks
                            .iter()
                            .find(|m| &m.metric == key)
                            .map(|m| {
                                format!(
                                    "{} ({})",
                                    (100.0 - m.normalized_rank).round(),
                                    m.value.round()
                                )
                            })
                            .unwrap_or_default()
                    }));
                    Row::Cells(cells)
                })
                .collect();

            let mut headers = vec!["FILE".to_string()];
            headers.extend(keys.iter().cloned());
            Table {
                title: format!(
                    "Metric scores (values) per file - {} / {}",
                    index + 1,
                    count
                ),
                headers,
                rows,
            }
        })
        .collect()
}

fn pad(text: &str, width: usize, left: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if left {
        format!("{text}{fill}")
    } else {
        format!("{fill}{text}")
    }
}

fn write_text_table<W: Write>(table: &Table, color: bool, writer: &mut W) -> Result<()> {
    let rows: Vec<Vec<String>> = table.cells().collect();
    let widths: Vec<usize> = (0..table.headers.len())
        .map(|i| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .chain(std::iter::once(&table.headers[i]))
                .map(|cell| cell.width())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let border = widths.iter().fold(String::from("+"), |mut line, width| {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
        line
    });

    let render_row = |cells: &[String], header: bool| -> String {
        let columns: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let padded = pad(cell, *width, i == 0);
                match (color, header, i) {
                    (false, _, _) => padded,
                    (true, true, _) => padded.bold().to_string(),
                    (true, false, 0) => padded,
                    (true, false, _) => padded.cyan().to_string(),
                }
            })
            .collect();
        format!("| {} |", columns.join(" | "))
    };

    if color {
        writeln!(writer, "{}", table.title.yellow().bold())?;
    } else {
        writeln!(writer, "{}", table.title)?;
    }
    writeln!(writer, "{border}")?;
    writeln!(writer, "{}", render_row(&table.headers, true))?;
    writeln!(writer, "{border}")?;
    for row in &rows {
        writeln!(writer, "{}", render_row(row, false))?;
    }
    writeln!(writer, "{border}")?;
    writeln!(writer)?;
    Ok(())
}

fn write_markdown_table<W: Write>(table: &Table, writer: &mut W) -> Result<()> {
    writeln!(writer, "## {}\n", table.title)?;
    writeln!(writer, "| {} |", table.headers.join(" | "))?;
    writeln!(
        writer,
        "|{}",
        table.headers.iter().map(|_| " --- |").collect::<String>()
    )?;
    for row in table.cells() {
        writeln!(writer, "| {} |", row.join(" | "))?;
    }
    writeln!(writer)?;
    Ok(())
}

fn format_json<W: Write>(value: &Value, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

fn format_markdown<W: Write>(value: &Value, writer: &mut W) -> Result<()> {
    format_value_as_markdown(value, writer, 0)?;
    Ok(())
}

fn format_text<W: Write>(value: &Value, writer: &mut W) -> Result<()> {
    format_value_as_text(value, writer, 0)?;
    Ok(())
}

fn format_value_as_markdown<W: Write>(value: &Value, writer: &mut W, depth: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let header_level = "#".repeat((depth + 1).min(6));
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{} {}\n", header_level, format_key(key))?;
                        format_value_as_markdown(val, writer, depth + 1)?;
                    }
                    _ => {
                        writeln!(writer, "**{}**: {}\n", format_key(key), format_scalar(val))?;
                    }
                }
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                writeln!(writer, "_No items_\n")?;
            } else if arr.iter().all(|v| !matches!(v, Value::Object(_) | Value::Array(_))) {
                let items: Vec<String> = arr.iter().map(format_scalar).collect();
                writeln!(writer, "{}\n", items.join(", "))?;
            } else if is_table_compatible(arr) {
                format_as_table(arr, writer)?;
            } else {
                for item in arr {
                    writeln!(writer, "---\n")?;
                    format_value_as_markdown(item, writer, depth)?;
                }
            }
        }
        _ => {
            writeln!(writer, "{}\n", format_scalar(value))?;
        }
    }
    Ok(())
}

/// `files_analyzed` becomes `Files Analyzed`.
fn format_key(key: &str) -> String {
    key.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    format!("{}", f as i64)
                } else {
                    format!("{:.2}", f)
                }
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        Value::Null => "-".to_string(),
        _ => value.to_string(),
    }
}

fn is_table_compatible(arr: &[Value]) -> bool {
    arr.iter().all(|v| {
        if let Value::Object(map) = v {
            map.values()
                .all(|v| !matches!(v, Value::Object(_) | Value::Array(_)))
        } else {
            false
        }
    })
}

fn format_as_table<W: Write>(arr: &[Value], writer: &mut W) -> Result<()> {
    let headers: Vec<&str> = match arr.first() {
        Some(Value::Object(map)) => map.keys().map(|s| s.as_str()).collect(),
        _ => return Ok(()),
    };

    write!(writer, "|")?;
    for header in &headers {
        write!(writer, " {} |", format_key(header))?;
    }
    writeln!(writer)?;

    write!(writer, "|")?;
    for _ in &headers {
        write!(writer, " --- |")?;
    }
    writeln!(writer)?;

    for item in arr {
        if let Value::Object(map) = item {
            write!(writer, "|")?;
            for header in &headers {
                let value = map.get(*header).unwrap_or(&Value::Null);
                write!(writer, " {} |", format_scalar(value))?;
            }
            writeln!(writer)?;
        }
    }

    writeln!(writer)?;
    Ok(())
}

fn format_value_as_text<W: Write>(value: &Value, writer: &mut W, indent: usize) -> Result<()> {
    let prefix = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{}{}:", prefix, format_key(key))?;
                        format_value_as_text(val, writer, indent + 1)?;
                    }
                    _ => {
                        writeln!(
                            writer,
                            "{}{}: {}",
                            prefix,
                            format_key(key),
                            format_scalar(val)
                        )?;
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                writeln!(writer, "{}[{}]", prefix, i)?;
                format_value_as_text(item, writer, indent + 1)?;
            }
        }
        _ => {
            writeln!(writer, "{}{}", prefix, format_scalar(value))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Summary;
    use crate::score::RankedMetric;
    use std::path::PathBuf;

    fn file_score(path: &str, score: f64, ranks: &[(&str, f64, f64)]) -> FileScore {
        FileScore {
            file: PathBuf::from(path),
            rank: 1,
            metric_ranks: ranks
                .iter()
                .map(|(metric, value, normalized_rank)| RankedMetric {
                    metric: metric.to_string(),
                    value: *value,
                    rank: 1,
                    normalized_rank: *normalized_rank,
                })
                .collect(),
            accumulated_rank: 100.0 - score,
            relative_rank: 0.0,
            score,
        }
    }

    fn analysis(files: Vec<FileScore>, metric_keys: &[&str]) -> score::Analysis {
        let average = score::average(&files);
        score::Analysis {
            files,
            unscored: Vec::new(),
            skipped: Vec::new(),
            average,
            metric_keys: metric_keys.iter().map(|k| k.to_string()).collect(),
            summary: Summary::default(),
        }
    }

    fn render(format: Format, analysis: &score::Analysis, metrics: bool) -> String {
        let mut out = Vec::new();
        let options = ScoreOptions {
            metrics,
            color: false,
        };
        format.format_scores(analysis, options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(87.456).to_string(), "87.46");
        assert_eq!(round2(50.0).to_string(), "50");
        assert_eq!(round2(99.5).to_string(), "99.5");
        assert_eq!(round2(-0.001).to_string(), "0");
    }

    #[test]
    fn test_common_prefix_is_char_wise() {
        assert_eq!(common_prefix(&["/p/src/a.js", "/p/src/ab.js"]), "/p/src/a");
        assert_eq!(common_prefix(&["abc"]), "abc");
        assert_eq!(common_prefix::<&str>(&[]), "");
    }

    #[test]
    fn test_display_paths() {
        assert_eq!(
            display_paths(&["/p/src/a.js", "/p/lib/b.js"]),
            vec!["src/a.js", "lib/b.js"]
        );
        assert_eq!(display_paths(&["/p/src/a.js"]), vec!["/p/src/a.js"]);
    }

    #[test]
    fn test_text_scores_table() {
        let analysis = analysis(
            vec![
                file_score("/p/src/b.js", 50.0, &[]),
                file_score("/p/src/a.js", 87.456, &[]),
            ],
            &[],
        );
        insta::assert_snapshot!(render(Format::Text, &analysis, false), @r"
Testability analysis results

Scores per file
+---------+-------+
| FILE    | SCORE |
+---------+-------+
| b.js    |    50 |
| a.js    | 87.46 |
| _______ | _____ |
| AVERAGE | 68.73 |
+---------+-------+
");
    }

    #[test]
    fn test_metric_tables_are_chunked() {
        let keys: Vec<String> = (0..12).map(|i| format!("m{i}M")).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let analysis = analysis(
            vec![
                file_score("/p/a.js", 90.0, &[("m0M", 3.4, 25.0), ("m11M", 7.0, 100.0)]),
                file_score("/p/b.js", 80.0, &[]),
            ],
            &key_refs,
        );
        let out = render(Format::Text, &analysis, true);

        assert!(out.contains("Metric scores (values) per file - 1 / 2"));
        assert!(out.contains("Metric scores (values) per file - 2 / 2"));
        assert!(out.contains("75 (3)"));
        assert!(out.contains("0 (7)"));
        assert!(out.contains("m9M"));
    }

    #[test]
    fn test_empty_analysis() {
        let empty = analysis(Vec::new(), &["locM"]);
        assert_eq!(render(Format::Text, &empty, true), "No files were found\n");
        assert_eq!(render(Format::Markdown, &empty, false), "No files were found\n");

        let json: Value = serde_json::from_str(&render(Format::Json, &empty, false)).unwrap();
        assert_eq!(json["files"], Value::Array(Vec::new()));
        assert_eq!(json["average"], Value::Null);
    }

    #[test]
    fn test_all_files_unscored() {
        let mut analysis = analysis(Vec::new(), &["ccF_max"]);
        analysis.unscored = vec![PathBuf::from("/p/a.js"), PathBuf::from("/p/b.js")];
        let expected = "2 files analyzed, none could be scored\n";
        assert_eq!(render(Format::Text, &analysis, false), expected);
        assert_eq!(render(Format::Markdown, &analysis, true), expected);
    }

    #[test]
    fn test_markdown_scores() {
        let analysis = analysis(vec![file_score("/p/a.js", 75.0, &[])], &[]);
        let out = render(Format::Markdown, &analysis, false);
        assert!(out.starts_with("# Testability analysis results"));
        assert!(out.contains("| FILE | SCORE |"));
        assert!(out.contains("| /p/a.js | 75 |"));
        assert!(out.contains("| AVERAGE | 75 |"));
    }

    #[test]
    fn test_json_scores() {
        let analysis = analysis(vec![file_score("/p/a.js", 75.0, &[("ccM", 2.0, 50.0)])], &["ccM"]);
        let json: Value = serde_json::from_str(&render(Format::Json, &analysis, false)).unwrap();
        assert_eq!(json["files"][0]["score"], 75.0);
        assert_eq!(json["files"][0]["metric_ranks"][0]["metric"], "ccM");
        assert_eq!(json["average"], 75.0);
    }

    #[test]
    fn test_generic_text_format() {
        let value = serde_json::json!({"files_analyzed": 3, "ratio": 0.5});
        let mut out = Vec::new();
        Format::Text.format_value(&value, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Files Analyzed: 3"));
        assert!(out.contains("Ratio: 0.50"));
    }
}
