//! Tree-sitter based JavaScript/TypeScript parser with dialect fallback.

pub mod dialect;
pub mod queries;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tree_sitter::{Node, Parser as TsParser, Tree};

use crate::config::ParserConfig;
use crate::core::{Error, Language, Result, SourceFile};

pub use dialect::{Dialect, DialectStrategy, ExtensionStrategy, FailureKind, Grammar};

/// Turns source text into a syntax tree.
pub trait SourceParser: Send + Sync {
    /// Parse `source`, using `path` to pick the dialect.
    fn parse(&self, source: &[u8], path: &Path) -> Result<ParseResult>;

    /// Apply the `[parser]` config table. Parsers without options ignore it.
    fn configure(&mut self, _config: &ParserConfig) {}
}

/// Default parser: cached tree-sitter parsers per grammar plus a dialect
/// strategy that allows one retry.
pub struct Parser {
    /// Cached parsers per grammar.
    parsers: Mutex<HashMap<Grammar, TsParser>>,
    strategy: Box<dyn DialectStrategy>,
    fallback: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with the extension strategy and fallback enabled.
    pub fn new() -> Self {
        Self {
            parsers: Mutex::new(HashMap::new()),
            strategy: Box::new(ExtensionStrategy),
            fallback: true,
        }
    }

    /// Enable or disable the retry with an alternative dialect.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace the dialect strategy.
    pub fn with_strategy(mut self, strategy: impl DialectStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Parse a file and return the syntax tree.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParseResult> {
        let file = SourceFile::load(path)?;
        self.parse_source(&file)
    }

    /// Parse an already loaded source file.
    pub fn parse_source(&self, file: &SourceFile) -> Result<ParseResult> {
        self.parse_with_language(&file.content, file.language, &file.path)
    }

    /// Parse content with an explicit language.
    pub fn parse_with_language(
        &self,
        content: &[u8],
        language: Language,
        path: &Path,
    ) -> Result<ParseResult> {
        let first = self.strategy.select(language);
        let failure = match self.attempt(content, first, path)? {
            Attempt::Parsed(tree) => {
                return Ok(ParseResult::new(tree, content, first, language, path));
            }
            Attempt::Failed(failure) => failure,
        };

        let next = if self.fallback {
            self.next_dialect(first, failure.kind)
        } else {
            None
        };
        let Some(next) = next else {
            return Err(failure.into_error(path, first));
        };

        tracing::debug!(
            "Parsing {} as {} failed ({:?} at line {}), retrying as {}",
            path.display(),
            first,
            failure.kind,
            failure.line,
            next
        );

        match self.attempt(content, next, path)? {
            Attempt::Parsed(tree) => Ok(ParseResult::new(tree, content, next, language, path)),
            Attempt::Failed(failure) => Err(failure.into_error(path, next)),
        }
    }

    /// Ask the strategy for the retry dialect, skipping a rung that would
    /// reuse the grammar that just failed.
    fn next_dialect(&self, failed: Dialect, kind: FailureKind) -> Option<Dialect> {
        let next = self.strategy.fallback(failed, kind)?;
        if next.grammar() != failed.grammar() {
            return Some(next);
        }
        self.strategy
            .fallback(next, FailureKind::UnexpectedToken)
            .filter(|d| d.grammar() != failed.grammar())
    }

    fn attempt(&self, content: &[u8], dialect: Dialect, path: &Path) -> Result<Attempt> {
        let grammar = dialect.grammar();
        let tree = {
            let mut parsers = self.parsers.lock();
            let parser = match parsers.entry(grammar) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let mut parser = TsParser::new();
                    parser
                        .set_language(&grammar.language())
                        .map_err(|e| {
                            Error::analysis(format!("Failed to load {dialect} grammar: {e}"))
                        })?;
                    entry.insert(parser)
                }
            };
            parser.parse(content, None).ok_or_else(|| Error::Parse {
                path: path.to_path_buf(),
                message: "Failed to parse file".to_string(),
            })?
        };

        match first_syntax_failure(&tree, content, dialect) {
            Some(failure) => Ok(Attempt::Failed(failure)),
            None => Ok(Attempt::Parsed(tree)),
        }
    }
}

impl SourceParser for Parser {
    fn parse(&self, source: &[u8], path: &Path) -> Result<ParseResult> {
        self.parse_with_language(source, Language::detect(path), path)
    }

    fn configure(&mut self, config: &ParserConfig) {
        self.fallback = config.fallback;
    }
}

enum Attempt {
    Parsed(Tree),
    Failed(SyntaxFailure),
}

/// The first error or missing node in a tree.
#[derive(Debug, Clone, Copy)]
struct SyntaxFailure {
    kind: FailureKind,
    line: usize,
    column: usize,
}

impl SyntaxFailure {
    fn into_error(self, path: &Path, dialect: Dialect) -> Error {
        let reason = match self.kind {
            FailureKind::MissingPlugin => "JSX is not enabled",
            FailureKind::UnexpectedToken => "unexpected token",
        };
        Error::Parse {
            path: path.to_path_buf(),
            message: format!(
                "{reason} at {}:{} (dialect {dialect})",
                self.line, self.column
            ),
        }
    }
}

fn first_syntax_failure(tree: &Tree, source: &[u8], dialect: Dialect) -> Option<SyntaxFailure> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut found = None;
    walk_tree(root, |node| {
        if found.is_some() {
            return false;
        }
        if node.is_error() || node.is_missing() {
            found = Some(node);
            return false;
        }
        node.has_error()
    });

    // has_error() guarantees an error or missing node somewhere below the root.
    let node = found.unwrap_or(root);
    let starts_with_angle = source
        .get(node.start_byte()..node.end_byte())
        .and_then(|bytes| bytes.iter().find(|b| !b.is_ascii_whitespace()))
        .is_some_and(|b| *b == b'<');
    let kind = if starts_with_angle && !dialect.supports_jsx() {
        FailureKind::MissingPlugin
    } else {
        FailureKind::UnexpectedToken
    };
    let position = node.start_position();
    Some(SyntaxFailure {
        kind,
        line: position.row + 1,
        column: position.column + 1,
    })
}

/// Result of parsing a source file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed syntax tree.
    pub tree: Arc<Tree>,
    /// Original source content.
    pub source: Vec<u8>,
    /// Language detected from the extension.
    pub language: Language,
    /// Dialect that produced an error-free tree.
    pub dialect: Dialect,
    /// File path.
    pub path: PathBuf,
}

impl ParseResult {
    fn new(tree: Tree, source: &[u8], dialect: Dialect, language: Language, path: &Path) -> Self {
        Self {
            tree: Arc::new(tree),
            source: source.to_vec(),
            language,
            dialect,
            path: path.to_path_buf(),
        }
    }

    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: &Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Source text as a string (lossy).
    pub fn source_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.source)
    }
}

/// Pre-order traversal of `root` and its descendants.
///
/// The callback returns whether to descend into the node's children.
/// Uses an iterative cursor, so deeply nested files cannot overflow the stack.
pub fn walk_tree<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        let descend = visit(cursor.node());
        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// An import found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportNode {
    /// The module specifier as written.
    pub path: String,
    /// Start line (1-indexed).
    pub line: u32,
}

/// Extract `import` declarations and `require(...)`/`import(...)` calls whose
/// first argument is a string literal, in source order.
pub fn extract_imports(result: &ParseResult) -> Vec<ImportNode> {
    let mut imports = Vec::new();
    walk_tree(result.root_node(), |node| {
        let specifier = match node.kind() {
            "import_statement" => node.child_by_field_name("source"),
            "call_expression" if is_module_loader(&node, &result.source) => node
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string"),
            _ => None,
        };
        if let Some(specifier) = specifier {
            imports.push(ImportNode {
                path: string_literal_value(result.node_text(&specifier)),
                line: node.start_position().row as u32 + 1,
            });
        }
        true
    });
    imports
}

fn is_module_loader(call: &Node<'_>, source: &[u8]) -> bool {
    let Some(function) = call.child_by_field_name("function") else {
        return false;
    };
    match function.kind() {
        "import" => true,
        "identifier" => function.utf8_text(source).is_ok_and(|name| name == "require"),
        _ => false,
    }
}

fn string_literal_value(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, path: &str) -> Result<ParseResult> {
        Parser::new().parse(content.as_bytes(), Path::new(path))
    }

    #[test]
    fn test_parse_javascript() {
        let result = parse("function main() {\n  console.log('Hello');\n}\n", "main.js").unwrap();
        assert_eq!(result.language, Language::JavaScript);
        assert_eq!(result.dialect, Dialect::JavaScript);
        assert_eq!(result.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_typescript() {
        let result = parse("const x: number = 1;\nexport type A = { a: string };\n", "a.ts").unwrap();
        assert_eq!(result.dialect, Dialect::TypeScript);
    }

    #[test]
    fn test_tsx_selected_up_front() {
        let result = parse("const App = () => <div className=\"a\">hi</div>;\n", "app.tsx").unwrap();
        assert_eq!(result.dialect, Dialect::Tsx);
    }

    #[test]
    fn test_jsx_in_ts_file_falls_back_to_tsx() {
        let result = parse(
            "const App = (): JSX.Element => <div>{\"hi\"}</div>;\n",
            "app.ts",
        )
        .unwrap();
        assert_eq!(result.language, Language::TypeScript);
        assert_eq!(result.dialect, Dialect::Tsx);
    }

    #[test]
    fn test_annotated_js_falls_back_to_flow() {
        let result = parse(
            "function add(a: number, b: number): number {\n  return a + b;\n}\n",
            "add.js",
        )
        .unwrap();
        assert_eq!(result.dialect, Dialect::Flow);
    }

    #[test]
    fn test_retry_skips_same_grammar_rung() {
        // Jsx shares the JavaScript grammar, so the retry goes to Flow.
        let parser = Parser::new();
        assert_eq!(
            parser.next_dialect(Dialect::JavaScript, FailureKind::MissingPlugin),
            Some(Dialect::Flow)
        );
        assert_eq!(
            parser.next_dialect(Dialect::TypeScript, FailureKind::MissingPlugin),
            Some(Dialect::Tsx)
        );
        assert_eq!(parser.next_dialect(Dialect::Flow, FailureKind::UnexpectedToken), None);
    }

    #[test]
    fn test_skipped_rung_without_other_grammar() {
        struct JsxOnly;
        impl DialectStrategy for JsxOnly {
            fn select(&self, _language: Language) -> Dialect {
                Dialect::JavaScript
            }
            fn fallback(&self, failed: Dialect, _failure: FailureKind) -> Option<Dialect> {
                match failed {
                    Dialect::JavaScript => Some(Dialect::Jsx),
                    _ => Some(Dialect::JavaScript),
                }
            }
        }

        let parser = Parser::new().with_strategy(JsxOnly);
        assert_eq!(
            parser.next_dialect(Dialect::JavaScript, FailureKind::MissingPlugin),
            None
        );
    }

    #[test]
    fn test_configure_through_trait() {
        let mut parser: Box<dyn SourceParser> = Box::new(Parser::new());
        parser.configure(&ParserConfig {
            fallback: false,
            ..ParserConfig::default()
        });
        let err = parser
            .parse(b"function add(a: number): number { return a; }", Path::new("add.js"))
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_fallback_disabled() {
        let parser = Parser::new().with_fallback(false);
        let err = parser
            .parse(b"function add(a: number): number { return a; }", Path::new("add.js"))
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unparseable_file_is_parse_error() {
        let err = parse("function ((( {", "broken.js").unwrap_err();
        match err {
            Error::Parse { path, message } => {
                assert_eq!(path, PathBuf::from("broken.js"));
                assert!(message.contains("dialect"), "message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_imports() {
        let result = parse(
            "import a from './a';\nimport { b } from \"../lib/b\";\nconst c = require('c');\nconst d = import('./d');\nconst e = require(name);\nrequire();\n",
            "index.js",
        )
        .unwrap();
        let imports = extract_imports(&result);
        let paths: Vec<&str> = imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["./a", "../lib/b", "c", "./d"]);
        assert_eq!(imports[2].line, 3);
    }

    #[test]
    fn test_walk_tree_visits_in_preorder() {
        let result = parse("a(b(c));", "calls.js").unwrap();
        let mut calls = Vec::new();
        walk_tree(result.root_node(), |node| {
            if node.kind() == "call_expression" {
                calls.push(node.start_byte());
            }
            true
        });
        assert_eq!(calls, vec![0, 2]);
    }

    #[test]
    fn test_walk_tree_can_prune() {
        let result = parse("f(function () { g(); });", "prune.js").unwrap();
        let mut calls = 0;
        walk_tree(result.root_node(), |node| {
            if node.kind() == "call_expression" {
                calls += 1;
            }
            node.kind() != "function_expression"
        });
        assert_eq!(calls, 1);
    }
}
