//! Structural metrics read directly off the syntax tree: nesting depth,
//! call counts, per-function depth and comment lines.

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use crate::parser::queries::{BLOCK_NODE_TYPES, CALL_NODE_TYPES, FUNCTION_EXPRESSION_TYPES};
use crate::parser::walk_tree;

/// Block comments, and line comments not preceded by `\` or `:` (so URLs
/// such as `http://` are not counted).
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)/\*[\s\S]*?\*/|([^\\:]|^)//.*$").expect("valid regex"));

/// Maximum number of nested block or class-body nodes on any path from `node`
/// down. A tree without blocks has depth 0.
pub fn depth(node: Node<'_>) -> usize {
    let mut cursor = node.walk();
    // Block count on the path to the node at each cursor depth.
    let mut path: Vec<usize> = Vec::new();
    let mut max = 0;

    loop {
        let current = cursor.node();
        let level = cursor.depth() as usize;
        let inherited = if level == 0 { 0 } else { path[level - 1] };
        let count = inherited + usize::from(BLOCK_NODE_TYPES.contains(&current.kind()));
        path.truncate(level);
        path.push(count);
        max = max.max(count);

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return max;
            }
        }
    }
}

/// Number of call expressions under `node`.
pub fn calls(node: Node<'_>) -> usize {
    let mut count = 0;
    walk_tree(node, |n| {
        if CALL_NODE_TYPES.contains(&n.kind()) {
            count += 1;
        }
        true
    });
    count
}

/// Depth of every function expression, arrow function and method in
/// pre-order. Each value covers the function's whole subtree, nested
/// functions included.
pub fn function_depths(node: Node<'_>) -> Vec<usize> {
    let mut depths = Vec::new();
    walk_tree(node, |n| {
        if FUNCTION_EXPRESSION_TYPES.contains(&n.kind()) {
            depths.push(depth(n));
        }
        true
    });
    depths
}

/// Number of non-empty lines covered by comments in `text`.
///
/// Works on raw text, so comment markers inside string literals are counted
/// too.
pub fn comment_lines(text: &str) -> usize {
    COMMENT_RE
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line))
                .filter(|line| !line.is_empty())
                .count()
        })
        .sum()
}
