//! Node kind tables for the JavaScript and TypeScript grammars.
//!
//! Both tree-sitter grammars share node names for everything listed here,
//! so one table serves every dialect.

/// Nodes that open a nesting level for the depth metric.
pub const BLOCK_NODE_TYPES: &[&str] = &["statement_block", "class_body"];

/// Call nodes counted by the call metric.
pub const CALL_NODE_TYPES: &[&str] = &["call_expression"];

/// Every node that gets its own per-function complexity record.
pub const FUNCTION_NODE_TYPES: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// Function nodes whose subtree gets a per-function depth value.
///
/// Declarations are left out; only expression-position functions and class
/// methods are visited.
pub const FUNCTION_EXPRESSION_TYPES: &[&str] = &[
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

/// Decision points for cyclomatic complexity.
///
/// Only `case` clauses with a test count; `switch_default` does not.
pub const DECISION_NODE_TYPES: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "switch_case",
    "catch_clause",
    "ternary_expression",
];

/// Short-circuit operators that add a decision point inside a `binary_expression`.
pub const LOGICAL_OPERATORS: &[&str] = &["&&", "||", "??"];

/// Non-`_statement` nodes that still count as one logical line.
const EXTRA_STATEMENT_TYPES: &[&str] = &[
    "lexical_declaration",
    "variable_declaration",
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "method_definition",
    "field_definition",
    "public_field_definition",
    "switch_case",
    "switch_default",
];

/// `_statement` nodes that do not count as a logical line.
const NON_STATEMENT_TYPES: &[&str] = &["statement_block", "empty_statement"];

/// Leaf kinds counted as Halstead operands.
pub const OPERAND_NODE_TYPES: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "private_property_identifier",
    "type_identifier",
    "predefined_type",
    "statement_identifier",
    "number",
    "true",
    "false",
    "null",
    "undefined",
    "this",
    "super",
];

/// Literal nodes counted as one operand without descending into them.
pub const LITERAL_OPERAND_TYPES: &[&str] = &["string", "template_string", "regex"];

/// Punctuation that closes or separates and is not a Halstead operator.
pub const IGNORED_PUNCTUATION: &[&str] = &["{", "}", ")", "]", ",", ";"];

/// Whether the node counts as a logical source line.
pub fn is_statement(kind: &str) -> bool {
    if NON_STATEMENT_TYPES.contains(&kind) {
        return false;
    }
    kind.ends_with("_statement") || EXTRA_STATEMENT_TYPES.contains(&kind)
}

/// Whether the node is a function of any kind.
pub fn is_function(kind: &str) -> bool {
    FUNCTION_NODE_TYPES.contains(&kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_statement() {
        assert!(is_statement("if_statement"));
        assert!(is_statement("expression_statement"));
        assert!(is_statement("lexical_declaration"));
        assert!(is_statement("switch_default"));
        assert!(!is_statement("statement_block"));
        assert!(!is_statement("empty_statement"));
        assert!(!is_statement("binary_expression"));
    }

    #[test]
    fn test_function_tables() {
        assert!(is_function("arrow_function"));
        assert!(is_function("function_declaration"));
        assert!(!is_function("call_expression"));
        for kind in FUNCTION_EXPRESSION_TYPES {
            assert!(is_function(kind), "{kind} must also be a function");
        }
        assert!(!FUNCTION_EXPRESSION_TYPES.contains(&"function_declaration"));
    }

    #[test]
    fn test_default_case_is_not_a_decision() {
        assert!(DECISION_NODE_TYPES.contains(&"switch_case"));
        assert!(!DECISION_NODE_TYPES.contains(&"switch_default"));
    }
}
