//! Parser dialects and the fallback ladder between them.

use serde::{Deserialize, Serialize};
use tree_sitter::Language as TsLanguage;

use crate::core::Language;

/// The syntax variant a file is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Plain JavaScript.
    JavaScript,
    /// JavaScript with JSX enabled.
    Jsx,
    /// TypeScript without JSX.
    TypeScript,
    /// TypeScript with JSX.
    Tsx,
    /// JavaScript with legacy type annotations.
    Flow,
}

/// Tree-sitter grammar backing a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Grammar {
    /// The tree-sitter language for this grammar.
    pub fn language(self) -> TsLanguage {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl Dialect {
    /// Grammar used to parse this dialect. Flow annotations are close enough
    /// to TypeScript's that the TSX grammar accepts them.
    pub fn grammar(self) -> Grammar {
        match self {
            Self::JavaScript | Self::Jsx => Grammar::JavaScript,
            Self::TypeScript => Grammar::TypeScript,
            Self::Tsx | Self::Flow => Grammar::Tsx,
        }
    }

    pub fn supports_jsx(self) -> bool {
        matches!(self, Self::Jsx | Self::Tsx | Self::Flow)
    }

    /// The same dialect with JSX enabled.
    pub fn with_jsx(self) -> Self {
        match self {
            Self::JavaScript => Self::Jsx,
            Self::TypeScript => Self::Tsx,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Flow => "flow",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a parse attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The first error sits on a `<` and the dialect has no JSX.
    MissingPlugin,
    /// Any other syntax error.
    UnexpectedToken,
}

/// Chooses the first dialect for a file and the one to retry with.
pub trait DialectStrategy: Send + Sync {
    /// Dialect for the first attempt.
    fn select(&self, language: Language) -> Dialect;

    /// Dialect for the single retry after `failed` failed, if any.
    fn fallback(&self, failed: Dialect, failure: FailureKind) -> Option<Dialect>;
}

/// Default strategy: pick by extension, then retry with JSX or Flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionStrategy;

impl DialectStrategy for ExtensionStrategy {
    fn select(&self, language: Language) -> Dialect {
        match language {
            Language::TypeScript => Dialect::TypeScript,
            Language::Tsx => Dialect::Tsx,
            Language::Jsx => Dialect::Jsx,
            Language::JavaScript => Dialect::JavaScript,
        }
    }

    fn fallback(&self, failed: Dialect, failure: FailureKind) -> Option<Dialect> {
        match failure {
            FailureKind::MissingPlugin if !failed.supports_jsx() => Some(failed.with_jsx()),
            _ => match failed {
                Dialect::TypeScript => Some(Dialect::Tsx),
                Dialect::JavaScript | Dialect::Jsx => Some(Dialect::Flow),
                Dialect::Tsx | Dialect::Flow => None,
            },
        }
    }
}
