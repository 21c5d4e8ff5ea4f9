//! Error types for the engine.
//!
//! Lexical and syntax errors are surfaced straight from `oxide_sql_core`
//! (`LexError` / `ParseError`); everything at and above the catalog,
//! evaluator, and executor boundary is a single `thiserror`-derived
//! [`EngineError`] enum, one variant per failure category.

use oxide_sql_core::parser::ParseError;

/// The taxonomy of engine-level failures.
///
/// One statement failure aborts that statement with zero mutation effect;
/// nothing here is recovered from inside the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Unknown character, unterminated string or comment.
    #[error("lexical error: {0}")]
    Lexical(String),

    /// Unexpected token while parsing; carries the position the parser
    /// reported.
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// Unknown database, table, column, view, CTE, or function.
    #[error("unknown {kind}: {name}")]
    Name {
        /// What sort of name was not found (`"table"`, `"column"`, ...).
        kind: &'static str,
        /// The name that could not be resolved.
        name: String,
    },

    /// Incompatible types in an expression, an invalid CAST, or a function
    /// arity mismatch.
    #[error("type error: {0}")]
    Type(String),

    /// NOT NULL, UNIQUE, PRIMARY KEY, or CHECK violation.
    #[error("constraint violation ({kind}): {detail}")]
    Constraint {
        /// Which constraint kind fired.
        kind: ConstraintKind,
        /// Human-readable detail (column name, offending value, ...).
        detail: String,
    },

    /// Divide-by-zero, integer overflow, or an invalid date/time value.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// A scalar subquery returned more than one row, or `UNION`/`INTERSECT`/
    /// `EXCEPT` branches disagree on arity.
    #[error("cardinality error: {0}")]
    Cardinality(String),

    /// Snapshot port failure (load/save/list).
    #[error("snapshot I/O error: {0}")]
    Io(String),

    /// No current database selected, or `REFRESH` on a non-materialized view,
    /// or similar session-state misuse.
    #[error("state error: {0}")]
    State(String),
}

/// Which constraint kind a [`EngineError::Constraint`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `NOT NULL`.
    NotNull,
    /// `UNIQUE`.
    Unique,
    /// `PRIMARY KEY`.
    PrimaryKey,
    /// `CHECK (...)`.
    Check,
}

impl core::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::NotNull => "NOT NULL",
            Self::Unique => "UNIQUE",
            Self::PrimaryKey => "PRIMARY KEY",
            Self::Check => "CHECK",
        })
    }
}

impl EngineError {
    /// Shorthand for [`EngineError::Name`] with `kind = "table"`.
    #[must_use]
    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::Name { kind: "table", name: name.into() }
    }

    /// Shorthand for [`EngineError::Name`] with `kind = "column"`.
    #[must_use]
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::Name { kind: "column", name: name.into() }
    }

    /// Shorthand for [`EngineError::Name`] with `kind = "database"`.
    #[must_use]
    pub fn unknown_database(name: impl Into<String>) -> Self {
        Self::Name { kind: "database", name: name.into() }
    }

    /// Shorthand for [`EngineError::Name`] with `kind = "function"`.
    #[must_use]
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::Name { kind: "function", name: name.into() }
    }

    /// Shorthand for a NOT NULL [`EngineError::Constraint`].
    #[must_use]
    pub fn not_null(column: impl Into<String>) -> Self {
        Self::Constraint {
            kind: ConstraintKind::NotNull,
            detail: format!("column {} may not be NULL", column.into()),
        }
    }

    /// Shorthand for a UNIQUE [`EngineError::Constraint`].
    #[must_use]
    pub fn unique(detail: impl Into<String>) -> Self {
        Self::Constraint { kind: ConstraintKind::Unique, detail: detail.into() }
    }

    /// Shorthand for a PRIMARY KEY [`EngineError::Constraint`].
    #[must_use]
    pub fn primary_key(detail: impl Into<String>) -> Self {
        Self::Constraint { kind: ConstraintKind::PrimaryKey, detail: detail.into() }
    }

    /// Shorthand for a CHECK [`EngineError::Constraint`].
    #[must_use]
    pub fn check(detail: impl Into<String>) -> Self {
        Self::Constraint { kind: ConstraintKind::Check, detail: detail.into() }
    }
}

/// Result alias over [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
