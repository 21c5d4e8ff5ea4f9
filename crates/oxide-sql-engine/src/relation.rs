//! A materialized intermediate result: an output schema plus the rows that
//! match it. Every stage of the SELECT pipeline (§4.5) — a table scan, a
//! join, a FROM-subquery, a CTE binding, a view expansion — produces one of
//! these, so the rest of the pipeline only ever has to deal in `Relation`s.

use crate::catalog::Row;

/// One column of a [`Relation`]'s schema: its output name and, if it came
/// from a table or an aliased source, the qualifier a `table.col` reference
/// can match against.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table name or alias this column is reachable as `qualifier.name`
    /// through, if any.
    pub table: Option<String>,
    /// The output column name.
    pub name: String,
}

impl ColumnRef {
    /// An unqualified column (as produced by projection).
    #[must_use]
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self { table: None, name: name.into() }
    }

    /// A column qualified by its source table/alias.
    #[must_use]
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self { table: Some(table.into()), name: name.into() }
    }

    /// True if `table_name`/`col_name` (a possibly-qualified reference) could
    /// resolve to this column.
    #[must_use]
    pub fn matches(&self, table_name: Option<&str>, col_name: &str) -> bool {
        if self.name != col_name {
            return false;
        }
        match table_name {
            None => true,
            Some(t) => self.table.as_deref() == Some(t),
        }
    }
}

/// A schema plus the rows conforming to it — the working unit the SELECT
/// pipeline passes from stage to stage.
#[derive(Debug, Clone, Default)]
pub struct Relation {
    /// Output schema, positionally aligned with each row in [`Relation::rows`].
    pub columns: Vec<ColumnRef>,
    /// The rows themselves.
    pub rows: Vec<Row>,
}

impl Relation {
    /// An empty relation with the given schema.
    #[must_use]
    pub fn empty(columns: Vec<ColumnRef>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// The column names only, for result-surface reporting (§6).
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Re-qualifies every column under a single alias (used when a subquery
    /// or CTE is referenced in `FROM` under an alias).
    #[must_use]
    pub fn aliased(mut self, alias: &str) -> Self {
        for col in &mut self.columns {
            col.table = Some(alias.to_string());
        }
        self
    }
}
