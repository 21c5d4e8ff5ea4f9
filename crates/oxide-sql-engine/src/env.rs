//! The expression evaluator's environment (§4.4): the current row, its
//! column-name → ordinal map, any enclosing rows (for correlated
//! subqueries), active CTE bindings, and a catalog handle for uncorrelated
//! subqueries.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use oxide_sql_core::ast::SelectStatement;

use crate::catalog::{Catalog, Row};
use crate::error::{EngineError, Result};
use crate::relation::{ColumnRef, Relation};
use crate::value::Value;

/// The executor's SELECT pipeline, as seen from the evaluator (§4.4, scalar
/// and `EXISTS`/`IN` subqueries). Kept as a trait so `eval` does not depend on
/// `executor` directly — the executor supplies the implementation and injects
/// it into every [`Env`] it builds.
pub trait SubqueryExecutor: Sync {
    /// Runs `stmt` to completion and returns its result relation. `env`
    /// supplies the outer row scopes a correlated subquery may reference, the
    /// CTE bindings, the catalog, the clock sample, and parameters.
    ///
    /// # Errors
    /// Any [`EngineError`] the nested pipeline produces.
    fn execute(&self, stmt: &SelectStatement, env: &Env<'_>) -> Result<Relation>;
}

/// One row in scope, with the schema needed to resolve `table.col` and bare
/// `col` references against it.
#[derive(Debug, Clone)]
pub struct Scope {
    /// The schema aligned with `row`.
    pub columns: Vec<ColumnRef>,
    /// The row's values.
    pub row: Row,
}

/// Parameter bindings for placeholders (§11): `?` substitutes positionally
/// (1-based), `:name` substitutes by name.
#[derive(Debug, Clone, Default)]
pub struct Params {
    /// Positional bindings, indexed from 0 (placeholder position 1 maps to
    /// index 0).
    pub positional: Vec<Value>,
    /// Named bindings.
    pub named: HashMap<String, Value>,
}

impl Params {
    /// No parameters bound.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Binds only positional parameters, in order.
    #[must_use]
    pub fn positional(values: Vec<Value>) -> Self {
        Self { positional: values, named: HashMap::new() }
    }
}

/// Everything the evaluator needs besides the expression itself: the active
/// row scope stack (innermost/current row last, so correlated subqueries can
/// see their outer rows), CTE bindings for this statement, the catalog (for
/// subquery execution), the once-per-statement clock sample, and parameter
/// bindings.
pub struct Env<'a> {
    /// Row scopes, current row last. A plain scalar expression (e.g. a
    /// `DEFAULT` expression with no row, or a `WHERE` clause with one `FROM`
    /// source) has exactly one.
    pub scopes: Vec<Scope>,
    /// `WITH`-bound CTE results, visible by name for this statement.
    pub ctes: &'a HashMap<String, Relation>,
    /// The schema catalog, for subquery execution.
    pub catalog: &'a Catalog,
    /// The wall-clock sample taken once at statement start.
    pub now: NaiveDateTime,
    /// Bound parameters.
    pub params: &'a Params,
    /// The SELECT pipeline, for evaluating scalar/`IN`/`EXISTS` subqueries.
    pub subqueries: &'a dyn SubqueryExecutor,
    /// Aggregate values precomputed per group by the SELECT pipeline's
    /// grouping stage, keyed by the aggregate call's canonical `Display`
    /// text (e.g. `"SUM(amount)"`). `eval`'s `Expr::Function` handling
    /// consults this before treating an aggregate name as an error — outside
    /// a grouped `SELECT`/`HAVING`/`ORDER BY` context this is `None` and any
    /// aggregate call is rejected.
    pub aggregates: Option<&'a HashMap<String, Value>>,
}

impl<'a> Env<'a> {
    /// An environment with a single row scope (the common case: scanning one
    /// source relation).
    #[must_use]
    pub fn with_row(
        columns: Vec<ColumnRef>,
        row: Row,
        ctes: &'a HashMap<String, Relation>,
        catalog: &'a Catalog,
        now: NaiveDateTime,
        params: &'a Params,
        subqueries: &'a dyn SubqueryExecutor,
    ) -> Self {
        Self { scopes: vec![Scope { columns, row }], ctes, catalog, now, params, subqueries, aggregates: None }
    }

    /// An environment with no row in scope at all (evaluating a `DEFAULT`
    /// expression, or a scalar with only a subquery/CTE source).
    #[must_use]
    pub fn scalar(
        ctes: &'a HashMap<String, Relation>,
        catalog: &'a Catalog,
        now: NaiveDateTime,
        params: &'a Params,
        subqueries: &'a dyn SubqueryExecutor,
    ) -> Self {
        Self { scopes: vec![], ctes, catalog, now, params, subqueries, aggregates: None }
    }

    /// A child environment with `outer` pushed onto the scope stack, so a
    /// correlated subquery can still see its enclosing row alongside whatever
    /// scopes the caller pushes for its own rows afterward.
    #[must_use]
    pub fn push_outer(&self, outer: Scope) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(outer);
        Self {
            scopes,
            ctes: self.ctes,
            catalog: self.catalog,
            now: self.now,
            params: self.params,
            subqueries: self.subqueries,
            aggregates: self.aggregates,
        }
    }

    /// A copy of this environment with `aggregates` attached, for evaluating
    /// a grouped `SELECT`/`HAVING`/`ORDER BY` expression against one group's
    /// precomputed aggregate values.
    #[must_use]
    pub fn with_aggregates(&self, aggregates: &'a HashMap<String, Value>) -> Self {
        Self {
            scopes: self.scopes.clone(),
            ctes: self.ctes,
            catalog: self.catalog,
            now: self.now,
            params: self.params,
            subqueries: self.subqueries,
            aggregates: Some(aggregates),
        }
    }

    /// Resolves a (possibly table-qualified) column reference against the
    /// scope stack, searching from the innermost (current) row outward so a
    /// correlated subquery can see its enclosing row. An unqualified name
    /// that matches more than one scope's column binds to the innermost.
    ///
    /// # Errors
    /// `EngineError::Name` if no scope has a matching column.
    pub fn resolve_column(&self, table: Option<&str>, name: &str) -> Result<&Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(idx) = scope.columns.iter().position(|c| c.matches(table, name)) {
                return Ok(&scope.row[idx]);
            }
        }
        let qualified = table.map(|t| format!("{t}.{name}")).unwrap_or_else(|| name.to_string());
        Err(EngineError::unknown_column(qualified))
    }
}
