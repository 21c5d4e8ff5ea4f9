//! Statement execution (§4.5, §6): DDL/DML dispatch, the clone-then-commit
//! mutation pattern, batch execution, and the [`Engine`] entry point that
//! ties the catalog, clock, and optional snapshot port together.

use std::collections::HashMap;

use oxide_sql_core::ast::{
    AlterTableAction, AlterTableStatement, ConflictAction, CreateDatabaseStatement,
    CreateTableStatement, CreateViewStatement, DeleteStatement, DropDatabaseStatement,
    DropTableStatement, DropViewStatement, Expr, InsertSource, InsertStatement,
    RefreshMaterializedViewStatement, SelectColumn, SelectStatement, Statement, TableConstraint,
    UpdateStatement, UseStatement,
};
use oxide_sql_core::parser::Parser;
use tracing::{debug, warn};

use crate::catalog::{Catalog, Column, MaterializedView, Row, Table, View};
use crate::clock::ClockPort;
use crate::env::{Env, Params, Scope};
use crate::error::{EngineError, Result};
use crate::eval::eval;
use crate::relation::{ColumnRef, Relation};
use crate::select::{run_select, Runner};
use crate::snapshot::SnapshotPort;
use crate::value::{coerce_for_storage, Bool3, Value};

/// What executing one statement produced (§6: "every DQL or DML-with-
/// RETURNING statement yields (column names, ordered rows); every DDL/DML-
/// without-RETURNING statement yields (status text, affected row count)").
#[derive(Debug, Clone)]
pub enum ExecOutcome {
    /// A `SELECT`, or a DML statement with `RETURNING`.
    Rows {
        /// Output column names, in projection order.
        columns: Vec<String>,
        /// The result rows.
        rows: Vec<Row>,
    },
    /// A DDL statement, or a DML statement without `RETURNING`.
    Status {
        /// A short human status, e.g. `"INSERT 3"`.
        message: String,
        /// Rows created, changed, or removed.
        affected: usize,
    },
}

/// The outcome of one statement in a batch, alongside the source text it was
/// parsed from (§6: every batch statement is reported individually).
pub type BatchItem = Result<ExecOutcome>;

/// The engine: an owned [`Catalog`], an injected [`ClockPort`], and an
/// optional [`SnapshotPort`] for `SAVE`/`LOAD` (§6). Not `Sync` by itself —
/// callers serialize access (§5: "single-writer, the core does not manage
/// concurrent access internally").
pub struct Engine {
    /// The schema catalog.
    pub catalog: Catalog,
    clock: Box<dyn ClockPort>,
    snapshot: Option<Box<dyn SnapshotPort>>,
}

impl Engine {
    /// A fresh engine with no databases and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self { catalog: Catalog::new(), clock: Box::new(crate::clock::SystemClock), snapshot: None }
    }

    /// Builds an engine over an existing catalog, a specific clock, and an
    /// optional snapshot port — the constructor tests and embedders use to
    /// supply a [`crate::clock::FixedClock`] or an
    /// [`crate::snapshot::InMemorySnapshotStore`].
    #[must_use]
    pub fn with_parts(catalog: Catalog, clock: Box<dyn ClockPort>, snapshot: Option<Box<dyn SnapshotPort>>) -> Self {
        Self { catalog, clock, snapshot }
    }

    /// Parses and executes a `;`-separated batch (§6). The whole batch fails
    /// to parse as a unit (`Parser::parse_statements` does not recover from a
    /// syntax error), in which case the single [`EngineError::Syntax`] is
    /// returned. Otherwise each statement executes in order; a statement that
    /// fails aborts only itself — statements before it stay committed,
    /// statements after it do not execute and are reported as never having
    /// run.
    ///
    /// # Errors
    /// `Err` only for a batch that fails to parse at all; once parsing
    /// succeeds, per-statement failures are reported inside the returned
    /// `Vec` rather than as an `Err` here.
    pub fn execute_batch(&mut self, sql: &str, params: &Params) -> Result<Vec<BatchItem>> {
        let statements = Parser::new(sql).parse_statements().map_err(EngineError::Syntax)?;
        let mut results = Vec::with_capacity(statements.len());
        for stmt in &statements {
            results.push(self.execute(stmt, params));
        }
        Ok(results)
    }

    /// Executes a single already-parsed statement.
    ///
    /// # Errors
    /// Any [`EngineError`] the statement's evaluation, constraint checks, or
    /// catalog operations produce. On `Err`, the catalog is left exactly as
    /// it was before this call (§4.5's "zero mutation effect" guarantee).
    pub fn execute(&mut self, stmt: &Statement, params: &Params) -> Result<ExecOutcome> {
        let now = self.clock.now();
        debug!(statement = statement_kind(stmt), "dispatching statement");
        match stmt {
            Statement::Select(select) => self.exec_select(select, params, now),
            Statement::Insert(insert) => self.exec_insert(insert, params, now),
            Statement::Update(update) => self.exec_update(update, params, now),
            Statement::Delete(delete) => self.exec_delete(delete, params, now),
            Statement::CreateDatabase(stmt) => self.exec_create_database(stmt),
            Statement::DropDatabase(stmt) => self.exec_drop_database(stmt),
            Statement::Use(stmt) => self.exec_use(stmt),
            Statement::CreateTable(stmt) => self.exec_create_table(stmt),
            Statement::DropTable(stmt) => self.exec_drop_table(stmt),
            Statement::AlterTable(stmt) => self.exec_alter_table(stmt, params, now),
            Statement::CreateView(stmt) => self.exec_create_view(stmt, params, now),
            Statement::DropView(stmt) => self.exec_drop_view(stmt),
            Statement::RefreshMaterializedView(stmt) => self.exec_refresh_mview(stmt, params, now),
        }
    }

    /// Persists the current database named `name` through the configured
    /// snapshot port.
    ///
    /// # Errors
    /// `EngineError::State` if no snapshot port is configured; `EngineError::
    /// Name` if no such database exists; `EngineError::Io` on adapter failure.
    pub fn save_snapshot(&self, name: &str) -> Result<()> {
        let port = self.snapshot.as_deref().ok_or_else(|| EngineError::State("no snapshot port configured".into()))?;
        let db = self.catalog.database(name).ok_or_else(|| EngineError::unknown_database(name))?;
        port.save(db).inspect_err(|e| warn!(database = name, error = %e, "snapshot save failed")).map_err(crate::snapshot::io_error)
    }

    /// Restores a database named `name` from the configured snapshot port and
    /// installs it into the catalog.
    ///
    /// # Errors
    /// `EngineError::State` if no snapshot port is configured; propagates
    /// [`crate::snapshot::load_database`]'s errors otherwise.
    pub fn load_snapshot(&mut self, name: &str) -> Result<()> {
        let port = self.snapshot.as_deref().ok_or_else(|| EngineError::State("no snapshot port configured".into()))?;
        let db = crate::snapshot::load_database(port, name)?;
        self.catalog.install_database(db);
        Ok(())
    }

    fn exec_select(&self, select: &SelectStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        let ctes = HashMap::new();
        let runner = Runner;
        let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
        let relation = run_select(select, &env)?;
        Ok(ExecOutcome::Rows { columns: relation.column_names(), rows: relation.rows })
    }

    fn exec_create_database(&mut self, stmt: &CreateDatabaseStatement) -> Result<ExecOutcome> {
        self.catalog.create_database(&stmt.name, stmt.if_not_exists)?;
        Ok(status(format!("CREATE DATABASE {}", stmt.name), 0))
    }

    fn exec_drop_database(&mut self, stmt: &DropDatabaseStatement) -> Result<ExecOutcome> {
        self.catalog.drop_database(&stmt.name, stmt.if_exists)?;
        Ok(status(format!("DROP DATABASE {}", stmt.name), 0))
    }

    fn exec_use(&mut self, stmt: &UseStatement) -> Result<ExecOutcome> {
        self.catalog.use_database(&stmt.name)?;
        Ok(status(format!("USE {}", stmt.name), 0))
    }

    fn exec_create_table(&mut self, stmt: &CreateTableStatement) -> Result<ExecOutcome> {
        let columns = stmt.columns.iter().map(Column::from_def).collect::<Result<Vec<_>>>()?;
        let table = Table::new(stmt.name.clone(), columns, stmt.constraints.clone());
        self.catalog.current_mut()?.create_table(table, stmt.if_not_exists)?;
        Ok(status(format!("CREATE TABLE {}", stmt.name), 0))
    }

    fn exec_drop_table(&mut self, stmt: &DropTableStatement) -> Result<ExecOutcome> {
        self.catalog.current_mut()?.drop_table(&stmt.name, stmt.if_exists)?;
        Ok(status(format!("DROP TABLE {}", stmt.name), 0))
    }

    fn exec_alter_table(&mut self, stmt: &AlterTableStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        match &stmt.action {
            AlterTableAction::AddColumn(def) => {
                let column = Column::from_def(def)?;
                let is_serial = matches!(column.data_type, crate::value::Type::Serial);
                let col_name = column.name.clone();
                if self.catalog.current()?.table(&stmt.name)?.column_index(&col_name).is_some() {
                    return Err(EngineError::Name { kind: "column", name: col_name });
                }
                if column.default.is_none() && !column.nullable {
                    return Err(EngineError::not_null(col_name));
                }
                let default_value = match &column.default {
                    Some(expr) => {
                        let ctes = HashMap::new();
                        let runner = Runner;
                        let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
                        eval(expr, &env)?
                    }
                    None => Value::Null,
                };
                let table = self.catalog.current_mut()?.table_mut(&stmt.name)?;
                for row in &mut table.rows {
                    row.push(default_value.clone());
                }
                table.columns.push(column);
                if is_serial {
                    table.register_serial(&col_name);
                }
                Ok(status(format!("ALTER TABLE {} ADD COLUMN {col_name}", stmt.name), 0))
            }
            AlterTableAction::DropColumn(name) => {
                let table = self.catalog.current_mut()?.table_mut(&stmt.name)?;
                let idx = table.column_index(name).ok_or_else(|| EngineError::unknown_column(name.clone()))?;
                let referenced_by_own_check =
                    table.columns[idx].check.as_ref().is_some_and(|c| expr_references_column(c, name));
                let referenced_elsewhere = table
                    .columns
                    .iter()
                    .any(|c| c.check.as_ref().is_some_and(|expr| expr_references_column(expr, name)))
                    || table.constraints.iter().any(|c| match c {
                        TableConstraint::Check(expr) => expr_references_column(expr, name),
                        TableConstraint::PrimaryKey(cols) | TableConstraint::Unique(cols) => {
                            cols.iter().any(|c| c == name)
                        }
                    });
                if referenced_by_own_check || referenced_elsewhere {
                    return Err(EngineError::State(format!(
                        "column \"{name}\" is referenced by a CHECK or key constraint and cannot be dropped"
                    )));
                }
                table.columns.remove(idx);
                for row in &mut table.rows {
                    row.remove(idx);
                }
                Ok(status(format!("ALTER TABLE {} DROP COLUMN {name}", stmt.name), 0))
            }
            AlterTableAction::AddConstraint(constraint) => {
                let table = self.catalog.current_mut()?.table_mut(&stmt.name)?;
                table.constraints.push(constraint.clone());
                Ok(status(format!("ALTER TABLE {} ADD CONSTRAINT", stmt.name), 0))
            }
            AlterTableAction::DropConstraint(name) => {
                // Table-level constraints carry no name in this grammar (see
                // `TableConstraint`), so the only constraint a name can ever
                // match is one added by a prior `ADD CONSTRAINT name ...` —
                // which this parser also never records a name for. In
                // practice this action can never find a match; it is kept so
                // the statement parses and fails predictably rather than
                // panicking.
                let _ = name;
                Err(EngineError::State(format!(
                    "constraint \"{name}\" not found: unnamed table constraints cannot be dropped by name"
                )))
            }
            AlterTableAction::Rename(new_name) => {
                self.catalog.current_mut()?.rename_table(&stmt.name, new_name)?;
                Ok(status(format!("ALTER TABLE {} RENAME TO {new_name}", stmt.name), 0))
            }
        }
    }

    fn exec_create_view(&mut self, stmt: &CreateViewStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        if stmt.materialized {
            let ctes = HashMap::new();
            let runner = Runner;
            let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
            let relation = run_select(&stmt.query, &env)?;
            let mview = MaterializedView {
                name: stmt.name.clone(),
                query: (*stmt.query).clone(),
                columns: relation.column_names(),
                rows: relation.rows,
            };
            self.catalog.current_mut()?.create_mview(mview, stmt.if_not_exists)?;
            Ok(status(format!("CREATE MATERIALIZED VIEW {}", stmt.name), 0))
        } else {
            let view = View { name: stmt.name.clone(), query: (*stmt.query).clone() };
            self.catalog.current_mut()?.create_view(view, stmt.if_not_exists)?;
            Ok(status(format!("CREATE VIEW {}", stmt.name), 0))
        }
    }

    fn exec_drop_view(&mut self, stmt: &DropViewStatement) -> Result<ExecOutcome> {
        self.catalog.current_mut()?.drop_view(&stmt.name, stmt.if_exists)?;
        Ok(status(format!("DROP VIEW {}", stmt.name), 0))
    }

    fn exec_refresh_mview(&mut self, stmt: &RefreshMaterializedViewStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        let query = {
            let db = self.catalog.current()?;
            let mview = db
                .mview(&stmt.name)
                .ok_or_else(|| EngineError::State(format!("{} is not a materialized view", stmt.name)))?;
            mview.query.clone()
        };
        let ctes = HashMap::new();
        let runner = Runner;
        let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
        let relation = run_select(&query, &env)?;
        let columns = relation.column_names();
        self.catalog.current_mut()?.refresh_mview(&stmt.name, columns, relation.rows)?;
        Ok(status(format!("REFRESH MATERIALIZED VIEW {}", stmt.name), 0))
    }

    fn exec_insert(&mut self, stmt: &InsertStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        let source_rows: Vec<Vec<Value>> = match &stmt.values {
            InsertSource::Values(rows) => {
                let ctes = HashMap::new();
                let runner = Runner;
                let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
                rows.iter().map(|row| row.iter().map(|e| eval(e, &env)).collect::<Result<Vec<_>>>()).collect::<Result<_>>()?
            }
            InsertSource::Query(query) => {
                let ctes = HashMap::new();
                let runner = Runner;
                let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
                run_select(query, &env)?.rows
            }
            InsertSource::DefaultValues => vec![vec![]],
        };

        let mut table = self.catalog.current()?.table(&stmt.table)?.clone();
        let target_columns: Vec<usize> = if stmt.columns.is_empty() {
            (0..table.columns.len()).collect()
        } else {
            stmt.columns
                .iter()
                .map(|name| table.column_index(name).ok_or_else(|| EngineError::unknown_column(name.clone())))
                .collect::<Result<_>>()?
        };

        let mut inserted = 0usize;
        let mut returning_rows = Vec::new();
        for source_row in source_rows {
            if source_row.len() != target_columns.len() && !matches!(stmt.values, InsertSource::DefaultValues) {
                return Err(EngineError::Cardinality(format!(
                    "INSERT has {} columns but {} values",
                    target_columns.len(),
                    source_row.len()
                )));
            }
            let mut full_row = vec![Value::Null; table.columns.len()];
            let mut explicit = vec![false; table.columns.len()];
            if !matches!(stmt.values, InsertSource::DefaultValues) {
                for (pos, &col_idx) in target_columns.iter().enumerate() {
                    full_row[col_idx] = source_row[pos].clone();
                    explicit[col_idx] = true;
                }
            }
            for (idx, col) in table.columns.iter().enumerate() {
                if explicit[idx] {
                    continue;
                }
                full_row[idx] = match &col.default {
                    Some(expr) => {
                        let ctes = HashMap::new();
                        let runner = Runner;
                        let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
                        eval(expr, &env)?
                    }
                    None if matches!(col.data_type, crate::value::Type::Serial) => Value::Serial(table.next_serial(&col.name)),
                    None => Value::Null,
                };
            }
            for (idx, col) in table.columns.iter().enumerate() {
                if explicit[idx] && matches!(col.data_type, crate::value::Type::Serial) {
                    if let Some(n) = full_row[idx].as_int() {
                        table.observe_serial(&col.name, n);
                    }
                }
                full_row[idx] = coerce_for_storage(full_row[idx].clone(), col.data_type)?;
            }

            validate_row(&table, &full_row, &self.catalog, now, params)?;

            let conflict_idx = match stmt.on_conflict.as_ref().filter(|oc| !oc.columns.is_empty()) {
                Some(oc) => {
                    let target: Vec<usize> = oc
                        .columns
                        .iter()
                        .map(|name| table.column_index(name).ok_or_else(|| EngineError::unknown_column(name.clone())))
                        .collect::<Result<_>>()?;
                    table.find_conflict_on(&full_row, &target)
                }
                None => table.find_conflict(&full_row, None).map(|(idx, _)| idx),
            };

            let committed_row = if let Some(conflict_idx) = conflict_idx {
                match handle_conflict(&mut table, conflict_idx, &full_row, stmt, &self.catalog, now, params)? {
                    ConflictResolution::Skipped => continue,
                    ConflictResolution::Applied => table.rows[conflict_idx].clone(),
                }
            } else {
                table.rows.push(full_row);
                table.rows.last().expect("just pushed").clone()
            };
            inserted += 1;
            if !stmt.returning.is_empty() {
                returning_rows.push(committed_row);
            }
        }

        if !stmt.returning.is_empty() {
            let qualifier = table.name.clone();
            let columns: Vec<ColumnRef> = table.columns.iter().map(|c| ColumnRef::qualified(&qualifier, &c.name)).collect();
            self.catalog.current_mut()?.table_mut(&stmt.table)?.clone_from(&table);
            return project_returning(&stmt.returning, columns, returning_rows, &self.catalog, now, params);
        }

        self.catalog.current_mut()?.table_mut(&stmt.table)?.clone_from(&table);
        Ok(status(format!("INSERT {inserted}"), inserted))
    }

    fn exec_update(&mut self, stmt: &UpdateStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        let mut table = self.catalog.current()?.table(&stmt.table)?.clone();
        let qualifier = stmt.alias.clone().unwrap_or_else(|| stmt.table.clone());
        let columns: Vec<ColumnRef> = table.columns.iter().map(|c| ColumnRef::qualified(&qualifier, &c.name)).collect();

        let assignment_indices: Vec<usize> = stmt
            .assignments
            .iter()
            .map(|a| table.column_index(&a.column).ok_or_else(|| EngineError::unknown_column(a.column.clone())))
            .collect::<Result<_>>()?;

        let ctes = HashMap::new();
        let runner = Runner;
        let from_relation = match &stmt.from {
            Some(table_ref) => {
                let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
                Some(crate::select::resolve_table_ref(Some(table_ref), &env)?)
            }
            None => None,
        };

        let mut updated = 0usize;
        let mut returning_rows = Vec::new();
        let original_rows = table.rows.clone();
        for (row_idx, original_row) in original_rows.iter().enumerate() {
            let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);

            // With a `FROM` source, the target row is joined against every
            // source row; the last matching pair's scope is what SET sees
            // (PostgreSQL itself documents the multi-match case as
            // unspecified, so "last match wins" is as valid as any order).
            let matching_env = match &from_relation {
                None => {
                    let row_env = env.push_outer(Scope { columns: columns.clone(), row: original_row.clone() });
                    let keep = match &stmt.where_clause {
                        Some(expr) => Bool3::try_from(&eval(expr, &row_env)?)?.is_true(),
                        None => true,
                    };
                    keep.then_some(row_env)
                }
                Some(from_rel) => {
                    let mut combined_columns = columns.clone();
                    combined_columns.extend(from_rel.columns.clone());
                    let mut last_match = None;
                    for from_row in &from_rel.rows {
                        let mut combined_row = original_row.clone();
                        combined_row.extend(from_row.iter().cloned());
                        let row_env =
                            env.push_outer(Scope { columns: combined_columns.clone(), row: combined_row });
                        let keep = match &stmt.where_clause {
                            Some(expr) => Bool3::try_from(&eval(expr, &row_env)?)?.is_true(),
                            None => true,
                        };
                        if keep {
                            last_match = Some(row_env);
                        }
                    }
                    last_match
                }
            };
            let Some(row_env) = matching_env else { continue };

            let mut new_row = original_row.clone();
            for (assignment, &col_idx) in stmt.assignments.iter().zip(&assignment_indices) {
                let value = eval(&assignment.value, &row_env)?;
                let col_type = table.columns[col_idx].data_type;
                new_row[col_idx] = coerce_for_storage(value, col_type)?;
            }
            validate_row(&table, &new_row, &self.catalog, now, params)?;
            if let Some((conflict_idx, _)) = table.find_conflict(&new_row, Some(row_idx)) {
                warn!(table = %table.name, "UNIQUE or PRIMARY KEY constraint rejected an UPDATE");
                return Err(EngineError::unique(format!(
                    "updated row conflicts with existing row {conflict_idx} on a UNIQUE or PRIMARY KEY constraint"
                )));
            }
            table.rows[row_idx] = new_row.clone();
            updated += 1;
            if !stmt.returning.is_empty() {
                returning_rows.push(new_row);
            }
        }

        if !stmt.returning.is_empty() {
            self.catalog.current_mut()?.table_mut(&stmt.table)?.clone_from(&table);
            return project_returning(&stmt.returning, columns, returning_rows, &self.catalog, now, params);
        }
        self.catalog.current_mut()?.table_mut(&stmt.table)?.clone_from(&table);
        Ok(status(format!("UPDATE {updated}"), updated))
    }

    fn exec_delete(&mut self, stmt: &DeleteStatement, params: &Params, now: chrono::NaiveDateTime) -> Result<ExecOutcome> {
        let mut table = self.catalog.current()?.table(&stmt.table)?.clone();
        let qualifier = stmt.alias.clone().unwrap_or_else(|| stmt.table.clone());
        let columns: Vec<ColumnRef> = table.columns.iter().map(|c| ColumnRef::qualified(&qualifier, &c.name)).collect();

        let mut kept_rows = Vec::with_capacity(table.rows.len());
        let mut deleted = 0usize;
        let mut returning_rows = Vec::new();
        for row in table.rows.iter() {
            let ctes = HashMap::new();
            let runner = Runner;
            let env = Env::scalar(&ctes, &self.catalog, now, params, &runner);
            let row_env = env.push_outer(Scope { columns: columns.clone(), row: row.clone() });
            let remove = match &stmt.where_clause {
                Some(expr) => Bool3::try_from(&eval(expr, &row_env)?)?.is_true(),
                None => true,
            };
            if remove {
                deleted += 1;
                if !stmt.returning.is_empty() {
                    returning_rows.push(row.clone());
                }
            } else {
                kept_rows.push(row.clone());
            }
        }
        table.rows = kept_rows;

        if !stmt.returning.is_empty() {
            self.catalog.current_mut()?.table_mut(&stmt.table)?.clone_from(&table);
            return project_returning(&stmt.returning, columns, returning_rows, &self.catalog, now, params);
        }
        self.catalog.current_mut()?.table_mut(&stmt.table)?.clone_from(&table);
        Ok(status(format!("DELETE {deleted}"), deleted))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn status(message: String, affected: usize) -> ExecOutcome {
    ExecOutcome::Status { message, affected }
}

/// A short name for the statement kind, for the dispatch-level `debug!` in
/// [`Engine::execute`] (§10.2).
const fn statement_kind(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Select(_) => "SELECT",
        Statement::Insert(_) => "INSERT",
        Statement::Update(_) => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::CreateDatabase(_) => "CREATE DATABASE",
        Statement::DropDatabase(_) => "DROP DATABASE",
        Statement::Use(_) => "USE",
        Statement::CreateTable(_) => "CREATE TABLE",
        Statement::DropTable(_) => "DROP TABLE",
        Statement::AlterTable(_) => "ALTER TABLE",
        Statement::CreateView(_) => "CREATE VIEW",
        Statement::DropView(_) => "DROP VIEW",
        Statement::RefreshMaterializedView(_) => "REFRESH MATERIALIZED VIEW",
    }
}

enum ConflictResolution {
    Applied,
    Skipped,
}

fn handle_conflict(
    table: &mut Table,
    conflict_idx: usize,
    _candidate: &Row,
    stmt: &InsertStatement,
    catalog: &Catalog,
    now: chrono::NaiveDateTime,
    params: &Params,
) -> Result<ConflictResolution> {
    let Some(on_conflict) = &stmt.on_conflict else {
        warn!(table = %table.name, "UNIQUE or PRIMARY KEY constraint rejected a row");
        return Err(EngineError::unique(format!(
            "duplicate key value violates a UNIQUE or PRIMARY KEY constraint on table {}",
            table.name
        )));
    };
    match &on_conflict.action {
        ConflictAction::DoNothing => Ok(ConflictResolution::Skipped),
        ConflictAction::DoUpdate(assignments) => {
            let qualifier = table.name.clone();
            let columns: Vec<ColumnRef> = table.columns.iter().map(|c| ColumnRef::qualified(&qualifier, &c.name)).collect();
            let ctes = HashMap::new();
            let runner = Runner;
            let env = Env::scalar(&ctes, catalog, now, params, &runner);
            let row_env = env.push_outer(Scope { columns, row: table.rows[conflict_idx].clone() });
            let mut new_row = table.rows[conflict_idx].clone();
            for assignment in assignments {
                let idx = table.column_index(&assignment.column).ok_or_else(|| EngineError::unknown_column(assignment.column.clone()))?;
                let value = eval(&assignment.value, &row_env)?;
                new_row[idx] = coerce_for_storage(value, table.columns[idx].data_type)?;
            }
            table.rows[conflict_idx] = new_row;
            Ok(ConflictResolution::Applied)
        }
    }
}

/// True if `expr` mentions a column named `name`, qualified or not. Used by
/// `ALTER TABLE ... DROP COLUMN` to refuse dropping a column a CHECK or key
/// constraint still depends on.
fn expr_references_column(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Column { name: n, .. } => n == name,
        Expr::Literal(_) | Expr::CurrentDate | Expr::Parameter { .. } | Expr::Wildcard { .. } => false,
        Expr::Binary { left, right, .. } => expr_references_column(left, name) || expr_references_column(right, name),
        Expr::Unary { operand, .. } => expr_references_column(operand, name),
        Expr::Function(call) => call.args.iter().any(|a| expr_references_column(a, name)),
        Expr::IsNull { expr, .. } => expr_references_column(expr, name),
        Expr::In { expr, list, .. } => {
            expr_references_column(expr, name) || list.iter().any(|e| expr_references_column(e, name))
        }
        Expr::InSubquery { expr, .. } => expr_references_column(expr, name),
        Expr::Between { expr, low, high, .. } => {
            expr_references_column(expr, name) || expr_references_column(low, name) || expr_references_column(high, name)
        }
        Expr::Like { expr, pattern, .. } => expr_references_column(expr, name) || expr_references_column(pattern, name),
        Expr::Case { operand, when_clauses, else_clause } => {
            operand.as_deref().is_some_and(|o| expr_references_column(o, name))
                || when_clauses.iter().any(|(w, t)| expr_references_column(w, name) || expr_references_column(t, name))
                || else_clause.as_deref().is_some_and(|e| expr_references_column(e, name))
        }
        Expr::Cast { expr, .. } | Expr::Extract { expr, .. } => expr_references_column(expr, name),
        Expr::Paren(inner) => expr_references_column(inner, name),
        Expr::Subquery(_) | Expr::Exists { .. } => false,
    }
}

/// Enforces NOT NULL and per-column/table-level CHECK for one fully-built
/// row. UNIQUE/PRIMARY KEY is checked separately via
/// [`Table::find_conflict`], since that needs the rest of the table.
fn validate_row(table: &Table, row: &Row, catalog: &Catalog, now: chrono::NaiveDateTime, params: &Params) -> Result<()> {
    for (idx, col) in table.columns.iter().enumerate() {
        if !col.nullable && row[idx].is_null() {
            warn!(table = %table.name, column = %col.name, "NOT NULL constraint rejected a row");
            return Err(EngineError::not_null(col.name.clone()));
        }
    }
    let qualifier = table.name.clone();
    let columns: Vec<ColumnRef> = table.columns.iter().map(|c| ColumnRef::qualified(&qualifier, &c.name)).collect();
    let ctes = HashMap::new();
    let runner = Runner;
    let env = Env::scalar(&ctes, catalog, now, params, &runner);
    let row_env = env.push_outer(Scope { columns, row: row.clone() });
    for col in &table.columns {
        if let Some(check) = &col.check {
            if !Bool3::try_from(&eval(check, &row_env)?)?.passes_check() {
                warn!(table = %table.name, column = %col.name, "CHECK constraint rejected a row");
                return Err(EngineError::check(format!("CHECK constraint on column {} violated", col.name)));
            }
        }
    }
    for constraint in &table.constraints {
        if let TableConstraint::Check(expr) = constraint {
            if !Bool3::try_from(&eval(expr, &row_env)?)?.passes_check() {
                warn!(table = %table.name, "table-level CHECK constraint rejected a row");
                return Err(EngineError::check(format!("CHECK constraint on table {} violated", table.name)));
            }
        }
    }
    Ok(())
}

/// Projects a `RETURNING` list over already-committed rows, reusing the
/// ordinary select-list evaluation path rather than a second expression
/// engine.
fn project_returning(
    returning: &[SelectColumn],
    columns: Vec<ColumnRef>,
    rows: Vec<Row>,
    catalog: &Catalog,
    now: chrono::NaiveDateTime,
    params: &Params,
) -> Result<ExecOutcome> {
    let ctes = HashMap::new();
    let runner = Runner;
    let env = Env::scalar(&ctes, catalog, now, params, &runner);

    let mut out_columns = Vec::with_capacity(returning.len());
    for col in returning {
        if matches!(col.expr, oxide_sql_core::ast::Expr::Wildcard { table: None }) {
            out_columns.extend(columns.iter().map(|c| c.name.clone()));
        } else {
            out_columns.push(col.alias.clone().unwrap_or_else(|| col.expr.to_string()));
        }
    }

    let mut out_rows = Vec::with_capacity(rows.len());
    for row in &rows {
        let row_env = env.push_outer(Scope { columns: columns.clone(), row: row.clone() });
        let mut out = Vec::new();
        for col in returning {
            if matches!(col.expr, oxide_sql_core::ast::Expr::Wildcard { table: None }) {
                out.extend(row.iter().cloned());
            } else {
                out.push(eval(&col.expr, &row_env)?);
            }
        }
        out_rows.push(out);
    }
    Ok(ExecOutcome::Rows { columns: out_columns, rows: out_rows })
}
