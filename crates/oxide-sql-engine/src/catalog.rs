//! The in-memory schema (§3, §4.3): databases, tables, views, materialized
//! views, and the session's current-database handle.

use std::collections::BTreeMap;

use oxide_sql_core::ast::{ColumnDef, SelectStatement, TableConstraint};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::value::{Type, Value};

/// A table column (§3 `Column`), folded from the parser's [`ColumnDef`] onto
/// the engine's runtime [`Type`] domain.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Runtime type.
    pub data_type: Type,
    /// Whether NULL is admitted. `SERIAL` and `PRIMARY KEY` force `false`.
    pub nullable: bool,
    /// `DEFAULT` expression, evaluated with no row in scope.
    pub default: Option<oxide_sql_core::ast::Expr>,
    /// Single-column `PRIMARY KEY`.
    pub primary_key: bool,
    /// Single-column `UNIQUE`.
    pub unique: bool,
    /// Single-column `CHECK (expr)`.
    pub check: Option<oxide_sql_core::ast::Expr>,
}

impl Column {
    /// Builds a [`Column`] from the parser's [`ColumnDef`].
    ///
    /// # Errors
    /// Propagates [`EngineError::Type`] from [`Type::from_ast`].
    pub fn from_def(def: &ColumnDef) -> Result<Self> {
        Ok(Self {
            name: def.name.clone(),
            data_type: Type::from_ast(&def.data_type)?,
            nullable: def.nullable,
            default: def.default.clone(),
            primary_key: def.primary_key,
            unique: def.unique,
            check: def.check.clone(),
        })
    }
}

/// One committed row (ordered, positionally aligned with [`Table::columns`]).
pub type Row = Vec<Value>;

/// A table (§3 `Table`): columns, rows, per-column `SERIAL` counters, and
/// table-level constraints.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in declared order.
    pub columns: Vec<Column>,
    /// Rows, in insertion order (no implicit ordering guarantee beyond that).
    pub rows: Vec<Row>,
    /// Table-level constraints (multi-column `PRIMARY KEY`/`UNIQUE`, or a
    /// `CHECK` not tied to one column).
    pub constraints: Vec<TableConstraint>,
    /// Per-`SERIAL`-column next-value counters, monotonic and never reused
    /// (§4.5, "the per-table SERIAL counter is monotonic, never reused even
    /// on DELETE").
    serial_next: BTreeMap<String, i64>,
}

impl Table {
    /// Creates an empty table from its declared columns/constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<Column>, constraints: Vec<TableConstraint>) -> Self {
        let mut serial_next = BTreeMap::new();
        for col in &columns {
            if matches!(col.data_type, Type::Serial) {
                serial_next.insert(col.name.clone(), 1);
            }
        }
        Self { name: name.into(), columns, rows: Vec::new(), constraints, serial_next }
    }

    /// The ordinal of a named column, if it exists.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Allocates and advances the next `SERIAL` value for `column`.
    ///
    /// # Panics
    /// Panics if `column` is not a `SERIAL` column of this table — callers
    /// only invoke this after confirming `Type::Serial` via [`Table::columns`].
    pub fn next_serial(&mut self, column: &str) -> i64 {
        let counter = self
            .serial_next
            .get_mut(column)
            .expect("next_serial called on non-SERIAL column");
        let value = *counter;
        *counter += 1;
        value
    }

    /// Registers a freshly added `SERIAL` column (`ALTER TABLE ... ADD COLUMN`)
    /// so [`Table::next_serial`] can allocate for it. A no-op if the column is
    /// already tracked.
    pub fn register_serial(&mut self, column: &str) {
        self.serial_next.entry(column.to_string()).or_insert(1);
    }

    /// Bumps a `SERIAL` counter so it never reissues a value at or below
    /// `at_least` (used when an explicit value is inserted into a SERIAL
    /// column rather than relying on auto-increment).
    pub fn observe_serial(&mut self, column: &str, at_least: i64) {
        if let Some(counter) = self.serial_next.get_mut(column) {
            if at_least >= *counter {
                *counter = at_least + 1;
            }
        }
    }

    /// Every single-column and table-level `UNIQUE`/`PRIMARY KEY` constraint,
    /// as the list of column-index sets it covers.
    #[must_use]
    pub fn unique_constraints(&self) -> Vec<(Vec<usize>, bool)> {
        let mut out = Vec::new();
        for (i, col) in self.columns.iter().enumerate() {
            if col.primary_key {
                out.push((vec![i], true));
            } else if col.unique {
                out.push((vec![i], false));
            }
        }
        for constraint in &self.constraints {
            match constraint {
                TableConstraint::PrimaryKey(cols) => {
                    out.push((cols.iter().filter_map(|c| self.column_index(c)).collect(), true));
                }
                TableConstraint::Unique(cols) => {
                    out.push((cols.iter().filter_map(|c| self.column_index(c)).collect(), false));
                }
                TableConstraint::Check(_) => {}
            }
        }
        out
    }

    /// Finds an existing row conflicting with `candidate` on any unique or
    /// primary-key constraint, skipping `exclude_row` (the row being
    /// updated, if any). PostgreSQL semantics: a constraint column set with
    /// any NULL member never conflicts (NULLs are distinct from each other).
    #[must_use]
    pub fn find_conflict(&self, candidate: &Row, exclude_row: Option<usize>) -> Option<(usize, Vec<usize>)> {
        for (cols, _is_pk) in self.unique_constraints() {
            if cols.iter().any(|&i| matches!(candidate.get(i), Some(Value::Null) | None)) {
                continue;
            }
            for (row_idx, row) in self.rows.iter().enumerate() {
                if Some(row_idx) == exclude_row {
                    continue;
                }
                if cols.iter().any(|&i| matches!(row.get(i), Some(Value::Null))) {
                    continue;
                }
                let matches_all = cols
                    .iter()
                    .all(|&i| crate::value::value_cmp(&row[i], &candidate[i]) == Some(core::cmp::Ordering::Equal));
                if matches_all {
                    return Some((row_idx, cols));
                }
            }
        }
        None
    }

    /// Finds a row matching `candidate` on exactly the named conflict-target
    /// columns (used by `INSERT ... ON CONFLICT (cols)`), ignoring any other
    /// constraint.
    #[must_use]
    pub fn find_conflict_on(&self, candidate: &Row, target_cols: &[usize]) -> Option<usize> {
        if target_cols.iter().any(|&i| matches!(candidate.get(i), Some(Value::Null))) {
            return None;
        }
        self.rows.iter().position(|row| {
            target_cols
                .iter()
                .all(|&i| crate::value::value_cmp(&row[i], &candidate[i]) == Some(core::cmp::Ordering::Equal))
        })
    }
}

/// A view (§3 `View`): re-evaluated on every reference.
#[derive(Debug, Clone)]
pub struct View {
    /// View name.
    pub name: String,
    /// The stored, parameterless `SELECT`.
    pub query: SelectStatement,
}

/// A materialized view (§3 `MaterializedView`): cached until explicit
/// `REFRESH`. There is no automatic dirty-tracking (§9's open question:
/// "Materialized view auto-refresh: not supported; explicit REFRESH only") —
/// the cache simply does not observe table mutations.
#[derive(Debug, Clone)]
pub struct MaterializedView {
    /// View name.
    pub name: String,
    /// The stored, parameterless `SELECT`.
    pub query: SelectStatement,
    /// Cached output column names, as of the last populate/REFRESH.
    pub columns: Vec<String>,
    /// Cached rows, as of the last populate/REFRESH.
    pub rows: Vec<Row>,
}

/// A database (§3 `Database`): tables, views, and materialized views, keyed
/// by name. `BTreeMap` keeps listings deterministic without needing
/// insertion-order preservation.
#[derive(Debug, Clone, Default)]
pub struct Database {
    /// Database name.
    pub name: String,
    tables: BTreeMap<String, Table>,
    views: BTreeMap<String, View>,
    mviews: BTreeMap<String, MaterializedView>,
}

impl Database {
    /// Creates an empty, nameless database shell.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Names already in use for a table, view, or materialized view — CREATE
    /// of any of the three must check against all three namespaces, since
    /// `FROM` resolution (§4.5 step 1) doesn't otherwise know which one it's
    /// looking at until it looks.
    fn name_taken(&self, name: &str) -> bool {
        self.tables.contains_key(name) || self.views.contains_key(name) || self.mviews.contains_key(name)
    }

    /// `CREATE TABLE`.
    ///
    /// # Errors
    /// `EngineError::Name` if the name collides and `if_not_exists` is false.
    pub fn create_table(&mut self, table: Table, if_not_exists: bool) -> Result<()> {
        if self.name_taken(&table.name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(EngineError::Name { kind: "table", name: table.name });
        }
        info!(table = %table.name, "CREATE TABLE");
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// `DROP TABLE`.
    ///
    /// # Errors
    /// `EngineError::Name` if the table is missing and `if_exists` is false.
    pub fn drop_table(&mut self, name: &str, if_exists: bool) -> Result<()> {
        if self.tables.remove(name).is_none() {
            if if_exists {
                return Ok(());
            }
            return Err(EngineError::unknown_table(name));
        }
        info!(table = name, "DROP TABLE");
        Ok(())
    }

    /// A shared reference to a table, or `NameError` if absent.
    ///
    /// # Errors
    /// `EngineError::Name` if no table by that name exists.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables.get(name).ok_or_else(|| EngineError::unknown_table(name))
    }

    /// A mutable reference to a table, or `NameError` if absent.
    ///
    /// # Errors
    /// `EngineError::Name` if no table by that name exists.
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables.get_mut(name).ok_or_else(|| EngineError::unknown_table(name))
    }

    /// All table names, in a deterministic (sorted) order.
    #[must_use]
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// `ALTER TABLE ... RENAME TO` — moves the table under `new_name`,
    /// checked against all three namespaces like `CREATE TABLE`.
    ///
    /// # Errors
    /// `EngineError::Name` if `old_name` is missing or `new_name` collides.
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if self.name_taken(new_name) {
            return Err(EngineError::Name { kind: "table", name: new_name.to_string() });
        }
        let mut table = self.tables.remove(old_name).ok_or_else(|| EngineError::unknown_table(old_name))?;
        table.name = new_name.to_string();
        info!(from = old_name, to = new_name, "ALTER TABLE RENAME");
        self.tables.insert(new_name.to_string(), table);
        Ok(())
    }

    /// A view by name, if registered.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// A materialized view by name, if registered.
    #[must_use]
    pub fn mview(&self, name: &str) -> Option<&MaterializedView> {
        self.mviews.get(name)
    }

    /// `CREATE VIEW`.
    ///
    /// # Errors
    /// `EngineError::Name` if the name collides and `if_not_exists` is false.
    pub fn create_view(&mut self, view: View, if_not_exists: bool) -> Result<()> {
        if self.name_taken(&view.name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(EngineError::Name { kind: "view", name: view.name });
        }
        info!(view = %view.name, "CREATE VIEW");
        self.views.insert(view.name.clone(), view);
        Ok(())
    }

    /// `CREATE MATERIALIZED VIEW` — `rows`/`columns` are the initial populate
    /// result, already computed by the caller (the executor, which owns the
    /// SELECT pipeline).
    ///
    /// # Errors
    /// `EngineError::Name` if the name collides and `if_not_exists` is false.
    pub fn create_mview(&mut self, mview: MaterializedView, if_not_exists: bool) -> Result<()> {
        if self.name_taken(&mview.name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(EngineError::Name { kind: "materialized view", name: mview.name });
        }
        info!(view = %mview.name, "CREATE MATERIALIZED VIEW");
        self.mviews.insert(mview.name.clone(), mview);
        Ok(())
    }

    /// `REFRESH MATERIALIZED VIEW` — overwrites the cached rows/columns.
    ///
    /// # Errors
    /// `EngineError::State` if no materialized view by that name exists.
    pub fn refresh_mview(&mut self, name: &str, columns: Vec<String>, rows: Vec<Row>) -> Result<()> {
        let mview = self
            .mviews
            .get_mut(name)
            .ok_or_else(|| EngineError::State(format!("{name} is not a materialized view")))?;
        mview.columns = columns;
        mview.rows = rows;
        debug!(view = name, "REFRESH MATERIALIZED VIEW");
        Ok(())
    }

    /// `DROP VIEW` — covers both a plain and a materialized view (whichever
    /// namespace `name` resolves in).
    ///
    /// # Errors
    /// `EngineError::Name` if neither exists and `if_exists` is false.
    pub fn drop_view(&mut self, name: &str, if_exists: bool) -> Result<()> {
        if self.views.remove(name).is_some() || self.mviews.remove(name).is_some() {
            info!(view = name, "DROP VIEW");
            return Ok(());
        }
        if if_exists {
            return Ok(());
        }
        Err(EngineError::Name { kind: "view", name: name.to_string() })
    }
}

/// The process-local catalog (§4.3): every database, plus the session's
/// current-database handle. Not a `'static`/global — owned by [`crate::Engine`]
/// and passed by reference into every executor entry point (§9, "Global
/// state").
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    databases: BTreeMap<String, Database>,
    current: Option<String>,
}

impl Catalog {
    /// An empty catalog with no databases and no current database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `CREATE DATABASE`.
    ///
    /// # Errors
    /// `EngineError::Name` if it already exists and `if_not_exists` is false.
    pub fn create_database(&mut self, name: &str, if_not_exists: bool) -> Result<()> {
        if self.databases.contains_key(name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(EngineError::unknown_database(name).swap_for_collision());
        }
        info!(database = name, "CREATE DATABASE");
        self.databases.insert(name.to_string(), Database::new(name));
        Ok(())
    }

    /// `DROP DATABASE`. Clears the current-database handle if it pointed at
    /// the dropped database.
    ///
    /// # Errors
    /// `EngineError::Name` if it does not exist and `if_exists` is false.
    pub fn drop_database(&mut self, name: &str, if_exists: bool) -> Result<()> {
        if self.databases.remove(name).is_none() {
            if if_exists {
                return Ok(());
            }
            return Err(EngineError::unknown_database(name));
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        info!(database = name, "DROP DATABASE");
        Ok(())
    }

    /// `USE name` — rebinds the session's current database.
    ///
    /// # Errors
    /// `EngineError::Name` if no such database exists.
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        if !self.databases.contains_key(name) {
            return Err(EngineError::unknown_database(name));
        }
        self.current = Some(name.to_string());
        debug!(database = name, "USE");
        Ok(())
    }

    /// The current database's name, if one is selected.
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// All database names, in a deterministic (sorted) order.
    #[must_use]
    pub fn list_databases(&self) -> Vec<&str> {
        self.databases.keys().map(String::as_str).collect()
    }

    /// The current database.
    ///
    /// # Errors
    /// `EngineError::State` if no database is selected.
    pub fn current(&self) -> Result<&Database> {
        let name = self.current.as_ref().ok_or_else(|| EngineError::State("no current database".into()))?;
        Ok(self.databases.get(name).expect("current database name always resolves"))
    }

    /// The current database, mutably.
    ///
    /// # Errors
    /// `EngineError::State` if no database is selected.
    pub fn current_mut(&mut self) -> Result<&mut Database> {
        let name = self.current.clone().ok_or_else(|| EngineError::State("no current database".into()))?;
        Ok(self.databases.get_mut(&name).expect("current database name always resolves"))
    }

    /// Inserts an already-built [`Database`] (used by the snapshot `load`
    /// path to restore a whole database at once).
    pub fn install_database(&mut self, db: Database) {
        self.databases.insert(db.name.clone(), db);
    }

    /// Looks up a database by name without requiring it to be current (used
    /// by the snapshot `save` path).
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }
}

impl EngineError {
    /// `create_database`'s collision case names the *database* kind, not the
    /// table-shaped default `unknown_database` gives — this threads that
    /// through without a second constructor.
    fn swap_for_collision(self) -> Self {
        match self {
            Self::Name { name, .. } => Self::Name { kind: "database", name },
            other => other,
        }
    }
}
