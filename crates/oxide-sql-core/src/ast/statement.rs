//! SQL statement AST types.

use core::fmt;

use super::expression::Expr;
use super::types::{ColumnDef, TableConstraint};

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Null ordering for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLs come first.
    First,
    /// NULLs come last.
    Last,
}

impl NullOrdering {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

impl fmt::Display for NullOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// The direction (ASC or DESC).
    pub direction: OrderDirection,
    /// Null ordering (optional; defaults to PostgreSQL semantics if absent —
    /// NULLs last for ASC, first for DESC).
    pub nulls: Option<NullOrdering>,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// The type of join.
    pub join_type: JoinType,
    /// The table to join.
    pub table: TableRef,
    /// The join condition (for non-CROSS joins).
    pub on: Option<Expr>,
    /// USING columns (alternative to ON).
    pub using: Vec<String>,
}

/// A table reference in FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A simple table name (also resolves to a view, materialized view, or
    /// CTE binding — which one is a catalog lookup, not a parser concern).
    Table {
        /// Schema name (optional).
        schema: Option<String>,
        /// Table name.
        name: String,
        /// Alias.
        alias: Option<String>,
    },
    /// A subquery.
    Subquery {
        /// The subquery.
        query: Box<SelectStatement>,
        /// Alias (required for subqueries).
        alias: String,
    },
    /// A joined table.
    Join {
        /// Left side of the join.
        left: Box<TableRef>,
        /// The join clause.
        join: Box<JoinClause>,
    },
}

impl TableRef {
    /// Creates a simple table reference.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Creates a table reference with schema.
    #[must_use]
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Table {
            schema: Some(schema.into()),
            name: name.into(),
            alias: None,
        }
    }

    /// Adds an alias to this table reference.
    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> Self {
        match self {
            Self::Table { schema, name, .. } => Self::Table {
                schema,
                name,
                alias: Some(alias.into()),
            },
            Self::Subquery { query, .. } => Self::Subquery {
                query,
                alias: alias.into(),
            },
            Self::Join { left, join } => Self::Join {
                left: Box::new((*left).alias(alias)),
                join,
            },
        }
    }
}

/// A named subquery bound by a `WITH` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpr {
    /// The CTE name, visible for the lifetime of the enclosing statement.
    pub name: String,
    /// Optional explicit column name list.
    pub columns: Vec<String>,
    /// The bound query.
    pub query: Box<SelectStatement>,
}

/// Set operation combining two SELECTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// `UNION` — distinct union.
    Union,
    /// `UNION ALL` — concatenation, no deduplication.
    UnionAll,
    /// `INTERSECT` — distinct intersection.
    Intersect,
    /// `EXCEPT` — distinct difference.
    Except,
}

impl SetOp {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{UNION | INTERSECT | EXCEPT} SELECT ...` branch chained after the
/// first SELECT in a compound statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOpBranch {
    /// Which combinator joins this branch to what precedes it.
    pub op: SetOp,
    /// The branch's own SELECT (without its own trailing set-ops; those nest
    /// as further [`SetOpBranch`] entries on the same [`SelectStatement`]).
    pub select: Box<SelectStatement>,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Leading `WITH` bindings, if any.
    pub ctes: Vec<CommonTableExpr>,
    /// Whether to select DISTINCT values.
    pub distinct: bool,
    /// The columns to select.
    pub columns: Vec<SelectColumn>,
    /// The FROM clause.
    pub from: Option<TableRef>,
    /// The WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause.
    pub limit: Option<Expr>,
    /// OFFSET clause.
    pub offset: Option<Expr>,
    /// Trailing `UNION`/`INTERSECT`/`EXCEPT` branches, left-associative.
    pub set_ops: Vec<SetOpBranch>,
}

impl SelectStatement {
    /// An otherwise-empty SELECT with just a column list — useful as a
    /// starting point when building one up field by field.
    #[must_use]
    pub fn new(columns: Vec<SelectColumn>) -> Self {
        Self {
            ctes: Vec::new(),
            distinct: false,
            columns,
            from: None,
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_ops: Vec::new(),
        }
    }
}

/// A column in SELECT clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    /// The expression.
    pub expr: Expr,
    /// Column alias.
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Creates a new select column.
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Creates a select column with an alias.
    #[must_use]
    pub fn with_alias(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Column names (optional).
    pub columns: Vec<String>,
    /// Values to insert.
    pub values: InsertSource,
    /// ON CONFLICT clause (for UPSERT).
    pub on_conflict: Option<OnConflict>,
    /// `RETURNING` select list; empty means no RETURNING clause.
    pub returning: Vec<SelectColumn>,
}

/// Source of data for INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// VALUES (...), (...), ...
    Values(Vec<Vec<Expr>>),
    /// SELECT ...
    Query(Box<SelectStatement>),
    /// DEFAULT VALUES
    DefaultValues,
}

/// ON CONFLICT clause for UPSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// Conflict target columns (identifies which UNIQUE/PRIMARY KEY fired).
    pub columns: Vec<String>,
    /// Action to take on conflict.
    pub action: ConflictAction,
}

/// Action to take on conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// DO NOTHING
    DoNothing,
    /// DO UPDATE SET ...
    DoUpdate(Vec<UpdateAssignment>),
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Alias.
    pub alias: Option<String>,
    /// SET assignments.
    pub assignments: Vec<UpdateAssignment>,
    /// FROM clause (for joins in UPDATE).
    pub from: Option<TableRef>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// `RETURNING` select list; empty means no RETURNING clause.
    pub returning: Vec<SelectColumn>,
}

/// An assignment in UPDATE SET.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    /// Column name.
    pub column: String,
    /// Value expression.
    pub value: Expr,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Alias.
    pub alias: Option<String>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// `RETURNING` select list; empty means no RETURNING clause.
    pub returning: Vec<SelectColumn>,
}

/// `CREATE DATABASE name`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabaseStatement {
    /// Database name.
    pub name: String,
    /// Suppress the name-collision error if it already exists.
    pub if_not_exists: bool,
}

/// `DROP DATABASE name`.
#[derive(Debug, Clone, PartialEq)]
pub struct DropDatabaseStatement {
    /// Database name.
    pub name: String,
    /// Suppress the name-missing error if it does not exist.
    pub if_exists: bool,
}

/// `USE name`.
#[derive(Debug, Clone, PartialEq)]
pub struct UseStatement {
    /// Database name to make current.
    pub name: String,
}

/// `CREATE TABLE name (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Column definitions, in declared order.
    pub columns: Vec<ColumnDef>,
    /// Table-level constraints.
    pub constraints: Vec<TableConstraint>,
    /// Suppress the name-collision error if it already exists.
    pub if_not_exists: bool,
}

/// `DROP TABLE name`.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Suppress the name-missing error if it does not exist.
    pub if_exists: bool,
}

/// An `ALTER TABLE` action.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    /// `ADD COLUMN coldef`.
    AddColumn(ColumnDef),
    /// `DROP COLUMN name`.
    DropColumn(String),
    /// `ADD CONSTRAINT constraint` (unnamed; the grammar does not require a
    /// constraint name).
    AddConstraint(TableConstraint),
    /// `DROP CONSTRAINT name` — dropping a constraint by the name it was
    /// declared with. Unnamed constraints cannot be dropped this way.
    DropConstraint(String),
    /// `RENAME TO new_name`.
    Rename(String),
}

/// `ALTER TABLE name action`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// The action to apply.
    pub action: AlterTableAction,
}

/// `CREATE [MATERIALIZED] VIEW name AS SELECT ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// View name.
    pub name: String,
    /// Whether this is a materialized view.
    pub materialized: bool,
    /// The defining query.
    pub query: Box<SelectStatement>,
    /// Suppress the name-collision error if it already exists.
    pub if_not_exists: bool,
}

/// `DROP VIEW name` (covers both plain and materialized views; which one it
/// is, is a catalog lookup, not a parser concern).
#[derive(Debug, Clone, PartialEq)]
pub struct DropViewStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// View name.
    pub name: String,
    /// Suppress the name-missing error if it does not exist.
    pub if_exists: bool,
}

/// `REFRESH MATERIALIZED VIEW name`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshMaterializedViewStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Materialized view name.
    pub name: String,
}

/// A SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(SelectStatement),
    /// INSERT statement.
    Insert(InsertStatement),
    /// UPDATE statement.
    Update(UpdateStatement),
    /// DELETE statement.
    Delete(DeleteStatement),
    /// CREATE DATABASE statement.
    CreateDatabase(CreateDatabaseStatement),
    /// DROP DATABASE statement.
    DropDatabase(DropDatabaseStatement),
    /// USE statement.
    Use(UseStatement),
    /// CREATE TABLE statement.
    CreateTable(CreateTableStatement),
    /// DROP TABLE statement.
    DropTable(DropTableStatement),
    /// ALTER TABLE statement.
    AlterTable(AlterTableStatement),
    /// CREATE [MATERIALIZED] VIEW statement.
    CreateView(CreateViewStatement),
    /// DROP VIEW statement.
    DropView(DropViewStatement),
    /// REFRESH MATERIALIZED VIEW statement.
    RefreshMaterializedView(RefreshMaterializedViewStatement),
}

// ===================================================================
// Display implementations
// ===================================================================

fn fmt_schema(f: &mut fmt::Formatter<'_>, schema: &Option<String>) -> fmt::Result {
    if let Some(s) = schema {
        write!(f, "{s}.")?;
    }
    Ok(())
}

fn fmt_returning(f: &mut fmt::Formatter<'_>, returning: &[SelectColumn]) -> fmt::Result {
    if returning.is_empty() {
        return Ok(());
    }
    write!(f, " RETURNING")?;
    for (i, col) in returning.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, " {col}")?;
    }
    Ok(())
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.direction)?;
        if let Some(nulls) = &self.nulls {
            write!(f, " {nulls}")?;
        }
        Ok(())
    }
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.join_type, self.table)?;
        if let Some(on) = &self.on {
            write!(f, " ON {on}")?;
        }
        if !self.using.is_empty() {
            write!(f, " USING (")?;
            for (i, col) in self.using.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{col}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table {
                schema,
                name,
                alias,
            } => {
                fmt_schema(f, schema)?;
                write!(f, "{name}")?;
                if let Some(a) = alias {
                    write!(f, " AS {a}")?;
                }
                Ok(())
            }
            Self::Subquery { query, alias } => {
                write!(f, "({query}) AS {alias}")
            }
            Self::Join { left, join } => {
                write!(f, "{left} {join}")
            }
        }
    }
}

impl fmt::Display for SelectColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(a) = &self.alias {
            write!(f, " AS {a}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CommonTableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.columns.is_empty() {
            write!(f, " ({})", self.columns.join(", "))?;
        }
        write!(f, " AS ({})", self.query)
    }
}

impl fmt::Display for SetOpBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.select)
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ctes.is_empty() {
            write!(f, "WITH ")?;
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{cte}")?;
            }
            write!(f, " ")?;
        }
        write!(f, "SELECT")?;
        if self.distinct {
            write!(f, " DISTINCT")?;
        }
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {col}")?;
        }
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY")?;
            for (i, g) in self.group_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {g}")?;
            }
        }
        if let Some(h) = &self.having {
            write!(f, " HAVING {h}")?;
        }
        for branch in &self.set_ops {
            write!(f, " {branch}")?;
        }
        // Binds to the whole set-op chain, not the first branch, so it is
        // rendered after every `SetOpBranch` — matching the grammar the
        // parser accepts back in (§4.2: the trailing clause follows the
        // entire `UNION`/`INTERSECT`/`EXCEPT` chain).
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY")?;
            for (i, o) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {o}")?;
            }
        }
        if let Some(l) = &self.limit {
            write!(f, " LIMIT {l}")?;
        }
        if let Some(o) = &self.offset {
            write!(f, " OFFSET {o}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InsertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values(rows) => {
                write!(f, "VALUES")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " (")?;
                    for (j, val) in row.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{val}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Query(q) => write!(f, "{q}"),
            Self::DefaultValues => write!(f, "DEFAULT VALUES"),
        }
    }
}

impl fmt::Display for OnConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ON CONFLICT (")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, ") {}", self.action)
    }
}

impl fmt::Display for ConflictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoNothing => write!(f, "DO NOTHING"),
            Self::DoUpdate(assignments) => {
                write!(f, "DO UPDATE SET")?;
                for (i, a) in assignments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {a}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO ")?;
        fmt_schema(f, &self.schema)?;
        write!(f, "{}", self.table)?;
        if !self.columns.is_empty() {
            write!(f, " (")?;
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{col}")?;
            }
            write!(f, ")")?;
        }
        write!(f, " {}", self.values)?;
        if let Some(oc) = &self.on_conflict {
            write!(f, " {oc}")?;
        }
        fmt_returning(f, &self.returning)
    }
}

impl fmt::Display for UpdateAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

impl fmt::Display for UpdateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE ")?;
        fmt_schema(f, &self.schema)?;
        write!(f, "{}", self.table)?;
        if let Some(a) = &self.alias {
            write!(f, " AS {a}")?;
        }
        write!(f, " SET")?;
        for (i, a) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {a}")?;
        }
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        fmt_returning(f, &self.returning)
    }
}

impl fmt::Display for DeleteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM ")?;
        fmt_schema(f, &self.schema)?;
        write!(f, "{}", self.table)?;
        if let Some(a) = &self.alias {
            write!(f, " AS {a}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        fmt_returning(f, &self.returning)
    }
}

impl fmt::Display for CreateDatabaseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE DATABASE ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for DropDatabaseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DROP DATABASE ")?;
        if self.if_exists {
            write!(f, "IF EXISTS ")?;
        }
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for UseStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USE {}", self.name)
    }
}

impl fmt::Display for CreateTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE TABLE ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        fmt_schema(f, &self.schema)?;
        write!(f, "{} (", self.name)?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        for constraint in &self.constraints {
            write!(f, ", {constraint}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for DropTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DROP TABLE ")?;
        if self.if_exists {
            write!(f, "IF EXISTS ")?;
        }
        fmt_schema(f, &self.schema)?;
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for AlterTableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddColumn(col) => write!(f, "ADD COLUMN {col}"),
            Self::DropColumn(name) => write!(f, "DROP COLUMN {name}"),
            Self::AddConstraint(c) => write!(f, "ADD CONSTRAINT {c}"),
            Self::DropConstraint(name) => write!(f, "DROP CONSTRAINT {name}"),
            Self::Rename(name) => write!(f, "RENAME TO {name}"),
        }
    }
}

impl fmt::Display for AlterTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE ")?;
        fmt_schema(f, &self.schema)?;
        write!(f, "{} {}", self.name, self.action)
    }
}

impl fmt::Display for CreateViewStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE ")?;
        if self.materialized {
            write!(f, "MATERIALIZED ")?;
        }
        write!(f, "VIEW ")?;
        if self.if_not_exists {
            write!(f, "IF NOT EXISTS ")?;
        }
        fmt_schema(f, &self.schema)?;
        write!(f, "{} AS {}", self.name, self.query)
    }
}

impl fmt::Display for DropViewStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DROP VIEW ")?;
        if self.if_exists {
            write!(f, "IF EXISTS ")?;
        }
        fmt_schema(f, &self.schema)?;
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for RefreshMaterializedViewStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REFRESH MATERIALIZED VIEW ")?;
        fmt_schema(f, &self.schema)?;
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => write!(f, "{s}"),
            Self::Insert(i) => write!(f, "{i}"),
            Self::Update(u) => write!(f, "{u}"),
            Self::Delete(d) => write!(f, "{d}"),
            Self::CreateDatabase(s) => write!(f, "{s}"),
            Self::DropDatabase(s) => write!(f, "{s}"),
            Self::Use(s) => write!(f, "{s}"),
            Self::CreateTable(s) => write!(f, "{s}"),
            Self::DropTable(s) => write!(f, "{s}"),
            Self::AlterTable(s) => write!(f, "{s}"),
            Self::CreateView(s) => write!(f, "{s}"),
            Self::DropView(s) => write!(f, "{s}"),
            Self::RefreshMaterializedView(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction() {
        assert_eq!(OrderDirection::Asc.as_str(), "ASC");
        assert_eq!(OrderDirection::Desc.as_str(), "DESC");
    }

    #[test]
    fn test_join_type() {
        assert_eq!(JoinType::Inner.as_str(), "INNER JOIN");
        assert_eq!(JoinType::Left.as_str(), "LEFT JOIN");
    }

    #[test]
    fn test_table_ref_builder() {
        let table = TableRef::table("users").alias("u");
        assert!(
            matches!(table, TableRef::Table { name, alias, .. } if name == "users" && alias == Some(String::from("u")))
        );
    }

    #[test]
    fn test_select_with_set_op_display() {
        let stmt = SelectStatement {
            set_ops: vec![SetOpBranch {
                op: SetOp::Union,
                select: Box::new(SelectStatement::new(vec![SelectColumn::new(Expr::integer(1))])),
            }],
            ..SelectStatement::new(vec![SelectColumn::new(Expr::integer(2))])
        };
        assert_eq!(stmt.to_string(), "SELECT 2 UNION SELECT 1");
    }

    #[test]
    fn test_create_table_display() {
        let stmt = CreateTableStatement {
            schema: None,
            name: String::from("t"),
            columns: vec![
                ColumnDef::new("id", super::super::types::DataType::Serial).primary_key(),
                ColumnDef::new("name", super::super::types::DataType::Text),
            ],
            constraints: vec![],
            if_not_exists: true,
        };
        assert_eq!(
            stmt.to_string(),
            "CREATE TABLE IF NOT EXISTS t (id SERIAL PRIMARY KEY, name TEXT)"
        );
    }
}
