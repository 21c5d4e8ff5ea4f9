//! Abstract Syntax Tree (AST) types for SQL statements.

mod expression;
mod statement;
mod types;

pub use expression::{BinaryOp, Expr, FunctionCall, Literal, UnaryOp};
pub use statement::{
    AlterTableAction, AlterTableStatement, CommonTableExpr, ConflictAction,
    CreateDatabaseStatement, CreateTableStatement, CreateViewStatement, DeleteStatement,
    DropDatabaseStatement, DropTableStatement, DropViewStatement, InsertSource, InsertStatement,
    JoinClause, JoinType, NullOrdering, OnConflict, OrderBy, OrderDirection,
    RefreshMaterializedViewStatement, SelectColumn, SelectStatement, SetOp, SetOpBranch,
    Statement, TableRef, UpdateAssignment, UpdateStatement, UseStatement,
};
pub use types::{ColumnDef, DataType, TableConstraint};
