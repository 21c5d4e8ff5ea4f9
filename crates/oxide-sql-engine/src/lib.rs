//! In-memory relational database engine: catalog, storage, evaluator, and
//! executor (§2 System Overview). Parsing is delegated entirely to
//! [`oxide_sql_core`]; this crate takes the resulting AST and runs it.
//!
//! ```text
//! SQL text -> oxide_sql_core::Parser -> Statement -> Engine::execute -> ExecOutcome
//! ```

mod aggregate;
mod catalog;
mod clock;
mod env;
mod error;
mod eval;
mod executor;
mod functions;
mod relation;
mod select;
mod snapshot;
mod value;

pub use catalog::{Catalog, Column, Database, MaterializedView, Row, Table, View};
pub use clock::{ClockPort, FixedClock, SystemClock};
pub use env::{Env, Params, Scope, SubqueryExecutor};
pub use error::{ConstraintKind, EngineError, Result};
pub use executor::{BatchItem, Engine, ExecOutcome};
pub use relation::{ColumnRef, Relation};
pub use select::{run_select, Runner};
pub use snapshot::{io_error, load_database, InMemorySnapshotStore, SnapshotPort};
pub use value::{
    cast_value, coerce_for_storage, value_cmp, value_eq3, value_group_eq, Bool3, Type, Value,
};

// Re-exported so embedders never need a direct `oxide-sql-core` dependency
// just to parse input for [`Engine::execute`].
pub use oxide_sql_core::ast::Statement;
pub use oxide_sql_core::parser::{ParseError, Parser};
