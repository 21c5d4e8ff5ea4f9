#![allow(dead_code)]

use oxide_sql_core::Parser;
use oxide_sql_engine::{Engine, EngineError, ExecOutcome, Params, Value};

/// Parses and executes one statement, panicking with the SQL text on either
/// a parse or an execution failure — the common case for test setup that is
/// expected to succeed.
pub fn exec(engine: &mut Engine, sql: &str) -> ExecOutcome {
    let stmt = Parser::new(sql).parse_statement().unwrap_or_else(|e| panic!("parse error in {sql:?}: {e}"));
    engine.execute(&stmt, &Params::none()).unwrap_or_else(|e| panic!("exec error in {sql:?}: {e}"))
}

/// Parses and executes one statement, returning the error rather than
/// panicking — for assertions that a statement must fail.
pub fn exec_err(engine: &mut Engine, sql: &str) -> EngineError {
    let stmt = Parser::new(sql).parse_statement().unwrap_or_else(|e| panic!("parse error in {sql:?}: {e}"));
    engine.execute(&stmt, &Params::none()).expect_err(&format!("expected {sql:?} to fail"))
}

/// Runs a `SELECT` (or any `RETURNING` statement) and unwraps its
/// (column names, rows) result.
pub fn query(engine: &mut Engine, sql: &str) -> (Vec<String>, Vec<Vec<Value>>) {
    match exec(engine, sql) {
        ExecOutcome::Rows { columns, rows } => (columns, rows),
        ExecOutcome::Status { message, .. } => panic!("expected rows from {sql:?}, got status {message:?}"),
    }
}

/// Runs every `;`-separated statement in `sql` in order via a fresh batch,
/// panicking on the first failure — convenience for multi-statement setup.
pub fn exec_batch(engine: &mut Engine, sql: &str) {
    for item in engine.execute_batch(sql, &Params::none()).unwrap_or_else(|e| panic!("batch parse error: {e}")) {
        item.unwrap_or_else(|e| panic!("batch exec error: {e}"));
    }
}

/// A fresh engine with one database `d` created and selected — the starting
/// point most scenario tests share.
pub fn fresh_db() -> Engine {
    let mut engine = Engine::new();
    exec(&mut engine, "CREATE DATABASE d");
    exec(&mut engine, "USE d");
    engine
}
