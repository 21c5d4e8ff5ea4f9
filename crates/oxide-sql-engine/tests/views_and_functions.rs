//! Plain (non-materialized) views re-evaluate on every reference, and the
//! built-in scalar function / CAST surface (§4.3, §11).

mod common;

use common::{exec, exec_err, fresh_db, query};
use oxide_sql_engine::Value;

#[test]
fn plain_view_reflects_live_table_state() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "INSERT INTO t VALUES (1), (2)");
    exec(&mut db, "CREATE VIEW v AS SELECT COUNT(*) AS c FROM t");

    let (_, rows) = query(&mut db, "SELECT c FROM v");
    assert_eq!(rows, vec![vec![Value::Int(2)]]);

    exec(&mut db, "INSERT INTO t VALUES (3)");
    let (_, rows) = query(&mut db, "SELECT c FROM v");
    assert_eq!(rows, vec![vec![Value::Int(3)]], "a plain view must not cache its result");
}

#[test]
fn drop_view_removes_it() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "CREATE VIEW v AS SELECT x FROM t");
    exec(&mut db, "DROP VIEW v");
    let err = exec_err(&mut db, "SELECT * FROM v");
    assert!(matches!(err, oxide_sql_engine::EngineError::Name { .. }));
}

#[test]
fn refresh_on_a_plain_view_is_rejected() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "CREATE VIEW v AS SELECT x FROM t");
    let err = exec_err(&mut db, "REFRESH MATERIALIZED VIEW v");
    assert!(matches!(err, oxide_sql_engine::EngineError::State(_)));
}

#[test]
fn string_and_numeric_functions() {
    let mut db = fresh_db();
    let (_, rows) = query(&mut db, "SELECT UPPER('abc'), LOWER('XYZ'), LENGTH('hello'), ROUND(3.456, 2)");
    assert_eq!(
        rows,
        vec![vec![
            Value::String("ABC".into()),
            Value::String("xyz".into()),
            Value::Int(5),
            Value::Float(3.46),
        ]]
    );
}

#[test]
fn coalesce_and_nullif() {
    let mut db = fresh_db();
    let (_, rows) = query(&mut db, "SELECT COALESCE(NULL, NULL, 5), NULLIF(3, 3), NULLIF(3, 4)");
    assert_eq!(rows, vec![vec![Value::Int(5), Value::Null, Value::Int(3)]]);
}

#[test]
fn concat_and_bitwise_and_like() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (name VARCHAR)");
    exec(&mut db, "INSERT INTO t VALUES ('alice'), ('bob'), ('alicia')");
    let (_, rows) = query(&mut db, "SELECT name FROM t WHERE name LIKE 'ali%' ORDER BY name");
    assert_eq!(rows, vec![vec![Value::String("alice".into())], vec![Value::String("alicia".into())]]);

    let (_, rows) = query(&mut db, "SELECT 'a' || 'b' || 'c'");
    assert_eq!(rows, vec![vec![Value::String("abc".into())]]);

    let (_, rows) = query(&mut db, "SELECT 6 & 3, 6 | 1, 1 << 3");
    assert_eq!(rows, vec![vec![Value::Int(2), Value::Int(7), Value::Int(8)]]);
}

#[test]
fn case_expression_first_match_wins() {
    let mut db = fresh_db();
    let (_, rows) = query(
        &mut db,
        "SELECT CASE WHEN 1 = 2 THEN 'a' WHEN 1 = 1 THEN 'b' ELSE 'c' END",
    );
    assert_eq!(rows, vec![vec![Value::String("b".into())]]);

    let (_, rows) = query(&mut db, "SELECT CASE WHEN 1 = 2 THEN 'a' END");
    assert_eq!(rows, vec![vec![Value::Null]], "CASE with no matching WHEN and no ELSE is NULL");
}
