//! Six named end-to-end scenarios: constraints/defaults, `ON CONFLICT DO
//! UPDATE`, three-valued logic, group/having/order, CTE + set-op +
//! subquery, and materialized view staleness.

mod common;

use common::{exec, exec_err, fresh_db, query};
use oxide_sql_engine::{EngineError, Value};

#[test]
fn s1_constraints_and_defaults() {
    let mut db = fresh_db();
    exec(
        &mut db,
        "CREATE TABLE t (id SERIAL PRIMARY KEY, name VARCHAR UNIQUE, age INT CHECK (age >= 0))",
    );
    exec(&mut db, "INSERT INTO t (name, age) VALUES ('a', 10), ('b', 20)");

    let unique_violation = exec_err(&mut db, "INSERT INTO t (name, age) VALUES ('a', 30)");
    assert!(matches!(unique_violation, EngineError::Constraint { .. }));

    let check_violation = exec_err(&mut db, "INSERT INTO t (name, age) VALUES ('c', -1)");
    assert!(matches!(check_violation, EngineError::Constraint { .. }));

    let (columns, rows) = query(&mut db, "SELECT * FROM t");
    assert_eq!(columns, vec!["id", "name", "age"]);
    assert_eq!(
        rows,
        vec![
            vec![Value::Serial(1), Value::String("a".into()), Value::Int(10)],
            vec![Value::Serial(2), Value::String("b".into()), Value::Int(20)],
        ]
    );
}

#[test]
fn s2_on_conflict_do_update() {
    let mut db = fresh_db();
    exec(
        &mut db,
        "CREATE TABLE t (id SERIAL PRIMARY KEY, name VARCHAR UNIQUE, age INT CHECK (age >= 0))",
    );
    exec(&mut db, "INSERT INTO t (name, age) VALUES ('a', 10), ('b', 20)");

    let (columns, rows) = query(
        &mut db,
        "INSERT INTO t (name, age) VALUES ('a', 99) ON CONFLICT (name) DO UPDATE SET age = 99 RETURNING *",
    );
    assert_eq!(columns, vec!["id", "name", "age"]);
    assert_eq!(rows, vec![vec![Value::Serial(1), Value::String("a".into()), Value::Int(99)]]);

    let (_, all) = query(&mut db, "SELECT * FROM t ORDER BY id");
    assert_eq!(all[0][2], Value::Int(99));
}

#[test]
fn s3_three_valued_logic() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE u (x INT)");
    exec(&mut db, "INSERT INTO u VALUES (1), (NULL), (2)");

    let (_, rows) = query(&mut db, "SELECT COUNT(*) FROM u WHERE x <> 1");
    assert_eq!(rows, vec![vec![Value::Int(1)]]);

    let (_, rows) = query(&mut db, "SELECT COUNT(*) FROM u WHERE x IS NULL");
    assert_eq!(rows, vec![vec![Value::Int(1)]]);
}

#[test]
fn s4_group_having_order() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE s (g VARCHAR, v INT)");
    exec(&mut db, "INSERT INTO s VALUES ('a',1),('a',3),('b',5),('b',NULL),('c',2)");

    let (columns, rows) = query(
        &mut db,
        "SELECT g, SUM(v) AS tot FROM s GROUP BY g HAVING SUM(v) > 2 ORDER BY tot DESC",
    );
    assert_eq!(columns, vec!["g", "tot"]);
    assert_eq!(
        rows,
        vec![
            vec![Value::String("b".into()), Value::Int(5)],
            vec![Value::String("a".into()), Value::Int(4)],
        ]
    );
}

#[test]
fn s5_cte_set_op_subquery() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE s (g VARCHAR, v INT)");
    exec(&mut db, "INSERT INTO s VALUES ('a',1),('a',3),('b',5),('b',NULL),('c',2)");

    let (_, rows) = query(
        &mut db,
        "WITH hi AS (SELECT v FROM s WHERE v > 1) \
         SELECT v FROM hi \
         UNION \
         SELECT v FROM s WHERE v = (SELECT MIN(v) FROM s)",
    );
    let mut got: Vec<i64> = rows.into_iter().map(|r| r[0].as_int().unwrap()).collect();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3, 5]);
}

#[test]
fn s6_materialized_view_staleness() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE s (g VARCHAR, v INT)");
    exec(&mut db, "INSERT INTO s VALUES ('a',1),('a',3),('b',5),('b',NULL),('c',2)");
    exec(&mut db, "CREATE MATERIALIZED VIEW mv AS SELECT COUNT(*) AS c FROM s");

    let (_, rows) = query(&mut db, "SELECT c FROM mv");
    assert_eq!(rows, vec![vec![Value::Int(5)]]);

    exec(&mut db, "INSERT INTO s VALUES ('d', 7)");
    let (_, rows) = query(&mut db, "SELECT c FROM mv");
    assert_eq!(rows, vec![vec![Value::Int(5)]], "materialized view must not auto-refresh");

    exec(&mut db, "REFRESH MATERIALIZED VIEW mv");
    let (_, rows) = query(&mut db, "SELECT c FROM mv");
    assert_eq!(rows, vec![vec![Value::Int(6)]]);
}
