//! JOIN variants, set operations, and subquery forms (§4.4-4.5).

mod common;

use common::{exec, exec_err, fresh_db, query};
use oxide_sql_engine::Value;

fn setup_join_tables(db: &mut oxide_sql_engine::Engine) {
    exec(db, "CREATE TABLE a (id INT, name VARCHAR)");
    exec(db, "INSERT INTO a VALUES (1, 'x'), (2, 'y'), (3, 'z')");
    exec(db, "CREATE TABLE b (aid INT, note VARCHAR)");
    exec(db, "INSERT INTO b VALUES (1, 'one'), (2, 'two'), (4, 'four')");
}

#[test]
fn inner_join_drops_unmatched_rows() {
    let mut db = fresh_db();
    setup_join_tables(&mut db);
    let (_, rows) = query(&mut db, "SELECT a.id, b.note FROM a JOIN b ON a.id = b.aid ORDER BY a.id");
    assert_eq!(
        rows,
        vec![
            vec![Value::Int(1), Value::String("one".into())],
            vec![Value::Int(2), Value::String("two".into())],
        ]
    );
}

#[test]
fn left_join_pads_unmatched_left_rows_with_null() {
    let mut db = fresh_db();
    setup_join_tables(&mut db);
    let (_, rows) = query(&mut db, "SELECT a.id, b.note FROM a LEFT JOIN b ON a.id = b.aid ORDER BY a.id");
    assert_eq!(
        rows,
        vec![
            vec![Value::Int(1), Value::String("one".into())],
            vec![Value::Int(2), Value::String("two".into())],
            vec![Value::Int(3), Value::Null],
        ]
    );
}

#[test]
fn right_join_pads_unmatched_right_rows_with_null() {
    let mut db = fresh_db();
    setup_join_tables(&mut db);
    let (_, rows) = query(&mut db, "SELECT a.id, b.note FROM a RIGHT JOIN b ON a.id = b.aid ORDER BY b.note");
    assert_eq!(
        rows,
        vec![
            vec![Value::Null, Value::String("four".into())],
            vec![Value::Int(1), Value::String("one".into())],
            vec![Value::Int(2), Value::String("two".into())],
        ]
    );
}

#[test]
fn full_join_pads_both_sides() {
    let mut db = fresh_db();
    setup_join_tables(&mut db);
    let (_, rows) = query(&mut db, "SELECT COUNT(*) FROM a FULL JOIN b ON a.id = b.aid");
    // 2 matches + 1 unmatched left (id 3) + 1 unmatched right (aid 4) = 4 rows.
    assert_eq!(rows, vec![vec![Value::Int(4)]]);
}

#[test]
fn cross_join_is_cartesian_product() {
    let mut db = fresh_db();
    setup_join_tables(&mut db);
    let (_, rows) = query(&mut db, "SELECT COUNT(*) FROM a CROSS JOIN b");
    assert_eq!(rows, vec![vec![Value::Int(9)]]);
}

#[test]
fn join_using_shares_the_named_column_once() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE a (id INT, v INT)");
    exec(&mut db, "INSERT INTO a VALUES (1, 10), (2, 20)");
    exec(&mut db, "CREATE TABLE b (id INT, w INT)");
    exec(&mut db, "INSERT INTO b VALUES (1, 100), (3, 300)");
    let (columns, rows) = query(&mut db, "SELECT * FROM a JOIN b USING (id)");
    assert_eq!(columns, vec!["id", "v", "w"]);
    assert_eq!(rows, vec![vec![Value::Int(1), Value::Int(10), Value::Int(100)]]);
}

#[test]
fn union_removes_duplicates_union_all_keeps_them() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "INSERT INTO t VALUES (1), (1), (2)");

    let (_, rows) = query(&mut db, "SELECT x FROM t UNION SELECT x FROM t");
    let mut got: Vec<i64> = rows.into_iter().map(|r| r[0].as_int().unwrap()).collect();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2]);

    let (_, rows) = query(&mut db, "SELECT x FROM t UNION ALL SELECT x FROM t");
    assert_eq!(rows.len(), 6);
}

#[test]
fn order_by_and_limit_bind_to_the_whole_compound_statement() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE a (v INT)");
    exec(&mut db, "INSERT INTO a VALUES (1), (3)");
    exec(&mut db, "CREATE TABLE b (v INT)");
    exec(&mut db, "INSERT INTO b VALUES (2), (4)");

    let (_, rows) =
        query(&mut db, "SELECT v FROM a UNION SELECT v FROM b ORDER BY v DESC LIMIT 2");
    assert_eq!(rows, vec![vec![Value::Int(4)], vec![Value::Int(3)]]);
}

#[test]
fn intersect_and_except() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "INSERT INTO t VALUES (1), (2), (3)");
    exec(&mut db, "CREATE TABLE u (x INT)");
    exec(&mut db, "INSERT INTO u VALUES (2), (3), (4)");

    let (_, rows) = query(&mut db, "SELECT x FROM t INTERSECT SELECT x FROM u");
    let mut got: Vec<i64> = rows.into_iter().map(|r| r[0].as_int().unwrap()).collect();
    got.sort_unstable();
    assert_eq!(got, vec![2, 3]);

    let (_, rows) = query(&mut db, "SELECT x FROM t EXCEPT SELECT x FROM u");
    assert_eq!(rows, vec![vec![Value::Int(1)]]);
}

#[test]
fn set_op_rejects_mismatched_column_count() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "CREATE TABLE u (x INT, y INT)");
    let err = exec_err(&mut db, "SELECT x FROM t UNION SELECT x, y FROM u");
    assert!(matches!(err, oxide_sql_engine::EngineError::Cardinality(_)));
}

#[test]
fn scalar_subquery_with_more_than_one_row_errors() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "INSERT INTO t VALUES (1), (2)");
    let err = exec_err(&mut db, "SELECT (SELECT x FROM t) FROM t");
    assert!(matches!(err, oxide_sql_engine::EngineError::Cardinality(_)));
}

#[test]
fn exists_and_not_exists() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (x INT)");
    exec(&mut db, "INSERT INTO t VALUES (1), (2), (3)");
    exec(&mut db, "CREATE TABLE u (x INT)");
    exec(&mut db, "INSERT INTO u VALUES (2)");

    let (_, rows) = query(&mut db, "SELECT x FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.x = t.x) ORDER BY x");
    assert_eq!(rows, vec![vec![Value::Int(2)]]);

    let (_, rows) = query(&mut db, "SELECT x FROM t WHERE NOT EXISTS (SELECT 1 FROM u WHERE u.x = t.x) ORDER BY x");
    assert_eq!(rows, vec![vec![Value::Int(1)], vec![Value::Int(3)]]);
}

#[test]
fn correlated_in_subquery() {
    let mut db = fresh_db();
    exec(&mut db, "CREATE TABLE t (g VARCHAR, x INT)");
    exec(&mut db, "INSERT INTO t VALUES ('a', 1), ('a', 2), ('b', 5)");

    let (_, rows) = query(
        &mut db,
        "SELECT g, x FROM t outer_t WHERE x IN (SELECT x FROM t inner_t WHERE inner_t.g = outer_t.g AND inner_t.x > 1) ORDER BY g, x",
    );
    assert_eq!(
        rows,
        vec![vec![Value::String("a".into()), Value::Int(2)], vec![Value::String("b".into()), Value::Int(5)]]
    );
}
