//! SQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression
//! parsing for a PostgreSQL-flavored SQL subset covering DDL, DML, and DQL.
//!
//! # Parsing approach
//!
//! Statements are parsed by dedicated recursive-descent methods dispatched
//! on the first keyword. Expressions use a Pratt (top-down operator
//! precedence) parser that handles prefix, infix, and postfix operators with
//! correct precedence and associativity (see [`pratt`]).
//!
//! # Supported statements
//!
//! | Statement | Notes |
//! |-----------|-------|
//! | `SELECT`  | Full DQL with all clauses listed below, plus trailing set-ops |
//! | `WITH ... SELECT` | One or more CTE bindings ahead of a SELECT |
//! | `INSERT`  | `VALUES`, `DEFAULT VALUES`, sub-`SELECT`, `ON CONFLICT`, `RETURNING` |
//! | `UPDATE`  | `SET`, optional `FROM`, optional alias, `RETURNING` |
//! | `DELETE`  | Optional alias, `WHERE`, `RETURNING` |
//! | `CREATE DATABASE` / `DROP DATABASE` | `IF [NOT] EXISTS` |
//! | `USE`     | Switches the session's current database |
//! | `CREATE TABLE` | Column defs, table constraints, `IF NOT EXISTS` |
//! | `DROP TABLE` | `IF EXISTS` |
//! | `ALTER TABLE` | `ADD COLUMN`, `DROP COLUMN`, `ADD CONSTRAINT`, `DROP CONSTRAINT`, `RENAME TO` |
//! | `CREATE [MATERIALIZED] VIEW` | `IF NOT EXISTS` |
//! | `DROP VIEW` | `IF EXISTS` |
//! | `REFRESH MATERIALIZED VIEW` | |
//!
//! # SELECT clauses
//!
//! Optional leading `WITH` list, `DISTINCT` / `ALL`, column list with
//! aliases, `FROM` (table, schema-qualified table, subquery, aliases),
//! `WHERE`, `GROUP BY`, `HAVING`, `ORDER BY` (with `ASC` / `DESC` and
//! `NULLS FIRST` / `NULLS LAST`), `LIMIT`, `OFFSET`, and a trailing
//! `{UNION [ALL] | INTERSECT | EXCEPT} SELECT ...` chained left-associatively.
//!
//! # JOINs
//!
//! `INNER`, `LEFT [OUTER]`, `RIGHT [OUTER]`, `FULL [OUTER]`,
//! `CROSS`, with `ON` or `USING` conditions. Chained (multi-table)
//! joins are left-associative.
//!
//! # Expressions
//!
//! - **Literals**: integers, floats, strings, blobs (`X'…'`),
//!   booleans (`TRUE`/`FALSE`), `NULL`
//! - **Column references**: unqualified (`col`), qualified (`t.col`),
//!   wildcards (`*`, `t.*`)
//! - **Binary operators**: `+`, `-`, `*`, `/`, `%`, `||`, `&`, `|`,
//!   `<<`, `>>`, `=`, `!=`/`<>`, `<`, `<=`, `>`, `>=`, `AND`, `OR`
//! - **Unary operators**: `+`, `-` (negate), `NOT`, `~` (bitwise NOT)
//! - **Special forms**: `IS [NOT] NULL`, `[NOT] BETWEEN … AND …`,
//!   `[NOT] IN (…)`/`[NOT] IN (subquery)`, `[NOT] LIKE`/`ILIKE`,
//!   `CASE`/`WHEN`/`THEN`/`ELSE`/`END`, `CAST(… AS <type>)`,
//!   `[NOT] EXISTS(…)`, `EXTRACT(field FROM expr)`, `CURRENT_DATE`
//! - **Function calls**: named functions with optional `DISTINCT`
//!   (e.g. `COUNT(DISTINCT col)`)
//! - **Subqueries**: scalar `(SELECT …)` in expressions
//! - **Parameters**: positional (`?`) and named (`:name`)
//!
//! # Data types
//!
//! `SMALLINT`, `INTEGER`/`INT`, `BIGINT`, `SERIAL`, `REAL`,
//! `DOUBLE`/`FLOAT`, `DECIMAL(p, s)`, `NUMERIC(p, s)`, `CHAR(n)`,
//! `VARCHAR(n)`, `TEXT`, `BLOB`, `DATE`, `TIME`, `TIMESTAMP`, `DATETIME`,
//! `BOOLEAN`.
//!
//! # Not supported
//!
//! Multi-statement transactions (`BEGIN` / `COMMIT` / `ROLLBACK`), window
//! functions (`OVER` / `PARTITION BY`), `NATURAL JOIN`, foreign keys,
//! triggers.

mod error;
mod parser;
mod pratt;

pub use error::ParseError;
pub use parser::Parser;
