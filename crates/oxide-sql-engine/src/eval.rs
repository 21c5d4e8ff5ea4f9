//! The expression evaluator (§4.4): turns an [`Expr`] plus an [`Env`] into a
//! runtime [`Value`]. Three-valued comparisons collapse to a plain [`Value`]
//! at the leaves (`Bool3::into_value`) so composition (e.g. `CASE WHEN a = b`)
//! stays uniform; the executor re-derives [`Bool3`] at its own admission
//! points (`WHERE`/`HAVING`/`ON`/`CHECK`) by converting back with
//! `Bool3::try_from`.

use oxide_sql_core::ast::{BinaryOp, Expr, Literal, UnaryOp};

use crate::aggregate::AggregateKind;
use crate::env::Env;
use crate::error::{EngineError, Result};
use crate::functions;
use crate::value::{self, Bool3, Type, Value};

/// Evaluates `expr` against `env`.
///
/// # Errors
/// Any [`EngineError`] the expression's operators, casts, function calls, or
/// nested subqueries produce.
pub fn eval(expr: &Expr, env: &Env<'_>) -> Result<Value> {
    Ok(match expr {
        Expr::Literal(lit) => literal_value(lit),
        Expr::Column { table, name, .. } => env.resolve_column(table.as_deref(), name)?.clone(),
        Expr::Binary { left, op, right } => eval_binary(left, *op, right, env)?,
        Expr::Unary { op, operand } => eval_unary(*op, operand, env)?,
        Expr::Function(call) => eval_function(call, env)?,
        Expr::Subquery(query) => eval_scalar_subquery(query, env)?,
        Expr::IsNull { expr, negated } => Value::Bool(eval(expr, env)?.is_null() != *negated),
        Expr::In { expr, list, negated } => eval_in_list(expr, list, *negated, env)?,
        Expr::InSubquery { expr, query, negated } => eval_in_subquery(expr, query, *negated, env)?,
        Expr::Between { expr, low, high, negated } => eval_between(expr, low, high, *negated, env)?,
        Expr::Like { expr, pattern, negated, case_insensitive } => {
            eval_like(expr, pattern, *negated, *case_insensitive, env)?
        }
        Expr::Exists { query, negated } => {
            let relation = env.subqueries.execute(query, env)?;
            Value::Bool(relation.rows.is_empty() == *negated)
        }
        Expr::Case { operand, when_clauses, else_clause } => eval_case(operand.as_deref(), when_clauses, else_clause.as_deref(), env)?,
        Expr::Cast { expr, data_type } => value::cast_value(&eval(expr, env)?, Type::from_ast(data_type)?)?,
        Expr::Extract { field, expr } => functions::extract(field, &eval(expr, env)?)?,
        Expr::CurrentDate => Value::Date(env.now.date()),
        Expr::Paren(inner) => eval(inner, env)?,
        Expr::Parameter { name, position } => resolve_param(name.as_deref(), *position, env)?,
        Expr::Wildcard { .. } => {
            return Err(EngineError::State("* is only valid in a SELECT list, not as an expression".into()));
        }
    })
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Blob(b) => Value::Blob(b.clone()),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn resolve_param(name: Option<&str>, position: usize, env: &Env<'_>) -> Result<Value> {
    if let Some(name) = name {
        return env
            .params
            .named
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::State(format!("no value bound for parameter :{name}")));
    }
    env.params
        .positional
        .get(position.saturating_sub(1))
        .cloned()
        .ok_or_else(|| EngineError::State(format!("no value bound for parameter ?{position}")))
}

fn eval_binary(left: &Expr, op: BinaryOp, right: &Expr, env: &Env<'_>) -> Result<Value> {
    // AND/OR short-circuit under Kleene logic rather than strict-null
    // propagation (e.g. `FALSE AND NULL` is `FALSE`, not `NULL`).
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let l = Bool3::try_from(&eval(left, env)?)?;
        let r = Bool3::try_from(&eval(right, env)?)?;
        return Ok(match op {
            BinaryOp::And => l.and(r),
            BinaryOp::Or => l.or(r),
            _ => unreachable!(),
        }
        .into_value());
    }

    let l = eval(left, env)?;
    let r = eval(right, env)?;

    if matches!(op, BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq) {
        return Ok(eval_comparison(op, &l, &r)?.into_value());
    }

    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }

    Ok(match op {
        BinaryOp::Add => numeric_binop(&l, &r, "+", |a, b| a.checked_add(b).map(Value::Int), |a, b| Value::Float(a + b))?,
        BinaryOp::Sub => numeric_binop(&l, &r, "-", |a, b| a.checked_sub(b).map(Value::Int), |a, b| Value::Float(a - b))?,
        BinaryOp::Mul => numeric_binop(&l, &r, "*", |a, b| a.checked_mul(b).map(Value::Int), |a, b| Value::Float(a * b))?,
        BinaryOp::Div => divide(&l, &r)?,
        BinaryOp::Mod => modulo(&l, &r)?,
        BinaryOp::Concat => Value::String(format!("{}{}", want_string(&l)?, want_string(&r)?)),
        BinaryOp::BitAnd => Value::Int(want_int(&l)? & want_int(&r)?),
        BinaryOp::BitOr => Value::Int(want_int(&l)? | want_int(&r)?),
        BinaryOp::LeftShift => Value::Int(shift(want_int(&l)?, want_int(&r)?, true)),
        BinaryOp::RightShift => Value::Int(shift(want_int(&l)?, want_int(&r)?, false)),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq | BinaryOp::And | BinaryOp::Or => {
            unreachable!("handled above")
        }
    })
}

fn eval_comparison(op: BinaryOp, l: &Value, r: &Value) -> Result<Bool3> {
    Ok(match op {
        BinaryOp::Eq => value::value_eq3(l, r),
        BinaryOp::NotEq => value::value_eq3(l, r).not(),
        _ => match value::value_cmp(l, r) {
            None => Bool3::Unknown,
            Some(ord) => Bool3::from_bool(match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::LtEq => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                BinaryOp::GtEq => ord.is_ge(),
                _ => unreachable!(),
            }),
        },
    })
}

fn numeric_binop(
    l: &Value,
    r: &Value,
    sym: &str,
    int_op: impl Fn(i64, i64) -> Option<Value>,
    float_op: impl Fn(f64, f64) -> Value,
) -> Result<Value> {
    match (l, r) {
        (Value::Int(a) | Value::Serial(a), Value::Int(b) | Value::Serial(b)) => {
            int_op(*a, *b).ok_or_else(|| EngineError::Arithmetic(format!("integer overflow in {a} {sym} {b}")))
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(float_op(a, b)),
            _ => Err(EngineError::Type(format!(
                "{sym}: expected numeric operands, found {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        },
    }
}

fn divide(l: &Value, r: &Value) -> Result<Value> {
    match (l, r) {
        (Value::Int(a) | Value::Serial(a), Value::Int(b) | Value::Serial(b)) => {
            if *b == 0 {
                return Err(EngineError::Arithmetic("division by zero".into()));
            }
            Ok(Value::Int(a / b)) // truncating toward zero, matching Rust's integer division
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => {
                if b == 0.0 {
                    return Err(EngineError::Arithmetic("division by zero".into()));
                }
                Ok(Value::Float(a / b))
            }
            _ => Err(EngineError::Type(format!(
                "/: expected numeric operands, found {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        },
    }
}

fn modulo(l: &Value, r: &Value) -> Result<Value> {
    let a = want_int(l)?;
    let b = want_int(r)?;
    if b == 0 {
        return Err(EngineError::Arithmetic("modulo by zero".into()));
    }
    let rem = a % b;
    // Follows the divisor's sign (as SQL's MOD does), not the dividend's
    // (Rust's `%` default).
    let rem = if rem != 0 && (rem < 0) != (b < 0) { rem + b } else { rem };
    Ok(Value::Int(rem))
}

// A negative amount reverses direction (`a << -n` is `a >> n`); an amount
// whose magnitude reaches or exceeds the operand's 64 bits saturates instead
// of wrapping into the shift instruction's modulo-64 behavior, matching
// SQLite rather than panicking (debug) or silently masking (release) on
// `SELECT 1 << 64`. Right-shift saturation sign-extends like `>>` already
// does for in-range amounts.
fn shift(a: i64, n: i64, left: bool) -> i64 {
    let left = if n < 0 { !left } else { left };
    let magnitude = n.unsigned_abs();
    if magnitude >= 64 {
        return if left || a >= 0 { 0 } else { -1 };
    }
    let magnitude = magnitude as u32;
    if left {
        ((a as u64) << magnitude) as i64
    } else {
        a >> magnitude
    }
}

fn want_string(v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        other => Err(EngineError::Type(format!("||: expected STRING, found {}", other.type_name()))),
    }
}

fn want_int(v: &Value) -> Result<i64> {
    v.as_int().ok_or_else(|| EngineError::Type(format!("expected INT, found {}", v.type_name())))
}

fn eval_unary(op: UnaryOp, operand: &Expr, env: &Env<'_>) -> Result<Value> {
    let v = eval(operand, env)?;
    if matches!(op, UnaryOp::Not) {
        return Ok(Bool3::try_from(&v)?.not().into_value());
    }
    if v.is_null() {
        return Ok(Value::Null);
    }
    Ok(match op {
        UnaryOp::Plus => match v {
            Value::Int(_) | Value::Serial(_) | Value::Float(_) => v,
            other => return Err(EngineError::Type(format!("unary +: expected numeric, found {}", other.type_name()))),
        },
        UnaryOp::Neg => match v {
            Value::Int(n) | Value::Serial(n) => {
                Value::Int(n.checked_neg().ok_or_else(|| EngineError::Arithmetic("integer overflow in unary -".into()))?)
            }
            Value::Float(f) => Value::Float(-f),
            other => return Err(EngineError::Type(format!("unary -: expected numeric, found {}", other.type_name()))),
        },
        UnaryOp::BitNot => Value::Int(!want_int(&v)?),
        UnaryOp::Not => unreachable!("handled above"),
    })
}

fn eval_function(call: &oxide_sql_core::ast::FunctionCall, env: &Env<'_>) -> Result<Value> {
    if AggregateKind::from_name(&call.name).is_some() {
        let key = Expr::Function(call.clone()).to_string();
        return env.aggregates.and_then(|m| m.get(&key)).cloned().ok_or_else(|| {
            EngineError::State(format!(
                "{} is an aggregate function and may only appear in a SELECT list, HAVING clause, or ORDER BY of a grouped query",
                call.name
            ))
        });
    }
    let args = call.args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>>>()?;
    functions::call(&call.name, &args, env.now)
}

fn eval_scalar_subquery(query: &oxide_sql_core::ast::SelectStatement, env: &Env<'_>) -> Result<Value> {
    let relation = env.subqueries.execute(query, env)?;
    if relation.columns.len() > 1 {
        return Err(EngineError::Cardinality(format!(
            "subquery used as an expression must return exactly one column, found {}",
            relation.columns.len()
        )));
    }
    match relation.rows.len() {
        0 => Ok(Value::Null),
        1 => Ok(relation.rows[0].first().cloned().unwrap_or(Value::Null)),
        n => Err(EngineError::Cardinality(format!("subquery used as an expression returned {n} rows, expected at most 1"))),
    }
}

fn eval_in_list(expr: &Expr, list: &[Expr], negated: bool, env: &Env<'_>) -> Result<Value> {
    let needle = eval(expr, env)?;
    let mut found = Bool3::False;
    for item in list {
        let candidate = eval(item, env)?;
        found = found.or(value::value_eq3(&needle, &candidate));
    }
    let result = if negated { found.not() } else { found };
    Ok(result.into_value())
}

fn eval_in_subquery(expr: &Expr, query: &oxide_sql_core::ast::SelectStatement, negated: bool, env: &Env<'_>) -> Result<Value> {
    let needle = eval(expr, env)?;
    let relation = env.subqueries.execute(query, env)?;
    let mut found = Bool3::False;
    for row in &relation.rows {
        let candidate = row.first().cloned().unwrap_or(Value::Null);
        found = found.or(value::value_eq3(&needle, &candidate));
    }
    let result = if negated { found.not() } else { found };
    Ok(result.into_value())
}

fn eval_between(expr: &Expr, low: &Expr, high: &Expr, negated: bool, env: &Env<'_>) -> Result<Value> {
    let v = eval(expr, env)?;
    let l = eval(low, env)?;
    let h = eval(high, env)?;
    let ge_low = eval_comparison(BinaryOp::GtEq, &v, &l)?;
    let le_high = eval_comparison(BinaryOp::LtEq, &v, &h)?;
    let between = ge_low.and(le_high);
    Ok(if negated { between.not() } else { between }.into_value())
}

fn eval_like(expr: &Expr, pattern: &Expr, negated: bool, case_insensitive: bool, env: &Env<'_>) -> Result<Value> {
    let text = eval(expr, env)?;
    let pat = eval(pattern, env)?;
    if text.is_null() || pat.is_null() {
        return Ok(Value::Null);
    }
    let text = want_string(&text)?;
    let pat = want_string(&pat)?;
    let matched = functions::like_match(&text, &pat, case_insensitive);
    Ok(Bool3::from_bool(matched != negated).into_value())
}

fn eval_case(operand: Option<&Expr>, when_clauses: &[(Expr, Expr)], else_clause: Option<&Expr>, env: &Env<'_>) -> Result<Value> {
    let operand_val = operand.map(|e| eval(e, env)).transpose()?;
    for (when, then) in when_clauses {
        let matched = match &operand_val {
            Some(op_val) => value::value_eq3(op_val, &eval(when, env)?).is_true(),
            None => Bool3::try_from(&eval(when, env)?)?.is_true(),
        };
        if matched {
            return eval(then, env);
        }
    }
    else_clause.map_or(Ok(Value::Null), |e| eval(e, env))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use oxide_sql_core::ast::SelectStatement;

    use super::*;
    use crate::catalog::Catalog;
    use crate::env::{Params, Scope};
    use crate::relation::{ColumnRef, Relation};

    struct NoSubqueries;
    impl crate::env::SubqueryExecutor for NoSubqueries {
        fn execute(&self, _stmt: &SelectStatement, _env: &Env<'_>) -> Result<Relation> {
            Ok(Relation::default())
        }
    }

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    struct Fixture {
        ctes: HashMap<String, Relation>,
        catalog: Catalog,
        params: Params,
        subqueries: NoSubqueries,
    }

    impl Fixture {
        fn new() -> Self {
            Self { ctes: HashMap::new(), catalog: Catalog::new(), params: Params::none(), subqueries: NoSubqueries }
        }

        fn scalar(&self) -> Env<'_> {
            Env::scalar(&self.ctes, &self.catalog, now(), &self.params, &self.subqueries)
        }

        fn with_row(&self, columns: Vec<ColumnRef>, row: Vec<Value>) -> Env<'_> {
            Env::with_row(columns, row, &self.ctes, &self.catalog, now(), &self.params, &self.subqueries)
        }
    }

    #[test]
    fn arithmetic_promotes_int_to_float() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(3).binary(BinaryOp::Add, Expr::float(0.5));
        assert_eq!(eval(&expr, &env).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn integer_division_truncates() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(7).binary(BinaryOp::Div, Expr::integer(2));
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(3));
    }

    #[test]
    fn division_by_zero_errors() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(1).binary(BinaryOp::Div, Expr::integer(0));
        assert!(matches!(eval(&expr, &env), Err(EngineError::Arithmetic(_))));
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(-7).binary(BinaryOp::Mod, Expr::integer(3));
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(2));
    }

    #[test]
    fn shift_by_in_range_amount_matches_native_shift() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let left = Expr::integer(1).binary(BinaryOp::LeftShift, Expr::integer(4));
        assert_eq!(eval(&left, &env).unwrap(), Value::Int(16));
        let right = Expr::integer(16).binary(BinaryOp::RightShift, Expr::integer(4));
        assert_eq!(eval(&right, &env).unwrap(), Value::Int(1));
    }

    #[test]
    fn shift_by_out_of_range_amount_saturates_instead_of_panicking() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let left = Expr::integer(1).binary(BinaryOp::LeftShift, Expr::integer(64));
        assert_eq!(eval(&left, &env).unwrap(), Value::Int(0));
        let right_pos = Expr::integer(5).binary(BinaryOp::RightShift, Expr::integer(100));
        assert_eq!(eval(&right_pos, &env).unwrap(), Value::Int(0));
        let right_neg = Expr::integer(-5).binary(BinaryOp::RightShift, Expr::integer(100));
        assert_eq!(eval(&right_neg, &env).unwrap(), Value::Int(-1));
    }

    #[test]
    fn shift_by_negative_amount_reverses_direction() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(1).binary(BinaryOp::LeftShift, Expr::integer(-4));
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(0));
        let expr = Expr::integer(16).binary(BinaryOp::RightShift, Expr::integer(-4));
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(256));
    }

    #[test]
    fn null_propagates_through_arithmetic_but_not_and() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let add = Expr::integer(1).binary(BinaryOp::Add, Expr::null());
        assert_eq!(eval(&add, &env).unwrap(), Value::Null);
        let and = Expr::boolean(false).binary(BinaryOp::And, Expr::null());
        assert_eq!(eval(&and, &env).unwrap(), Value::Bool(false));
    }

    #[test]
    fn between_is_inclusive() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(5).between(Expr::integer(1), Expr::integer(5));
        assert_eq!(eval(&expr, &env).unwrap(), Value::Bool(true));
    }

    #[test]
    fn case_first_match_wins_and_no_else_is_null() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::Case {
            operand: None,
            when_clauses: vec![(Expr::boolean(false), Expr::integer(1)), (Expr::boolean(true), Expr::integer(2))],
            else_clause: None,
        };
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(2));
        let no_match = Expr::Case { operand: None, when_clauses: vec![(Expr::boolean(false), Expr::integer(1))], else_clause: None };
        assert_eq!(eval(&no_match, &env).unwrap(), Value::Null);
    }

    #[test]
    fn column_resolution_finds_qualified_and_unqualified() {
        let fx = Fixture::new();
        let env = fx.with_row(vec![ColumnRef::qualified("t", "x")], vec![Value::Int(42)]);
        assert_eq!(eval(&Expr::column("x"), &env).unwrap(), Value::Int(42));
        assert_eq!(eval(&Expr::qualified_column("t", "x"), &env).unwrap(), Value::Int(42));
    }

    #[test]
    fn in_list_with_null_and_no_match_is_unknown() {
        let fx = Fixture::new();
        let env = fx.scalar();
        let expr = Expr::integer(1).in_list(vec![Expr::integer(2), Expr::null()]);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Null);
    }

    #[test]
    fn scope_stack_resolves_innermost_first() {
        let fx = Fixture::new();
        let outer = fx.with_row(vec![ColumnRef::unqualified("x")], vec![Value::Int(1)]);
        let mut nested = outer.push_outer(Scope { columns: vec![ColumnRef::unqualified("x")], row: vec![Value::Int(1)] });
        nested.scopes.push(Scope { columns: vec![ColumnRef::unqualified("x")], row: vec![Value::Int(2)] });
        assert_eq!(eval(&Expr::column("x"), &nested).unwrap(), Value::Int(2));
    }
}
