//! The SELECT pipeline (§4.5): source resolution, filtering, grouping,
//! having, projection, distinct, set-op combination, and ordering/limiting.
//! This is also where [`SubqueryExecutor`] is implemented, so a scalar/`IN`/
//! `EXISTS` subquery re-enters the same pipeline the top-level `SELECT` does.

use std::collections::HashMap;

use oxide_sql_core::ast::{
    CommonTableExpr, Expr, FunctionCall, JoinClause, JoinType, NullOrdering, OrderBy,
    OrderDirection, SelectColumn, SelectStatement, SetOp, SetOpBranch, TableRef,
};

use crate::aggregate::{AggregateKind, Accumulator};
use crate::catalog::Row;
use crate::env::{Env, Scope, SubqueryExecutor};
use crate::error::{EngineError, Result};
use crate::eval::eval;
use crate::relation::{ColumnRef, Relation};
use crate::value::{value_cmp, value_group_eq, Bool3, Value};

/// Feeds the evaluator's scalar/`IN`/`EXISTS` subquery support back into this
/// module's [`run_select`]. Stateless: every piece of context it needs
/// (catalog, CTEs, clock, params) already travels inside the [`Env`] it is
/// handed.
pub struct Runner;

impl SubqueryExecutor for Runner {
    fn execute(&self, stmt: &SelectStatement, env: &Env<'_>) -> Result<Relation> {
        run_select(stmt, env)
    }
}

/// Runs a (possibly `WITH`-prefixed, possibly set-op-chained) SELECT to
/// completion against `env`.
///
/// # Errors
/// Any [`EngineError`] the pipeline stages below produce.
pub fn run_select(stmt: &SelectStatement, env: &Env<'_>) -> Result<Relation> {
    let mut ctes: HashMap<String, Relation> = env.ctes.clone();
    for cte in &stmt.ctes {
        if ctes.contains_key(&cte.name) {
            return Err(EngineError::Name { kind: "CTE", name: cte.name.clone() });
        }
        let cte_env = child_env(env, &ctes);
        let relation = run_select(&cte.query, &cte_env)?;
        ctes.insert(cte.name.clone(), name_cte_columns(relation, cte));
    }
    let inner_env = child_env(env, &ctes);

    let mut result = run_select_core(stmt, &inner_env)?;
    for branch in &stmt.set_ops {
        let branch_result = run_select_core(&branch.select, &inner_env)?;
        result = combine_set_op(result, branch_result, branch.op)?;
    }

    if !stmt.order_by.is_empty() {
        apply_order_by(&mut result, &stmt.order_by, &inner_env)?;
    }
    apply_limit_offset(&mut result, stmt.limit.as_ref(), stmt.offset.as_ref(), &inner_env)?;
    Ok(result)
}

/// A same-scope child [`Env`] bound to a (possibly extended) CTE map, reusing
/// the rest of the caller's context.
fn child_env<'b>(base: &Env<'_>, ctes: &'b HashMap<String, Relation>) -> Env<'b> {
    Env {
        scopes: base.scopes.clone(),
        ctes,
        catalog: base.catalog,
        now: base.now,
        params: base.params,
        subqueries: base.subqueries,
        aggregates: None,
    }
}

/// Attaches per-group aggregate values to a copy of `base`, without requiring
/// the aggregate map to share `base`'s own (often much longer) lifetime —
/// unlike [`Env::with_aggregates`], whose signature pins the map to the same
/// lifetime as the catalog/CTE borrows, `aggregates` here only needs to
/// outlive its own call.
fn env_with_aggregates<'a: 'b, 'b>(base: &Env<'a>, aggregates: &'b HashMap<String, Value>) -> Env<'b> {
    Env {
        scopes: base.scopes.clone(),
        ctes: base.ctes,
        catalog: base.catalog,
        now: base.now,
        params: base.params,
        subqueries: base.subqueries,
        aggregates: Some(aggregates),
    }
}

fn name_cte_columns(relation: Relation, cte: &CommonTableExpr) -> Relation {
    if cte.columns.is_empty() {
        return relation;
    }
    let mut relation = relation;
    for (col, name) in relation.columns.iter_mut().zip(&cte.columns) {
        col.name = name.clone();
        col.table = None;
    }
    relation
}

/// One (FROM → WHERE → group/having → project → distinct) branch, stopping
/// short of set-op combination, ORDER BY, and LIMIT/OFFSET — those apply once
/// to the whole compound statement in [`run_select`].
fn run_select_core(stmt: &SelectStatement, env: &Env<'_>) -> Result<Relation> {
    let source = resolve_table_ref(stmt.from.as_ref(), env)?;

    let mut filtered: Vec<Row> = Vec::with_capacity(source.rows.len());
    for row in &source.rows {
        let row_env = env.push_outer(Scope { columns: source.columns.clone(), row: row.clone() });
        let keep = match &stmt.where_clause {
            Some(expr) => Bool3::try_from(&eval(expr, &row_env)?)?.is_true(),
            None => true,
        };
        if keep {
            filtered.push(row.clone());
        }
    }

    let mut agg_calls = Vec::new();
    for col in &stmt.columns {
        collect_aggregate_calls(&col.expr, &mut agg_calls);
    }
    if let Some(h) = &stmt.having {
        collect_aggregate_calls(h, &mut agg_calls);
    }
    let needs_grouping = !stmt.group_by.is_empty() || !agg_calls.is_empty() || stmt.having.is_some();

    if !needs_grouping {
        let select_list = expand_select_list(&stmt.columns, &source.columns)?;
        let mut out_rows = Vec::with_capacity(filtered.len());
        for row in &filtered {
            let row_env = env.push_outer(Scope { columns: source.columns.clone(), row: row.clone() });
            let mut out = Vec::with_capacity(select_list.len());
            for (expr, _) in &select_list {
                out.push(eval(expr, &row_env)?);
            }
            out_rows.push(out);
        }
        let out_columns = select_list.iter().map(|(_, name)| ColumnRef::unqualified(name.clone())).collect();
        let mut relation = Relation { columns: out_columns, rows: out_rows };
        if stmt.distinct {
            relation.rows = dedup_rows(relation.rows);
        }
        return Ok(relation);
    }

    for col in &stmt.columns {
        if !expr_is_group_safe(&col.expr, &stmt.group_by) {
            return Err(EngineError::Type(format!(
                "column \"{}\" must appear in the GROUP BY clause or be used in an aggregate function",
                col.expr
            )));
        }
    }
    if let Some(h) = &stmt.having {
        if !expr_is_group_safe(h, &stmt.group_by) {
            return Err(EngineError::Type(format!(
                "HAVING clause \"{h}\" must appear in the GROUP BY clause or be used in an aggregate function"
            )));
        }
    }

    let groups = build_groups(&stmt.group_by, filtered, &source.columns, env)?;

    let select_list = expand_select_list(&stmt.columns, &source.columns)?;
    let mut out_rows = Vec::with_capacity(groups.len());
    for group_rows in &groups {
        let agg_values = finalize_aggregates(&agg_calls, group_rows, &source.columns, env)?;
        let representative =
            group_rows.first().cloned().unwrap_or_else(|| vec![Value::Null; source.columns.len()]);
        let base_env = env.push_outer(Scope { columns: source.columns.clone(), row: representative });
        let group_env = env_with_aggregates(&base_env, &agg_values);

        if let Some(h) = &stmt.having {
            if !Bool3::try_from(&eval(h, &group_env)?)?.is_true() {
                continue;
            }
        }
        let mut out = Vec::with_capacity(select_list.len());
        for (expr, _) in &select_list {
            out.push(eval(expr, &group_env)?);
        }
        out_rows.push(out);
    }
    let out_columns = select_list.iter().map(|(_, name)| ColumnRef::unqualified(name.clone())).collect();
    let mut relation = Relation { columns: out_columns, rows: out_rows };
    if stmt.distinct {
        relation.rows = dedup_rows(relation.rows);
    }
    Ok(relation)
}

/// Partitions `filtered` into groups by `group_by`'s tuple of expression
/// values (linear scan — this engine is not built for large catalogs). An
/// empty `group_by` with rows present still yields exactly one group; with
/// no rows and an aggregate in play it yields one empty group, so
/// `COUNT(*)`/`SUM` etc. still produce their empty-input result instead of no
/// rows at all.
fn build_groups(
    group_by: &[Expr],
    filtered: Vec<Row>,
    source_columns: &[ColumnRef],
    env: &Env<'_>,
) -> Result<Vec<Vec<Row>>> {
    if group_by.is_empty() {
        return Ok(vec![filtered]);
    }
    let mut groups: Vec<(Vec<Value>, Vec<Row>)> = Vec::new();
    for row in filtered {
        let row_env = env.push_outer(Scope { columns: source_columns.to_vec(), row: row.clone() });
        let key: Vec<Value> = group_by.iter().map(|e| eval(e, &row_env)).collect::<Result<_>>()?;
        match groups.iter_mut().find(|(k, _)| keys_match(k, &key)) {
            Some(existing) => existing.1.push(row),
            None => groups.push((key, vec![row])),
        }
    }
    Ok(groups.into_iter().map(|(_, rows)| rows).collect())
}

fn keys_match(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| value_group_eq(x, y))
}

fn finalize_aggregates(
    agg_calls: &[FunctionCall],
    group_rows: &[Row],
    source_columns: &[ColumnRef],
    env: &Env<'_>,
) -> Result<HashMap<String, Value>> {
    let mut agg_values = HashMap::with_capacity(agg_calls.len());
    for call in agg_calls {
        let kind = AggregateKind::from_name(&call.name)
            .expect("agg_calls only ever holds calls AggregateKind::from_name recognized");
        let count_star = matches!(call.args.first(), Some(Expr::Wildcard { .. }));
        let mut acc = Accumulator::new(kind, count_star, call.distinct);
        for row in group_rows {
            let row_env = env.push_outer(Scope { columns: source_columns.to_vec(), row: row.clone() });
            let value = if count_star { Value::Null } else { eval(&call.args[0], &row_env)? };
            acc.push(value);
        }
        agg_values.insert(Expr::Function(call.clone()).to_string(), acc.finalize()?);
    }
    Ok(agg_values)
}

/// Collects every aggregate-function call reachable from `expr` without
/// descending into a nested subquery (a subquery's own aggregates belong to
/// its own grouping, not this statement's) or into an aggregate call's own
/// arguments (its argument is evaluated per-row inside the accumulator, not
/// resolved against the group's representative row). Deduplicates by
/// canonical `Display` text, matching [`crate::eval::eval_function`]'s
/// aggregate lookup key.
pub fn collect_aggregate_calls(expr: &Expr, out: &mut Vec<FunctionCall>) {
    match expr {
        Expr::Function(call) => {
            if AggregateKind::from_name(&call.name).is_some() {
                let key = Expr::Function(call.clone()).to_string();
                if !out.iter().any(|c| Expr::Function(c.clone()).to_string() == key) {
                    out.push(call.clone());
                }
            } else {
                for arg in &call.args {
                    collect_aggregate_calls(arg, out);
                }
            }
        }
        Expr::Literal(_)
        | Expr::Column { .. }
        | Expr::CurrentDate
        | Expr::Parameter { .. }
        | Expr::Wildcard { .. }
        | Expr::Subquery(_)
        | Expr::Exists { .. } => {}
        Expr::Binary { left, right, .. } => {
            collect_aggregate_calls(left, out);
            collect_aggregate_calls(right, out);
        }
        Expr::Unary { operand, .. } => collect_aggregate_calls(operand, out),
        Expr::IsNull { expr, .. } => collect_aggregate_calls(expr, out),
        Expr::In { expr, list, .. } => {
            collect_aggregate_calls(expr, out);
            for item in list {
                collect_aggregate_calls(item, out);
            }
        }
        Expr::InSubquery { expr, .. } => collect_aggregate_calls(expr, out),
        Expr::Between { expr, low, high, .. } => {
            collect_aggregate_calls(expr, out);
            collect_aggregate_calls(low, out);
            collect_aggregate_calls(high, out);
        }
        Expr::Like { expr, pattern, .. } => {
            collect_aggregate_calls(expr, out);
            collect_aggregate_calls(pattern, out);
        }
        Expr::Case { operand, when_clauses, else_clause } => {
            if let Some(o) = operand {
                collect_aggregate_calls(o, out);
            }
            for (when, then) in when_clauses {
                collect_aggregate_calls(when, out);
                collect_aggregate_calls(then, out);
            }
            if let Some(e) = else_clause {
                collect_aggregate_calls(e, out);
            }
        }
        Expr::Cast { expr, .. } | Expr::Extract { expr, .. } => collect_aggregate_calls(expr, out),
        Expr::Paren(inner) => collect_aggregate_calls(inner, out),
    }
}

/// True if `expr`, evaluated in a grouped query, is functionally determined
/// by `group_by`: it names one of the grouping expressions verbatim, is a
/// literal/parameter, is built only from such pieces, or is (or contains) an
/// aggregate call, which is always group-safe regardless of its own
/// argument. A bare `*` is conservatively rejected — expanding it in a
/// grouped query is rarely what's intended and not required by this engine.
fn expr_is_group_safe(expr: &Expr, group_by: &[Expr]) -> bool {
    if group_by.iter().any(|g| exprs_equal(g, expr)) {
        return true;
    }
    match expr {
        Expr::Literal(_) | Expr::CurrentDate | Expr::Parameter { .. } => true,
        Expr::Column { .. } => false,
        Expr::Function(call) if AggregateKind::from_name(&call.name).is_some() => true,
        Expr::Function(call) => call.args.iter().all(|a| expr_is_group_safe(a, group_by)),
        Expr::Binary { left, right, .. } => expr_is_group_safe(left, group_by) && expr_is_group_safe(right, group_by),
        Expr::Unary { operand, .. } => expr_is_group_safe(operand, group_by),
        Expr::IsNull { expr, .. } => expr_is_group_safe(expr, group_by),
        Expr::In { expr, list, .. } => {
            expr_is_group_safe(expr, group_by) && list.iter().all(|e| expr_is_group_safe(e, group_by))
        }
        Expr::InSubquery { expr, .. } => expr_is_group_safe(expr, group_by),
        Expr::Between { expr, low, high, .. } => {
            expr_is_group_safe(expr, group_by) && expr_is_group_safe(low, group_by) && expr_is_group_safe(high, group_by)
        }
        Expr::Like { expr, pattern, .. } => expr_is_group_safe(expr, group_by) && expr_is_group_safe(pattern, group_by),
        Expr::Exists { .. } | Expr::Subquery(_) => true,
        Expr::Case { operand, when_clauses, else_clause } => {
            operand.as_deref().is_none_or(|o| expr_is_group_safe(o, group_by))
                && when_clauses.iter().all(|(w, t)| expr_is_group_safe(w, group_by) && expr_is_group_safe(t, group_by))
                && else_clause.as_deref().is_none_or(|e| expr_is_group_safe(e, group_by))
        }
        Expr::Cast { expr, .. } | Expr::Extract { expr, .. } => expr_is_group_safe(expr, group_by),
        Expr::Paren(inner) => expr_is_group_safe(inner, group_by),
        Expr::Wildcard { .. } => false,
    }
}

/// Structural equality that ignores a [`Expr::Column`]'s source span — two
/// columns parsed at different positions in the query text (one in
/// `GROUP BY`, one in the select list) are the same grouping key as long as
/// their table/name match.
fn exprs_equal(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Paren(x), y) | (y, Expr::Paren(x)) => exprs_equal(x, y),
        (Expr::Column { table: t1, name: n1, .. }, Expr::Column { table: t2, name: n2, .. }) => {
            n1 == n2 && (t1 == t2 || t1.is_none() || t2.is_none())
        }
        (Expr::Literal(x), Expr::Literal(y)) => x == y,
        (Expr::Binary { left: l1, op: o1, right: r1 }, Expr::Binary { left: l2, op: o2, right: r2 }) => {
            o1 == o2 && exprs_equal(l1, l2) && exprs_equal(r1, r2)
        }
        (Expr::Unary { op: o1, operand: p1 }, Expr::Unary { op: o2, operand: p2 }) => o1 == o2 && exprs_equal(p1, p2),
        (Expr::Function(c1), Expr::Function(c2)) => {
            c1.name.eq_ignore_ascii_case(&c2.name)
                && c1.distinct == c2.distinct
                && c1.args.len() == c2.args.len()
                && c1.args.iter().zip(&c2.args).all(|(x, y)| exprs_equal(x, y))
        }
        (Expr::Cast { expr: e1, data_type: d1 }, Expr::Cast { expr: e2, data_type: d2 }) => {
            d1 == d2 && exprs_equal(e1, e2)
        }
        (Expr::CurrentDate, Expr::CurrentDate) => true,
        _ => false,
    }
}

/// Expands the select list against `source_columns`, resolving `*`/`t.*`
/// wildcards to concrete column expressions and computing each output
/// column's name: explicit `AS` alias, else (for a bare column reference) the
/// source column's own name, else the expression's canonical text.
fn expand_select_list(columns: &[SelectColumn], source_columns: &[ColumnRef]) -> Result<Vec<(Expr, String)>> {
    let mut out = Vec::with_capacity(columns.len());
    for col in columns {
        match &col.expr {
            Expr::Wildcard { table } => {
                let mut any = false;
                for src in source_columns {
                    if table.is_none() || src.table.as_deref() == table.as_deref() {
                        any = true;
                        let expr = match &src.table {
                            Some(t) => Expr::qualified_column(t.clone(), src.name.clone()),
                            None => Expr::column(src.name.clone()),
                        };
                        out.push((expr, src.name.clone()));
                    }
                }
                if !any {
                    return Err(EngineError::unknown_table(table.clone().unwrap_or_default()));
                }
            }
            _ => {
                let name = col.alias.clone().unwrap_or_else(|| match &col.expr {
                    Expr::Column { name, .. } => name.clone(),
                    other => other.to_string(),
                });
                out.push((col.expr.clone(), name));
            }
        }
    }
    Ok(out)
}

fn rows_equal(a: &Row, b: &Row) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| value_group_eq(x, y))
}

fn dedup_rows(rows: Vec<Row>) -> Vec<Row> {
    let mut out: Vec<Row> = Vec::with_capacity(rows.len());
    for row in rows {
        if !out.iter().any(|o| rows_equal(o, &row)) {
            out.push(row);
        }
    }
    out
}

fn type_family(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Int(_) | Value::Serial(_) | Value::Float(_) => 1,
        Value::Bool(_) => 2,
        Value::String(_) => 3,
        Value::Date(_) => 4,
        Value::Time(_) => 5,
        Value::Timestamp(_) => 6,
        Value::Blob(_) => 7,
    }
}

fn check_set_op_compatible(left: &Relation, right: &Relation) -> Result<()> {
    if left.columns.len() != right.columns.len() {
        return Err(EngineError::Cardinality(format!(
            "set operation branches have {} and {} columns",
            left.columns.len(),
            right.columns.len()
        )));
    }
    for i in 0..left.columns.len() {
        let lv = left.rows.iter().map(|r| &r[i]).find(|v| !v.is_null());
        let rv = right.rows.iter().map(|r| &r[i]).find(|v| !v.is_null());
        if let (Some(a), Some(b)) = (lv, rv) {
            if type_family(a) != type_family(b) {
                return Err(EngineError::Type(format!(
                    "set operation column {} type mismatch: {} vs {}",
                    i + 1,
                    a.type_name(),
                    b.type_name()
                )));
            }
        }
    }
    Ok(())
}

fn combine_set_op(left: Relation, right: Relation, op: SetOp) -> Result<Relation> {
    check_set_op_compatible(&left, &right)?;
    let columns = left.columns.clone();
    let rows = match op {
        SetOp::UnionAll => {
            let mut rows = left.rows;
            rows.extend(right.rows);
            rows
        }
        SetOp::Union => dedup_rows(left.rows.into_iter().chain(right.rows).collect()),
        SetOp::Intersect => {
            dedup_rows(left.rows).into_iter().filter(|r| right.rows.iter().any(|rr| rows_equal(r, rr))).collect()
        }
        SetOp::Except => {
            dedup_rows(left.rows).into_iter().filter(|r| !right.rows.iter().any(|rr| rows_equal(r, rr))).collect()
        }
    };
    Ok(Relation { columns, rows })
}

fn apply_order_by(relation: &mut Relation, order_by: &[OrderBy], env: &Env<'_>) -> Result<()> {
    let mut keyed: Vec<(Vec<Value>, Row)> = Vec::with_capacity(relation.rows.len());
    for row in relation.rows.drain(..) {
        let row_env = env.push_outer(Scope { columns: relation.columns.clone(), row: row.clone() });
        let key = order_by.iter().map(|o| eval(&o.expr, &row_env)).collect::<Result<Vec<_>>>()?;
        keyed.push((key, row));
    }
    keyed.sort_by(|a, b| compare_sort_keys(&a.0, &b.0, order_by));
    relation.rows = keyed.into_iter().map(|(_, row)| row).collect();
    Ok(())
}

fn compare_sort_keys(a: &[Value], b: &[Value], order_by: &[OrderBy]) -> core::cmp::Ordering {
    for ((av, bv), spec) in a.iter().zip(b).zip(order_by) {
        let ord = compare_one_key(av, bv, spec.direction, spec.nulls);
        if ord != core::cmp::Ordering::Equal {
            return ord;
        }
    }
    core::cmp::Ordering::Equal
}

fn compare_one_key(a: &Value, b: &Value, direction: OrderDirection, nulls: Option<NullOrdering>) -> core::cmp::Ordering {
    use core::cmp::Ordering;
    let nulls = nulls.unwrap_or(match direction {
        OrderDirection::Asc => NullOrdering::Last,
        OrderDirection::Desc => NullOrdering::First,
    });
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => if nulls == NullOrdering::First { Ordering::Less } else { Ordering::Greater },
        (false, true) => if nulls == NullOrdering::First { Ordering::Greater } else { Ordering::Less },
        (false, false) => {
            let ord = value_cmp(a, b).unwrap_or(Ordering::Equal);
            if direction == OrderDirection::Desc {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

fn apply_limit_offset(relation: &mut Relation, limit: Option<&Expr>, offset: Option<&Expr>, env: &Env<'_>) -> Result<()> {
    let offset_n = match offset {
        Some(e) => eval_nonneg_int(e, env, "OFFSET")?,
        None => 0,
    };
    let rows = core::mem::take(&mut relation.rows);
    let skipped: Vec<Row> = rows.into_iter().skip(offset_n).collect();
    relation.rows = match limit {
        Some(e) => {
            let n = eval_nonneg_int(e, env, "LIMIT")?;
            skipped.into_iter().take(n).collect()
        }
        None => skipped,
    };
    Ok(())
}

fn eval_nonneg_int(expr: &Expr, env: &Env<'_>, clause: &str) -> Result<usize> {
    let value = eval(expr, env)?;
    let n = value.as_int().ok_or_else(|| EngineError::Type(format!("{clause} must be an integer")))?;
    if n < 0 {
        return Err(EngineError::Arithmetic(format!("{clause} must not be negative")));
    }
    Ok(n as usize)
}

/// Resolves one `FROM` source (§4.5 step 1): CTE bindings shadow table
/// names, then table, then view (expanded inline), then materialized view
/// (served from its cache). A missing `FROM` clause (`SELECT 1 + 1`) yields a
/// single empty row with no columns.
pub(crate) fn resolve_table_ref(table_ref: Option<&TableRef>, env: &Env<'_>) -> Result<Relation> {
    match table_ref {
        None => Ok(Relation { columns: vec![], rows: vec![vec![]] }),
        Some(TableRef::Table { name, alias, .. }) => {
            if let Some(rel) = env.ctes.get(name) {
                let mut rel = rel.clone();
                if let Some(a) = alias {
                    rel = rel.aliased(a);
                }
                return Ok(rel);
            }
            let db = env.catalog.current()?;
            if let Ok(table) = db.table(name) {
                let qualifier = alias.clone().unwrap_or_else(|| name.clone());
                let columns = table.columns.iter().map(|c| ColumnRef::qualified(&qualifier, &c.name)).collect();
                return Ok(Relation { columns, rows: table.rows.clone() });
            }
            if let Some(view) = db.view(name) {
                let qualifier = alias.clone().unwrap_or_else(|| name.clone());
                let sub_env = child_env(env, env.ctes);
                let relation = run_select(&view.query, &sub_env)?;
                return Ok(relation.aliased(&qualifier));
            }
            if let Some(mview) = db.mview(name) {
                let qualifier = alias.clone().unwrap_or_else(|| name.clone());
                let columns = mview.columns.iter().map(|c| ColumnRef::qualified(&qualifier, c)).collect();
                return Ok(Relation { columns, rows: mview.rows.clone() });
            }
            Err(EngineError::unknown_table(name.clone()))
        }
        Some(TableRef::Subquery { query, alias }) => {
            let sub_env = child_env(env, env.ctes);
            let relation = run_select(query, &sub_env)?;
            Ok(relation.aliased(alias))
        }
        Some(TableRef::Join { left, join }) => {
            let left_rel = resolve_table_ref(Some(left), env)?;
            let right_rel = resolve_table_ref(Some(&join.table), env)?;
            join_relations(left_rel, right_rel, join, env)
        }
    }
}

fn join_relations(left: Relation, right: Relation, join: &JoinClause, env: &Env<'_>) -> Result<Relation> {
    let left_len = left.columns.len();
    let mut combined_columns = left.columns.clone();
    combined_columns.extend(right.columns.clone());

    let mut out_rows = Vec::new();
    let mut right_matched = vec![false; right.rows.len()];
    for lrow in &left.rows {
        let mut any_match = false;
        for (ridx, rrow) in right.rows.iter().enumerate() {
            let mut combined_row = lrow.clone();
            combined_row.extend(rrow.iter().cloned());
            let matched = match join.join_type {
                JoinType::Cross => true,
                _ => eval_join_condition(join, &combined_columns, left_len, &combined_row, env)?,
            };
            if matched {
                any_match = true;
                right_matched[ridx] = true;
                out_rows.push(combined_row);
            }
        }
        if !any_match && matches!(join.join_type, JoinType::Left | JoinType::Full) {
            let mut padded = lrow.clone();
            padded.extend(core::iter::repeat(Value::Null).take(right.columns.len()));
            out_rows.push(padded);
        }
    }
    if matches!(join.join_type, JoinType::Right | JoinType::Full) {
        for (ridx, rrow) in right.rows.iter().enumerate() {
            if !right_matched[ridx] {
                let mut padded: Row = core::iter::repeat(Value::Null).take(left_len).collect();
                padded.extend(rrow.iter().cloned());
                out_rows.push(padded);
            }
        }
    }
    Ok(Relation { columns: combined_columns, rows: out_rows })
}

fn eval_join_condition(
    join: &JoinClause,
    combined_columns: &[ColumnRef],
    left_len: usize,
    combined_row: &Row,
    env: &Env<'_>,
) -> Result<bool> {
    if let Some(on) = &join.on {
        let row_env = env.push_outer(Scope { columns: combined_columns.to_vec(), row: combined_row.clone() });
        return Ok(Bool3::try_from(&eval(on, &row_env)?)?.is_true());
    }
    for name in &join.using {
        let left_idx = combined_columns[..left_len].iter().position(|c| c.name == *name);
        let right_idx = combined_columns[left_len..].iter().position(|c| c.name == *name).map(|i| i + left_len);
        let (Some(li), Some(ri)) = (left_idx, right_idx) else {
            return Err(EngineError::unknown_column(name.clone()));
        };
        if !crate::value::value_eq3(&combined_row[li], &combined_row[ri]).is_true() {
            return Ok(false);
        }
    }
    Ok(true)
}
