//! Aggregate functions (§4.4): `COUNT`, `SUM`, `AVG`, `MIN`, `MAX`. These are
//! never evaluated as scalars — the executor collects one argument value per
//! row in a group, then [`Accumulator::finalize`] reduces the collection.

use crate::error::{EngineError, Result};
use crate::value::{value_cmp, Value};

/// Which aggregate a call names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// `COUNT(*)` or `COUNT(expr)`.
    Count,
    /// `SUM(expr)`.
    Sum,
    /// `AVG(expr)`.
    Avg,
    /// `MIN(expr)`.
    Min,
    /// `MAX(expr)`.
    Max,
}

impl AggregateKind {
    /// Recognizes an aggregate by (case-insensitive) function name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "COUNT" => Self::Count,
            "SUM" => Self::Sum,
            "AVG" => Self::Avg,
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            _ => return None,
        })
    }
}

/// Accumulates one aggregate's argument values across a group.
#[derive(Debug, Clone)]
pub struct Accumulator {
    kind: AggregateKind,
    /// True for `COUNT(*)`, which counts rows (including all-NULL) rather
    /// than non-NULL argument values.
    count_star: bool,
    distinct: bool,
    seen: Vec<Value>,
}

impl Accumulator {
    /// A fresh accumulator for `kind`. `count_star` only matters for
    /// [`AggregateKind::Count`].
    #[must_use]
    pub fn new(kind: AggregateKind, count_star: bool, distinct: bool) -> Self {
        Self { kind, count_star, distinct, seen: Vec::new() }
    }

    /// Feeds one row's argument value into the accumulator.
    pub fn push(&mut self, value: Value) {
        if self.distinct && self.seen.iter().any(|v| crate::value::value_group_eq(v, &value)) {
            return;
        }
        self.seen.push(value);
    }

    /// Reduces the collected values to a final [`Value`] per §4.4:
    /// `COUNT(*)` counts all rows; `COUNT(expr)` counts non-NULL; `SUM`/
    /// `AVG`/`MIN`/`MAX` ignore NULL, and `AVG`/`SUM` of empty-or-all-NULL
    /// is NULL (PostgreSQL semantics, not `0`).
    ///
    /// # Errors
    /// `EngineError::Type` if a non-numeric value reaches `SUM`/`AVG`.
    pub fn finalize(&self) -> Result<Value> {
        match self.kind {
            AggregateKind::Count => {
                let n = if self.count_star { self.seen.len() } else { self.seen.iter().filter(|v| !v.is_null()).count() };
                Ok(Value::Int(n as i64))
            }
            AggregateKind::Sum => sum_or_avg(&self.seen, false),
            AggregateKind::Avg => sum_or_avg(&self.seen, true),
            AggregateKind::Min => extremum(&self.seen, core::cmp::Ordering::Less),
            AggregateKind::Max => extremum(&self.seen, core::cmp::Ordering::Greater),
        }
    }
}

fn sum_or_avg(values: &[Value], average: bool) -> Result<Value> {
    let mut count = 0i64;
    let mut int_total = 0i64;
    let mut float_total = 0f64;
    let mut saw_float = false;
    for v in values {
        match v {
            Value::Null => continue,
            Value::Int(n) | Value::Serial(n) => {
                int_total += n;
                float_total += *n as f64;
            }
            Value::Float(f) => {
                saw_float = true;
                float_total += f;
            }
            other => return Err(EngineError::Type(format!("SUM/AVG: expected numeric, found {}", other.type_name()))),
        }
        count += 1;
    }
    if count == 0 {
        return Ok(Value::Null);
    }
    if average {
        return Ok(Value::Float(float_total / count as f64));
    }
    Ok(if saw_float { Value::Float(float_total) } else { Value::Int(int_total) })
}

fn extremum(values: &[Value], want: core::cmp::Ordering) -> Result<Value> {
    let mut best: Option<&Value> = None;
    for v in values {
        if v.is_null() {
            continue;
        }
        best = Some(match best {
            None => v,
            Some(current) => match value_cmp(v, current) {
                Some(ord) if ord == want => v,
                Some(_) => current,
                None => {
                    return Err(EngineError::Type(format!(
                        "MIN/MAX: cannot compare {} and {}",
                        v.type_name(),
                        current.type_name()
                    )))
                }
            },
        });
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_star_counts_all_rows_including_null() {
        let mut acc = Accumulator::new(AggregateKind::Count, true, false);
        acc.push(Value::Int(1));
        acc.push(Value::Null);
        acc.push(Value::Int(2));
        assert_eq!(acc.finalize().unwrap(), Value::Int(3));
    }

    #[test]
    fn count_expr_skips_null() {
        let mut acc = Accumulator::new(AggregateKind::Count, false, false);
        acc.push(Value::Int(1));
        acc.push(Value::Null);
        assert_eq!(acc.finalize().unwrap(), Value::Int(1));
    }

    #[test]
    fn sum_of_all_null_is_null() {
        let mut acc = Accumulator::new(AggregateKind::Sum, false, false);
        acc.push(Value::Null);
        acc.push(Value::Null);
        assert_eq!(acc.finalize().unwrap(), Value::Null);
    }

    #[test]
    fn avg_ignores_null() {
        let mut acc = Accumulator::new(AggregateKind::Avg, false, false);
        acc.push(Value::Int(2));
        acc.push(Value::Null);
        acc.push(Value::Int(4));
        assert_eq!(acc.finalize().unwrap(), Value::Float(3.0));
    }

    #[test]
    fn min_max_ignore_null() {
        let mut min = Accumulator::new(AggregateKind::Min, false, false);
        let mut max = Accumulator::new(AggregateKind::Max, false, false);
        for v in [Value::Int(5), Value::Null, Value::Int(1), Value::Int(3)] {
            min.push(v.clone());
            max.push(v);
        }
        assert_eq!(min.finalize().unwrap(), Value::Int(1));
        assert_eq!(max.finalize().unwrap(), Value::Int(5));
    }

    #[test]
    fn distinct_deduplicates_before_aggregation() {
        let mut acc = Accumulator::new(AggregateKind::Sum, false, true);
        acc.push(Value::Int(1));
        acc.push(Value::Int(1));
        acc.push(Value::Int(2));
        assert_eq!(acc.finalize().unwrap(), Value::Int(3));
    }
}
