//! The scalar function library (§4.4): string, math, and date/time
//! functions, plus `LIKE`/`ILIKE` pattern matching. Aggregates (`COUNT`,
//! `SUM`, `AVG`, `MIN`, `MAX`) are handled separately by [`crate::aggregate`]
//! — they are never evaluated as plain scalar calls.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{EngineError, Result};
use crate::value::{value_eq3, Value};

fn arity_error(name: &str, expected: &str, got: usize) -> EngineError {
    EngineError::Type(format!("{name} expects {expected} argument(s), got {got}"))
}

fn want_string(name: &str, v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(EngineError::Type(format!("{name}: expected STRING, found {}", other.type_name()))),
    }
}

fn want_int(name: &str, v: &Value) -> Result<i64> {
    v.as_int().ok_or_else(|| EngineError::Type(format!("{name}: expected INT, found {}", v.type_name())))
}

/// Evaluates a non-aggregate function call. `args` have already been
/// evaluated; any NULL argument makes most functions return NULL (SQL's
/// usual strict-null convention), except where §4.4 specifies otherwise
/// (noted per function below).
///
/// # Errors
/// `EngineError::Type` on arity mismatch or a non-coercible argument type;
/// `EngineError::Name` if `name` is not a recognized function;
/// `EngineError::Arithmetic` for a negative `SUBSTRING` length.
pub fn call(name: &str, args: &[Value], now: NaiveDateTime) -> Result<Value> {
    let upper = name.to_ascii_uppercase();

    // NOW()/CURRENT_TIMESTAMP take no arguments and never return NULL.
    if upper == "NOW" || upper == "CURRENT_TIMESTAMP" {
        if !args.is_empty() {
            return Err(arity_error(&upper, "0", args.len()));
        }
        return Ok(Value::Timestamp(now));
    }

    // CONCAT ignores arity (variadic) and treats NULL arguments as empty
    // strings, matching the behavior PostgreSQL's CONCAT (not `||`) uses.
    if upper == "CONCAT" {
        let mut out = String::new();
        for arg in args {
            if !arg.is_null() {
                out.push_str(&arg.to_string());
            }
        }
        return Ok(Value::String(out));
    }

    // COALESCE/NULLIF are parsed as ordinary function calls (no dedicated AST
    // node) but their entire point is to treat NULL specially, so both are
    // handled before the blanket NULL-propagation rule below.
    if upper == "COALESCE" {
        for arg in args {
            if !arg.is_null() {
                return Ok(arg.clone());
            }
        }
        return Ok(Value::Null);
    }
    if upper == "NULLIF" {
        let [a, b] = require_n(&upper, args)?;
        return Ok(if value_eq3(a, b).is_true() { Value::Null } else { a.clone() });
    }

    // Every other function returns NULL if any argument is NULL.
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }

    Ok(match upper.as_str() {
        "UPPER" => {
            let [a] = require_n(&upper, args)?;
            Value::String(want_string(&upper, a)?.to_uppercase())
        }
        "LOWER" => {
            let [a] = require_n(&upper, args)?;
            Value::String(want_string(&upper, a)?.to_lowercase())
        }
        "LENGTH" => {
            let [a] = require_n(&upper, args)?;
            Value::Int(want_string(&upper, a)?.chars().count() as i64)
        }
        "SUBSTRING" | "SUBSTR" => substring(&upper, args)?,
        "REPLACE" => {
            let [s, from, to] = require_n3(&upper, args)?;
            Value::String(want_string(&upper, s)?.replace(&want_string(&upper, from)?, &want_string(&upper, to)?))
        }
        "ROUND" => round(&upper, args)?,
        "CEIL" | "CEILING" => {
            let [a] = require_n(&upper, args)?;
            same_shape_unary(a, f64::ceil)?
        }
        "FLOOR" => {
            let [a] = require_n(&upper, args)?;
            same_shape_unary(a, f64::floor)?
        }
        "ABS" => {
            let [a] = require_n(&upper, args)?;
            match a {
                Value::Int(n) | Value::Serial(n) => Value::Int(n.abs()),
                Value::Float(f) => Value::Float(f.abs()),
                other => return Err(EngineError::Type(format!("ABS: expected numeric, found {}", other.type_name()))),
            }
        }
        "DATEDIFF" => {
            let [a, b] = require_n(&upper, args)?;
            Value::Int(datediff(a, b)?)
        }
        _ => return Err(EngineError::unknown_function(name)),
    })
}

fn require_n<'a, const N: usize>(name: &str, args: &'a [Value]) -> Result<[&'a Value; N]> {
    if args.len() != N {
        return Err(arity_error(name, &N.to_string(), args.len()));
    }
    Ok(std::array::from_fn(|i| &args[i]))
}

fn require_n3<'a>(name: &str, args: &'a [Value]) -> Result<[&'a Value; 3]> {
    require_n::<3>(name, args)
}

fn same_shape_unary(v: &Value, f: impl Fn(f64) -> f64) -> Result<Value> {
    match v {
        Value::Int(n) | Value::Serial(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Float(f(*x))),
        other => Err(EngineError::Type(format!("expected numeric, found {}", other.type_name()))),
    }
}

fn substring(name: &str, args: &[Value]) -> Result<Value> {
    if args.len() != 2 && args.len() != 3 {
        return Err(arity_error(name, "2 or 3", args.len()));
    }
    let s = want_string(name, &args[0])?;
    let chars: Vec<char> = s.chars().collect();
    let start = want_int(name, &args[1])?;
    // 1-indexed; out-of-range start yields empty string rather than error.
    let start0 = start.saturating_sub(1).max(0) as usize;
    if start0 >= chars.len() {
        return Ok(Value::String(String::new()));
    }
    let take = if args.len() == 3 {
        let len = want_int(name, &args[2])?;
        if len < 0 {
            return Err(EngineError::Arithmetic(format!("{name}: negative length {len}")));
        }
        len as usize
    } else {
        chars.len() - start0
    };
    let end = (start0 + take).min(chars.len());
    Ok(Value::String(chars[start0..end].iter().collect()))
}

fn round(name: &str, args: &[Value]) -> Result<Value> {
    if args.is_empty() || args.len() > 2 {
        return Err(arity_error(name, "1 or 2", args.len()));
    }
    let digits = if args.len() == 2 { want_int(name, &args[1])? } else { 0 };
    match &args[0] {
        Value::Int(n) | Value::Serial(n) => Ok(Value::Int(*n)),
        Value::Float(x) => {
            let factor = 10f64.powi(digits as i32);
            // Half-away-from-zero, as §4.4 specifies (`f64::round` already
            // rounds ties away from zero).
            Ok(Value::Float((x * factor).round() / factor))
        }
        other => Err(EngineError::Type(format!("{name}: expected numeric, found {}", other.type_name()))),
    }
}

fn datediff(a: &Value, b: &Value) -> Result<i64> {
    let to_date = |v: &Value| -> Result<chrono::NaiveDate> {
        match v {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(ts) => Ok(ts.date()),
            other => Err(EngineError::Type(format!("DATEDIFF: expected DATE, found {}", other.type_name()))),
        }
    };
    Ok((to_date(a)? - to_date(b)?).num_days())
}

/// `EXTRACT(field FROM value)` (§4.4).
///
/// # Errors
/// `EngineError::Type` for an unrecognized field or a non-temporal value.
pub fn extract(field: &str, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let field = field.to_ascii_uppercase();
    let (date, time) = match value {
        Value::Date(d) => (Some(*d), None),
        Value::Time(t) => (None, Some(*t)),
        Value::Timestamp(ts) => (Some(ts.date()), Some(ts.time())),
        other => return Err(EngineError::Type(format!("EXTRACT: expected a date/time value, found {}", other.type_name()))),
    };
    Ok(Value::Int(match field.as_str() {
        "YEAR" => i64::from(date.ok_or_else(|| extract_err(&field))?.year()),
        "MONTH" => i64::from(date.ok_or_else(|| extract_err(&field))?.month()),
        "DAY" => i64::from(date.ok_or_else(|| extract_err(&field))?.day()),
        "HOUR" => i64::from(time.ok_or_else(|| extract_err(&field))?.hour()),
        "MINUTE" => i64::from(time.ok_or_else(|| extract_err(&field))?.minute()),
        "SECOND" => i64::from(time.ok_or_else(|| extract_err(&field))?.second()),
        _ => return Err(EngineError::Type(format!("EXTRACT: unknown field {field}"))),
    }))
}

fn extract_err(field: &str) -> EngineError {
    EngineError::Type(format!("EXTRACT({field} ...): value has no such component"))
}

/// `LIKE`/`ILIKE` pattern matching: `%` matches any run (including empty),
/// `_` matches exactly one character.
#[must_use]
pub fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    like_match_chars(&t, &p)
}

fn like_match_chars(t: &[char], p: &[char]) -> bool {
    // Standard DP for glob-style patterns with '%' and '_'.
    let (tn, pn) = (t.len(), p.len());
    let mut dp = vec![vec![false; pn + 1]; tn + 1];
    dp[0][0] = true;
    for (j, &pc) in p.iter().enumerate() {
        if pc == '%' {
            dp[0][j + 1] = dp[0][j];
        }
    }
    for i in 0..tn {
        for j in 0..pn {
            dp[i + 1][j + 1] = match p[j] {
                '%' => dp[i][j + 1] || dp[i + 1][j],
                '_' => dp[i][j],
                c => dp[i][j] && c == t[i],
            };
        }
    }
    dp[tn][pn]
}
