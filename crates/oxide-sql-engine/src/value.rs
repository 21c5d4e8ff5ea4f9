//! The runtime value domain (§3 `Value`) and three-valued logic (§4.4).

use core::cmp::Ordering;
use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use oxide_sql_core::ast::DataType;

use crate::error::{EngineError, Result};

/// A runtime value. `Null` is distinct from every other value under §4.4's
/// three-valued logic; `Serial` is a storage detail of auto-increment columns
/// and otherwise behaves exactly like `Int` everywhere values are compared or
/// displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// `INT`.
    Int(i64),
    /// `FLOAT`.
    Float(f64),
    /// `BOOLEAN`.
    Bool(bool),
    /// `VARCHAR` / `CHAR` / `TEXT`.
    String(String),
    /// `DATE`.
    Date(NaiveDate),
    /// `TIME`.
    Time(NaiveTime),
    /// `TIMESTAMP`.
    Timestamp(NaiveDateTime),
    /// `SERIAL` — an auto-incremented integer. Compares and casts as `Int`.
    Serial(i64),
    /// `BLOB` — an opaque byte string, compared and ordered byte-wise.
    Blob(Vec<u8>),
}

impl Value {
    /// True iff this value is SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The integer value of an `Int` or `Serial`, if applicable.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) | Self::Serial(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a widened `f64`, for arithmetic that must promote.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) | Self::Serial(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// A short name for the runtime type, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Int(_) | Self::Serial(_) => "INT",
            Self::Float(_) => "FLOAT",
            Self::Bool(_) => "BOOLEAN",
            Self::String(_) => "STRING",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Blob(_) => "BLOB",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(n) | Self::Serial(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{}", if *b { "t" } else { "f" }),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Self::Blob(b) => {
                write!(f, "\\x")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Column / cast target type (§3 `Type`). Distinct from
/// `oxide_sql_core::ast::DataType`, which is the *syntax* the parser accepts;
/// this is the narrower runtime domain the evaluator and storage layer work
/// with. [`Type::from_ast`] folds the wider DDL syntax down onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// `INT` (also accepts `SMALLINT`/`INTEGER`/`BIGINT` at the syntax level).
    Int,
    /// `FLOAT` (also accepts `REAL`/`DOUBLE`/`DECIMAL`/`NUMERIC`).
    Float,
    /// `BOOLEAN`.
    Boolean,
    /// `VARCHAR(len)`; `len` is advisory, overruns are rejected at write time.
    Varchar(Option<u32>),
    /// `CHAR(len)`.
    Char(Option<u32>),
    /// `TEXT`.
    Text,
    /// `DATE`.
    Date,
    /// `TIME`.
    Time,
    /// `TIMESTAMP` (also accepts `DATETIME`).
    Timestamp,
    /// `SERIAL`.
    Serial,
    /// `BLOB`.
    Blob,
}

impl Type {
    /// Folds the parser's wider `DataType` syntax onto the runtime domain.
    ///
    /// # Errors
    /// Returns [`EngineError::Type`] for a `DataType::Custom` the engine does
    /// not recognize.
    pub fn from_ast(dt: &DataType) -> Result<Self> {
        Ok(match dt {
            DataType::Smallint | DataType::Integer | DataType::Bigint => Self::Int,
            DataType::Serial => Self::Serial,
            DataType::Real | DataType::Double | DataType::Decimal { .. } | DataType::Numeric { .. } => {
                Self::Float
            }
            DataType::Char(len) => Self::Char(*len),
            DataType::Varchar(len) => Self::Varchar(*len),
            DataType::Text => Self::Text,
            DataType::Blob => Self::Blob,
            DataType::Date => Self::Date,
            DataType::Time => Self::Time,
            DataType::Timestamp | DataType::Datetime => Self::Timestamp,
            DataType::Boolean => Self::Boolean,
            DataType::Custom(name) => {
                return Err(EngineError::Type(format!("unsupported column type: {name}")));
            }
        })
    }

    /// The advisory character length, for `VARCHAR`/`CHAR` overrun checks.
    #[must_use]
    pub const fn max_len(&self) -> Option<u32> {
        match self {
            Self::Varchar(len) | Self::Char(len) => *len,
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "INT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Varchar(Some(n)) => write!(f, "VARCHAR({n})"),
            Self::Varchar(None) => write!(f, "VARCHAR"),
            Self::Char(Some(n)) => write!(f, "CHAR({n})"),
            Self::Char(None) => write!(f, "CHAR"),
            Self::Text => write!(f, "TEXT"),
            Self::Date => write!(f, "DATE"),
            Self::Time => write!(f, "TIME"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Serial => write!(f, "SERIAL"),
            Self::Blob => write!(f, "BLOB"),
        }
    }
}

/// Three-valued boolean (§4.4, §9 "Three-valued logic"). Collapsed to a
/// two-way `bool` only at admission points (`WHERE`, `HAVING`, `ON`, `CHECK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bool3 {
    /// TRUE.
    True,
    /// FALSE.
    False,
    /// UNKNOWN (NULL-derived).
    Unknown,
}

impl Bool3 {
    /// Lifts a plain `bool` result.
    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }

    /// `NULL AND FALSE = FALSE`; `NULL AND TRUE = NULL`; the rest follows the
    /// usual Kleene table.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    /// `NULL OR TRUE = TRUE`; `NULL OR FALSE = NULL`.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    /// `NOT NULL = NULL`.
    #[must_use]
    pub const fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }

    /// Admits (is TRUE) under WHERE/HAVING/ON/ON-CONFLICT semantics — NULL is
    /// discarded exactly like FALSE.
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Admits under CHECK semantics — TRUE or UNKNOWN both pass; only
    /// an explicit FALSE rejects the row.
    #[must_use]
    pub const fn passes_check(self) -> bool {
        !matches!(self, Self::False)
    }

    /// Converts back to a [`Value`] (`Unknown` becomes `Value::Null`).
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::True => Value::Bool(true),
            Self::False => Value::Bool(false),
            Self::Unknown => Value::Null,
        }
    }
}

impl TryFrom<&Value> for Bool3 {
    type Error = EngineError;

    fn try_from(v: &Value) -> Result<Self> {
        match v {
            Value::Null => Ok(Self::Unknown),
            Value::Bool(b) => Ok(Self::from_bool(*b)),
            other => Err(EngineError::Type(format!(
                "expected BOOLEAN, found {}",
                other.type_name()
            ))),
        }
    }
}

/// Grouping/DISTINCT equality: `NULL` equals `NULL` (unlike SQL `=`), and
/// numeric values compare across `Int`/`Float`/`Serial`.
#[must_use]
pub fn value_group_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        _ => value_cmp(a, b) == Some(Ordering::Equal),
    }
}

/// A total ordering over two values of comparable runtime type, or `None` if
/// the pair can't be compared (NULL involved, or incompatible types).
/// Numeric variants (`Int`/`Float`/`Serial`) compare across kinds.
#[must_use]
pub fn value_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(x), Value::Bool(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => x.partial_cmp(y),
        (Value::Blob(x), Value::Blob(y)) => x.partial_cmp(y),
        (Value::Date(x), Value::Date(y)) => x.partial_cmp(y),
        (Value::Time(x), Value::Time(y)) => x.partial_cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.partial_cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

/// Three-valued equality per §4.4 ("any comparison with a NULL operand
/// yields NULL").
#[must_use]
pub fn value_eq3(a: &Value, b: &Value) -> Bool3 {
    if a.is_null() || b.is_null() {
        return Bool3::Unknown;
    }
    match value_cmp(a, b) {
        Some(Ordering::Equal) => Bool3::True,
        Some(_) => Bool3::False,
        None => Bool3::Unknown,
    }
}

/// Casts `value` to `target`, following §4.4's "canonical conversions":
/// INT↔FLOAT (rounding), numeric↔STRING (lossless decimal text),
/// STRING↔DATE/TIME/TIMESTAMP (ISO 8601 only).
///
/// # Errors
/// Returns [`EngineError::Type`] for any conversion not covered above,
/// including a NULL source is always allowed (NULL casts to NULL of any
/// type).
pub fn cast_value(value: &Value, target: Type) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let bad = || {
        EngineError::Type(format!(
            "cannot CAST {} to {target}",
            value.type_name()
        ))
    };
    Ok(match target {
        Type::Int | Type::Serial => match value {
            Value::Int(n) | Value::Serial(n) => Value::Int(*n),
            Value::Float(f) => Value::Int(f.round() as i64),
            Value::String(s) => Value::Int(s.trim().parse::<i64>().map_err(|_| bad())?),
            Value::Bool(b) => Value::Int(i64::from(*b)),
            _ => return Err(bad()),
        },
        Type::Float => match value {
            Value::Int(n) | Value::Serial(n) => Value::Float(*n as f64),
            Value::Float(f) => Value::Float(*f),
            Value::String(s) => Value::Float(s.trim().parse::<f64>().map_err(|_| bad())?),
            _ => return Err(bad()),
        },
        Type::Boolean => match value {
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(n) | Value::Serial(n) => Value::Bool(*n != 0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" => Value::Bool(true),
                "f" | "false" | "0" => Value::Bool(false),
                _ => return Err(bad()),
            },
            _ => return Err(bad()),
        },
        Type::Varchar(_) | Type::Char(_) | Type::Text => Value::String(match value {
            Value::String(s) => s.clone(),
            Value::Int(n) | Value::Serial(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => (if *b { "t" } else { "f" }).to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Blob(_) | Value::Null => return Err(bad()),
        }),
        Type::Date => match value {
            Value::Date(d) => Value::Date(*d),
            Value::Timestamp(ts) => Value::Date(ts.date()),
            Value::String(s) => Value::Date(
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| bad())?,
            ),
            _ => return Err(bad()),
        },
        Type::Time => match value {
            Value::Time(t) => Value::Time(*t),
            Value::Timestamp(ts) => Value::Time(ts.time()),
            Value::String(s) => Value::Time(
                NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
                    .map_err(|_| bad())?,
            ),
            _ => return Err(bad()),
        },
        Type::Timestamp => match value {
            Value::Timestamp(ts) => Value::Timestamp(*ts),
            Value::Date(d) => Value::Timestamp(d.and_hms_opt(0, 0, 0).ok_or_else(bad)?),
            Value::String(s) => {
                let s = s.trim();
                Value::Timestamp(
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                        .or_else(|_| {
                            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                                .and_then(|d| Ok(d.and_hms_opt(0, 0, 0).unwrap()))
                        })
                        .map_err(|_| bad())?,
                )
            }
            _ => return Err(bad()),
        },
        Type::Blob => match value {
            Value::Blob(b) => Value::Blob(b.clone()),
            _ => return Err(bad()),
        },
    })
}

/// Type-checks and coerces `value` to `column_type` for storage (INSERT/
/// UPDATE/DEFAULT evaluation), enforcing VARCHAR/CHAR length overrun.
///
/// Unlike [`cast_value`], this does not stringify numbers into a VARCHAR
/// column or parse arbitrary strings into an INT column — implicit storage
/// coercion is limited to the INT↔FLOAT widening §4.4 describes for
/// arithmetic; anything else must go through an explicit `CAST`.
///
/// # Errors
/// Returns [`EngineError::Type`] on a type mismatch or length overrun.
pub fn coerce_for_storage(value: Value, column_type: Type) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match (column_type, &value) {
        (Type::Int | Type::Serial, Value::Int(_) | Value::Serial(_)) => {}
        (Type::Float, Value::Float(_)) => {}
        (Type::Float, Value::Int(n)) => return Ok(Value::Float(*n as f64)),
        (Type::Boolean, Value::Bool(_)) => {}
        (Type::Varchar(max) | Type::Char(max), Value::String(s)) => {
            if let Some(max) = max {
                if s.chars().count() > *max as usize {
                    return Err(EngineError::Type(format!(
                        "value '{s}' overruns column length {max}"
                    )));
                }
            }
        }
        (Type::Text, Value::String(_)) => {}
        (Type::Date, Value::Date(_)) => {}
        (Type::Time, Value::Time(_)) => {}
        (Type::Timestamp, Value::Timestamp(_)) => {}
        (Type::Blob, Value::Blob(_)) => {}
        _ => {
            return Err(EngineError::Type(format!(
                "cannot store {} in a {column_type} column",
                value.type_name()
            )));
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_valued_and() {
        assert_eq!(Bool3::Unknown.and(Bool3::False), Bool3::False);
        assert_eq!(Bool3::Unknown.and(Bool3::True), Bool3::Unknown);
        assert_eq!(Bool3::True.and(Bool3::True), Bool3::True);
    }

    #[test]
    fn three_valued_or() {
        assert_eq!(Bool3::Unknown.or(Bool3::True), Bool3::True);
        assert_eq!(Bool3::Unknown.or(Bool3::False), Bool3::Unknown);
        assert_eq!(Bool3::False.or(Bool3::False), Bool3::False);
    }

    #[test]
    fn three_valued_not() {
        assert_eq!(Bool3::Unknown.not(), Bool3::Unknown);
        assert_eq!(Bool3::True.not(), Bool3::False);
    }

    #[test]
    fn full_truth_table() {
        use Bool3::{False, True, Unknown};
        let vals = [True, False, Unknown];
        let expected_and = [
            [True, False, Unknown],
            [False, False, False],
            [Unknown, False, Unknown],
        ];
        let expected_or = [
            [True, True, True],
            [True, False, Unknown],
            [True, Unknown, Unknown],
        ];
        for (i, a) in vals.iter().enumerate() {
            for (j, b) in vals.iter().enumerate() {
                assert_eq!(a.and(*b), expected_and[i][j], "{a:?} AND {b:?}");
                assert_eq!(a.or(*b), expected_or[i][j], "{a:?} OR {b:?}");
            }
        }
    }

    #[test]
    fn null_distinct_from_every_value() {
        assert_eq!(value_eq3(&Value::Null, &Value::Int(0)), Bool3::Unknown);
        assert_eq!(value_eq3(&Value::Null, &Value::Null), Bool3::Unknown);
    }

    #[test]
    fn group_eq_treats_null_as_equal() {
        assert!(value_group_eq(&Value::Null, &Value::Null));
        assert!(value_group_eq(&Value::Int(1), &Value::Float(1.0)));
        assert!(!value_group_eq(&Value::Int(1), &Value::Int(2)));
    }

    #[test]
    fn cast_numeric_roundtrip() {
        assert_eq!(cast_value(&Value::Float(3.6), Type::Int).unwrap(), Value::Int(4));
        assert_eq!(cast_value(&Value::Int(3), Type::Float).unwrap(), Value::Float(3.0));
        assert_eq!(
            cast_value(&Value::Int(42), Type::Text).unwrap(),
            Value::String(String::from("42"))
        );
    }

    #[test]
    fn cast_invalid_string_to_int_fails() {
        assert!(cast_value(&Value::String(String::from("abc")), Type::Int).is_err());
    }

    #[test]
    fn varchar_overrun_rejected() {
        let err = coerce_for_storage(Value::String(String::from("toolong")), Type::Varchar(Some(3)));
        assert!(err.is_err());
    }
}
