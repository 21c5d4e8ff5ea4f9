//! SQL data type definitions.

use core::fmt;

use super::expression::Expr;

/// SQL data types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    // Integer types
    /// Small integer (2 bytes).
    Smallint,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    Bigint,
    /// Auto-incrementing integer; implies `NOT NULL` and a per-column
    /// counter seeded from the table's existing rows.
    Serial,

    // Floating point
    /// Real (4-byte float).
    Real,
    /// Double precision (8-byte float).
    Double,
    /// Decimal with precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },
    /// Numeric (alias for Decimal).
    Numeric {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },

    // String types
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Text (variable length, no limit).
    Text,

    /// Binary large object.
    Blob,

    // Date/time types
    /// Date.
    Date,
    /// Time.
    Time,
    /// Timestamp.
    Timestamp,
    /// DateTime (SQLite-style alias for Timestamp).
    Datetime,

    // Boolean
    /// Boolean.
    Boolean,

    // Custom type (for database-specific types).
    Custom(String),
}

impl DataType {
    /// Returns the SQL representation of the data type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Serial => String::from("SERIAL"),
            Self::Real => String::from("REAL"),
            Self::Double => String::from("DOUBLE"),
            Self::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => String::from("DECIMAL"),
            },
            Self::Numeric { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("NUMERIC({p}, {s})"),
                (Some(p), None) => format!("NUMERIC({p})"),
                _ => String::from("NUMERIC"),
            },
            Self::Char(len) => match len {
                Some(n) => format!("CHAR({n})"),
                None => String::from("CHAR"),
            },
            Self::Varchar(len) => match len {
                Some(n) => format!("VARCHAR({n})"),
                None => String::from("VARCHAR"),
            },
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from("BLOB"),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Datetime => String::from("DATETIME"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A column definition for CREATE TABLE / ALTER TABLE ADD COLUMN.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: DataType,
    /// Whether the column is nullable. `SERIAL` and `PRIMARY KEY` force this
    /// to `false` regardless of what was written.
    pub nullable: bool,
    /// Default value expression.
    pub default: Option<Expr>,
    /// Whether this is a (single-column) primary key.
    pub primary_key: bool,
    /// Whether this column is unique.
    pub unique: bool,
    /// `CHECK (expr)` constraint, if any.
    pub check: Option<Expr>,
}

impl ColumnDef {
    /// Creates a new column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let serial = matches!(data_type, DataType::Serial);
        Self {
            name: name.into(),
            data_type,
            nullable: !serial,
            default: None,
            primary_key: false,
            unique: false,
            check: None,
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as PRIMARY KEY.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are implicitly NOT NULL
        self
    }

    /// Sets the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, expr: Expr) -> Self {
        self.default = Some(expr);
        self
    }

    /// Sets a CHECK constraint.
    #[must_use]
    pub fn check(mut self, expr: Expr) -> Self {
        self.check = Some(expr);
        self
    }

    /// True if this column auto-increments (`SERIAL`).
    #[must_use]
    pub const fn is_serial(&self) -> bool {
        matches!(self.data_type, DataType::Serial)
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        } else if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        if self.unique {
            write!(f, " UNIQUE")?;
        }
        if let Some(d) = &self.default {
            write!(f, " DEFAULT {d}")?;
        }
        if let Some(c) = &self.check {
            write!(f, " CHECK ({c})")?;
        }
        Ok(())
    }
}

/// A table-level constraint, as opposed to one attached to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    /// `PRIMARY KEY (col, ...)` spanning one or more columns.
    PrimaryKey(Vec<String>),
    /// `UNIQUE (col, ...)` spanning one or more columns.
    Unique(Vec<String>),
    /// `CHECK (expr)` not tied to a single column.
    Check(Expr),
}

impl fmt::Display for TableConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKey(cols) => write!(f, "PRIMARY KEY ({})", cols.join(", ")),
            Self::Unique(cols) => write!(f, "UNIQUE ({})", cols.join(", ")),
            Self::Check(expr) => write!(f, "CHECK ({expr})"),
        }
    }
}
