use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Scalar data types an attribute can be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    #[serde(alias = "string", alias = "text")]
    Varchar,
    Uuid,
    Date,
    #[serde(alias = "date_time")]
    DateTime,
    #[serde(alias = "date_time_offset", alias = "offset_date_time")]
    DateTimeOffset,
}

/// Coarse grouping of data types, used to decide which filter operators apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Boolean,
    Numeric,
    Textual,
    Identifier,
    Temporal,
}

impl DataType {
    pub fn category(&self) -> TypeCategory {
        match self {
            DataType::Boolean => TypeCategory::Boolean,
            DataType::Int32 | DataType::Int64 | DataType::Float64 => TypeCategory::Numeric,
            DataType::Varchar => TypeCategory::Textual,
            DataType::Uuid => TypeCategory::Identifier,
            DataType::Date | DataType::DateTime | DataType::DateTimeOffset => {
                TypeCategory::Temporal
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Varchar => "varchar",
            DataType::Uuid => "uuid",
            DataType::Date => "date",
            DataType::DateTime => "date_time",
            DataType::DateTimeOffset => "date_time_offset",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values flowing through filters, plans and result rows
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    /// Literal list, only produced for `in` / `between` operands
    List(Vec<Value>),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null | Value::List(_) => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
            Value::Uuid(_) => Some(DataType::Uuid),
            Value::Date(_) => Some(DataType::Date),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::DateTimeOffset(_) => Some(DataType::DateTimeOffset),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is compatible with the given data type
    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true, // NULL is compatible with any type
            (Value::List(_), _) => false,
            (Value::Int32(_), DataType::Int64 | DataType::Float64) => true,
            (Value::Int64(_), DataType::Float64) => true,
            (value, expected) => value.data_type() == Some(expected),
        }
    }

    /// Order two non-list values.
    ///
    /// Numeric values compare across widths. Returns `None` for NULLs and for
    /// values of unrelated types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int64(b)) => Some(i64::from(*a).cmp(b)),
            (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&i64::from(*b))),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Numeric view of this value, if it is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(f64::from(*n)),
            Value::Int64(n) => Some(*n as f64),
            Value::Float64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce an untyped JSON literal into a value of the declared type.
    ///
    /// Returns `None` when the literal cannot represent the type. Temporal types
    /// accept ISO-8601 strings; a date-only string widens to midnight.
    pub fn from_json(json: &serde_json::Value, data_type: DataType) -> Option<Value> {
        use serde_json::Value as Json;

        if json.is_null() {
            return Some(Value::Null);
        }

        match (data_type, json) {
            (DataType::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
            (DataType::Int32, Json::Number(n)) => {
                n.as_i64().and_then(|v| i32::try_from(v).ok()).map(Value::Int32)
            }
            (DataType::Int64, Json::Number(n)) => n.as_i64().map(Value::Int64),
            (DataType::Float64, Json::Number(n)) => n.as_f64().map(Value::Float64),
            (DataType::Varchar, Json::String(s)) => Some(Value::String(s.clone())),
            (DataType::Uuid, Json::String(s)) => Uuid::parse_str(s).ok().map(Value::Uuid),
            (DataType::Date, Json::String(s)) => parse_date(s).map(Value::Date),
            (DataType::DateTime, Json::String(s)) => parse_date_time(s).map(Value::DateTime),
            (DataType::DateTimeOffset, Json::String(s)) => {
                parse_date_time_offset(s).map(Value::DateTimeOffset)
            }
            _ => None,
        }
    }

    /// Render this value as JSON for result output
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Int32(n) => Json::from(*n),
            Value::Int64(n) => Json::from(*n),
            Value::Float64(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Uuid(u) => Json::String(u.to_string()),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::DateTimeOffset(dt) => Json::String(dt.to_rfc3339()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(n) => write!(f, "{}", n),
            Value::Int64(n) => write!(f, "{}", n),
            Value::Float64(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::DateTimeOffset(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date_time(s).map(|dt| dt.date()))
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_date_time_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        let utc = FixedOffset::east_opt(0)?;
        parse_date_time(s).and_then(|dt| dt.and_local_timezone(utc).single())
    })
}
