use std::fmt::{self, Display, Write};

/// A value in one of the engine's storage classes.
///
/// Used both for rows read from a cursor and for the shadow record of bound
/// parameters. Blob parameters are shadowed as a hex literal `Text`, see
/// [`Value::blob_literal`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Box<[u8]>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Hex literal of a blob (`x'AB01'`), readable in diagnostics without
    /// retaining the binary payload a second time.
    pub fn blob_literal(bytes: &[u8]) -> String {
        let mut literal = String::with_capacity(bytes.len() * 2 + 3);
        literal.push_str("x'");
        for byte in bytes {
            let _ = write!(literal, "{:02X}", byte);
        }
        literal.push('\'');
        literal
    }

    /// Positional text argument used to replay this value through the raw
    /// query path. `None` binds as SQL NULL.
    pub(crate) fn as_replay_arg(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(v) => Some(v.to_string()),
            Value::Real(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Blob(v) => Some(Self::blob_literal(v)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Blob(v) => f.write_str(&Self::blob_literal(v)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.into())
    }
}
