//! Parameter values, keys and declared types.

use std::fmt;

/// A scalar value bound to a query parameter or quoted into a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// The parameter type matching this variant.
    pub fn natural_type(&self) -> ParamType {
        match self {
            Value::Null => ParamType::Null,
            Value::Bool(_) => ParamType::Bool,
            Value::Int(_) => ParamType::Int,
            Value::Str(_) => ParamType::Str,
            Value::Bytes(_) => ParamType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Plain text rendering used by the debug query (`getQuery`).
///
/// No escaping happens here.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
            Value::Bytes(bytes) => {
                f.write_str("\\x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Declared type of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    Null,
    Int,
    #[default]
    Str,
    Bool,
    Binary,
}

/// Key addressing a bound parameter: a `?` position or a `:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Positional(usize),
    Named(String),
}

impl ParamKey {
    /// Build a named key; one leading `:` is stripped.
    pub fn named(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        ParamKey::Named(name.strip_prefix(':').unwrap_or(name).to_string())
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Positional(i) => write!(f, "?{i}"),
            ParamKey::Named(name) => write!(f, ":{name}"),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(v: usize) -> Self {
        ParamKey::Positional(v)
    }
}

impl From<&str> for ParamKey {
    fn from(v: &str) -> Self {
        ParamKey::named(v)
    }
}

impl From<String> for ParamKey {
    fn from(v: String) -> Self {
        ParamKey::named(v)
    }
}
