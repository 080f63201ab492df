//! PostgreSQL implementation of [`DbHandle`].
//!
//! Rendered statements use `?` and `:name` markers; before execution they
//! are rewritten to `$1, $2, ...` and every value is sent through
//! `query_typed` with the PostgreSQL type its [`ParamType`] declares.
//! `Str` values (the default for undeclared parameters) are sent as untyped
//! text, so the server coerces them to whatever the statement expects.

mod config;
mod instrumented;

pub use config::HandleConfig;
pub use instrumented::InstrumentedHandle;

use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::params::{ParameterSet, ParameterTypeSet};
use crate::placeholder::number_markers;
use crate::value::{ParamKey, ParamType, Value};
use bytes::BytesMut;
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{Format, IsNull, ToSql, Type, to_sql_checked};

type BoxedParam = Box<dyn ToSql + Sync + Send>;

/// Render `value` as a PostgreSQL literal.
///
/// Strings are single-quoted with embedded quotes doubled (this assumes
/// `standard_conforming_strings = on`, the server default).
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Str(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bytes(_) => format!("'{value}'"),
    }
}

/// A statement rewritten to `$n` markers with its values converted to their
/// declared types.
pub(crate) struct BoundStatement {
    pub(crate) sql: String,
    values: Vec<(BoxedParam, Type)>,
}

impl BoundStatement {
    pub(crate) fn new(
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> QbResult<Self> {
        let (sql, keys) = number_markers(sql);
        let values = keys
            .iter()
            .map(|key| {
                let value = params
                    .get(key)
                    .ok_or_else(|| QbError::bind(format!("no value bound for {key}")))?;
                convert(key, value, types.get(key))
            })
            .collect::<QbResult<Vec<_>>>()?;
        Ok(Self { sql, values })
    }

    pub(crate) fn params(&self) -> Vec<(&(dyn ToSql + Sync), Type)> {
        self.values
            .iter()
            .map(|(v, ty)| (&**v as &(dyn ToSql + Sync), ty.clone()))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn types(&self) -> Vec<Type> {
        self.values.iter().map(|(_, ty)| ty.clone()).collect()
    }

    /// `true` for each value sent in text format.
    #[cfg(test)]
    pub(crate) fn text_formats(&self) -> Vec<bool> {
        self.values
            .iter()
            .map(|(v, ty)| matches!(v.encode_format(ty), Format::Text))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn encoded(&self, i: usize) -> Option<Vec<u8>> {
        let (value, ty) = &self.values[i];
        let mut buf = BytesMut::new();
        match value.to_sql_checked(ty, &mut buf).ok()? {
            IsNull::Yes => None,
            IsNull::No => Some(buf.to_vec()),
        }
    }
}

fn mismatch(key: &ParamKey, value: &Value, ty: ParamType) -> QbError {
    QbError::bind(format!(
        "{key}: cannot send {:?} value as {ty:?}",
        value.natural_type()
    ))
}

fn boxed<T: ToSql + Sync + Send + 'static>(value: T, ty: Type) -> (BoxedParam, Type) {
    (Box::new(value), ty)
}

/// Text with no declared type, sent in text format.
///
/// Paired with `Type::UNKNOWN`, the server infers the parameter type from
/// where the marker appears, as it does for an untyped string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UntypedText(String);

impl ToSql for UntypedText {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn encode_format(&self, _ty: &Type) -> Format {
        Format::Text
    }

    to_sql_checked!();
}

/// Convert `value` to the Rust type matching the declared `ty`.
fn convert(key: &ParamKey, value: &Value, ty: ParamType) -> QbResult<(BoxedParam, Type)> {
    let converted = match (ty, value) {
        (ParamType::Null, _) => boxed(None::<UntypedText>, Type::UNKNOWN),
        (ParamType::Int, Value::Null) => boxed(None::<i64>, Type::INT8),
        (ParamType::Int, Value::Int(i)) => boxed(*i, Type::INT8),
        (ParamType::Int, Value::Bool(b)) => boxed(i64::from(*b), Type::INT8),
        (ParamType::Int, Value::Str(s)) => {
            let i: i64 = s.trim().parse().map_err(|_| mismatch(key, value, ty))?;
            boxed(i, Type::INT8)
        }
        (ParamType::Str, Value::Null) => boxed(None::<UntypedText>, Type::UNKNOWN),
        (ParamType::Str, Value::Str(s)) => boxed(UntypedText(s.clone()), Type::UNKNOWN),
        (ParamType::Str, Value::Int(_) | Value::Bool(_)) => {
            boxed(UntypedText(value.to_string()), Type::UNKNOWN)
        }
        (ParamType::Str, Value::Bytes(bytes)) => {
            let s = String::from_utf8(bytes.clone()).map_err(|_| mismatch(key, value, ty))?;
            boxed(UntypedText(s), Type::UNKNOWN)
        }
        (ParamType::Bool, Value::Null) => boxed(None::<bool>, Type::BOOL),
        (ParamType::Bool, Value::Bool(b)) => boxed(*b, Type::BOOL),
        (ParamType::Bool, Value::Int(i)) => boxed(*i != 0, Type::BOOL),
        (ParamType::Bool, Value::Str(s)) => {
            let b = match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "1" | "yes" | "on" => true,
                "f" | "false" | "0" | "no" | "off" | "" => false,
                _ => return Err(mismatch(key, value, ty)),
            };
            boxed(b, Type::BOOL)
        }
        (ParamType::Binary, Value::Null) => boxed(None::<Vec<u8>>, Type::BYTEA),
        (ParamType::Binary, Value::Bytes(bytes)) => boxed(bytes.clone(), Type::BYTEA),
        (ParamType::Binary, Value::Str(s)) => boxed(s.clone().into_bytes(), Type::BYTEA),
        _ => return Err(mismatch(key, value, ty)),
    };
    Ok(converted)
}

impl DbHandle for tokio_postgres::Client {
    type Rows = Vec<Row>;

    fn quote(&self, value: &Value) -> String {
        quote_literal(value)
    }

    async fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> QbResult<Vec<Row>> {
        let bound = BoundStatement::new(sql, params, types)?;
        Ok(tokio_postgres::Client::query_typed(self, &bound.sql, &bound.params()).await?)
    }
}

impl DbHandle for tokio_postgres::Transaction<'_> {
    type Rows = Vec<Row>;

    fn quote(&self, value: &Value) -> String {
        quote_literal(value)
    }

    async fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> QbResult<Vec<Row>> {
        let bound = BoundStatement::new(sql, params, types)?;
        Ok(tokio_postgres::Transaction::query_typed(self, &bound.sql, &bound.params()).await?)
    }
}

/// Each query checks out one connection from the pool for its duration.
#[cfg(feature = "pool")]
impl DbHandle for deadpool_postgres::Pool {
    type Rows = Vec<Row>;

    fn quote(&self, value: &Value) -> String {
        quote_literal(value)
    }

    async fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> QbResult<Vec<Row>> {
        let bound = BoundStatement::new(sql, params, types)?;
        let client = self.get().await?;
        Ok(client.query_typed(&bound.sql, &bound.params()).await?)
    }
}
