//! The database-handle capability consumed by query builders.

use crate::error::QbResult;
use crate::params::{ParameterSet, ParameterTypeSet};
use crate::value::Value;
use std::sync::Arc;

/// Quoting and execution, the only two things a builder asks of a database.
///
/// Builders never talk to a transport directly: literals inlined by
/// `prepare_condition` go through [`DbHandle::quote`], and statements are
/// run through [`DbHandle::query`] together with their parameters and
/// declared types.
///
/// Implementations exist for `tokio_postgres::Client`,
/// `tokio_postgres::Transaction` and (with the `pool` feature)
/// `deadpool_postgres::Pool`. References and `Arc`s of a handle are handles
/// too, so a builder can borrow a shared connection.
pub trait DbHandle: Send + Sync {
    /// What a successful query returns.
    type Rows: Send;

    /// Render `value` as a dialect-correct SQL literal.
    fn quote(&self, value: &Value) -> String;

    /// Run `sql` with the given parameters.
    fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> impl std::future::Future<Output = QbResult<Self::Rows>> + Send;
}

impl<T: DbHandle> DbHandle for &T {
    type Rows = T::Rows;

    fn quote(&self, value: &Value) -> String {
        (**self).quote(value)
    }

    fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> impl std::future::Future<Output = QbResult<Self::Rows>> + Send {
        (**self).query(sql, params, types)
    }
}

impl<T: DbHandle> DbHandle for Arc<T> {
    type Rows = T::Rows;

    fn quote(&self, value: &Value) -> String {
        (**self).quote(value)
    }

    fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> impl std::future::Future<Output = QbResult<Self::Rows>> + Send {
        (**self).query(sql, params, types)
    }
}
