use super::config::HandleConfig;
use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::params::{ParameterSet, ParameterTypeSet};
use crate::value::Value;
use std::time::Instant;
use tracing::Level;

/// A [`DbHandle`] wrapper that logs statements and enforces a timeout.
///
/// Only the SQL text and the parameter count are logged; parameter values
/// never reach the log.
#[derive(Debug, Clone)]
pub struct InstrumentedHandle<H> {
    inner: H,
    config: HandleConfig,
}

impl<H: DbHandle> InstrumentedHandle<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            config: HandleConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HandleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Get a reference to the inner handle.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Get the inner handle, consuming this wrapper.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => {
                format!("{}...", truncate_sql_bytes(sql, max)).into()
            }
            _ => sql.into(),
        }
    }

    fn emit(&self, sql: &str, param_count: usize) {
        // dispatch at a runtime-chosen level
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.config.log_level,
            target: "sqlparts.sql",
            param_count,
            sql = %sql,
        );
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

impl<H: DbHandle> DbHandle for InstrumentedHandle<H> {
    type Rows = H::Rows;

    fn quote(&self, value: &Value) -> String {
        self.inner.quote(value)
    }

    async fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        types: &ParameterTypeSet,
    ) -> QbResult<H::Rows> {
        self.emit(sql, params.len());
        let start = Instant::now();
        let fut = self.inner.query(sql, params, types);
        let result = match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(QbError::Timeout(timeout)),
            },
            None => fut.await,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::trace!(target: "sqlparts.sql", elapsed_ms, "query finished"),
            Err(err) => tracing::warn!(
                target: "sqlparts.sql",
                elapsed_ms,
                error = %err,
                sql = %self.truncate_sql(sql),
                "query failed"
            ),
        }
        result
    }
}
