//! # sqlparts
//!
//! A fluent SQL query builder that assembles statements from named parts.
//!
//! ## Features
//!
//! - **Parts table**: every statement is a fixed table of named fragments
//!   (`select`, `from`, `join`, `set`, `where`, `groupBy`, `having`, `orderBy`)
//!   that can be appended to, replaced, read back and reset by name
//! - **Typed parameters**: positional `?` and named `:name` values, each with a
//!   declared [`ParamType`] that decides how it is sent to the database
//! - **Injected handle**: builders never look up a connection; quoting and
//!   execution go through the [`DbHandle`] they were created with
//! - **Debug rendering**: [`SqlBuilder::get_query`] inlines bound values for logs
//! - **Query monitoring**: [`InstrumentedHandle`] logs statements through `tracing`
//!   and enforces a timeout
//!
//! ## Example
//!
//! ```ignore
//! use sqlparts::{CondArg, Order, ParamType, SqlBuilder};
//!
//! // SELECT
//! let mut qb = sqlparts::select(&client, "u.id, u.name");
//! qb.from("users", "u")
//!     .left_join("u", "roles", "r", "r.id = u.role_id")
//!     .where_("u.status = ?")
//!     .order_by("u.created_at", Order::Desc)
//!     .set_limit(10);
//! qb.set_parameter(None, "active", ParamType::Str);
//! let rows = qb.execute().await?;
//!
//! // UPDATE
//! let mut qb = sqlparts::update(&client, "users");
//! qb.set("status", "inactive")
//!     .where_with("id = ?", &[CondArg::one(user_id)])?;
//! qb.execute().await?;
//! ```

pub mod builder;
pub mod composite;
pub mod error;
pub mod handle;
pub mod params;
pub mod parts;
pub mod pg;
pub mod placeholder;
pub mod value;

pub use builder::{
    AliasRegistry, BaseBuilder, CondArg, DeleteBuilder, InsertBuilder, Order, SelectBuilder,
    SqlBuilder, UpdateBuilder, delete, insert, select, update,
};
pub use composite::{CompositeBuilder, CompositeKind, Condition};
pub use error::{QbError, QbResult};
pub use handle::DbHandle;
pub use params::{ParameterSet, ParameterTypeSet};
pub use parts::{
    FlatSlot, FromClause, JoinClause, JoinType, Part, PartKind, PartName, PartValue, ScalarSlot,
    SqlParts,
};
pub use pg::{HandleConfig, InstrumentedHandle, quote_literal};
pub use value::{ParamKey, ParamType, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{
    DEFAULT_POOL_SIZE, create_instrumented_pool, create_pool, create_pool_with_config,
    create_pool_with_manager_config,
};
