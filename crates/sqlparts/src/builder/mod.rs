//! Parts-based query builders.
//!
//! Every concrete builder ([`SelectBuilder`], [`InsertBuilder`],
//! [`UpdateBuilder`], [`DeleteBuilder`]) wraps one [`BaseBuilder`], which owns
//! the parts table, the bound parameters and their types, the alias registry
//! and the injected [`DbHandle`].
//!
//! Builders are plain mutable accumulators: they are not meant to be shared
//! between threads while being mutated, and one builder is created per
//! statement.
//!
//! # Example
//!
//! ```ignore
//! use sqlparts::{select, SqlBuilder, CondArg};
//!
//! let mut qb = select(&client, "u.id, u.name");
//! qb.from("users", "u")
//!     .left_join("u", "roles", "r", "r.id = u.role_id")
//!     .where_("u.status = ?")
//!     .set_parameter(None, "active", ParamType::Str);
//! qb.and_where_with("u.id IN (?)", &[CondArg::many([1, 2, 3])])?;
//!
//! let rows = qb.execute().await?;
//! ```

#[macro_use]
mod macros;

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::{Order, SelectBuilder};
pub use update::UpdateBuilder;

use crate::composite::{CompositeKind, Condition, combine};
use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::params::{ParameterSet, ParameterTypeSet};
use crate::parts::{
    FlatSlot, FromClause, JoinClause, Part, PartName, PartValue, ScalarSlot, SqlParts,
};
use crate::placeholder::{render_debug, splice_next};
use crate::value::{ParamKey, ParamType, Value};

/// An argument substituted into a condition template by
/// [`BaseBuilder::prepare_condition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CondArg {
    /// Quoted and spliced in place of one marker.
    One(Value),
    /// Every element quoted, joined with `,`, spliced in place of one marker.
    Many(Vec<Value>),
}

impl CondArg {
    pub fn one(value: impl Into<Value>) -> Self {
        CondArg::One(value.into())
    }

    pub fn many<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        CondArg::Many(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for CondArg {
    fn from(value: Value) -> Self {
        CondArg::One(value)
    }
}

impl From<Vec<Value>> for CondArg {
    fn from(values: Vec<Value>) -> Self {
        CondArg::Many(values)
    }
}

/// Known table aliases and the table (or subquery) each one names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasRegistry {
    entries: Vec<(String, String)>,
}

impl AliasRegistry {
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, t)| t.as_str())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    fn register(&mut self, alias: &str, table: &str) {
        match self.entries.iter_mut().find(|(a, _)| a == alias) {
            Some(entry) => entry.1 = table.to_string(),
            None => self.entries.push((alias.to_string(), table.to_string())),
        }
    }

    fn rebuild(parts: &SqlParts) -> Self {
        let mut registry = Self::default();
        for from in parts.get(PartName::From).as_tables() {
            registry.register(from.reference(), &from.table);
        }
        for (_, joins) in parts.get(PartName::Join).as_joins() {
            for join in joins {
                registry.register(&join.alias, &join.table);
            }
        }
        registry
    }
}

/// Shared state and primitives of every statement builder.
#[derive(Debug, Clone)]
pub struct BaseBuilder<H> {
    db: H,
    parts: SqlParts,
    params: ParameterSet,
    param_types: ParameterTypeSet,
    aliases: AliasRegistry,
}

impl<H: DbHandle> BaseBuilder<H> {
    /// Create an empty builder running through `db`.
    pub fn new(db: H) -> Self {
        Self {
            db,
            parts: SqlParts::new(),
            params: ParameterSet::new(),
            param_types: ParameterTypeSet::new(),
            aliases: AliasRegistry::default(),
        }
    }

    /// The database handle this builder quotes and executes through.
    pub fn db(&self) -> &H {
        &self.db
    }

    /// The whole parts table.
    pub fn parts(&self) -> &SqlParts {
        &self.parts
    }

    /// Aliases introduced by `from` and `join` parts.
    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Either append to or replace a single query part, by name.
    ///
    /// Unknown names fail with [`QbError::InvalidPart`].
    pub fn add_query_part(
        &mut self,
        name: &str,
        part: impl Into<Part>,
        append: bool,
    ) -> QbResult<&mut Self> {
        let name: PartName = name.parse()?;
        self.add_part(name, part.into(), append)?;
        Ok(self)
    }

    /// Get a query part by its name.
    pub fn get_query_part(&self, name: &str) -> QbResult<&PartValue> {
        let name: PartName = name.parse()?;
        Ok(self.parts.get(name))
    }

    /// Reset a single query part to empty (sequences) or null (scalars).
    pub fn reset_query_part(&mut self, name: &str) -> QbResult<&mut Self> {
        let name: PartName = name.parse()?;
        self.reset_part(name);
        Ok(self)
    }

    fn add_part(&mut self, name: PartName, part: Part, append: bool) -> QbResult<()> {
        self.parts.add(name, part, append)?;
        if matches!(name, PartName::From | PartName::Join) {
            self.aliases = AliasRegistry::rebuild(&self.parts);
        }
        Ok(())
    }

    fn reset_part(&mut self, name: PartName) {
        self.parts.reset(name);
        if matches!(name, PartName::From | PartName::Join) {
            self.aliases = AliasRegistry::rebuild(&self.parts);
        }
    }

    pub(crate) fn set_condition(&mut self, slot: ScalarSlot, condition: Condition) {
        self.parts.set_condition(slot, Some(condition));
    }

    /// Merge `condition` into a predicate slot as `AND`/`OR`.
    ///
    /// An empty condition leaves the slot as it is.
    pub(crate) fn combine_condition(
        &mut self,
        slot: ScalarSlot,
        condition: Condition,
        kind: CompositeKind,
    ) {
        if condition.is_empty() {
            return;
        }
        let existing = self.parts.get(slot.into()).as_scalar().cloned();
        self.parts
            .set_condition(slot, Some(combine(existing, condition, kind)));
    }

    pub(crate) fn add_exprs(&mut self, slot: FlatSlot, exprs: Vec<String>, append: bool) {
        self.parts.add_exprs(slot, exprs, append);
    }

    pub(crate) fn add_table(&mut self, table: FromClause, append: bool) {
        self.parts.add_table(table, append);
        self.aliases = AliasRegistry::rebuild(&self.parts);
    }

    pub(crate) fn add_join(&mut self, from_alias: &str, join: JoinClause) {
        self.parts.add_join(from_alias.to_string(), join, true);
        self.aliases = AliasRegistry::rebuild(&self.parts);
    }

    pub(crate) fn set_table(&mut self, table: &str) {
        self.add_table(FromClause::new(table, None), false);
    }

    /// Bind one parameter.
    ///
    /// A null `value` is skipped entirely: nothing is stored and no
    /// positional key is consumed. A `None` key takes the next positional
    /// key, equal to the current parameter count.
    pub fn set_parameter(
        &mut self,
        key: Option<ParamKey>,
        value: impl Into<Value>,
        ty: ParamType,
    ) -> &mut Self {
        let value = value.into();
        if value.is_null() {
            return self;
        }
        let key = key.unwrap_or(ParamKey::Positional(self.params.len()));
        self.param_types.insert(key.clone(), ty);
        self.params.insert(key, value);
        self
    }

    /// Replace all parameters and their types.
    pub fn set_parameters(&mut self, params: ParameterSet, types: ParameterTypeSet) -> &mut Self {
        self.params = params;
        self.param_types = types;
        self
    }

    /// Gets a (previously set) query parameter.
    pub fn get_parameter(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.params.get(&key.into())
    }

    pub fn get_parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn get_parameter_types(&self) -> &ParameterTypeSet {
        &self.param_types
    }

    /// Build a condition by splicing quoted `args` into `template`.
    ///
    /// Each argument replaces the first `?` not yet consumed, left to right;
    /// markers inside already spliced values are never consumed. List
    /// arguments are quoted element by element and joined with `,`. Markers
    /// left over stay in place for parameter binding; more arguments than
    /// markers is an error.
    pub fn prepare_condition(&self, template: &str, args: &[CondArg]) -> QbResult<String> {
        let mut condition = template.to_string();
        let mut cursor = 0;
        for (i, arg) in args.iter().enumerate() {
            let quoted = match arg {
                CondArg::One(v) => self.db.quote(v),
                CondArg::Many(values) => values
                    .iter()
                    .map(|v| self.db.quote(v))
                    .collect::<Vec<_>>()
                    .join(","),
            };
            cursor = splice_next(&mut condition, cursor, &quoted).ok_or(
                QbError::ParameterCountMismatch {
                    placeholders: i,
                    params: args.len(),
                },
            )?;
        }
        Ok(condition)
    }
}

/// Contract shared by the concrete statement builders.
pub trait SqlBuilder: Sync {
    type Handle: DbHandle;

    fn base(&self) -> &BaseBuilder<Self::Handle>;

    /// Render the statement from the parts table.
    ///
    /// Idempotent: calling it twice without mutations yields the same text.
    fn get_sql(&self) -> QbResult<String>;

    /// Render the statement with every `?` replaced by its quoted value.
    ///
    /// For logs and debugging only; never execute the result.
    fn get_query(&self) -> QbResult<String> {
        render_debug(&self.get_sql()?, self.base().get_parameters())
    }

    /// Render the statement and run it through the database handle.
    ///
    /// Handle failures come back as [`QbError::QueryExecution`] carrying the
    /// rendered SQL and the parameter snapshot.
    fn execute(
        &self,
    ) -> impl std::future::Future<Output = QbResult<<Self::Handle as DbHandle>::Rows>> + Send {
        async move {
            let sql = self.get_sql()?;
            let base = self.base();
            match base
                .db()
                .query(&sql, base.get_parameters(), base.get_parameter_types())
                .await
            {
                Ok(rows) => Ok(rows),
                Err(err) => Err(QbError::execution(sql, base.get_parameters().clone(), err)),
            }
        }
    }
}

/// Create a SELECT builder for `columns`.
pub fn select<H: DbHandle>(db: H, columns: &str) -> SelectBuilder<H> {
    let mut qb = SelectBuilder::new(db);
    qb.select(columns);
    qb
}

/// Create an INSERT builder for `table`.
pub fn insert<H: DbHandle>(db: H, table: &str) -> InsertBuilder<H> {
    let mut qb = InsertBuilder::new(db);
    qb.insert(table);
    qb
}

/// Create an UPDATE builder for `table`.
pub fn update<H: DbHandle>(db: H, table: &str) -> UpdateBuilder<H> {
    let mut qb = UpdateBuilder::new(db);
    qb.update(table);
    qb
}

/// Create a DELETE builder for `table`.
pub fn delete<H: DbHandle>(db: H, table: &str) -> DeleteBuilder<H> {
    let mut qb = DeleteBuilder::new(db);
    qb.delete(table);
    qb
}

#[cfg(test)]
mod tests;
