//! The SQL parts table and its merge rules.
//!
//! Every builder owns one [`SqlParts`]: a fixed set of named slots
//! (`select`, `from`, `join`, `set`, `where`, `groupBy`, `having`,
//! `orderBy`). Each slot has a [`PartKind`] fixed at definition time, and
//! [`SqlParts::add`] dispatches on that kind:
//!
//! | kind             | slots                                  | append                          |
//! |------------------|----------------------------------------|---------------------------------|
//! | `Scalar`         | `where`, `having`                      | replace                         |
//! | `FlatSequence`   | `select`, `set`, `groupBy`, `orderBy`  | concatenate every element       |
//! | `Sequence`       | `from`                                 | push one element                |
//! | `NestedSequence` | `join`                                 | push under the same key         |
//!
//! Without `append`, every slot is replaced wholesale.

use crate::composite::Condition;
use crate::error::{QbError, QbResult};
use std::fmt;
use std::str::FromStr;

/// Name of one slot of the parts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartName {
    Select,
    From,
    Join,
    Set,
    Where,
    GroupBy,
    Having,
    OrderBy,
}

impl PartName {
    /// All slots, in rendering order.
    pub const ALL: [PartName; 8] = [
        PartName::Select,
        PartName::From,
        PartName::Join,
        PartName::Set,
        PartName::Where,
        PartName::GroupBy,
        PartName::Having,
        PartName::OrderBy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartName::Select => "select",
            PartName::From => "from",
            PartName::Join => "join",
            PartName::Set => "set",
            PartName::Where => "where",
            PartName::GroupBy => "groupBy",
            PartName::Having => "having",
            PartName::OrderBy => "orderBy",
        }
    }

    /// The merge behavior of this slot.
    pub fn kind(&self) -> PartKind {
        match self {
            PartName::Where | PartName::Having => PartKind::Scalar,
            PartName::Select | PartName::Set | PartName::GroupBy | PartName::OrderBy => {
                PartKind::FlatSequence
            }
            PartName::From => PartKind::Sequence,
            PartName::Join => PartKind::NestedSequence,
        }
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartName {
    type Err = QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| QbError::invalid_part(format!("unknown part `{s}`")))
    }
}

/// Merge behavior attached to each [`PartName`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Single value or null.
    Scalar,
    /// Sequence of fragments; appends concatenate.
    FlatSequence,
    /// Sequence of records; appends push one record.
    Sequence,
    /// Sequences keyed by alias; appends push under the key.
    NestedSequence,
}

/// The slots holding a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarSlot {
    Where,
    Having,
}

impl From<ScalarSlot> for PartName {
    fn from(slot: ScalarSlot) -> Self {
        match slot {
            ScalarSlot::Where => PartName::Where,
            ScalarSlot::Having => PartName::Having,
        }
    }
}

/// The slots holding a list of fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatSlot {
    Select,
    Set,
    GroupBy,
    OrderBy,
}

impl From<FlatSlot> for PartName {
    fn from(slot: FlatSlot) -> Self {
        match slot {
            FlatSlot::Select => PartName::Select,
            FlatSlot::Set => PartName::Set,
            FlatSlot::GroupBy => PartName::GroupBy,
            FlatSlot::OrderBy => PartName::OrderBy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
        }
    }
}

/// One `from` entry: a table (or subquery) and its optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub table: String,
    pub alias: Option<String>,
}

impl FromClause {
    pub fn new(table: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            table: table.into(),
            alias,
        }
    }

    /// The name other clauses use to refer to this table.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} {}", self.table, alias),
            None => f.write_str(&self.table),
        }
    }
}

/// One structured join record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: String,
    pub condition: String,
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} JOIN {} {} ON {}",
            self.join_type.as_str(),
            self.table,
            self.alias,
            self.condition
        )
    }
}

/// A value handed to [`SqlParts::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// A single fragment; wrapped into a one-element sequence where needed.
    Expr(String),
    /// Several fragments.
    Exprs(Vec<String>),
    /// A predicate for `where`/`having`.
    Condition(Condition),
    /// A `from` entry.
    Table(FromClause),
    /// A join keyed by the alias it attaches to.
    Join { from_alias: String, join: JoinClause },
}

impl From<&str> for Part {
    fn from(s: &str) -> Self {
        Part::Expr(s.to_string())
    }
}

impl From<String> for Part {
    fn from(s: String) -> Self {
        Part::Expr(s)
    }
}

impl From<Vec<String>> for Part {
    fn from(v: Vec<String>) -> Self {
        Part::Exprs(v)
    }
}

impl From<Vec<&str>> for Part {
    fn from(v: Vec<&str>) -> Self {
        Part::Exprs(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Condition> for Part {
    fn from(c: Condition) -> Self {
        Part::Condition(c)
    }
}

impl From<FromClause> for Part {
    fn from(t: FromClause) -> Self {
        Part::Table(t)
    }
}

/// A stored slot value. Its variant never changes for a given slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Scalar(Option<Condition>),
    Flat(Vec<String>),
    Tables(Vec<FromClause>),
    Joins(Vec<(String, Vec<JoinClause>)>),
}

impl PartValue {
    fn empty(kind: PartKind) -> Self {
        match kind {
            PartKind::Scalar => PartValue::Scalar(None),
            PartKind::FlatSequence => PartValue::Flat(Vec::new()),
            PartKind::Sequence => PartValue::Tables(Vec::new()),
            PartKind::NestedSequence => PartValue::Joins(Vec::new()),
        }
    }

    /// `true` for a null scalar or an empty sequence.
    pub fn is_empty(&self) -> bool {
        match self {
            PartValue::Scalar(v) => v.is_none(),
            PartValue::Flat(v) => v.is_empty(),
            PartValue::Tables(v) => v.is_empty(),
            PartValue::Joins(v) => v.is_empty(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Condition> {
        match self {
            PartValue::Scalar(v) => v.as_ref(),
            _ => None,
        }
    }

    pub fn as_flat(&self) -> &[String] {
        match self {
            PartValue::Flat(v) => v,
            _ => &[],
        }
    }

    pub fn as_tables(&self) -> &[FromClause] {
        match self {
            PartValue::Tables(v) => v,
            _ => &[],
        }
    }

    pub fn as_joins(&self) -> &[(String, Vec<JoinClause>)] {
        match self {
            PartValue::Joins(v) => v,
            _ => &[],
        }
    }
}

/// The fixed table of SQL parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlParts {
    slots: [PartValue; 8],
}

impl Default for SqlParts {
    fn default() -> Self {
        Self {
            slots: PartName::ALL.map(|name| PartValue::empty(name.kind())),
        }
    }
}

fn index(name: PartName) -> usize {
    name as usize
}

fn shape_error(name: PartName, part: &Part) -> QbError {
    let shape = match part {
        Part::Expr(_) => "an expression",
        Part::Exprs(_) => "an expression list",
        Part::Condition(_) => "a condition",
        Part::Table(_) => "a table",
        Part::Join { .. } => "a join",
    };
    QbError::invalid_part(format!("part `{name}` cannot hold {shape}"))
}

impl SqlParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: PartName) -> &PartValue {
        &self.slots[index(name)]
    }

    /// Reset a slot: sequences become empty, scalars become null.
    pub fn reset(&mut self, name: PartName) {
        self.slots[index(name)] = PartValue::empty(name.kind());
    }

    /// Either append to or replace a single slot.
    ///
    /// Fails with [`QbError::InvalidPart`] when `part` cannot be stored in the
    /// slot's shape; the table is left untouched in that case.
    pub fn add(&mut self, name: PartName, part: Part, append: bool) -> QbResult<()> {
        match (&mut self.slots[index(name)], part) {
            (PartValue::Scalar(value), Part::Expr(s)) => *value = non_empty(Condition::Raw(s)),
            (PartValue::Scalar(value), Part::Condition(c)) => *value = non_empty(c),
            (PartValue::Flat(items), Part::Expr(s)) => merge_flat(items, vec![s], append),
            (PartValue::Flat(items), Part::Exprs(v)) => merge_flat(items, v, append),
            (PartValue::Tables(tables), Part::Table(t)) => merge_tables(tables, t, append),
            (PartValue::Tables(tables), Part::Expr(s)) => {
                merge_tables(tables, FromClause::new(s, None), append)
            }
            (PartValue::Joins(groups), Part::Join { from_alias, join }) => {
                merge_joins(groups, from_alias, join, append)
            }
            (_, other) => return Err(shape_error(name, &other)),
        }
        Ok(())
    }

    /// Store `condition` in a predicate slot; an empty condition clears it.
    pub fn set_condition(&mut self, slot: ScalarSlot, condition: Option<Condition>) {
        if let PartValue::Scalar(value) = &mut self.slots[index(slot.into())] {
            *value = condition.and_then(non_empty);
        }
    }

    /// Append to or replace a fragment list.
    pub fn add_exprs(&mut self, slot: FlatSlot, exprs: Vec<String>, append: bool) {
        if let PartValue::Flat(items) = &mut self.slots[index(slot.into())] {
            merge_flat(items, exprs, append);
        }
    }

    /// Append to or replace the `from` list.
    pub fn add_table(&mut self, table: FromClause, append: bool) {
        if let PartValue::Tables(tables) = &mut self.slots[index(PartName::From)] {
            merge_tables(tables, table, append);
        }
    }

    /// Attach a join to `from_alias`, or replace every join with it.
    pub fn add_join(&mut self, from_alias: String, join: JoinClause, append: bool) {
        if let PartValue::Joins(groups) = &mut self.slots[index(PartName::Join)] {
            merge_joins(groups, from_alias, join, append);
        }
    }

    /// Joins registered under `alias`, in insertion order.
    pub fn joins_for(&self, alias: &str) -> &[JoinClause] {
        self.get(PartName::Join)
            .as_joins()
            .iter()
            .find(|(k, _)| k == alias)
            .map(|(_, joins)| joins.as_slice())
            .unwrap_or(&[])
    }
}

fn non_empty(condition: Condition) -> Option<Condition> {
    (!condition.is_empty()).then_some(condition)
}

fn merge_flat(items: &mut Vec<String>, incoming: Vec<String>, append: bool) {
    if append {
        items.extend(incoming);
    } else {
        *items = incoming;
    }
}

fn merge_tables(tables: &mut Vec<FromClause>, table: FromClause, append: bool) {
    if append {
        tables.push(table);
    } else {
        *tables = vec![table];
    }
}

fn merge_joins(
    groups: &mut Vec<(String, Vec<JoinClause>)>,
    from_alias: String,
    join: JoinClause,
    append: bool,
) {
    if !append {
        *groups = vec![(from_alias, vec![join])];
    } else if let Some((_, joins)) = groups.iter_mut().find(|(k, _)| *k == from_alias) {
        joins.push(join);
    } else {
        groups.push((from_alias, vec![join]));
    }
}
