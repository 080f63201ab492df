use super::BaseBuilder;
use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::parts::{FlatSlot, FromClause, JoinClause, JoinType, PartName, ScalarSlot, SqlParts};

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// SELECT statement builder.
#[derive(Debug, Clone)]
pub struct SelectBuilder<H> {
    base: BaseBuilder<H>,
    limit: Option<u64>,
    offset: u64,
}

impl_base_methods!(SelectBuilder);
impl_condition_methods!(
    SelectBuilder,
    ScalarSlot::Where,
    where_,
    where_with,
    and_where,
    and_where_with,
    or_where,
    or_where_with
);
impl_condition_methods!(
    SelectBuilder,
    ScalarSlot::Having,
    having,
    having_with,
    and_having,
    and_having_with,
    or_having,
    or_having_with
);

impl<H: DbHandle> SelectBuilder<H> {
    /// Create an empty SELECT builder.
    pub fn new(db: H) -> Self {
        Self {
            base: BaseBuilder::new(db),
            limit: None,
            offset: 0,
        }
    }

    /// Set SELECT columns (string form, supports complex expressions).
    pub fn select(&mut self, columns: &str) -> &mut Self {
        self.base
            .add_exprs(FlatSlot::Select, vec![columns.to_string()], false);
        self
    }

    /// Set SELECT columns (array form).
    pub fn select_cols(&mut self, columns: &[&str]) -> &mut Self {
        self.base.add_exprs(FlatSlot::Select, to_strings(columns), false);
        self
    }

    /// Append one SELECT expression.
    pub fn add_select(&mut self, column: &str) -> &mut Self {
        self.base
            .add_exprs(FlatSlot::Select, vec![column.to_string()], true);
        self
    }

    /// Append several SELECT expressions.
    pub fn add_select_cols(&mut self, columns: &[&str]) -> &mut Self {
        self.base.add_exprs(FlatSlot::Select, to_strings(columns), true);
        self
    }

    /// Add a table to the FROM list under `alias`.
    pub fn from(&mut self, table: &str, alias: &str) -> &mut Self {
        let from = FromClause::new(table, Some(alias.to_string()));
        self.base.add_table(from, true);
        self
    }

    /// Add a table to the FROM list without an alias.
    pub fn from_table(&mut self, table: &str) -> &mut Self {
        let from = FromClause::new(table, None);
        self.base.add_table(from, true);
        self
    }

    /// Add a join of `join_type` attached to `from_alias`.
    pub fn join_with(
        &mut self,
        join_type: JoinType,
        from_alias: &str,
        table: &str,
        alias: &str,
        condition: &str,
    ) -> &mut Self {
        let join = JoinClause {
            join_type,
            table: table.to_string(),
            alias: alias.to_string(),
            condition: condition.to_string(),
        };
        self.base.add_join(from_alias, join);
        self
    }

    /// Alias for [`SelectBuilder::inner_join`].
    pub fn join(&mut self, from_alias: &str, table: &str, alias: &str, condition: &str) -> &mut Self {
        self.inner_join(from_alias, table, alias, condition)
    }

    pub fn inner_join(
        &mut self,
        from_alias: &str,
        table: &str,
        alias: &str,
        condition: &str,
    ) -> &mut Self {
        self.join_with(JoinType::Inner, from_alias, table, alias, condition)
    }

    pub fn left_join(
        &mut self,
        from_alias: &str,
        table: &str,
        alias: &str,
        condition: &str,
    ) -> &mut Self {
        self.join_with(JoinType::Left, from_alias, table, alias, condition)
    }

    pub fn right_join(
        &mut self,
        from_alias: &str,
        table: &str,
        alias: &str,
        condition: &str,
    ) -> &mut Self {
        self.join_with(JoinType::Right, from_alias, table, alias, condition)
    }

    /// Replace the GROUP BY list.
    pub fn group_by(&mut self, expr: &str) -> &mut Self {
        self.base
            .add_exprs(FlatSlot::GroupBy, vec![expr.to_string()], false);
        self
    }

    /// Append to the GROUP BY list.
    pub fn add_group_by(&mut self, expr: &str) -> &mut Self {
        self.base
            .add_exprs(FlatSlot::GroupBy, vec![expr.to_string()], true);
        self
    }

    /// Replace the ORDER BY list.
    pub fn order_by(&mut self, sort: &str, order: Order) -> &mut Self {
        let expr = format!("{} {}", sort, order.as_str());
        self.base.add_exprs(FlatSlot::OrderBy, vec![expr], false);
        self
    }

    /// Append to the ORDER BY list.
    pub fn add_order_by(&mut self, sort: &str, order: Order) -> &mut Self {
        let expr = format!("{} {}", sort, order.as_str());
        self.base.add_exprs(FlatSlot::OrderBy, vec![expr], true);
        self
    }

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Set the offset to the start of `page` (1-based) for the current limit.
    ///
    /// Pages below 1 are treated as 1; without a limit the offset is 0.
    pub fn set_page(&mut self, page: u64) -> &mut Self {
        let page = page.max(1);
        self.offset = self.limit.unwrap_or(0).saturating_mul(page - 1);
        self
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn render(&self) -> QbResult<String> {
        let parts = self.base.parts();
        let select = parts.get(PartName::Select).as_flat();
        if select.is_empty() {
            return Err(QbError::incomplete("SELECT requires at least one column"));
        }
        let tables = parts.get(PartName::From).as_tables();
        if tables.is_empty() {
            return Err(QbError::incomplete("SELECT requires a FROM clause"));
        }

        let mut visited: Vec<&str> = Vec::new();
        let from_clauses: Vec<String> = tables
            .iter()
            .map(|from| {
                let mut clause = from.to_string();
                render_joins(parts, from.reference(), &mut visited, &mut clause);
                clause
            })
            .collect();

        // every join must hang off an alias reachable from FROM
        if let Some((alias, _)) = parts
            .get(PartName::Join)
            .as_joins()
            .iter()
            .find(|(alias, _)| !visited.contains(&alias.as_str()))
        {
            return Err(QbError::incomplete(format!(
                "join attached to unknown alias `{alias}`"
            )));
        }

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), from_clauses.join(", "));
        if let Some(cond) = parts.get(PartName::Where).as_scalar() {
            sql.push_str(&format!(" WHERE {cond}"));
        }
        let group_by = parts.get(PartName::GroupBy).as_flat();
        if !group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", group_by.join(", ")));
        }
        if let Some(cond) = parts.get(PartName::Having).as_scalar() {
            sql.push_str(&format!(" HAVING {cond}"));
        }
        let order_by = parts.get(PartName::OrderBy).as_flat();
        if !order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", order_by.join(", ")));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, self.offset));
        }
        Ok(sql)
    }
}

fn to_strings(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Append the joins attached to `alias`, then the joins attached to each of
/// those, depth first.
fn render_joins<'a>(parts: &'a SqlParts, alias: &'a str, visited: &mut Vec<&'a str>, out: &mut String) {
    if visited.contains(&alias) {
        return;
    }
    visited.push(alias);
    for join in parts.joins_for(alias) {
        out.push(' ');
        out.push_str(&join.to_string());
        render_joins(parts, &join.alias, visited, out);
    }
}
