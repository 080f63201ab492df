use super::BaseBuilder;
use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::parts::{PartName, ScalarSlot};

/// UPDATE statement builder.
#[derive(Debug, Clone)]
pub struct UpdateBuilder<H> {
    base: BaseBuilder<H>,
}

impl_base_methods!(UpdateBuilder);
impl_set_methods!(UpdateBuilder);
impl_condition_methods!(
    UpdateBuilder,
    ScalarSlot::Where,
    where_,
    where_with,
    and_where,
    and_where_with,
    or_where,
    or_where_with
);

impl<H: DbHandle> UpdateBuilder<H> {
    pub fn new(db: H) -> Self {
        Self {
            base: BaseBuilder::new(db),
        }
    }

    /// Set the target table.
    pub fn update(&mut self, table: &str) -> &mut Self {
        self.base.set_table(table);
        self
    }

    fn render(&self) -> QbResult<String> {
        let parts = self.base.parts();
        let table = parts
            .get(PartName::From)
            .as_tables()
            .first()
            .ok_or_else(|| QbError::incomplete("UPDATE requires a table"))?;
        let sets = parts.get(PartName::Set).as_flat();
        if sets.is_empty() {
            return Err(QbError::incomplete("UPDATE requires at least one SET"));
        }

        let mut sql = format!("UPDATE {} SET {}", table, sets.join(", "));
        if let Some(cond) = parts.get(PartName::Where).as_scalar() {
            sql.push_str(&format!(" WHERE {cond}"));
        }
        Ok(sql)
    }
}
