use super::BaseBuilder;
use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::parts::{PartName, ScalarSlot};

/// DELETE statement builder.
///
/// A builder without a `where` part deletes every row of the table.
#[derive(Debug, Clone)]
pub struct DeleteBuilder<H> {
    base: BaseBuilder<H>,
}

impl_base_methods!(DeleteBuilder);
impl_condition_methods!(
    DeleteBuilder,
    ScalarSlot::Where,
    where_,
    where_with,
    and_where,
    and_where_with,
    or_where,
    or_where_with
);

impl<H: DbHandle> DeleteBuilder<H> {
    pub fn new(db: H) -> Self {
        Self {
            base: BaseBuilder::new(db),
        }
    }

    /// Set the target table.
    pub fn delete(&mut self, table: &str) -> &mut Self {
        self.base.set_table(table);
        self
    }

    fn render(&self) -> QbResult<String> {
        let parts = self.base.parts();
        let table = parts
            .get(PartName::From)
            .as_tables()
            .first()
            .ok_or_else(|| QbError::incomplete("DELETE requires a table"))?;

        let mut sql = format!("DELETE FROM {table}");
        if let Some(cond) = parts.get(PartName::Where).as_scalar() {
            sql.push_str(&format!(" WHERE {cond}"));
        }
        Ok(sql)
    }
}
