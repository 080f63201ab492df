use super::BaseBuilder;
use crate::error::{QbError, QbResult};
use crate::handle::DbHandle;
use crate::parts::PartName;

/// INSERT statement builder.
///
/// Values are collected in the `set` part as `column = expr` fragments and
/// rendered as `INSERT INTO t (columns) VALUES (exprs)`.
#[derive(Debug, Clone)]
pub struct InsertBuilder<H> {
    base: BaseBuilder<H>,
}

impl_base_methods!(InsertBuilder);
impl_set_methods!(InsertBuilder);

impl<H: DbHandle> InsertBuilder<H> {
    pub fn new(db: H) -> Self {
        Self {
            base: BaseBuilder::new(db),
        }
    }

    /// Set the target table.
    pub fn insert(&mut self, table: &str) -> &mut Self {
        self.base.set_table(table);
        self
    }

    fn render(&self) -> QbResult<String> {
        let parts = self.base.parts();
        let table = parts
            .get(PartName::From)
            .as_tables()
            .first()
            .ok_or_else(|| QbError::incomplete("INSERT requires a table"))?;
        let sets = parts.get(PartName::Set).as_flat();
        if sets.is_empty() {
            return Err(QbError::incomplete("INSERT requires at least one value"));
        }

        let mut columns = Vec::with_capacity(sets.len());
        let mut values = Vec::with_capacity(sets.len());
        for fragment in sets {
            let (column, value) = fragment.split_once(" = ").ok_or_else(|| {
                QbError::invalid_part(format!("set fragment `{fragment}` is not `column = value`"))
            })?;
            columns.push(column);
            values.push(value);
        }

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.table,
            columns.join(", "),
            values.join(", ")
        ))
    }
}
