//! Method sets shared by the concrete builders.
//!
//! Each builder wraps a `BaseBuilder` in a `base` field; these macros expose
//! the base primitives on the builder itself so chains keep returning the
//! concrete type.

/// Part access and parameter binding.
macro_rules! impl_base_methods {
    ($builder:ident) => {
        impl<H: $crate::handle::DbHandle> $builder<H> {
            /// Either append to or replace a single query part, by name.
            pub fn add_query_part(
                &mut self,
                name: &str,
                part: impl Into<$crate::parts::Part>,
                append: bool,
            ) -> $crate::error::QbResult<&mut Self> {
                self.base.add_query_part(name, part, append)?;
                Ok(self)
            }

            /// Get a query part by its name.
            pub fn get_query_part(
                &self,
                name: &str,
            ) -> $crate::error::QbResult<&$crate::parts::PartValue> {
                self.base.get_query_part(name)
            }

            /// Reset a single query part.
            pub fn reset_query_part(&mut self, name: &str) -> $crate::error::QbResult<&mut Self> {
                self.base.reset_query_part(name)?;
                Ok(self)
            }

            /// Bind one parameter; see [`BaseBuilder::set_parameter`](crate::BaseBuilder::set_parameter).
            pub fn set_parameter(
                &mut self,
                key: Option<$crate::value::ParamKey>,
                value: impl Into<$crate::value::Value>,
                ty: $crate::value::ParamType,
            ) -> &mut Self {
                self.base.set_parameter(key, value, ty);
                self
            }

            /// Replace all parameters and their types.
            pub fn set_parameters(
                &mut self,
                params: $crate::params::ParameterSet,
                types: $crate::params::ParameterTypeSet,
            ) -> &mut Self {
                self.base.set_parameters(params, types);
                self
            }

            pub fn get_parameter(
                &self,
                key: impl Into<$crate::value::ParamKey>,
            ) -> Option<&$crate::value::Value> {
                self.base.get_parameter(key)
            }

            pub fn get_parameters(&self) -> &$crate::params::ParameterSet {
                self.base.get_parameters()
            }

            /// Build a condition from a template and quoted arguments.
            pub fn prepare_condition(
                &self,
                template: &str,
                args: &[$crate::builder::CondArg],
            ) -> $crate::error::QbResult<String> {
                self.base.prepare_condition(template, args)
            }
        }

        impl<H: $crate::handle::DbHandle> $crate::builder::SqlBuilder for $builder<H> {
            type Handle = H;

            fn base(&self) -> &$crate::builder::BaseBuilder<H> {
                &self.base
            }

            fn get_sql(&self) -> $crate::error::QbResult<String> {
                self.render()
            }
        }

        /// Renders [`get_sql`](crate::SqlBuilder::get_sql), or the error text
        /// when the statement is incomplete.
        impl<H: $crate::handle::DbHandle> std::fmt::Display for $builder<H> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.render() {
                    Ok(sql) => f.write_str(&sql),
                    Err(err) => write!(f, "{err}"),
                }
            }
        }
    };
}

/// `where`/`having` style condition methods for one scalar slot.
///
/// Generates `$set`, `$set_with`, `$and`, `$and_with`, `$or`, `$or_with`.
macro_rules! impl_condition_methods {
    (
        $builder:ident, $part:expr,
        $set:ident, $set_with:ident,
        $and:ident, $and_with:ident,
        $or:ident, $or_with:ident
    ) => {
        impl<H: $crate::handle::DbHandle> $builder<H> {
            /// Replace the condition.
            pub fn $set(&mut self, condition: impl Into<$crate::composite::Condition>) -> &mut Self {
                self.base.set_condition($part, condition.into());
                self
            }

            /// Replace the condition, splicing quoted `args` into `template`.
            pub fn $set_with(
                &mut self,
                template: &str,
                args: &[$crate::builder::CondArg],
            ) -> $crate::error::QbResult<&mut Self> {
                let condition = self.base.prepare_condition(template, args)?;
                Ok(self.$set(condition))
            }

            /// Add a condition joined with `AND`.
            pub fn $and(&mut self, condition: impl Into<$crate::composite::Condition>) -> &mut Self {
                self.base.combine_condition(
                    $part,
                    condition.into(),
                    $crate::composite::CompositeKind::And,
                );
                self
            }

            /// Add a condition joined with `AND`, splicing quoted `args` into `template`.
            pub fn $and_with(
                &mut self,
                template: &str,
                args: &[$crate::builder::CondArg],
            ) -> $crate::error::QbResult<&mut Self> {
                let condition = self.base.prepare_condition(template, args)?;
                Ok(self.$and(condition))
            }

            /// Add a condition joined with `OR`.
            pub fn $or(&mut self, condition: impl Into<$crate::composite::Condition>) -> &mut Self {
                self.base.combine_condition(
                    $part,
                    condition.into(),
                    $crate::composite::CompositeKind::Or,
                );
                self
            }

            /// Add a condition joined with `OR`, splicing quoted `args` into `template`.
            pub fn $or_with(
                &mut self,
                template: &str,
                args: &[$crate::builder::CondArg],
            ) -> $crate::error::QbResult<&mut Self> {
                let condition = self.base.prepare_condition(template, args)?;
                Ok(self.$or(condition))
            }
        }
    };
}

/// `set(column, value)` for INSERT and UPDATE.
macro_rules! impl_set_methods {
    ($builder:ident) => {
        impl<H: $crate::handle::DbHandle> $builder<H> {
            /// Bind `value` positionally and append `column = ?`.
            ///
            /// A null value appends the fragment but binds nothing.
            pub fn set(&mut self, column: &str, value: impl Into<$crate::value::Value>) -> &mut Self {
                let value = value.into();
                let ty = value.natural_type();
                self.base.set_parameter(None, value, ty);
                self.set_expr(column, "?")
            }

            /// Append `column = expr` without binding anything.
            pub fn set_expr(&mut self, column: &str, expr: &str) -> &mut Self {
                self.base.add_exprs(
                    $crate::parts::FlatSlot::Set,
                    vec![format!("{column} = {expr}")],
                    true,
                );
                self
            }
        }
    };
}
