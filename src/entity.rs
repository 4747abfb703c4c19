//!
//! Entity traits and the explicit registration descriptor.
//!
//! Entities are registered with the configuration by an explicit
//! [`Configuration::entity`](crate::config::Configuration::entity) call per
//! type; there is no runtime scanning.
//!
use crate::data::Row;
use crate::errors::Result;
use crate::value::Value;

/// A record type mapped onto one table.
pub trait Entity {
    fn table_name() -> &'static str;

    /// All mapped columns, in declaration order.
    fn columns() -> &'static [&'static str];

    /// Columns written on insert. Differs from [`columns`](Entity::columns)
    /// only for tables with an auto-generated key.
    fn insert_columns() -> &'static [&'static str] {
        Self::columns()
    }

    /// Idempotent DDL, run once at session-factory build time.
    fn create_table_sql() -> &'static str;
}

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

pub trait ToRow {
    /// Values for [`Entity::insert_columns`], in the same order.
    fn to_row(&self) -> Vec<Value>;
}

/// Static registration handle collected by the configuration builder.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    pub table: &'static str,
    pub create_sql: &'static str,
}

impl EntityDescriptor {
    pub fn of<T: Entity>() -> Self {
        EntityDescriptor {
            table: T::table_name(),
            create_sql: T::create_table_sql(),
        }
    }
}
