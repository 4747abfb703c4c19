//!
//! Session factory, sessions and transactions.
//!
//! A session owns one pooled connection for the duration of a logical unit
//! of work. The factory, its resolved settings and the function registry are
//! process-wide and read-only once the configuration has been built.
//!
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rusqlite::params_from_iter;
use tracing::debug;

use crate::data::Rows;
use crate::dialect::{ConnectionSettings, Dialect};
use crate::entity::{Entity, EntityDescriptor, ToRow};
use crate::errors::{Result, StoreError};
use crate::functions::FunctionRegistry;
use crate::platform::sqlite::{self, SqlitePool};
use crate::query::{ExecutableQuery, Expr, QueryBuilder, SelectQuery, UpdateQuery};
use crate::value::{FromValue, Value};

/// Immutable handle producing sessions over the resolved backend.
#[derive(Debug)]
pub struct SessionFactory {
    pool: OnceCell<SqlitePool>,
    registry: Arc<FunctionRegistry>,
    settings: ConnectionSettings,
}

impl SessionFactory {
    pub(crate) fn build(
        settings: ConnectionSettings,
        registry: FunctionRegistry,
        entities: Vec<EntityDescriptor>,
    ) -> Result<Self> {
        let dialect = settings.dialect().ok_or_else(|| {
            StoreError::ConfigError(format!(
                "no dialect configured and none could be inferred from url `{}`",
                settings.url()
            ))
        })?;
        if dialect != Dialect::Sqlite {
            return Err(StoreError::UnsupportedOperation(format!(
                "no bundled driver for the `{}` dialect",
                dialect
            )));
        }
        let pool = sqlite::init_pool(&settings)?;
        let factory = SessionFactory {
            pool: OnceCell::from(pool),
            registry: Arc::new(registry),
            settings,
        };
        let session = factory.open_session()?;
        for entity in &entities {
            session.execute_drop(entity.create_sql, vec![])?;
        }
        Ok(factory)
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Draw a connection from the pool. Against the single-file backend the
    /// pool holds exactly one connection, so concurrent callers block here.
    pub fn open_session(&self) -> Result<Session> {
        let pool = self
            .pool
            .get()
            .ok_or_else(|| StoreError::R2D2Error("pool not initialized".to_string()))?;
        let conn = pool.get()?;
        Ok(Session {
            conn,
            registry: Arc::clone(&self.registry),
        })
    }
}

/// One unit of work over one pooled connection. Returned to the pool on
/// drop, on every exit path.
pub struct Session {
    conn: r2d2::PooledConnection<sqlite::SqliteConnectionManager>,
    registry: Arc<FunctionRegistry>,
}

impl Session {
    /// Build a select against the entity root of `T`. The closure runs
    /// synchronously; execution is deferred to the returned query.
    pub fn select_query<T, F>(&self, build: F) -> ExecutableQuery<'_, T>
    where
        T: Entity,
        F: FnOnce(&QueryBuilder, &mut SelectQuery<T>),
    {
        let builder = QueryBuilder::new(&self.registry);
        let mut query = SelectQuery::new();
        build(&builder, &mut query);
        ExecutableQuery::new(self, query.into_sql(), vec![])
    }

    /// Build a bulk update against the entity root of `T`.
    pub fn update_query<T, F>(&self, build: F) -> ExecutableQuery<'_, ()>
    where
        T: Entity,
        F: FnOnce(&QueryBuilder, &mut UpdateQuery<T>),
    {
        let builder = QueryBuilder::new(&self.registry);
        let mut update = UpdateQuery::new();
        build(&builder, &mut update);
        let (sql, params) = update.into_sql();
        ExecutableQuery::new(self, sql, params)
    }

    /// Evaluate a single scalar expression, e.g. `rand()`, without a root.
    pub fn select_scalar<V, F>(&self, build: F) -> Result<V>
    where
        V: FromValue,
        F: FnOnce(&QueryBuilder) -> Expr<V>,
    {
        let builder = QueryBuilder::new(&self.registry);
        let expr = build(&builder);
        let sql = format!("select {}", expr.sql_fragment());
        let rows = self.execute_result(&sql, vec![])?;
        let row = rows.iter().next();
        match row {
            Some(row) => row.first(),
            None => Err(StoreError::DataError("zero rows returned".to_string())),
        }
    }

    pub fn save<T: Entity + ToRow>(&self, entity: &T) -> Result<()> {
        self.execute_drop(&insert_sql::<T>("insert"), entity.to_row())
    }

    pub fn save_batch<T: Entity + ToRow>(&self, entities: &[&T]) -> Result<()> {
        let sql = insert_sql::<T>("insert");
        for entity in entities {
            self.execute_drop(&sql, entity.to_row())?;
        }
        Ok(())
    }

    /// Insert, replacing an existing row with the same primary key.
    pub fn merge<T: Entity + ToRow>(&self, entity: &T) -> Result<()> {
        self.execute_drop(&insert_sql::<T>("insert or replace"), entity.to_row())
    }

    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Open an explicit transaction boundary. The guard rolls back unless
    /// committed.
    pub fn begin_transaction(&self) -> Result<Transaction<'_>> {
        self.execute_drop("BEGIN TRANSACTION", vec![])?;
        Ok(Transaction {
            session: self,
            committed: false,
            rolled_back: false,
        })
    }

    pub(crate) fn execute_result(&self, sql: &str, params: Vec<Value>) -> Result<Rows> {
        debug!("[chatstore] prepare sql: {} params: {:?}", sql, params);
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
        let column_count = stmt.column_count();
        let sql_values: Vec<rusqlite::types::Value> =
            params.iter().map(sqlite::to_sq_value).collect();
        let mut records = Rows::new(columns);
        let mut rows = stmt.query(params_from_iter(sql_values))?;
        while let Some(row) = rows.next()? {
            let mut record: Vec<Value> = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let raw: rusqlite::types::Value = row.get(i)?;
                record.push(sqlite::from_sq_value(raw));
            }
            records.push(record);
        }
        Ok(records)
    }

    pub(crate) fn execute_update(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        debug!("[chatstore] prepare sql: {} params: {:?}", sql, params);
        let mut stmt = self.conn.prepare(sql)?;
        let sql_values: Vec<rusqlite::types::Value> =
            params.iter().map(sqlite::to_sq_value).collect();
        let affected = stmt.execute(params_from_iter(sql_values))?;
        Ok(affected as u64)
    }

    pub(crate) fn execute_drop(&self, sql: &str, params: Vec<Value>) -> Result<()> {
        self.execute_update(sql, params).map(|_| ())
    }
}

fn insert_sql<T: Entity>(verb: &str) -> String {
    let columns = T::insert_columns();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let column_list = columns
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} into {} ({}) values ({})",
        verb,
        T::table_name(),
        column_list,
        placeholders
    )
}

/// An open transaction. Either the whole unit commits, or the guard rolls
/// back on drop.
pub struct Transaction<'a> {
    session: &'a Session,
    committed: bool,
    rolled_back: bool,
}

impl<'a> Transaction<'a> {
    pub fn commit(mut self) -> Result<()> {
        self.session.execute_drop("COMMIT TRANSACTION", vec![])?;
        self.committed = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.session.execute_drop("ROLLBACK TRANSACTION", vec![])?;
        self.rolled_back = true;
        Ok(())
    }
}

impl<'a> Drop for Transaction<'a> {
    /// Will rollback transaction.
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            let _ = self.session.execute_drop("ROLLBACK TRANSACTION", vec![]);
        }
    }
}
