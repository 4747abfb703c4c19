//!
//! SQLite modules.
//!
use std::fmt;
use std::path::{Path, PathBuf};

use r2d2::{ManageConnection, Pool};
use rusqlite::{Connection, OpenFlags};

use crate::dialect::ConnectionSettings;
use crate::errors::{Result, StoreError};
use crate::value::Value;

pub type SqlitePool = Pool<SqliteConnectionManager>;

#[derive(Debug)]
enum Source {
    File(PathBuf),
    Memory,
}

pub struct SqliteConnectionManager {
    source: Source,
    flags: OpenFlags,
}

impl fmt::Debug for SqliteConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SqliteConnectionManager")
            .field("source", &self.source)
            .finish()
    }
}

impl SqliteConnectionManager {
    /// See `rusqlite::Connection::open`
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
            flags: OpenFlags::default(),
        }
    }

    pub fn memory() -> Self {
        Self {
            source: Source::Memory,
            flags: OpenFlags::default(),
        }
    }
}

impl ManageConnection for SqliteConnectionManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> std::result::Result<Connection, rusqlite::Error> {
        match self.source {
            Source::File(ref path) => Connection::open_with_flags(path, self.flags),
            Source::Memory => Connection::open_in_memory_with_flags(self.flags),
        }
    }

    fn is_valid(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch("")
    }

    fn has_broken(&self, _: &mut Connection) -> bool {
        false
    }
}

/// Build the connection pool from resolved settings. The resolver already
/// pinned the bounds to one connection for this backend.
pub(crate) fn init_pool(settings: &ConnectionSettings) -> Result<SqlitePool> {
    let path = settings.database_path().ok_or_else(|| {
        StoreError::UrlParseError(format!(
            "`{}` is not a sqlite connection url",
            settings.url()
        ))
    })?;
    let manager = if path.is_empty() || path == ":memory:" {
        SqliteConnectionManager::memory()
    } else {
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        SqliteConnectionManager::file(&path)
    };
    let pool = Pool::builder()
        .min_idle(Some(settings.pool_min()))
        .max_size(settings.pool_max())
        .connection_timeout(settings.connection_timeout())
        .build(manager)?;
    Ok(pool)
}

pub(crate) fn to_sq_value(val: &Value) -> rusqlite::types::Value {
    match *val {
        Value::Nil => rusqlite::types::Value::Null,
        Value::Bool(v) => rusqlite::types::Value::Integer(if v { 1 } else { 0 }),
        Value::Int(v) => rusqlite::types::Value::Integer(i64::from(v)),
        Value::Bigint(v) => rusqlite::types::Value::Integer(v),
        Value::Double(v) => rusqlite::types::Value::Real(v),
        Value::Text(ref v) => rusqlite::types::Value::Text(v.clone()),
        Value::Blob(ref v) => rusqlite::types::Value::Blob(v.clone()),
    }
}

pub(crate) fn from_sq_value(val: rusqlite::types::Value) -> Value {
    match val {
        rusqlite::types::Value::Null => Value::Nil,
        rusqlite::types::Value::Integer(v) => Value::Bigint(v),
        rusqlite::types::Value::Real(v) => Value::Double(v),
        rusqlite::types::Value::Text(v) => Value::Text(v),
        rusqlite::types::Value::Blob(v) => Value::Blob(v),
    }
}
