//!
//! Connection URL inspection: dialect inference and pool tuning.
//!
use std::time::Duration;

use indexmap::IndexMap;
use url::Url;

/// A backend-specific SQL generation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    H2,
    Sqlite,
    MariaDb,
    Postgres,
    SqlServer,
}

/// Known URL prefixes, first match wins.
const PREFIXES: &[(&str, Dialect)] = &[
    ("jdbc:h2", Dialect::H2),
    ("jdbc:sqlite", Dialect::Sqlite),
    ("jdbc:mysql", Dialect::MariaDb),
    ("jdbc:postgresql", Dialect::Postgres),
    ("jdbc:sqlserver", Dialect::SqlServer),
];

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::H2 => "h2",
            Dialect::Sqlite => "sqlite",
            Dialect::MariaDb => "mariadb",
            Dialect::Postgres => "postgres",
            Dialect::SqlServer => "sqlserver",
        }
    }

    /// Parse an explicit dialect override from the settings file.
    pub fn from_name(name: &str) -> Option<Dialect> {
        match name.trim().to_lowercase().as_str() {
            "h2" => Some(Dialect::H2),
            "sqlite" => Some(Dialect::Sqlite),
            "mysql" | "mariadb" => Some(Dialect::MariaDb),
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "sqlserver" | "mssql" => Some(Dialect::SqlServer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_POOL_MIN: u32 = 1;
pub const DEFAULT_POOL_MAX: u32 = 16;
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(6);

/// Resolved connection tuning, immutable once [`resolve`](ConnectionSettings::resolve) has run.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    url: String,
    pool_min: u32,
    pool_max: u32,
    connection_timeout: Duration,
    dialect: Option<Dialect>,
    extra: IndexMap<String, String>,
}

impl ConnectionSettings {
    pub fn new<S: Into<String>>(url: S) -> Self {
        ConnectionSettings {
            url: url.into(),
            pool_min: DEFAULT_POOL_MIN,
            pool_max: DEFAULT_POOL_MAX,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            dialect: None,
            extra: IndexMap::new(),
        }
    }

    /// Infer the dialect from the URL prefix and apply backend pool overrides.
    ///
    /// Never fails: an unrecognized prefix simply leaves the dialect unset so
    /// the caller may still supply one explicitly. A dialect set before this
    /// call is kept as-is. The single-file backend is the one exception to
    /// caller-supplied pool bounds: it does not tolerate concurrent writers,
    /// so its pool is pinned to exactly one connection.
    pub fn resolve(mut self) -> Self {
        let matched = PREFIXES
            .iter()
            .find(|(prefix, _)| self.url.starts_with(prefix))
            .map(|(_, dialect)| *dialect);
        if let Some(dialect) = matched {
            if self.dialect.is_none() {
                self.dialect = Some(dialect);
            }
            if dialect == Dialect::Sqlite {
                self.pool_min = 1;
                self.pool_max = 1;
            }
        }
        self
    }

    pub fn set_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn set_pool_min(mut self, pool_min: u32) -> Self {
        self.pool_min = pool_min;
        self
    }

    pub fn set_pool_max(mut self, pool_max: u32) -> Self {
        self.pool_max = pool_max;
        self
    }

    pub fn set_connection_timeout(mut self, connection_timeout: Duration) -> Self {
        self.connection_timeout = connection_timeout;
        self
    }

    pub fn set_extra(mut self, extra: IndexMap<String, String>) -> Self {
        self.extra = extra;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool_min(&self) -> u32 {
        self.pool_min
    }

    pub fn pool_max(&self) -> u32 {
        self.pool_max
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn extra(&self) -> &IndexMap<String, String> {
        &self.extra
    }

    /// The database file behind a `jdbc:sqlite:` URL, `":memory:"` included.
    pub fn database_path(&self) -> Option<String> {
        let raw = self.url.strip_prefix("jdbc:")?;
        let url = Url::parse(raw).ok()?;
        if url.scheme() != "sqlite" {
            return None;
        }
        let host = url.host_str().unwrap_or_default();
        let path = url.path();
        let path = if path == "/" { "" } else { path };
        Some(format!("{}{}", host, path))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prefix_mapping() {
        let cases = [
            ("jdbc:h2:./data/store", Dialect::H2),
            ("jdbc:sqlite:data/store.db", Dialect::Sqlite),
            ("jdbc:mysql://localhost:3306/store", Dialect::MariaDb),
            ("jdbc:postgresql://localhost/store", Dialect::Postgres),
            ("jdbc:sqlserver://localhost;databaseName=store", Dialect::SqlServer),
        ];
        for (url, expected) in cases {
            let settings = ConnectionSettings::new(url).resolve();
            assert_eq!(settings.dialect(), Some(expected), "{}", url);
        }
    }

    #[test]
    fn unrecognized_prefix_stays_unset() {
        let settings = ConnectionSettings::new("jdbc:oracle:thin:@localhost").resolve();
        assert_eq!(settings.dialect(), None);
        let settings = ConnectionSettings::new("not a url at all").resolve();
        assert_eq!(settings.dialect(), None);
    }

    #[test]
    fn sqlite_forces_single_connection() {
        let settings = ConnectionSettings::new("jdbc:sqlite:store.db")
            .set_pool_min(4)
            .set_pool_max(32)
            .resolve();
        assert_eq!(settings.pool_min(), 1);
        assert_eq!(settings.pool_max(), 1);
    }

    #[test]
    fn sqlite_pool_pinned_even_with_explicit_dialect() {
        let settings = ConnectionSettings::new("jdbc:sqlite:store.db")
            .set_dialect(Dialect::Sqlite)
            .set_pool_max(8)
            .resolve();
        assert_eq!(settings.pool_max(), 1);
    }

    #[test]
    fn explicit_dialect_wins_over_inference() {
        let settings = ConnectionSettings::new("jdbc:mysql://localhost/store")
            .set_dialect(Dialect::Postgres)
            .resolve();
        assert_eq!(settings.dialect(), Some(Dialect::Postgres));
    }

    #[test]
    fn other_backends_keep_caller_bounds() {
        let settings = ConnectionSettings::new("jdbc:postgresql://localhost/store")
            .set_pool_min(2)
            .set_pool_max(8)
            .resolve();
        assert_eq!(settings.pool_min(), 2);
        assert_eq!(settings.pool_max(), 8);
    }

    #[test]
    fn sqlite_database_path() {
        let settings = ConnectionSettings::new("jdbc:sqlite:data/store.db");
        assert_eq!(settings.database_path().as_deref(), Some("data/store.db"));
        let settings = ConnectionSettings::new("jdbc:sqlite::memory:");
        assert_eq!(settings.database_path().as_deref(), Some(":memory:"));
        let settings = ConnectionSettings::new("jdbc:mysql://localhost/store");
        assert_eq!(settings.database_path(), None);
    }
}
