//!
//! Configuration building: settings file handling, dialect resolution,
//! function registration and explicit entity registration.
//!
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::debug;

use crate::dialect::{ConnectionSettings, Dialect};
use crate::entity::{Entity, EntityDescriptor};
use crate::errors::{Result, StoreError};
use crate::functions::FunctionRegistry;
use crate::session::SessionFactory;

pub const CONNECTION_URL: &str = "connection.url";
pub const CONNECTION_DIALECT: &str = "connection.dialect";
pub const POOL_PROVIDER: &str = "connection.pool";
pub const POOL_MINIMUM_IDLE: &str = "pool.minimum_idle";
pub const POOL_MAXIMUM_SIZE: &str = "pool.maximum_size";
pub const POOL_CONNECTION_TIMEOUT: &str = "pool.connection_timeout";

pub const DEFAULT_SETTINGS: &str = "\
# chatstore settings
connection.url=jdbc:sqlite:data/chatstore.db
pool.connection_timeout=6
";

/// Where the settings file lives and what to seed it with when absent.
#[derive(Debug, Clone)]
pub struct Loader {
    pub settings_path: PathBuf,
    pub default_text: String,
}

impl Default for Loader {
    fn default() -> Self {
        Loader {
            settings_path: PathBuf::from("chatstore.properties"),
            default_text: DEFAULT_SETTINGS.to_string(),
        }
    }
}

impl Loader {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(settings_path: P, default_text: S) -> Self {
        Loader {
            settings_path: settings_path.into(),
            default_text: default_text.into(),
        }
    }
}

/// Collects properties, an optional explicit dialect and the entity
/// registry, then builds the immutable [`SessionFactory`].
pub struct Configuration {
    properties: IndexMap<String, String>,
    dialect: Option<Dialect>,
    entities: Vec<EntityDescriptor>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}

impl Configuration {
    pub fn new() -> Self {
        let mut properties = IndexMap::new();
        // default pool provider; the settings file may override it
        properties.insert(POOL_PROVIDER.to_string(), "r2d2".to_string());
        Configuration {
            properties,
            dialect: None,
            entities: vec![],
        }
    }

    /// [`new`](Configuration::new) followed by [`load`](Configuration::load).
    pub fn from_loader(loader: &Loader) -> Result<Self> {
        let mut configuration = Configuration::new();
        configuration.load(loader)?;
        Ok(configuration)
    }

    pub fn set_property<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// An explicitly chosen dialect always wins over URL inference.
    pub fn set_dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.dialect = Some(dialect);
        self
    }

    /// Register an entity type. Replaces the original's annotated-class
    /// scanning with an explicit call per type.
    pub fn entity<T: Entity>(&mut self) -> &mut Self {
        self.entities.push(EntityDescriptor::of::<T>());
        self
    }

    /// Scoped-acquire the settings file: write the defaults first when the
    /// file is absent, then merge its properties over the in-code defaults
    /// (file wins on conflicting keys). I/O failure here aborts the build.
    pub fn load(&mut self, loader: &Loader) -> Result<()> {
        let path = &loader.settings_path;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &loader.default_text)?;
            debug!("[chatstore] wrote default settings to {}", path.display());
        }
        let text = std::fs::read_to_string(path)?;
        for (key, value) in parse_properties(&text) {
            self.properties.insert(key, value);
        }
        Ok(())
    }

    /// Resolve the dialect, bind the standard functions against it, build
    /// the pool and run entity DDL. The result is immutable.
    pub fn build(self) -> Result<SessionFactory> {
        let url = self
            .properties
            .get(CONNECTION_URL)
            .cloned()
            .unwrap_or_default();
        let mut settings = ConnectionSettings::new(url);
        if let Some(dialect) = self.dialect {
            settings = settings.set_dialect(dialect);
        } else if let Some(name) = self.properties.get(CONNECTION_DIALECT) {
            let dialect = Dialect::from_name(name).ok_or_else(|| {
                StoreError::ConfigError(format!(
                    "unknown dialect `{}` in property `{}`",
                    name, CONNECTION_DIALECT
                ))
            })?;
            settings = settings.set_dialect(dialect);
        }
        if let Some(min) = self.parse_numeric::<u32>(POOL_MINIMUM_IDLE)? {
            settings = settings.set_pool_min(min);
        }
        if let Some(max) = self.parse_numeric::<u32>(POOL_MAXIMUM_SIZE)? {
            settings = settings.set_pool_max(max);
        }
        if let Some(secs) = self.parse_numeric::<u64>(POOL_CONNECTION_TIMEOUT)? {
            settings = settings.set_connection_timeout(Duration::from_secs(secs));
        }
        settings = settings.set_extra(self.properties.clone()).resolve();
        let dialect = settings.dialect().ok_or_else(|| {
            StoreError::ConfigError(format!(
                "no dialect configured and none could be inferred from url `{}`",
                settings.url()
            ))
        })?;
        let registry = FunctionRegistry::standard(dialect);
        SessionFactory::build(settings, registry, self.entities)
    }

    /// Parse a numeric property into its target width; out-of-range values
    /// fail the same way malformed ones do, naming the key.
    fn parse_numeric<N: std::str::FromStr>(&self, key: &str) -> Result<Option<N>> {
        match self.properties.get(key) {
            Some(raw) => raw.trim().parse::<N>().map(Some).map_err(|_| {
                StoreError::ConfigError(format!(
                    "property `{}` is not a valid number: `{}`",
                    key, raw
                ))
            }),
            None => Ok(None),
        }
    }
}

/// Plain UTF-8 `key=value` lines; `#` and `!` start comments.
fn parse_properties(text: &str) -> IndexMap<String, String> {
    let mut properties = IndexMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            properties.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    properties
}
