use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::env;

use thiserror::Error;

use crate::store::{Backend, DbPool, RestStore, SqliteOptions, StoreError};

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const DATABASE_URL: &str = "DATABASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is set but {1} is missing")]
    Incomplete(&'static str, &'static str),

    #[error("SUPABASE_URL and SUPABASE_ANON_KEY, or DATABASE_URL, must be set in .env")]
    NoBackend,

    #[error("could not open store: {0}")]
    Store(#[from] StoreError),
}

/// Where scores and tasks live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Rest { project_url: String, anon_key: String },
    Sqlite { database_url: String },
}

impl StoreConfig {
    /// Reads the store settings from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    /// The hosted data API wins when both are configured. Blank values count as missing.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (get(SUPABASE_URL), get(SUPABASE_ANON_KEY)) {
            (Some(project_url), Some(anon_key)) => {
                return Ok(StoreConfig::Rest {
                    project_url,
                    anon_key,
                })
            }
            (Some(_), None) => return Err(ConfigError::Incomplete(SUPABASE_URL, SUPABASE_ANON_KEY)),
            (None, Some(_)) => return Err(ConfigError::Incomplete(SUPABASE_ANON_KEY, SUPABASE_URL)),
            (None, None) => {}
        }

        get(DATABASE_URL)
            .map(|database_url| StoreConfig::Sqlite { database_url })
            .ok_or(ConfigError::NoBackend)
    }

    /// Opens the configured store. SQLite connections create missing tables as they are opened.
    ///
    /// Builds a blocking HTTP client for the REST store, so call it off the async runtime.
    pub fn connect(&self) -> Result<Backend, ConfigError> {
        match self {
            StoreConfig::Rest {
                project_url,
                anon_key,
            } => Ok(Backend::Rest(RestStore::new(project_url, anon_key)?)),
            StoreConfig::Sqlite { database_url } => {
                let manager = ConnectionManager::<SqliteConnection>::new(database_url);
                let pool: DbPool = Pool::builder()
                    .connection_customizer(Box::new(SqliteOptions))
                    .build(manager)
                    .map_err(|e| ConfigError::Store(StoreError::Pool(e)))?;
                pool.get().map_err(StoreError::Pool)?;
                Ok(Backend::Sqlite(pool))
            }
        }
    }
}
