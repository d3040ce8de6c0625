//! Connection Configuration
//!
//! Connection parameters are read from environment variables named
//! `EXTENDEDDB_<CONNECTION>_<PARAM>`, so a single process can hold several
//! named connections (`EXTENDEDDB_MAIN_HOST`, `EXTENDEDDB_REPORTING_HOST`, ...).
//!
//! ## Required Variables
//!
//! - `TYPE` - database type, currently only `postgres`
//! - `HOST` - server host
//! - `POSTGRES_PORT` - server port
//! - `SSL_MODE` - libpq ssl mode (`disable`, `prefer`, `require`, ...)
//! - `NAME` - database name
//! - `USER` - user name
//! - `PASSWORD` - password
//!
//! ## Optional Pool Variables
//!
//! - `MAX_CONNECTIONS` (default 15)
//! - `MIN_CONNECTIONS` (default 5)
//! - `ACQUIRE_TIMEOUT_SECS` (default 30)
//! - `IDLE_TIMEOUT_SECS` (default 600)
//! - `MAX_LIFETIME_SECS` (default 1800)

use std::{env, fmt, str::FromStr, time::Duration};

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::warn;

use crate::database::error::{DbError, Result};

pub const ENV_PREFIX: &str = "EXTENDEDDB";

/// Builds the environment variable name for one parameter of a named connection.
///
/// ```
/// use extended_db::database::config::env_var_name;
///
/// assert_eq!(env_var_name("TEST", "HOST"), "EXTENDEDDB_TEST_HOST");
/// ```
pub fn env_var_name(connection: &str, param: &str) -> String {
    format!("{}_{}_{}", ENV_PREFIX, connection, param)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Postgres,
}

impl FromStr for DatabaseType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(DatabaseType::Postgres),
            other => Err(DbError::UnsupportedDatabaseType(other.to_string())),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::Postgres => write!(f, "postgres"),
        }
    }
}

/// Connection pool tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_connections: 15,
            min_connections: 5,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Everything needed to open a named connection.
///
/// `Debug` never prints the password; use [`ConnectionConfig::dsn`] when the
/// full connection string is really needed.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub database_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub ssl_mode: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool: PoolConfig,
}

impl ConnectionConfig {
    /// Reads the configuration of connection `name` from the process environment.
    pub fn from_env(name: &str) -> Result<Self> {
        Self::from_lookup(name, |var| env::var(var).ok())
    }

    /// Reads the configuration of connection `name` through `lookup`.
    ///
    /// All variables are inspected before failing, and every missing or invalid
    /// one is logged and listed in the returned error.
    pub fn from_lookup<F>(name: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut reader = EnvReader {
            connection: name,
            lookup,
            missing: Vec::new(),
        };

        let database_type = reader.required("TYPE");
        let host = reader.required("HOST");
        let port = reader.required_parsed::<u16>("POSTGRES_PORT", |port| *port != 0);
        let ssl_mode = reader.required("SSL_MODE");
        if !ssl_mode.is_empty() && ssl_mode.parse::<PgSslMode>().is_err() {
            reader.reject("SSL_MODE", &ssl_mode);
        }
        let database = reader.required("NAME");
        let user = reader.required("USER");
        let password = reader.required("PASSWORD");

        let defaults = PoolConfig::default();
        let max_connections =
            reader.optional("MAX_CONNECTIONS", defaults.max_connections, |max| *max != 0);
        let min_connections = reader.optional("MIN_CONNECTIONS", defaults.min_connections, |_| true);
        let acquire_timeout_secs = reader.optional(
            "ACQUIRE_TIMEOUT_SECS",
            defaults.acquire_timeout_secs,
            |secs| *secs != 0,
        );
        let idle_timeout_secs =
            reader.optional("IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs, |_| true);
        let max_lifetime_secs =
            reader.optional("MAX_LIFETIME_SECS", defaults.max_lifetime_secs, |_| true);

        if !reader.missing.is_empty() {
            return Err(DbError::MissingConfiguration {
                connection: name.to_string(),
                variables: reader.missing,
            });
        }

        Ok(ConnectionConfig {
            database_type: database_type.parse()?,
            host,
            port: port.unwrap_or_default(),
            ssl_mode,
            database,
            user,
            password,
            pool: PoolConfig {
                max_connections,
                min_connections: min_connections.min(max_connections),
                acquire_timeout_secs,
                idle_timeout_secs,
                max_lifetime_secs,
            },
        })
    }

    /// The libpq style connection string.
    pub fn dsn(&self) -> String {
        self.format_dsn(&self.password)
    }

    /// The connection string with the password masked, safe for logs.
    pub fn redacted_dsn(&self) -> String {
        self.format_dsn("***")
    }

    fn format_dsn(&self, password: &str) -> String {
        format!(
            "host={} port={} sslmode={} dbname={} user={} password={}",
            self.host, self.port, self.ssl_mode, self.database, self.user, password
        )
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .ssl_mode(self.ssl_mode.parse().unwrap_or(PgSslMode::Prefer))
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.pool.max_connections)
            .min_connections(self.pool.min_connections)
            .acquire_timeout(Duration::from_secs(self.pool.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.pool.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.pool.max_lifetime_secs))
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("database_type", &self.database_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("pool", &self.pool)
            .finish()
    }
}

struct EnvReader<'a, F> {
    connection: &'a str,
    lookup: F,
    missing: Vec<String>,
}

impl<F> EnvReader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&mut self, param: &str) -> String {
        let var = env_var_name(self.connection, param);
        match (self.lookup)(&var) {
            Some(value) if !value.is_empty() => value,
            _ => {
                warn!("please set the {} environment variable", var);
                self.missing.push(var);
                String::new()
            }
        }
    }

    fn required_parsed<T: FromStr>(&mut self, param: &str, valid: impl Fn(&T) -> bool) -> Option<T> {
        let raw = self.required(param);
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<T>() {
            Ok(value) if valid(&value) => Some(value),
            _ => {
                self.reject(param, &raw);
                None
            }
        }
    }

    fn optional<T: FromStr>(&mut self, param: &str, default: T, valid: impl Fn(&T) -> bool) -> T {
        let var = env_var_name(self.connection, param);
        let raw = match (self.lookup)(&var) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return default,
        };
        match raw.parse::<T>() {
            Ok(value) if valid(&value) => value,
            _ => {
                self.reject(param, &raw);
                default
            }
        }
    }

    fn reject(&mut self, param: &str, raw: &str) {
        let var = env_var_name(self.connection, param);
        warn!("invalid value {:?} for the {} environment variable", raw, var);
        self.missing.push(var);
    }
}
