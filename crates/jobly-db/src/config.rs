//! Connection configuration.

use crate::error::{DbError, DbResult};
use std::time::Duration;
use tokio_postgres::NoTls;

const DEFAULT_DATABASE_URL: &str = "postgresql:///jobly";
const DEFAULT_TEST_DATABASE_URL: &str = "postgresql:///jobly_test";

/// Configuration for connecting to the companies database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database used outside of tests.
    pub database_url: String,
    /// Database used when `use_test_database` is set.
    pub test_database_url: String,
    /// Select `test_database_url` instead of `database_url`.
    pub use_test_database: bool,
    /// `application_name` reported to Postgres.
    pub application_name: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            test_database_url: DEFAULT_TEST_DATABASE_URL.to_string(),
            use_test_database: false,
            application_name: Some("jobly".to_string()),
            connect_timeout: None,
        }
    }
}

impl DbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment.
    ///
    /// | variable                     | field               |
    /// |------------------------------|---------------------|
    /// | `DATABASE_URL`               | `database_url`      |
    /// | `DATABASE_URL_TEST`          | `test_database_url` |
    /// | `JOBLY_ENV` (`test`)         | `use_test_database` |
    /// | `JOBLY_APP_NAME`             | `application_name`  |
    /// | `JOBLY_CONNECT_TIMEOUT_SECS` | `connect_timeout`   |
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(url) = lookup("DATABASE_URL_TEST") {
            config.test_database_url = url;
        }
        config.use_test_database = lookup("JOBLY_ENV").is_some_and(|env| env == "test");
        if let Some(name) = lookup("JOBLY_APP_NAME") {
            config.application_name = Some(name);
        }
        if let Some(secs) = lookup("JOBLY_CONNECT_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DbError::validation(format!(
                    "JOBLY_CONNECT_TIMEOUT_SECS must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            config.connect_timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Set the main database URL.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Select the test database.
    pub fn use_test_database(mut self, yes: bool) -> Self {
        self.use_test_database = yes;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// The URL that [`connect`] will use.
    pub fn url(&self) -> &str {
        if self.use_test_database {
            &self.test_database_url
        } else {
            &self.database_url
        }
    }

    fn pg_config(&self) -> DbResult<tokio_postgres::Config> {
        let mut pg: tokio_postgres::Config = self
            .url()
            .parse()
            .map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;
        if let Some(name) = &self.application_name {
            pg.application_name(name);
        }
        if let Some(timeout) = self.connect_timeout {
            pg.connect_timeout(timeout);
        }
        Ok(pg)
    }
}

/// Open a single connection and drive it on the tokio runtime.
///
/// Connection-level failures after startup are logged; queries on the
/// returned client then fail with [`DbError::Query`].
pub async fn connect(config: &DbConfig) -> DbResult<tokio_postgres::Client> {
    let (client, connection) = config
        .pg_config()?
        .connect(NoTls)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "postgres connection error");
        }
    });

    tracing::debug!(test_database = config.use_test_database, "connected");
    Ok(client)
}
