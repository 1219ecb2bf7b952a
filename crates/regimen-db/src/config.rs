use std::env;

/// Database configuration.
///
/// Reads from the `REGIMEN_DATABASE_URL` environment variable, falling back
/// to `postgresql://localhost:5432/regimen` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/regimen";

    /// Environment variable consulted by [`DbConfig::from_env`].
    pub const URL_ENV: &str = "REGIMEN_DATABASE_URL";

    /// Pool size used unless overridden.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    pub fn from_env() -> Self {
        let database_url =
            env::var(Self::URL_ENV).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self::new(database_url)
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Extract the database name from the URL, ignoring any query string.
    ///
    /// Returns `None` if the URL has no path component.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split('?')
            .next()
            .unwrap_or(&self.database_url);
        let (prefix, name) = without_query.rsplit_once('/')?;
        // "postgresql://host" has only the scheme slashes before the host.
        if prefix.ends_with('/') || name.is_empty() {
            return None;
        }
        Some(name)
    }

    /// Return a URL pointing at the `postgres` maintenance database on the
    /// same host. Used to issue `CREATE DATABASE` when the target DB does not
    /// yet exist.
    pub fn maintenance_url(&self) -> String {
        let query_start = self
            .database_url
            .find('?')
            .unwrap_or(self.database_url.len());
        let (base, query) = self.database_url.split_at(query_start);
        match (self.database_name(), base.rsplit_once('/')) {
            (Some(_), Some((prefix, _))) => format!("{prefix}/postgres{query}"),
            _ => format!("{}/postgres{query}", base.trim_end_matches('/')),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
