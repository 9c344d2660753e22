//! Server configuration parsed from environment variables.
//!
//! Every knob has a default so the server boots with no environment at all:
//! without `DATABASE_URL` rooms are kept in process memory.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_PERSIST_RETRIES: usize = 3;
pub const DEFAULT_PERSIST_RETRY_BASE_MS: u64 = 20;

/// Retry policy for store calls made on behalf of a client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistConfig {
    /// Total attempts per store call, including the first.
    pub retries: usize,
    /// Linear back-off step in milliseconds (`attempt * retry_base_ms`).
    pub retry_base_ms: u64,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self { retries: DEFAULT_PERSIST_RETRIES, retry_base_ms: DEFAULT_PERSIST_RETRY_BASE_MS }
    }
}

impl PersistConfig {
    pub fn from_env() -> Self {
        Self {
            retries: env_parse("PERSIST_RETRIES", DEFAULT_PERSIST_RETRIES),
            retry_base_ms: env_parse("PERSIST_RETRY_BASE_MS", DEFAULT_PERSIST_RETRY_BASE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Outbound frame buffer per websocket connection.
    pub client_channel_capacity: usize,
    pub persist: PersistConfig,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DATABASE_URL`: in-memory store when absent or empty
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `CLIENT_CHANNEL_CAPACITY`: default 256
    /// - `PERSIST_RETRIES`: default 3
    /// - `PERSIST_RETRY_BASE_MS`: default 20
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            client_channel_capacity: env_parse("CLIENT_CHANNEL_CAPACITY", DEFAULT_CLIENT_CHANNEL_CAPACITY).max(1),
            persist: PersistConfig::from_env(),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
