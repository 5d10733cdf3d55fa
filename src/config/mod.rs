use anyhow::Context;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub redirect_server: ServerConfig,
    /// Public base URL of the redirect listener, used to render tracking URLs
    pub redirect_base_url: String,
    pub cache: CacheConfig,
    pub stats: StatsConfig,
    pub upload: UploadConfig,
    /// Shared secret for the load-test data routes. Routes are not mounted when unset.
    pub test_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of slug lookups kept in the redirect read cache
    pub max_entries: u64,
    pub ttl_secs: u64,
    /// How often buffered clicks are written to the database
    pub click_flush_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    /// Offset of the reporting time zone; "today" and date ranges are cut at its midnight
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl_secs: 300,
            click_flush_interval_secs: 2,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl_secs: 60,
            utc_offset_minutes: 9 * 60,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "./uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl StatsConfig {
    /// Reporting time zone as a fixed offset, UTC for out-of-range values
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str = env_or("DATABASE_BACKEND", "sqlite");

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = env_or("DATABASE_URL", "sqlite://./creatorlink.db?mode=rwc");
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let api_host = env_or("API_HOST", "127.0.0.1");
        let api_port = env_or("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a valid port")?;

        let redirect_host = env_or("REDIRECT_HOST", "127.0.0.1");
        let redirect_port = env_or("REDIRECT_PORT", "3000")
            .parse::<u16>()
            .context("REDIRECT_PORT must be a valid port")?;

        let redirect_base_url = env_or("REDIRECT_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let cache_defaults = CacheConfig::default();
        let cache = CacheConfig {
            max_entries: std::env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(cache_defaults.max_entries),
            ttl_secs: std::env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(cache_defaults.ttl_secs),
            click_flush_interval_secs: std::env::var("CLICK_FLUSH_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(|v| v.max(1))
                .unwrap_or(cache_defaults.click_flush_interval_secs),
        };

        let stats_defaults = StatsConfig::default();
        let utc_offset_minutes = std::env::var("REPORTING_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(stats_defaults.utc_offset_minutes);
        if FixedOffset::east_opt(utc_offset_minutes * 60).is_none() {
            anyhow::bail!(
                "REPORTING_UTC_OFFSET_MINUTES={utc_offset_minutes} is outside the valid range (-1439..=1439)"
            );
        }

        let stats = StatsConfig {
            cache_enabled: env_flag("STATS_CACHE_ENABLED").unwrap_or(stats_defaults.cache_enabled),
            cache_ttl_secs: std::env::var("STATS_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(stats_defaults.cache_ttl_secs),
            utc_offset_minutes,
        };

        let upload_defaults = UploadConfig::default();
        let upload = UploadConfig {
            dir: env_or("UPLOAD_DIR", &upload_defaults.dir),
            max_bytes: std::env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(upload_defaults.max_bytes),
        };

        let test_token = std::env::var("TEST_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            redirect_server: ServerConfig {
                host: redirect_host,
                port: redirect_port,
            },
            redirect_base_url,
            cache,
            stats,
            upload,
            test_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reporting_zone_is_seoul() {
        let offset = StatsConfig::default().offset();
        assert_eq!(offset.local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let stats = StatsConfig {
            utc_offset_minutes: 24 * 60,
            ..StatsConfig::default()
        };
        assert_eq!(stats.offset().local_minus_utc(), 0);
    }

    #[test]
    fn backend_names_are_lowercase() {
        let backend: DatabaseBackend = serde_json::from_str("\"postgres\"").unwrap();
        assert_eq!(backend, DatabaseBackend::Postgres);
    }
}
