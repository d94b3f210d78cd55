use dotenvy::dotenv;
use std::env;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Closed range of accepted page sizes for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeLimits {
    pub min: i64,
    pub max: i64,
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub http_server_address: String,
    pub token_symmetric_key: Vec<u8>,
    pub access_token_duration: chrono::Duration,
    pub page_size: PageSizeLimits,
    pub store_timeout: std::time::Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("http_server_address", &self.http_server_address)
            .field("access_token_duration", &self.access_token_duration)
            .field("page_size", &self.page_size)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let number = |name: &'static str, default: i64| -> Result<i64, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(raw) => raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                    name,
                    reason: e.to_string(),
                }),
            }
        };

        let database_url = required("DATABASE_URL")?;
        let token_symmetric_key = required("TOKEN_SYMMETRIC_KEY")?.into_bytes();
        let http_server_address =
            lookup("HTTP_SERVER_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let minutes = number("ACCESS_TOKEN_DURATION_MINUTES", 15)?;
        if minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_DURATION_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        let page_size = PageSizeLimits {
            min: number("PAGE_SIZE_MIN", 5)?,
            max: number("PAGE_SIZE_MAX", 10)?,
        };
        if page_size.min < 1 || page_size.min > page_size.max {
            return Err(ConfigError::Invalid {
                name: "PAGE_SIZE_MIN",
                reason: format!(
                    "need 1 <= PAGE_SIZE_MIN <= PAGE_SIZE_MAX, got {}..{}",
                    page_size.min, page_size.max
                ),
            });
        }

        let timeout_secs = number("STORE_TIMEOUT_SECONDS", 5)?;
        if timeout_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "STORE_TIMEOUT_SECONDS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Config {
            database_url,
            http_server_address,
            token_symmetric_key,
            access_token_duration: chrono::Duration::minutes(minutes),
            page_size,
            store_timeout: std::time::Duration::from_secs(timeout_secs as u64),
        })
    }
}
