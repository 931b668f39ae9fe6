use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// `["*"]` allows any origin.
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

/// Secrets are `None` when unset or empty. A `None` secret never matches.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_username", &self.admin_username.as_ref().map(|_| "<set>"))
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<set>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Ok(Self {
            server: ServerConfig {
                port: lookup("PORT")
                    .unwrap_or_else(|| "8000".to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                cors_allowed_origins: lookup("ALLOWED_ORIGINS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|| "52428800".to_string())
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
            },
            auth: AuthConfig {
                admin_username: secret("ADMIN_USERNAME"),
                admin_password: secret("ADMIN_PASSWORD"),
                api_key: secret("API_KEY"),
            },
            storage: StorageConfig {
                data_dir: lookup("DATA_DIR")
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("stored_data")),
            },
            logging: LoggingConfig {
                log_dir: lookup("LOG_DIR").filter(|v| !v.is_empty()).map(PathBuf::from),
            },
        })
    }
}
