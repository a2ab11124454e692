use dotenv::dotenv;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub bind_host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub db_pool_size: u32,
}

impl AppConfig {
    /// Reads `.env` (if present), then the process environment, over built-in defaults.
    /// `JWT_SECRET` has no default and must be provided.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv().ok(); // Load .env file if present
        let settings = config::Config::builder()
            .set_default("bind_host", "127.0.0.1")?
            .set_default("port", 5000)?
            .set_default("database_url", "marketplace.db")?
            .set_default("token_ttl_secs", 3600)?
            .set_default("bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .set_default("upload_dir", "uploads")?
            .set_default("max_upload_bytes", 25 * 1024 * 1024)?
            .set_default("db_pool_size", 8)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(config::ConfigError::Message("JWT_SECRET must not be empty".into()));
        }
        if self.token_ttl_secs <= 0 {
            return Err(config::ConfigError::Message("TOKEN_TTL_SECS must be positive".into()));
        }
        if self.bcrypt_cost < 4 || self.bcrypt_cost > 31 {
            return Err(config::ConfigError::Message("BCRYPT_COST must be between 4 and 31".into()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("db_pool_size", &self.db_pool_size)
            .finish()
    }
}
