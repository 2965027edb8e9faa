// ============================================================================
// Group Chat Config - Centralized configuration management
// ============================================================================
//
// Loads every service setting from environment variables (optionally seeded
// from a .env file) with defaults for everything that is not a secret or an
// endpoint.
//
// ============================================================================

mod constants;
mod database;
mod kafka;
mod logging;
mod media;
mod moderation;
mod redis;

pub use constants::{MAX_CONTENT_LENGTH, MAX_REQUEST_BODY_SIZE};
pub use database::DbConfig;
pub use kafka::KafkaConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use media::{AttachmentFailurePolicy, MediaConfig};
pub use moderation::ModerationConfig;
pub use redis::RedisConfig;

use anyhow::Result;
use constants::*;

/// Main configuration structure for the message service
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub bind_address: String,

    // Sub-configurations
    pub logging: LoggingConfig,
    pub db: DbConfig,
    pub kafka: KafkaConfig,
    pub redis: RedisConfig,
    pub media: MediaConfig,
    pub moderation: ModerationConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            port,
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| format!("0.0.0.0:{}", port)),

            logging: LoggingConfig::from_env(),
            db: DbConfig::from_env(),
            kafka: KafkaConfig::from_env(),
            redis: RedisConfig::from_env()?,
            media: MediaConfig::from_env()?,
            moderation: ModerationConfig::from_env(),
        })
    }
}
