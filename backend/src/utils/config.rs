use crate::constants::DEFAULT_SERVER_PORT;
use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Webhook endpoint the notifier posts to. Unset means notifications
    /// are logged and dropped.
    pub notifier_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_SERVER_PORT),
            notifier_url: env::var("NOTIFIER_URL").ok().filter(|v| !v.trim().is_empty()),
        })
    }
}
