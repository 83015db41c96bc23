//! Server configuration read from the environment

use std::time::Duration;

use thiserror::Error;
use vocab_core::engine::DEFAULT_ADMIN_INVITE_CODE;
use vocab_core::timer::DEFAULT_TICK;

use crate::services::study_timer::DEFAULT_IDLE_TICKS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Invite code that grants the admin role at registration
    pub admin_invite_code: String,
    /// How often a running study session flushes elapsed time
    pub study_tick: Duration,
    /// Ticks without a heartbeat before a study session is ended
    pub study_idle_ticks: u32,
}

impl Config {
    /// Read configuration from process environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let admin_invite_code =
            get("ADMIN_INVITE_CODE").unwrap_or_else(|| DEFAULT_ADMIN_INVITE_CODE.to_string());

        let study_tick = match get("STUDY_TICK_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STUDY_TICK_MS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_TICK,
        };

        let study_idle_ticks = match get("STUDY_IDLE_TICKS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(ticks) if ticks > 0 => ticks,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STUDY_IDLE_TICKS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_IDLE_TICKS,
        };

        Ok(Self {
            database_url,
            host,
            port,
            admin_invite_code,
            study_tick,
            study_idle_ticks,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
