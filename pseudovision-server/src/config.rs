//! Flat configuration document loaded from the environment, following
//! `ferrex-server`'s `Config::from_env` shape: `dotenvy` bootstrapping
//! plus `unwrap_or_else` defaults, no layered sources.

use std::env;

use chrono_tz::Tz;

/// Server-wide configuration. Settings for transcoding and scanning
/// surfaces are omitted rather than stubbed, since this system doesn't
/// own those concerns.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server_port: u16,
    pub database_url: String,
    pub lookahead_hours: i64,
    pub rebuild_interval_minutes: i64,
    pub zone_id: Tz,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let zone_id = env::var("SCHEDULING_ZONE_ID").unwrap_or_else(|_| "UTC".to_string());
        let zone_id = zone_id
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid SCHEDULING_ZONE_ID {zone_id:?}: {e}"))?;

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            lookahead_hours: env::var("SCHEDULING_LOOKAHEAD_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(72),
            rebuild_interval_minutes: env::var("SCHEDULING_REBUILD_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            zone_id,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        })
    }

    pub fn build_options(&self) -> pseudovision_core::BuildOptions {
        pseudovision_core::BuildOptions {
            lookahead_hours: self.lookahead_hours,
            zone_id: self.zone_id,
        }
    }
}
