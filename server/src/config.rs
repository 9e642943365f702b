use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use tracing::info;

pub const DEFAULT_VERIFIED_THRESHOLD: i64 = 5;

/// Server settings read from `WOLFIEFIND_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    /// Import the built-in campus dataset when the store has no buildings.
    pub seed: bool,
    /// Vote total at which a submission becomes a resource.
    pub verified_threshold: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: try_load("WOLFIEFIND_DB_PATH", "wolfiefind.db")?,
            port: try_load("WOLFIEFIND_PORT", "3001")?,
            seed: try_load("WOLFIEFIND_SEED", "false")?,
            verified_threshold: try_load(
                "WOLFIEFIND_VERIFIED_THRESHOLD",
                &DEFAULT_VERIFIED_THRESHOLD.to_string(),
            )?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
