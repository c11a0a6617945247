use clap::{Parser, ValueEnum};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Club World Cup scoreboard -> Supabase result sync
#[derive(Parser, Debug, Clone)]
#[command(name = "placar-sync", version, about)]
pub struct Config {
    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase service-role key
    #[arg(long, env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    pub supabase_service_key: Option<String>,

    /// Scoreboard page listing the tournament's matches
    #[arg(
        long,
        env = "SCOREBOARD_URL",
        default_value = "https://www.placardefutebol.com.br/mundial-clubes-fifa"
    )]
    pub scoreboard_url: String,

    /// How the scoreboard page is read
    #[arg(long, env = "PAGE_SOURCE", value_enum, default_value_t = PageSourceKind::Chrome)]
    pub page_source: PageSourceKind,

    /// Chrome/Chromium binary to launch (auto-detected when unset)
    #[arg(long, env = "CHROME_EXECUTABLE")]
    pub chrome_executable: Option<String>,

    /// Maximum time to wait for match cards to appear on the page
    #[arg(long, env = "PAGE_TIMEOUT_SECS", default_value = "20")]
    pub page_timeout_secs: u64,

    /// Delay between page polls while waiting for match cards
    #[arg(long, env = "PAGE_POLL_INTERVAL_MS", default_value = "2000")]
    pub page_poll_interval_ms: u64,

    /// SQLite mirror to sync into instead of Supabase
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: Option<String>,
}

/// Scoreboard retrieval strategy
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSourceKind {
    /// Render the page in headless Chrome and wait for the match list
    Chrome,
    /// Single HTTP fetch of the served HTML
    Http,
}

/// Where finished results get written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Supabase { url: String, service_key: String },
    Sqlite { path: String },
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.scoreboard_url).map_err(|source| ConfigError::InvalidUrl {
            name: "SCOREBOARD_URL",
            source,
        })?;
        if self.page_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("PAGE_TIMEOUT_SECS"));
        }
        if self.page_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("PAGE_POLL_INTERVAL_MS"));
        }
        self.store_target().map(|_| ())
    }

    pub fn store_target(&self) -> Result<StoreTarget, ConfigError> {
        if let Some(path) = non_empty(&self.database_path) {
            return Ok(StoreTarget::Sqlite {
                path: path.to_string(),
            });
        }
        let url = non_empty(&self.supabase_url).ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let service_key = non_empty(&self.supabase_service_key)
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_KEY"))?;
        Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            name: "SUPABASE_URL",
            source,
        })?;
        Ok(StoreTarget::Supabase {
            url: url.to_string(),
            service_key: service_key.to_string(),
        })
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn page_poll_interval(&self) -> Duration {
        Duration::from_millis(self.page_poll_interval_ms)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
