use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

mod config;
mod error;
mod scoreboard;
mod store;
mod sync;

use config::{Config, PageSourceKind, StoreTarget};
use scoreboard::{scrape, ChromePage, HttpPage, PageSource};
use store::{BackendStore, SqliteStore, SupabaseStore};
use sync::SyncReport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the environment
    dotenv::dotenv().ok();

    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    run(&config).await?;
    Ok(())
}

/// One scrape-and-sync pass. Every fatal failure is logged here and
/// returned so the process exits non-zero.
async fn run(config: &Config) -> Result<SyncReport> {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return Err(e).context("invalid configuration");
    }

    let store = open_store(config)?;
    let page = page_source(config)?;

    let records = match scrape(page.as_ref()).await {
        Ok(r) => r,
        Err(e) => {
            error!("Scoreboard scrape failed: {}", e);
            return Err(e).context("scoreboard scrape failed");
        }
    };
    if records.is_empty() {
        info!("No matches found on the scoreboard, nothing to do");
        return Ok(SyncReport::default());
    }

    match sync::synchronize(&records, store.as_ref()).await {
        Ok(report) => {
            info!(
                "Sync finished: {}",
                serde_json::to_string(&report).unwrap_or_else(|_| format!("{:?}", report))
            );
            Ok(report)
        }
        Err(e) => {
            error!("Failed to load teams from {}: {}", store.name(), e);
            Err(e).context("team lookup failed")
        }
    }
}

fn open_store(config: &Config) -> Result<Box<dyn BackendStore>> {
    match config.store_target()? {
        StoreTarget::Supabase { url, service_key } => {
            match SupabaseStore::new(&url, &service_key) {
                Ok(s) => {
                    info!("Supabase client ready for {}", url);
                    Ok(Box::new(s))
                }
                Err(e) => {
                    error!("Failed to connect to Supabase: {}", e);
                    Err(e).context("store connection failed")
                }
            }
        }
        StoreTarget::Sqlite { path } => match SqliteStore::open(&path) {
            Ok(s) => {
                info!("Local mirror opened: {}", path);
                Ok(Box::new(s))
            }
            Err(e) => {
                error!("Failed to open local mirror {}: {}", path, e);
                Err(e).context("store connection failed")
            }
        },
    }
}

fn page_source(config: &Config) -> Result<Box<dyn PageSource>> {
    let page: Box<dyn PageSource> = match config.page_source {
        PageSourceKind::Chrome => Box::new(ChromePage::new(
            &config.scoreboard_url,
            config.chrome_executable.clone(),
            config.page_timeout(),
            config.page_poll_interval(),
        )),
        PageSourceKind::Http => Box::new(
            HttpPage::new(&config.scoreboard_url, config.page_timeout())
                .context("Failed to build scoreboard client")?,
        ),
    };
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scoreboard_url: String) -> Config {
        Config {
            supabase_url: None,
            supabase_service_key: None,
            scoreboard_url,
            page_source: PageSourceKind::Http,
            chrome_executable: None,
            page_timeout_secs: 5,
            page_poll_interval_ms: 10,
            database_path: Some(":memory:".into()),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_the_run() {
        let mut cfg = config("http://127.0.0.1:9/never-contacted".into());
        cfg.database_path = None;
        assert!(run(&cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_scrape_failure_fails_the_run() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/mundial-clubes-fifa")
            .with_status(500)
            .create_async()
            .await;

        let cfg = config(format!("{}/mundial-clubes-fifa", server.url()));
        assert!(run(&cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_successful_run_returns_report() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/mundial-clubes-fifa")
            .with_status(200)
            .with_body(
                r#"<div id="main"><a class="match__md">
                    <div class="match__md_card--ht-name">Flamengo</div>
                    <div class="match__md_card--at-name">Chelsea</div>
                    <div class="match__md_card--status">Encerrado</div>
                    <div class="match__md_card--scoreboard"><b>3</b><b>1</b></div>
                </a></div>"#,
            )
            .create_async()
            .await;

        let cfg = config(format!("{}/mundial-clubes-fifa", server.url()));
        let report = run(&cfg).await.unwrap();
        assert_eq!(report.finished, 1);
        assert_eq!(report.team_not_found, 1);
    }
}
