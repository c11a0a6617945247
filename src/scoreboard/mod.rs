pub mod extract;
pub mod fragment;
pub mod page;

pub use extract::extract;
pub use page::{ChromePage, HttpPage, PageSource};

use tracing::info;

use crate::error::ScrapeError;
use crate::store::models::MatchRecord;

/// Fetch the scoreboard from `source` and turn it into match records.
pub async fn scrape(source: &dyn PageSource) -> Result<Vec<MatchRecord>, ScrapeError> {
    let html = source.fetch_page().await?;
    let records = extract(&html)?;
    info!(
        "{} produced {} match records ({} finished)",
        source.name(),
        records.len(),
        records.iter().filter(|r| r.status.is_finished()).count()
    );
    Ok(records)
}
