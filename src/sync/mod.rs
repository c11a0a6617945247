use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::store::models::{MatchRecord, MatchStatus};
use crate::store::BackendStore;

/// Outcome counters for one synchronization run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub records_seen: usize,
    pub finished: usize,
    /// Finished only because a scoreboard was shown without a status label
    pub inferred_finished: usize,
    pub team_not_found: usize,
    pub updated: usize,
    pub update_failures: usize,
    pub scoring_triggered: usize,
    pub scoring_failures: usize,
}

/// Push finished results into `store` and trigger scoring for every match
/// that transitioned to finished in this run.
///
/// Only the initial team load is fatal; per-record failures are logged and
/// counted in the report.
pub async fn synchronize(
    records: &[MatchRecord],
    store: &dyn BackendStore,
) -> Result<SyncReport, StoreError> {
    let mut report = SyncReport {
        records_seen: records.len(),
        ..Default::default()
    };

    let team_ids: HashMap<String, i64> = store
        .list_teams()
        .await?
        .into_iter()
        .map(|t| (t.name, t.id))
        .collect();
    info!("{} teams loaded from {}", team_ids.len(), store.name());

    let finished: Vec<&MatchRecord> = records.iter().filter(|r| r.status.is_finished()).collect();
    report.finished = finished.len();
    report.inferred_finished = finished
        .iter()
        .filter(|r| r.status == MatchStatus::FinishedByScorePresence)
        .count();

    if finished.is_empty() {
        info!("No finished matches to update");
        return Ok(report);
    }
    info!("{} finished matches to process", finished.len());

    for record in finished {
        let (home_id, away_id) = match (
            team_ids.get(&record.home_team_name),
            team_ids.get(&record.away_team_name),
        ) {
            (Some(h), Some(a)) => (*h, *a),
            _ => {
                warn!(
                    "Match '{} vs {}' skipped: team not found in store",
                    record.home_team_name, record.away_team_name
                );
                report.team_not_found += 1;
                continue;
            }
        };

        let match_id = match store
            .conditional_update_match(home_id, away_id, &record.home_score, &record.away_score)
            .await
        {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!(
                    "No open match for '{} vs {}', already closed",
                    record.home_team_name, record.away_team_name
                );
                continue;
            }
            Err(e) => {
                error!(
                    "Failed to update '{} vs {}': {}",
                    record.home_team_name, record.away_team_name, e
                );
                report.update_failures += 1;
                continue;
            }
        };

        report.updated += 1;
        info!(
            "Match {} closed {} {}-{} {}, computing points",
            match_id,
            record.home_team_name,
            record.home_score,
            record.away_score,
            record.away_team_name
        );

        match store.trigger_scoring(match_id).await {
            Ok(()) => report.scoring_triggered += 1,
            Err(e) => {
                error!("Scoring failed for match {}: {}", match_id, e);
                report.scoring_failures += 1;
            }
        }
    }

    Ok(report)
}
