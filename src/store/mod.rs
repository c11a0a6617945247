pub mod models;
pub mod sqlite;
pub mod supabase;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;

use crate::error::StoreError;
use models::{Score, Team};

/// Backend holding teams, fixtures and prediction scoring.
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// All registered teams.
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;

    /// Close the open match between `home_team_id` and `away_team_id` with
    /// the given score. Only a match with `is_finished = false` is touched,
    /// so repeating the call is a no-op. Returns the closed match id.
    async fn conditional_update_match(
        &self,
        home_team_id: i64,
        away_team_id: i64,
        home_score: &Score,
        away_score: &Score,
    ) -> Result<Option<i64>, StoreError>;

    /// Recompute prediction points for a closed match.
    async fn trigger_scoring(&self, match_id: i64) -> Result<(), StoreError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
