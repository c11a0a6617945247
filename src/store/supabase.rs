use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info};

use super::models::{MatchResultUpdate, Score, Team};
use super::BackendStore;
use crate::error::StoreError;

/// Postgres function that recomputes user points for one match
const SCORING_RPC: &str = "update_user_points_for_match";

/// Supabase project accessed through its PostgREST endpoint.
#[derive(Clone)]
pub struct SupabaseStore {
    http: Client,
    rest_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct UpdatedMatch {
    id: i64,
}

impl SupabaseStore {
    pub fn new(project_url: &str, service_key: &str) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(SupabaseStore {
            http,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }
}

async fn ensure_success(resp: Response) -> Result<Response, StoreError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}

#[async_trait]
impl BackendStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let url = format!("{}/teams", self.rest_url);
        debug!("Loading teams from {}", url);

        let resp = self
            .authed(self.http.get(&url))
            .query(&[("select", "id,name")])
            .send()
            .await?;
        let body = ensure_success(resp).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn conditional_update_match(
        &self,
        home_team_id: i64,
        away_team_id: i64,
        home_score: &Score,
        away_score: &Score,
    ) -> Result<Option<i64>, StoreError> {
        let url = format!("{}/matches", self.rest_url);
        let update = MatchResultUpdate {
            home_score,
            away_score,
            is_finished: true,
        };

        let resp = self
            .authed(self.http.patch(&url))
            .query(&[
                ("home_team_id", format!("eq.{}", home_team_id)),
                ("away_team_id", format!("eq.{}", away_team_id)),
                ("is_finished", "eq.false".to_string()),
            ])
            .header("Prefer", "return=representation")
            .json(&update)
            .send()
            .await?;
        let body = ensure_success(resp).await?.text().await?;
        let rows: Vec<UpdatedMatch> = serde_json::from_str(&body)?;
        Ok(rows.first().map(|m| m.id))
    }

    async fn trigger_scoring(&self, match_id: i64) -> Result<(), StoreError> {
        let url = format!("{}/rpc/{}", self.rest_url, SCORING_RPC);
        let resp = self
            .authed(self.http.post(&url))
            .json(&serde_json::json!({ "match_id_param": match_id }))
            .send()
            .await?;
        ensure_success(resp).await?;
        info!("Scoring computed for match {}", match_id);
        Ok(())
    }
}
