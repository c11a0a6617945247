use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use super::models::{Score, Team};
use super::BackendStore;
use crate::error::StoreError;

/// Local SQLite mirror of the backend tables (single connection with mutex)
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// A stored fixture
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMatch {
    pub id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: Option<String>,
    pub away_score: Option<String>,
    pub is_finished: bool,
}

/// A queued request for the points computation
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub match_id: i64,
    pub requested_at: DateTime<Utc>,
}

impl ToSql for Score {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Score::Goals(n) => ToSqlOutput::from(i64::from(*n)),
            other => ToSqlOutput::from(other.to_string()),
        })
    }
}

impl SqliteStore {
    /// Open (or create) the SQLite mirror at the given path
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Connection("sqlite connection mutex poisoned".into()))
    }
}

// Seeding and inspection helpers for local mirrors
#[allow(dead_code)]
impl SqliteStore {
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn)
    }

    pub fn insert_team(&self, name: &str) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO teams (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    /// Schedule an open fixture between two teams
    pub fn insert_match(&self, home_team_id: i64, away_team_id: i64) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO matches (home_team_id, away_team_id) VALUES (?1, ?2)",
            params![home_team_id, away_team_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_match(&self, id: i64) -> Result<Option<StoredMatch>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, home_team_id, away_team_id,
                    CAST(home_score AS TEXT), CAST(away_score AS TEXT), is_finished
             FROM matches WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(StoredMatch {
                id: row.get(0)?,
                home_team_id: row.get(1)?,
                away_team_id: row.get(2)?,
                home_score: row.get(3)?,
                away_score: row.get(4)?,
                is_finished: row.get(5)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_scoring_requests(&self) -> Result<Vec<ScoringRequest>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT match_id, requested_at FROM scoring_requests ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ScoringRequest {
                    match_id: row.get(0)?,
                    requested_at: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl BackendStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM teams ORDER BY id")?;
        let teams = stmt
            .query_map([], |row| {
                Ok(Team {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teams)
    }

    async fn conditional_update_match(
        &self,
        home_team_id: i64,
        away_team_id: i64,
        home_score: &Score,
        away_score: &Score,
    ) -> Result<Option<i64>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "UPDATE matches SET home_score = ?1, away_score = ?2, is_finished = 1
             WHERE home_team_id = ?3 AND away_team_id = ?4 AND is_finished = 0
             RETURNING id",
        )?;
        let ids = stmt
            .query_map(
                params![home_score, away_score, home_team_id, away_team_id],
                |row| row.get::<_, i64>(0),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids.first().copied())
    }

    async fn trigger_scoring(&self, match_id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO scoring_requests (match_id, requested_at) VALUES (?1, ?2)",
            params![match_id, Utc::now()],
        )?;
        info!("Scoring queued for match {}", match_id);
        Ok(())
    }
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT    NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS matches (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    home_team_id  INTEGER NOT NULL,
    away_team_id  INTEGER NOT NULL,
    home_score,
    away_score,
    is_finished   INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (home_team_id) REFERENCES teams(id),
    FOREIGN KEY (away_team_id) REFERENCES teams(id)
);

CREATE TABLE IF NOT EXISTS scoring_requests (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id      INTEGER NOT NULL,
    requested_at  TEXT    NOT NULL,
    FOREIGN KEY (match_id) REFERENCES matches(id)
);

-- at most one open fixture per ordered pair
CREATE UNIQUE INDEX IF NOT EXISTS idx_matches_open_pair
    ON matches(home_team_id, away_team_id) WHERE is_finished = 0;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (SqliteStore, i64, i64, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let fla = store.insert_team("Flamengo").unwrap();
        let ahly = store.insert_team("Al Ahly").unwrap();
        let m = store.insert_match(fla, ahly).unwrap();
        (store, fla, ahly, m)
    }

    #[tokio::test]
    async fn test_list_teams() {
        let (store, fla, ahly, _) = seeded();
        let teams = store.list_teams().await.unwrap();
        assert_eq!(
            teams,
            vec![
                Team { id: fla, name: "Flamengo".into() },
                Team { id: ahly, name: "Al Ahly".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_update_closes_open_match_once() {
        let (store, fla, ahly, m) = seeded();

        let first = store
            .conditional_update_match(fla, ahly, &Score::Goals(2), &Score::Goals(1))
            .await
            .unwrap();
        assert_eq!(first, Some(m));

        let second = store
            .conditional_update_match(fla, ahly, &Score::Goals(5), &Score::Goals(5))
            .await
            .unwrap();
        assert_eq!(second, None);

        let stored = store.get_match(m).unwrap().unwrap();
        assert!(stored.is_finished);
        assert_eq!(stored.home_score.as_deref(), Some("2"));
        assert_eq!(stored.away_score.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_update_respects_home_away_order() {
        let (store, fla, ahly, m) = seeded();
        let reversed = store
            .conditional_update_match(ahly, fla, &Score::Goals(0), &Score::Goals(0))
            .await
            .unwrap();
        assert_eq!(reversed, None);
        assert!(!store.get_match(m).unwrap().unwrap().is_finished);
    }

    #[test]
    fn test_second_open_match_for_pair_rejected() {
        let (store, fla, ahly, _) = seeded();
        assert!(store.insert_match(fla, ahly).is_err());
    }

    #[tokio::test]
    async fn test_trigger_scoring_queues_request() {
        let (store, _, _, m) = seeded();
        store.trigger_scoring(m).await.unwrap();
        let queued = store.list_scoring_requests().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].match_id, m);
    }
}
