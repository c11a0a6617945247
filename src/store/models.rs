use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A team as registered in the backend (read-only for this tool)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Team {
    pub id: i64,
    /// Display name; must match the scoreboard page exactly
    pub name: String,
}

/// One side of a scoreline as read from the scoreboard page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Score {
    /// No score shown yet (rendered as "-")
    #[default]
    Unknown,
    Goals(u32),
    /// Scoreboard text that did not parse as a number
    Raw(String),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Unknown => f.write_str("-"),
            Score::Goals(n) => write!(f, "{}", n),
            Score::Raw(s) => f.write_str(s),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Goals(n) => serializer.serialize_u32(*n),
            other => serializer.collect_str(other),
        }
    }
}

/// Match status as classified from a scoreboard card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Suspended,
    /// Explicitly labelled as over ("encerrado", "fim de jogo", penalties)
    Finished,
    HalfTime,
    Live,
    /// No status label but a populated scoreboard; the site omits the label
    /// on some finished matches
    FinishedByScorePresence,
    NotStarted,
    Undefined,
}

impl MatchStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            MatchStatus::Finished | MatchStatus::FinishedByScorePresence
        )
    }

    /// Label used by the scoreboard site
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Suspended => "Suspenso",
            MatchStatus::Finished | MatchStatus::FinishedByScorePresence => "Encerrado",
            MatchStatus::HalfTime => "Intervalo",
            MatchStatus::Live => "Ao Vivo",
            MatchStatus::NotStarted => "Não iniciado",
            MatchStatus::Undefined => "Não definido",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A match as extracted from one scoreboard card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_score: Score,
    pub away_score: Score,
    pub status: MatchStatus,
}

/// Column values written when a match is closed
#[derive(Debug, Clone, Serialize)]
pub struct MatchResultUpdate<'a> {
    pub home_score: &'a Score,
    pub away_score: &'a Score,
    pub is_finished: bool,
}
