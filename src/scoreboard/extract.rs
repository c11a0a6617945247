use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::fragment::Fragment;
use crate::error::{CardError, ScrapeError};
use crate::store::models::{MatchRecord, MatchStatus, Score};

/// CSS class carried by every match card; also the readiness marker
/// the page source waits for.
pub const MATCH_CARD_CLASS: &str = "match__md";

const HOME_NAME: &str = "match__md_card--ht-name";
const AWAY_NAME: &str = "match__md_card--at-name";
const SCOREBOARD: &str = "match__md_card--scoreboard";
const STATUS_LABEL: &str = "match__md_card--status";
const LIVE_MARKER: &str = "match__md_card--live";
const DATETIME: &str = "match__md_card--datetime";

const FINISHED_MARKERS: [&str; 3] = ["encerrado", "fim de jogo", "pên."];

/// Extract every match card from a scoreboard page snapshot.
///
/// Cards that cannot form a record are logged and skipped; only a page
/// without the main container is an error.
pub fn extract(html: &str) -> Result<Vec<MatchRecord>, ScrapeError> {
    let document = Html::parse_document(html);
    let main_selector = selector("div#main")?;
    let card_selector = selector(&format!("a.{}", MATCH_CARD_CLASS))?;

    let main = document
        .select(&main_selector)
        .next()
        .ok_or_else(|| ScrapeError::PageStructure("main container not found".into()))?;

    let cards: Vec<_> = main.select(&card_selector).collect();
    info!("{} match cards found, processing", cards.len());

    let records = cards
        .iter()
        .enumerate()
        .filter_map(|(idx, card)| match extract_card(card) {
            Ok(record) => {
                debug!(
                    "Card {}: {} {}-{} {} ({:?})",
                    idx,
                    record.home_team_name,
                    record.home_score,
                    record.away_score,
                    record.away_team_name,
                    record.status
                );
                Some(record)
            }
            Err(e) => {
                warn!("Skipping match card {}: {}", idx, e);
                None
            }
        })
        .collect();

    Ok(records)
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::PageStructure(format!("bad selector {}", css)))
}

/// Build a record from one match card.
pub fn extract_card<F: Fragment>(card: &F) -> Result<MatchRecord, CardError> {
    let home_team_name = team_name(card, HOME_NAME).ok_or(CardError::MissingTeamName("home"))?;
    let away_team_name = team_name(card, AWAY_NAME).ok_or(CardError::MissingTeamName("away"))?;

    let scoreboard = card.find("div", SCOREBOARD);
    let status = classify(card, scoreboard.is_some());

    let (home_score, away_score) = match &scoreboard {
        Some(board) if status.is_finished() => read_scores(board),
        _ => (Score::Unknown, Score::Unknown),
    };

    Ok(MatchRecord {
        home_team_name,
        away_team_name,
        home_score,
        away_score,
        status,
    })
}

fn team_name<F: Fragment>(card: &F, class: &str) -> Option<String> {
    card.find("div", class)
        .map(|el| el.text())
        .filter(|name| !name.is_empty())
}

/// Status by priority: explicit label, then live marker, then the presence
/// of a scoreboard or kickoff time.
pub fn classify<F: Fragment>(card: &F, has_scoreboard: bool) -> MatchStatus {
    let label = card
        .find("div", STATUS_LABEL)
        .map(|el| el.text().to_lowercase())
        .unwrap_or_default();

    if label.contains("suspenso") {
        MatchStatus::Suspended
    } else if FINISHED_MARKERS.iter().any(|m| label.contains(m)) {
        MatchStatus::Finished
    } else if label.contains("intervalo") {
        MatchStatus::HalfTime
    } else if card.find("div", LIVE_MARKER).is_some() {
        MatchStatus::Live
    } else if has_scoreboard {
        MatchStatus::FinishedByScorePresence
    } else if card.find("div", DATETIME).is_some() {
        MatchStatus::NotStarted
    } else {
        MatchStatus::Undefined
    }
}

/// Read the first two bold tokens of a scoreboard as (home, away).
///
/// If either token is not a number both sides keep their raw text, so a
/// parsed goal count is never paired with an unparsed one.
pub fn read_scores<F: Fragment>(scoreboard: &F) -> (Score, Score) {
    let tokens: Vec<String> = scoreboard
        .find_all("b")
        .iter()
        .take(2)
        .map(Fragment::text)
        .collect();

    let [home, away] = match <[String; 2]>::try_from(tokens) {
        Ok(pair) => pair,
        Err(_) => return (Score::Unknown, Score::Unknown),
    };

    match (home.parse::<u32>(), away.parse::<u32>()) {
        (Ok(h), Ok(a)) => (Score::Goals(h), Score::Goals(a)),
        _ => (Score::Raw(home), Score::Raw(away)),
    }
}
