use thiserror::Error;

/// Invalid or missing settings; raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (required unless DATABASE_PATH points to a local mirror)")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Failures while retrieving or reading the scoreboard page as a whole.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("scoreboard request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scoreboard responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("invalid browser configuration: {0}")]
    BrowserConfig(String),

    #[error("no match card appeared within {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected page structure: {0}")]
    PageStructure(String),
}

/// A single card that cannot be turned into a match record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("missing {0} team name")]
    MissingTeamName(&'static str),
}

/// Failures talking to the backend store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to store: {0}")]
    Connection(String),

    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
