use crate::response::BadCsvError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {0} returned by {1}")]
    Status(reqwest::StatusCode, String),
    #[error("No session id field on the download page")]
    MissingSessionId,
    #[error("No open session; call open_session first")]
    SessionNotOpened,
    #[error("Got an HTML page where CSV was expected (session rejected?)")]
    HtmlResponse,
    #[error(transparent)]
    BadCsv(#[from] BadCsvError),
}
