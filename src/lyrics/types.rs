use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Lyrics not found")]
    NotFound,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: HTTP {0}")]
    Http(reqwest::StatusCode),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LyricsError {
    /// Transient failures are retried on the next natural poll; everything
    /// else is remembered until the track changes or the user refreshes.
    /// Server errors and garbled bodies count as transient, as they do for
    /// the playback poll.
    pub fn is_transient(&self) -> bool {
        match self {
            LyricsError::Network(_) | LyricsError::Serde(_) => true,
            LyricsError::Http(status) => status.is_server_error(),
            LyricsError::NotFound => false,
        }
    }
}

/// Source of plain lyrics text for a track.
///
/// Implementations may answer from a cache; the sync engine cannot tell and
/// does not care.
pub trait LyricsProvider: Send + Sync + 'static {
    fn fetch(&self, artists: &str, title: &str) -> impl Future<Output = Result<String, LyricsError>> + Send;
}
