//! HTTP poller for the Playback Source.

use crate::http::{endpoint, http_client};
use crate::playback::snapshot::{PlaybackSnapshot, parse_currently_playing};
use reqwest::StatusCode;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Not authorized")]
    Unauthorized,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Everything except a missing session is retried on the next poll.
    pub fn is_transient(&self) -> bool {
        !matches!(self, PlaybackError::Unauthorized)
    }
}

/// Source of playback snapshots. `Ok(None)` means nothing is playing.
pub trait PlaybackSource: Send + Sync + 'static {
    fn poll(&self) -> impl Future<Output = Result<Option<PlaybackSnapshot>, PlaybackError>> + Send;
}

/// Polls `{origin}/api/current` on the local auth proxy.
#[derive(Debug, Clone)]
pub struct HttpPlaybackSource {
    url: String,
}

impl HttpPlaybackSource {
    pub fn new(origin: &str) -> Self {
        Self {
            url: endpoint(origin, "/api/current"),
        }
    }
}

impl PlaybackSource for HttpPlaybackSource {
    async fn poll(&self) -> Result<Option<PlaybackSnapshot>, PlaybackError> {
        let resp = http_client().get(&self.url).send().await?;
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(PlaybackError::Unauthorized),
            StatusCode::NO_CONTENT => Ok(None),
            s if s.is_success() => {
                let body = resp.text().await?;
                Ok(parse_currently_playing(&body)?)
            }
            s => Err(PlaybackError::Api(format!("current playback: HTTP {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_is_persistent() {
        assert!(!PlaybackError::Unauthorized.is_transient());
        assert!(PlaybackError::Api("HTTP 500".into()).is_transient());
    }

    #[test]
    fn builds_current_endpoint() {
        let src = HttpPlaybackSource::new("http://127.0.0.1:8888/");
        assert_eq!(src.url, "http://127.0.0.1:8888/api/current");
    }
}
