use reqwest::StatusCode;
use serde::Deserialize;

use crate::http::{endpoint, http_client};
use crate::lyrics::types::{LyricsError, LyricsProvider};

#[derive(Debug, Deserialize)]
struct LyricsResponse {
    lyrics: Option<String>,
}

/// Fetches plain lyrics from `{origin}/api/lyrics`.
///
/// The proxy answers from its own file cache when it can, so repeated
/// lookups of the same song are cheap.
#[derive(Debug, Clone)]
pub struct HttpLyricsProvider {
    base: String,
}

impl HttpLyricsProvider {
    pub fn new(origin: &str) -> Self {
        Self {
            base: endpoint(origin, "/api/lyrics"),
        }
    }

    fn lookup_url(&self, artists: &str, title: &str) -> String {
        format!(
            "{}?artist={}&track={}",
            self.base,
            urlencoding::encode(artists),
            urlencoding::encode(title)
        )
    }
}

impl LyricsProvider for HttpLyricsProvider {
    async fn fetch(&self, artists: &str, title: &str) -> Result<String, LyricsError> {
        let url = self.lookup_url(artists, title);
        let resp = http_client().get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(LyricsError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(LyricsError::Http(resp.status()));
        }

        let body = resp.text().await?;
        let parsed: LyricsResponse = serde_json::from_str(&body)?;
        match parsed.lyrics {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LyricsError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_url_encodes_query() {
        let p = HttpLyricsProvider::new("http://127.0.0.1:8888");
        assert_eq!(
            p.lookup_url("Simon & Garfunkel, Guest", "The Boxer"),
            "http://127.0.0.1:8888/api/lyrics?artist=Simon%20%26%20Garfunkel%2C%20Guest&track=The%20Boxer"
        );
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        assert!(!LyricsError::NotFound.is_transient());
        assert!(LyricsError::Http(StatusCode::INTERNAL_SERVER_ERROR).is_transient());
        assert!(LyricsError::Http(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!LyricsError::Http(StatusCode::BAD_REQUEST).is_transient());
        let garbled = serde_json::from_str::<LyricsResponse>("<html>").unwrap_err();
        assert!(LyricsError::Serde(garbled).is_transient());
    }
}
