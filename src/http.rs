use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

// Shared HTTP client for both collaborators. A single request is never
// retried; the next scheduled poll is the retry.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("LyricsOverlay/0.1")
        .timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
});

pub(crate) fn http_client() -> &'static Client {
    &HTTP_CLIENT
}

/// Joins an origin and an absolute path without doubling the slash.
pub fn endpoint(origin: &str, path: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_handles_trailing_slash() {
        assert_eq!(endpoint("http://127.0.0.1:8888/", "/api/current"), "http://127.0.0.1:8888/api/current");
        assert_eq!(endpoint("http://127.0.0.1:8888", "/login"), "http://127.0.0.1:8888/login");
    }
}
