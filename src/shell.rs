// shell.rs: Host-shell side effects requested by the event pool

/// Open `url` in the user's browser without blocking the runtime.
/// Failures are logged and otherwise ignored.
pub async fn open_external(url: String) {
    tracing::info!(%url, "opening browser");
    let target = url.clone();
    match tokio::task::spawn_blocking(move || open::that(&target)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(%url, error = %e, "could not open browser"),
        Err(e) => tracing::warn!(error = %e, "browser launcher task failed"),
    }
}

/// Shown in pipe mode, and in the overlay when no browser can be launched.
pub fn login_hint(url: &str) -> String {
    format!("Log in at {url}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_mentions_url() {
        assert_eq!(login_hint("http://127.0.0.1:8888/login"), "Log in at http://127.0.0.1:8888/login");
    }
}
