use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. `LYRICS_OVERLAY_LOG` (or `RUST_LOG`) wins
/// over the defaults; `verbose` raises the default to `debug`.
pub fn init_logging(verbose: bool, default_level: &str) {
    let fallback = if verbose { "debug" } else { default_level };
    let filter = std::env::var("LYRICS_OVERLAY_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(fallback),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(fallback)),
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(false, "off");
        init_logging(true, "warn");
    }
}
