mod engine;
mod event;
mod http;
mod logger;
mod lyrics;
mod overrides;
mod playback;
mod pool;
mod shell;
mod state;
mod sync;
mod text_utils;
mod timer;
mod ui;
mod visibility;

use crate::lyrics::HttpLyricsProvider;
use crate::playback::HttpPlaybackSource;
use crate::pool::PoolSettings;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8888";

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    /// Print the current lyric line to stdout instead of drawing the overlay
    #[arg(long)]
    pipe: bool,
    /// Origin of the local auth and lyrics server.
    /// If unset, the API_ORIGIN env var is used, then http://127.0.0.1:8888.
    #[arg(long)]
    origin: Option<String>,
    /// Initial sync speed multiplier (0.25 to 4.0)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
    /// Advance the position between polls using the local clock
    #[arg(long)]
    interpolate: bool,
    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug_log: bool,
}

impl Config {
    fn origin(&self) -> &str {
        self.origin.as_deref().unwrap_or(DEFAULT_ORIGIN)
    }
}

fn origin_from_env_if_empty(cli: &mut Config) {
    if cli.origin.is_none()
        && let Ok(s) = std::env::var("API_ORIGIN")
    {
        let s = s.trim();
        if !s.is_empty() {
            cli.origin = Some(s.to_string());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut cfg = Config::parse();
    origin_from_env_if_empty(&mut cfg);
    // The overlay owns the terminal, so it stays silent unless asked.
    logger::init_logging(cfg.debug_log, if cfg.pipe { "warn" } else { "off" });

    let origin = cfg.origin().to_string();
    tracing::info!(%origin, pipe = cfg.pipe, "starting");

    let source = Arc::new(HttpPlaybackSource::new(&origin));
    let lyrics = Arc::new(HttpLyricsProvider::new(&origin));
    let settings = PoolSettings {
        login_url: http::endpoint(&origin, "/login"),
        speed: cfg.speed,
        interpolate: cfg.interpolate,
    };

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (out_tx, out_rx) = mpsc::channel(32);
    let pool = tokio::spawn(pool::listen(source, lyrics, settings, cmd_rx, out_tx));

    let result = if cfg.pipe {
        crate::ui::pipe::display_lyrics_pipe(cmd_tx, out_rx).await
    } else {
        crate::ui::modern::display_lyrics_modern(cmd_tx, out_rx).await
    };
    pool.abort();

    // Print error if any, for better diagnostics
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return Err(e);
    }
    Ok(())
}
