//! Playback snapshot model and decoding of the currently-playing payload.
//!
//! The payload is the music service's "currently playing" object as proxied
//! by the local auth server. Only the handful of fields the sync engine needs
//! are decoded; everything else is ignored.

use serde::Deserialize;

/// One poll's worth of playback state. Immutable once built and replaced
/// wholesale by the next poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub track_id: Option<String>,
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub title: String,
    pub artist_names: Vec<String>,
}

impl PlaybackSnapshot {
    /// Artist names joined the way the lyrics lookup expects them.
    pub fn artists(&self) -> String {
        self.artist_names.join(", ")
    }

    /// Identity used for track-change detection.
    ///
    /// Falls back to `artists — title` for items that carry no id (local
    /// files, some podcast episodes).
    pub fn track_key(&self) -> String {
        match self.track_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("{} — {}", self.artists(), self.title),
        }
    }

    pub fn display_title(&self) -> String {
        if self.artist_names.is_empty() {
            self.title.clone()
        } else {
            format!("{} — {}", self.title, self.artists())
        }
    }
}

#[derive(Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<i64>,
    item: Option<Item>,
}

#[derive(Deserialize)]
struct Item {
    id: Option<String>,
    #[serde(default)]
    name: String,
    duration_ms: Option<i64>,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Deserialize)]
struct Artist {
    #[serde(default)]
    name: String,
}

/// Decode a currently-playing body.
///
/// Returns `Ok(None)` when nothing is playing: an empty body, `{}`, or an
/// object without an `item`.
pub fn parse_currently_playing(body: &str) -> Result<Option<PlaybackSnapshot>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let now: CurrentlyPlaying = serde_json::from_str(body)?;
    let Some(item) = now.item else {
        return Ok(None);
    };
    Ok(Some(PlaybackSnapshot {
        track_id: item.id.filter(|id| !id.is_empty()),
        is_playing: now.is_playing,
        progress_ms: non_negative(now.progress_ms),
        duration_ms: non_negative(item.duration_ms),
        title: item.name,
        artist_names: item
            .artists
            .into_iter()
            .map(|a| a.name)
            .filter(|n| !n.is_empty())
            .collect(),
    }))
}

fn non_negative(ms: Option<i64>) -> u64 {
    ms.unwrap_or(0).max(0) as u64
}
