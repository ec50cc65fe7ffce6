//! Playback Source adapter: snapshot model and the HTTP poller.

pub mod snapshot;
pub mod source;

pub use snapshot::PlaybackSnapshot;
pub use source::{HttpPlaybackSource, PlaybackError, PlaybackSource};
