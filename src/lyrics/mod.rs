// lyrics/mod.rs - Lyrics Provider adapter and text splitting
pub mod parse;
pub mod provider;
pub mod types;

pub use provider::HttpLyricsProvider;
pub use types::{LyricsError, LyricsProvider};
