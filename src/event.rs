// event.rs: Messages between the event pool, its background tasks and the UI

use crate::engine::{FetchRequest, FetchResult, PollResult, SyncEngine};
use crate::state::Update;
use tokio::sync::mpsc;

/// Requests a presentation adapter can make of the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll immediately, re-fetching lyrics even for a loaded track.
    Refresh,
    Login,
    SyncToLine(usize),
    Wheel(i32),
    AdjustSpeed(i32),
    ResetSpeed,
    Close,
}

/// Things only the host shell can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    OpenUrl(String),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Frame(Update),
    Shell(ShellRequest),
}

/// Results reported back by spawned network tasks.
#[derive(Debug)]
pub enum TaskEvent {
    Playback { result: PollResult, forced: bool },
    Lyrics { request: FetchRequest, result: FetchResult },
}

/// Publish the engine's current frame unless that version already went out.
/// Returns false once the receiving side is gone.
pub async fn send_update(engine: &SyncEngine, last_sent: &mut Option<u64>, output: &mpsc::Sender<Output>) -> bool {
    let version = engine.version();
    if *last_sent == Some(version) {
        return true;
    }
    if output.send(Output::Frame(engine.update())).await.is_err() {
        return false;
    }
    *last_sent = Some(version);
    true
}
