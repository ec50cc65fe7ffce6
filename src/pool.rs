// pool.rs: Central event loop driving the sync engine
//
// Everything that touches engine state runs on this one task. Network calls
// are spawned and report back through a channel, so a slow server never
// delays the sync timer.

use crate::engine::{FetchRequest, PollAction, SyncEngine};
use crate::event::{Command, Output, ShellRequest, TaskEvent, send_update};
use crate::lyrics::LyricsProvider;
use crate::playback::PlaybackSource;
use crate::timer::{Cooldown, POLL_INTERVAL, SYNC_INTERVAL, SyncTimer};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval};

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub login_url: String,
    pub speed: f64,
    pub interpolate: bool,
}

/// Runs until a `Close` command arrives, the command channel closes, or the
/// output receiver goes away.
pub async fn listen<S, L>(
    source: Arc<S>,
    lyrics: Arc<L>,
    settings: PoolSettings,
    mut commands: mpsc::Receiver<Command>,
    output: mpsc::Sender<Output>,
) where
    S: PlaybackSource,
    L: LyricsProvider,
{
    let mut engine = SyncEngine::new(settings.speed, settings.interpolate);
    let (task_tx, mut task_rx) = mpsc::channel::<TaskEvent>(16);

    let mut poll_timer = interval(POLL_INTERVAL);
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sync_timer = SyncTimer::new(SYNC_INTERVAL);
    let mut cooldown = Cooldown::default();
    let mut poll_in_flight = false;
    let mut refresh_queued = false;
    let mut last_sent = None;

    if !send_update(&engine, &mut last_sent, &output).await {
        return;
    }

    loop {
        tokio::select! {
            biased;
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                tracing::trace!(?cmd, "command");
                match cmd {
                    Command::Close => {
                        let _ = output.send(Output::Shell(ShellRequest::Close)).await;
                        break;
                    }
                    Command::Refresh => {
                        if poll_in_flight {
                            refresh_queued = true;
                        } else {
                            spawn_poll(&source, &task_tx, true);
                            poll_in_flight = true;
                            poll_timer.reset();
                        }
                    }
                    Command::Login => {
                        let url = settings.login_url.clone();
                        if output.send(Output::Shell(ShellRequest::OpenUrl(url))).await.is_err() {
                            break;
                        }
                    }
                    Command::SyncToLine(line) => {
                        engine.click_line(line, Instant::now());
                    }
                    Command::Wheel(delta) => {
                        if let Some(deadline) = engine.wheel(delta, Instant::now()) {
                            cooldown.restart(deadline);
                        }
                    }
                    Command::AdjustSpeed(steps) => {
                        engine.adjust_speed(steps);
                    }
                    Command::ResetSpeed => engine.reset_speed(),
                }
            }
            Some(event) = task_rx.recv() => match event {
                TaskEvent::Playback { result, forced } => {
                    poll_in_flight = false;
                    if let PollAction::Fetch(request) = engine.observe_poll(result, forced, Instant::now()) {
                        spawn_fetch(&lyrics, &task_tx, request);
                    }
                    if std::mem::take(&mut refresh_queued) {
                        spawn_poll(&source, &task_tx, true);
                        poll_in_flight = true;
                        poll_timer.reset();
                    }
                }
                TaskEvent::Lyrics { request, result } => {
                    engine.commit_lyrics(&request, result, Instant::now());
                }
            },
            _ = poll_timer.tick() => {
                if poll_in_flight {
                    tracing::trace!("previous poll still running, skipping");
                } else {
                    spawn_poll(&source, &task_tx, false);
                    poll_in_flight = true;
                }
            }
            _ = sync_timer.tick() => {
                engine.tick(Instant::now());
            }
            _ = cooldown.expired() => {
                engine.cooldown_elapsed(Instant::now());
            }
        }

        sync_timer.set_running(engine.sync_running());
        if engine.cooldown_deadline().is_none() {
            cooldown.cancel();
        }
        if !send_update(&engine, &mut last_sent, &output).await {
            break;
        }
    }
    tracing::debug!("event pool stopped");
}

fn spawn_poll<S: PlaybackSource>(source: &Arc<S>, tx: &mpsc::Sender<TaskEvent>, forced: bool) {
    let source = Arc::clone(source);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = source.poll().await;
        let _ = tx.send(TaskEvent::Playback { result, forced }).await;
    });
}

fn spawn_fetch<L: LyricsProvider>(lyrics: &Arc<L>, tx: &mpsc::Sender<TaskEvent>, request: FetchRequest) {
    tracing::debug!(artist = %request.artists, title = %request.title, "fetching lyrics");
    let lyrics = Arc::clone(lyrics);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = lyrics.fetch(&request.artists, &request.title).await;
        let _ = tx.send(TaskEvent::Lyrics { request, result }).await;
    });
}
