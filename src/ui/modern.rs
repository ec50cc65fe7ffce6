//! Terminal overlay mode.
//!
//! A full-screen ratatui interface with:
//! - a header showing the now-playing title (scrolling when it is long), the
//!   status, the speed multiplier and any notice
//! - the wrapped lyrics below it, past lines dimmed and the active line
//!   highlighted, kept in view while auto-scroll is on
//!
//! The event loop uses `tokio::select!` to handle frames from the event
//! pool, terminal input (keys, wheel, clicks) and the title marquee timer.
//! All sync decisions live in the pool; this module only renders frames and
//! turns input into commands.

use crate::event::{Command, Output, ShellRequest};
use crate::shell;
use crate::state::Update;
use crate::sync::LineClass;
use crate::text_utils::{marquee, needs_marquee, truncate};
use crate::ui::layout::LyricsView;
use crate::ui::styles::LyricStyles;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::error::Error;
use std::io;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

type UiResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Rows scrolled per wheel notch or arrow key.
const SCROLL_ROWS: i32 = 3;
/// How often a long title advances by one grapheme.
const MARQUEE_PERIOD: Duration = Duration::from_millis(300);
/// Header rows above the lyrics.
const HEADER_HEIGHT: u16 = 2;

/// UI state for the terminal overlay
#[derive(Default)]
pub struct ModernUIState {
    last_update: Option<Update>,
    view: LyricsView,
    /// Line the next draw should bring into view.
    pending_scroll: Option<usize>,
    marquee_step: usize,
    /// Screen area of the lyrics as of the last draw; used to map clicks.
    lyrics_area: Rect,
    login_hint: Option<String>,
    should_exit: bool,
}

impl ModernUIState {
    pub fn new() -> Self {
        Self::default()
    }

    fn title_scrolls(&self) -> bool {
        self.last_update.as_ref().is_some_and(|u| needs_marquee(&u.title))
    }

    fn apply_update(&mut self, update: Update) {
        let title_changed = self.last_update.as_ref().is_none_or(|u| u.title != update.title);
        if title_changed {
            self.marquee_step = 0;
        }
        if update.status != crate::state::Status::AuthRequired {
            self.login_hint = None;
        }
        self.pending_scroll = update.scroll_to;
        self.last_update = Some(update);
    }
}

/// Display lyrics in the terminal overlay until the user closes it.
pub async fn display_lyrics_modern(commands: mpsc::Sender<Command>, mut outputs: mpsc::Receiver<Output>) -> UiResult<()> {
    enable_raw_mode().map_err(to_boxed_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(to_boxed_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(to_boxed_err)?;

    let result = run(&mut terminal, &commands, &mut outputs).await;

    disable_raw_mode().map_err(to_boxed_err)?;
    execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen).map_err(to_boxed_err)?;
    terminal.show_cursor().map_err(to_boxed_err)?;
    result
}

async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    commands: &mpsc::Sender<Command>,
    outputs: &mut mpsc::Receiver<Output>,
) -> UiResult<()> {
    let styles = LyricStyles::default();
    let mut state = ModernUIState::new();
    let mut marquee_timer = tokio::time::interval(MARQUEE_PERIOD);

    // A real OS thread polls crossterm and forwards events into the runtime.
    // try_send lets it notice when the receiver is gone.
    let (event_tx, mut event_rx) = mpsc::channel(32);
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(Duration::from_millis(100)) {
                Ok(true) => {
                    if let Ok(ev) = crossterm::event::read()
                        && event_tx.try_send(ev).is_err()
                        && event_tx.is_closed()
                    {
                        break;
                    }
                }
                Ok(false) => {
                    if event_tx.is_closed() {
                        break;
                    }
                }
                Err(_) => thread::sleep(Duration::from_millis(100)),
            }
        }
    });

    draw(terminal, &mut state, &styles)?;
    while !state.should_exit {
        tokio::select! {
            biased;

            out = outputs.recv() => {
                match out {
                    Some(Output::Frame(update)) => state.apply_update(update),
                    Some(Output::Shell(ShellRequest::OpenUrl(url))) => {
                        state.login_hint = Some(shell::login_hint(&url));
                        tokio::spawn(shell::open_external(url));
                    }
                    Some(Output::Shell(ShellRequest::Close)) | None => state.should_exit = true,
                }
                draw(terminal, &mut state, &styles)?;
            }

            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(event) => {
                        for cmd in process_event(event, &mut state) {
                            if commands.send(cmd).await.is_err() {
                                state.should_exit = true;
                            }
                        }
                        draw(terminal, &mut state, &styles)?;
                    }
                    None => state.should_exit = true,
                }
            }

            _ = marquee_timer.tick(), if state.title_scrolls() => {
                state.marquee_step = state.marquee_step.wrapping_add(1);
                draw(terminal, &mut state, &styles)?;
            }
        }
    }
    Ok(())
}

/// Translate one terminal event into pool commands, applying the local part
/// (view scrolling, exit on a dead pool) directly.
fn process_event(event: Event, state: &mut ModernUIState) -> Vec<Command> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => process_key(key, state),
        Event::Mouse(mouse) => process_mouse(mouse, state),
        _ => Vec::new(),
    }
}

fn process_key(key: KeyEvent, state: &mut ModernUIState) -> Vec<Command> {
    let page = i32::from(state.lyrics_area.height.max(1));
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => vec![Command::Close],
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => vec![Command::Close],
        KeyCode::Char('r') => vec![Command::Refresh],
        KeyCode::Char('l') => vec![Command::Login],
        KeyCode::Up | KeyCode::Char('k') => scroll(state, -1, SCROLL_ROWS),
        KeyCode::Down | KeyCode::Char('j') => scroll(state, 1, SCROLL_ROWS),
        KeyCode::PageUp => scroll(state, -1, page),
        KeyCode::PageDown => scroll(state, 1, page),
        KeyCode::Enter => state.view.center_line().map(Command::SyncToLine).into_iter().collect(),
        KeyCode::Char('+') | KeyCode::Char('=') => vec![Command::AdjustSpeed(1)],
        KeyCode::Char('-') => vec![Command::AdjustSpeed(-1)],
        KeyCode::Char('0') => vec![Command::ResetSpeed],
        _ => Vec::new(),
    }
}

fn process_mouse(mouse: MouseEvent, state: &mut ModernUIState) -> Vec<Command> {
    match mouse.kind {
        MouseEventKind::ScrollUp => scroll(state, -1, SCROLL_ROWS),
        MouseEventKind::ScrollDown => scroll(state, 1, SCROLL_ROWS),
        MouseEventKind::Down(MouseButton::Left) => {
            let area = state.lyrics_area;
            let inside = mouse.row >= area.y && mouse.row < area.y + area.height;
            if !inside {
                return Vec::new();
            }
            state
                .view
                .line_at(usize::from(mouse.row - area.y))
                .map(Command::SyncToLine)
                .into_iter()
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Scroll the view locally and report the gesture as a wheel event.
fn scroll(state: &mut ModernUIState, direction: i32, rows: i32) -> Vec<Command> {
    state.pending_scroll = None;
    state.view.scroll_by(direction * rows);
    vec![Command::Wheel(direction)]
}

fn draw<B: Backend>(terminal: &mut Terminal<B>, state: &mut ModernUIState, styles: &LyricStyles) -> UiResult<()> {
    terminal
        .draw(|f| render(f, state, styles))
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
    Ok(())
}

fn render(f: &mut Frame, state: &mut ModernUIState, styles: &LyricStyles) {
    let area = f.area();
    let [header, body] = Layout::vertical([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)]).areas(area);

    let Some(update) = state.last_update.as_ref() else {
        f.render_widget(Paragraph::new("Starting…").alignment(Alignment::Center), area);
        return;
    };

    f.render_widget(Paragraph::new(header_lines(update, state, styles, header.width)), header);

    if update.minimized || update.lines.is_empty() {
        state.lyrics_area = Rect::default();
        return;
    }

    state.view.reflow(&update.lines, usize::from(body.width));
    state.view.set_height(usize::from(body.height));
    if let Some(line) = state.pending_scroll.take() {
        state.view.center_on(line);
    }
    state.lyrics_area = body;

    let lines: Vec<Line> = state
        .view
        .visible_rows()
        .iter()
        .map(|row| {
            let class = update.classes.get(row.line).copied().unwrap_or(LineClass::Future);
            Line::from(Span::styled(row.text.clone(), styles.for_class(class)))
        })
        .collect();
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), body);
}

fn header_lines<'a>(update: &'a Update, state: &ModernUIState, styles: &LyricStyles, width: u16) -> Vec<Line<'a>> {
    let width = usize::from(width);
    let title = if needs_marquee(&update.title) {
        marquee(&update.title, width.min(crate::text_utils::MARQUEE_THRESHOLD), state.marquee_step)
    } else {
        truncate(&update.title, width)
    };

    let mut status = vec![Span::styled(update.status.label(), styles.status)];
    if (update.speed - 1.0).abs() > f64::EPSILON {
        status.push(Span::raw(format!("  ×{:.2}", update.speed)));
    }
    if !update.auto_scroll {
        status.push(Span::raw("  (scrolling)"));
    }
    if let Some(notice) = state.login_hint.as_deref().or(update.notice.as_deref()) {
        status.push(Span::styled(format!("  {notice}"), styles.notice));
    }

    vec![Line::from(Span::styled(title, styles.title)), Line::from(status)]
}

fn to_boxed_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Status;
    use crate::sync::classify;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn frame(n: usize, active: usize) -> Update {
        Update {
            title: "Song — Artist".into(),
            status: Status::Playing,
            lines: Arc::new((0..n).map(|i| format!("line {i}")).collect()),
            classes: classify(Some(active), n),
            active: Some(active),
            scroll_to: Some(active),
            auto_scroll: true,
            speed: 1.0,
            version: 1,
            ..Default::default()
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn rendered(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn draws_header_and_active_line() {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let mut state = ModernUIState::new();
        state.apply_update(frame(20, 10));
        draw(&mut terminal, &mut state, &LyricStyles::default()).unwrap();
        let screen = rendered(&terminal);
        assert!(screen.contains("Song — Artist"));
        assert!(screen.contains("Playing"));
        assert!(screen.contains("line 10"));
        assert!(!screen.contains("line 0 "));
        assert_eq!(state.view.center_line(), Some(10));
    }

    #[test]
    fn minimized_frame_hides_lyrics() {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let mut state = ModernUIState::new();
        let mut upd = frame(5, 1);
        upd.minimized = true;
        state.apply_update(upd);
        draw(&mut terminal, &mut state, &LyricStyles::default()).unwrap();
        assert!(!rendered(&terminal).contains("line 1"));
        assert!(process_event(click(4), &mut state).is_empty());
    }

    #[test]
    fn click_maps_to_lyric_line() {
        let mut terminal = Terminal::new(TestBackend::new(40, 7)).unwrap();
        let mut state = ModernUIState::new();
        state.apply_update(frame(3, 0));
        draw(&mut terminal, &mut state, &LyricStyles::default()).unwrap();
        assert_eq!(process_event(click(HEADER_HEIGHT + 2), &mut state), vec![Command::SyncToLine(2)]);
        assert!(process_event(click(0), &mut state).is_empty());
    }

    #[test]
    fn scrolling_reports_wheel_and_moves_view() {
        let mut terminal = Terminal::new(TestBackend::new(40, 7)).unwrap();
        let mut state = ModernUIState::new();
        state.apply_update(frame(30, 0));
        draw(&mut terminal, &mut state, &LyricStyles::default()).unwrap();
        let wheel = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(process_event(wheel, &mut state), vec![Command::Wheel(1)]);
        assert_eq!(state.view.offset(), 3);
        assert_eq!(process_event(key(KeyCode::Up), &mut state), vec![Command::Wheel(-1)]);
        assert_eq!(state.view.offset(), 0);
    }

    #[test]
    fn keys_map_to_commands() {
        let mut state = ModernUIState::new();
        assert_eq!(process_event(key(KeyCode::Char('q')), &mut state), vec![Command::Close]);
        assert_eq!(process_event(key(KeyCode::Char('r')), &mut state), vec![Command::Refresh]);
        assert_eq!(process_event(key(KeyCode::Char('l')), &mut state), vec![Command::Login]);
        assert_eq!(process_event(key(KeyCode::Char('+')), &mut state), vec![Command::AdjustSpeed(1)]);
        assert_eq!(process_event(key(KeyCode::Char('0')), &mut state), vec![Command::ResetSpeed]);
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(process_event(ctrl_c, &mut state), vec![Command::Close]);
    }

    #[test]
    fn long_titles_scroll_in_header() {
        let mut state = ModernUIState::new();
        let mut upd = frame(1, 0);
        upd.title = "An Extremely Long Song Title That Keeps Going — Artist".into();
        state.apply_update(upd);
        assert!(state.title_scrolls());
        let styles = LyricStyles::default();
        let update = state.last_update.clone().unwrap();
        let first = header_lines(&update, &state, &styles, 80)[0].to_string();
        state.marquee_step = 3;
        let later = header_lines(&update, &state, &styles, 80)[0].to_string();
        assert_ne!(first, later);
        assert!(later.starts_with("Extremely"));
    }
}
