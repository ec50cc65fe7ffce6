use crate::event::{Command, Output, ShellRequest};
use crate::shell;
use crate::state::{Status, Update};
use tokio::sync::mpsc;

/// Tracks what has already been printed so each lyric line goes out once.
#[derive(Debug, Default)]
struct PipePrinter {
    last_title: Option<String>,
    last_line: Option<usize>,
    last_notice: Option<String>,
}

impl PipePrinter {
    /// Lines to print on stdout for this frame.
    fn lyric_lines(&mut self, upd: &Update) -> Vec<String> {
        let mut out = Vec::new();
        let track_changed = self.last_title.as_deref() != Some(upd.title.as_str());
        if track_changed {
            // Blank line between songs, but only after one that printed lyrics.
            if self.last_line.is_some() && !upd.lines.is_empty() {
                out.push(String::new());
            }
            self.last_title = Some(upd.title.clone());
            self.last_line = None;
        }
        if upd.lines.is_empty() || upd.active == self.last_line {
            return out;
        }
        if let Some(line) = upd.active.and_then(|i| upd.lines.get(i)) {
            out.push(line.clone());
        }
        self.last_line = upd.active;
        out
    }

    /// Notice to print on stderr, if it changed.
    fn notice(&mut self, upd: &Update) -> Option<String> {
        if upd.notice == self.last_notice {
            return None;
        }
        self.last_notice = upd.notice.clone();
        upd.notice.clone()
    }
}

/// Display lyrics in pipe mode (stdout only, for scripting)
pub async fn display_lyrics_pipe(
    commands: mpsc::Sender<Command>,
    mut outputs: mpsc::Receiver<Output>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut printer = PipePrinter::default();
    let mut login_requested = false;
    loop {
        tokio::select! {
            out = outputs.recv() => match out {
                Some(Output::Frame(upd)) => {
                    // No keyboard here, so ask for the login URL once.
                    if upd.status == Status::AuthRequired && !login_requested {
                        login_requested = true;
                        let _ = commands.send(Command::Login).await;
                    }
                    if let Some(notice) = printer.notice(&upd) {
                        eprintln!("{notice}");
                    }
                    for line in printer.lyric_lines(&upd) {
                        println!("{line}");
                    }
                }
                Some(Output::Shell(ShellRequest::OpenUrl(url))) => eprintln!("{}", shell::login_hint(&url)),
                Some(Output::Shell(ShellRequest::Close)) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                if commands.send(Command::Close).await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::classify;
    use std::sync::Arc;

    fn upd(title: &str, lines: &[&str], active: Option<usize>) -> Update {
        Update {
            title: title.into(),
            lines: Arc::new(lines.iter().map(|s| s.to_string()).collect()),
            classes: classify(active, lines.len()),
            active,
            ..Default::default()
        }
    }

    #[test]
    fn prints_each_active_line_once() {
        let mut p = PipePrinter::default();
        let lines = ["a", "b", "c"];
        assert_eq!(p.lyric_lines(&upd("T", &lines, Some(0))), vec!["a"]);
        assert!(p.lyric_lines(&upd("T", &lines, Some(0))).is_empty());
        assert_eq!(p.lyric_lines(&upd("T", &lines, Some(2))), vec!["c"]);
    }

    #[test]
    fn separates_tracks_with_blank_line() {
        let mut p = PipePrinter::default();
        p.lyric_lines(&upd("T1", &["a"], Some(0)));
        assert_eq!(p.lyric_lines(&upd("T2", &["x", "y"], Some(0))), vec!["", "x"]);
        // A track without lyrics prints nothing.
        assert!(p.lyric_lines(&upd("T3", &[], None)).is_empty());
    }

    #[test]
    fn notices_are_reported_on_change() {
        let mut p = PipePrinter::default();
        let mut u = upd("", &[], None);
        u.notice = Some("Press l to log in".into());
        assert_eq!(p.notice(&u).as_deref(), Some("Press l to log in"));
        assert_eq!(p.notice(&u), None);
        u.notice = None;
        assert_eq!(p.notice(&u), None);
    }
}
