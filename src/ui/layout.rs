// ui/layout.rs: Wrapped lyric rows and the overlay's scroll position

use std::sync::Arc;

/// One terminal row of a wrapped lyric line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub text: String,
}

/// Wrap every lyric line to `width` columns, remembering which line each
/// row came from.
pub fn wrap_rows(lines: &[String], width: usize) -> Vec<Row> {
    let width = width.max(1);
    lines
        .iter()
        .enumerate()
        .flat_map(|(line, text)| {
            textwrap::wrap(text, width).into_iter().map(move |chunk| Row {
                line,
                text: chunk.into_owned(),
            })
        })
        .collect()
}

/// Scrollable window over the wrapped rows of the current document.
#[derive(Debug, Default)]
pub struct LyricsView {
    source: Option<Arc<Vec<String>>>,
    width: usize,
    height: usize,
    rows: Vec<Row>,
    offset: usize,
}

impl LyricsView {
    /// Re-wrap if the document or the width changed. A new document starts
    /// at the top.
    pub fn reflow(&mut self, lines: &Arc<Vec<String>>, width: usize) {
        let same_doc = self.source.as_ref().is_some_and(|s| Arc::ptr_eq(s, lines));
        if same_doc && self.width == width {
            return;
        }
        self.rows = wrap_rows(lines, width);
        self.source = Some(Arc::clone(lines));
        self.width = width;
        if !same_doc {
            self.offset = 0;
        }
        self.clamp();
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.clamp();
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn max_offset(&self) -> usize {
        self.rows.len().saturating_sub(self.height)
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }

    /// Put the middle row of `line` in the middle of the viewport, as far as
    /// the document bounds allow.
    pub fn center_on(&mut self, line: usize) {
        let Some(first) = self.rows.iter().position(|r| r.line == line) else {
            return;
        };
        let span = self.rows[first..].iter().take_while(|r| r.line == line).count();
        let middle = first + span / 2;
        self.offset = middle.saturating_sub(self.height / 2);
        self.clamp();
    }

    pub fn scroll_by(&mut self, rows: i32) {
        let target = self.offset as i64 + rows as i64;
        self.offset = target.max(0) as usize;
        self.clamp();
    }

    pub fn visible_rows(&self) -> &[Row] {
        let end = (self.offset + self.height).min(self.rows.len());
        &self.rows[self.offset.min(end)..end]
    }

    /// Lyric line shown at viewport row `row`.
    pub fn line_at(&self, row: usize) -> Option<usize> {
        self.visible_rows().get(row).map(|r| r.line)
    }

    /// Lyric line in the middle of the viewport.
    pub fn center_line(&self) -> Option<usize> {
        let rows = self.visible_rows();
        rows.get(rows.len() / 2).map(|r| r.line)
    }
}
