use crate::sync::LineClass;
use ratatui::style::{Color, Modifier, Style};

pub struct LyricStyles {
    pub past: Style,
    pub active: Style,
    pub future: Style,
    pub title: Style,
    pub status: Style,
    pub notice: Style,
}

impl LyricStyles {
    pub fn for_class(&self, class: LineClass) -> Style {
        match class {
            LineClass::Past => self.past,
            LineClass::Active => self.active,
            LineClass::Future => self.future,
        }
    }
}

impl Default for LyricStyles {
    fn default() -> Self {
        Self {
            past: Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            active: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            future: Style::default(),
            title: Style::default().add_modifier(Modifier::BOLD),
            status: Style::default().fg(Color::Cyan),
            notice: Style::default().fg(Color::Yellow),
        }
    }
}
