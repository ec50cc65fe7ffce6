// visibility.rs: Overlay minimize/expand and auto-scroll-into-view decisions

/// Two independent, idempotent bits of presentation state: whether the
/// overlay is collapsed, and which line (if any) to scroll into view.
#[derive(Debug, Default)]
pub struct VisibilityController {
    minimized: bool,
}

impl VisibilityController {
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Returns whether the state changed.
    pub fn minimize(&mut self) -> bool {
        !std::mem::replace(&mut self.minimized, true)
    }

    /// Returns whether the state changed.
    pub fn expand(&mut self) -> bool {
        std::mem::replace(&mut self.minimized, false)
    }

    /// The single line to scroll into view this tick.
    pub fn scroll_target(&self, active: Option<usize>, auto_scroll_enabled: bool) -> Option<usize> {
        if self.minimized || !auto_scroll_enabled {
            return None;
        }
        active
    }
}
