// src/text_utils.rs
// Grapheme-aware helpers for the overlay header

use unicode_segmentation::UnicodeSegmentation;

/// Titles longer than this many graphemes scroll instead of being cut off.
pub const MARQUEE_THRESHOLD: usize = 30;

/// Spaces inserted between the end of a scrolling title and its restart.
const MARQUEE_GAP: usize = 5;

pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

pub fn needs_marquee(text: &str) -> bool {
    grapheme_len(text) > MARQUEE_THRESHOLD
}

/// The `width`-grapheme window of `text` after scrolling `step` positions.
/// Short text is returned unchanged.
pub fn marquee(text: &str, width: usize, step: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= width || width == 0 {
        return text.to_string();
    }
    let cycle = graphemes.len() + MARQUEE_GAP;
    let start = step % cycle;
    (start..start + width)
        .map(|i| {
            let i = i % cycle;
            graphemes.get(i).copied().unwrap_or(" ")
        })
        .collect()
}

/// Truncate to `width` graphemes, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if grapheme_len(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.graphemes(true).take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_do_not_scroll() {
        assert!(!needs_marquee("Short title"));
        assert_eq!(marquee("Short title", 20, 7), "Short title");
    }

    #[test]
    fn long_titles_scroll_and_wrap_around() {
        let title = "A Very Long Song Title — Some Artist, Another";
        assert!(needs_marquee(title));
        assert_eq!(marquee(title, 6, 0), "A Very");
        assert_eq!(marquee(title, 6, 2), "Very L");
        let cycle = grapheme_len(title) + MARQUEE_GAP;
        assert_eq!(marquee(title, 6, cycle), marquee(title, 6, 0));
        for step in 0..cycle {
            assert_eq!(grapheme_len(&marquee(title, 6, step)), 6);
        }
    }

    #[test]
    fn marquee_counts_graphemes_not_bytes() {
        let title = "e\u{301}e\u{301}e\u{301}e\u{301}";
        assert_eq!(marquee(title, 2, 1), "e\u{301}e\u{301}");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
        assert_eq!(truncate("abc", 0), "");
    }
}
