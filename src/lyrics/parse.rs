/// Split a plain lyrics blob into display lines.
///
/// Lines are trimmed and blank lines dropped, so every returned entry has
/// visible text.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
