//! Text normalization applied before anything touches disk.

/// Characters that cannot appear in a file name on common filesystems.
pub const ILLEGAL_TITLE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Length reserved for the folder prefix and extension of a comment file.
pub const PATH_BUDGET: usize = 59;

/// Longest path (prefix budget plus title) a comment file may have.
pub const MAX_PATH_LEN: usize = 240;

/// Removes every newline and tab from comment text. All other characters,
/// including carriage returns, are kept.
pub fn sanitize_comment_text(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\t').collect()
}

pub fn strip_illegal_title_chars(title: &str) -> String {
    title
        .chars()
        .filter(|c| !ILLEGAL_TITLE_CHARS.contains(c))
        .collect()
}

/// Returns the shortened title when `PATH_BUDGET + title` would exceed
/// `MAX_PATH_LEN`. Lengths are counted in characters.
pub fn truncate_title(title: &str) -> Option<String> {
    let max_title = MAX_PATH_LEN - PATH_BUDGET;
    if title.chars().count() > max_title {
        Some(title.chars().take(max_title).collect())
    } else {
        None
    }
}

/// Makes a post title safe to use as a file name. Idempotent.
pub fn sanitize_title(title: &str) -> String {
    let stripped = strip_illegal_title_chars(title);
    truncate_title(&stripped).unwrap_or(stripped)
}

pub fn strip_zero_width(text: &str) -> String {
    text.replace('\u{200b}', "")
}
