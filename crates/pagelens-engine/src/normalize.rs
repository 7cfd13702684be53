//! Text and attribute normalization.

/// Collapse whitespace runs to single spaces, trim, and truncate to
/// `max_len` characters (appending an ellipsis when cut). Returns an
/// empty string for whitespace-only input.
pub fn clean_text(raw: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(raw.len().min(max_len + 3));
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    truncate_chars(out, max_len)
}

fn truncate_chars(mut text: String, max_len: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_len) {
        text.truncate(idx);
        while text.ends_with(' ') {
            text.pop();
        }
        text.push_str("...");
    }
    text
}

/// A class/id value too short to identify anything is treated as absent.
pub fn non_trivial_token(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (trimmed.len() > 2).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_text("  Hello\n\t  world  ", 200), "Hello world");
        assert_eq!(clean_text(" \n\t ", 200), "");
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        assert_eq!(clean_text("abcdefgh", 5), "abcde...");
        assert_eq!(clean_text("short", 5), "short");
    }

    #[test]
    fn test_truncation_is_char_safe() {
        // Multi-byte characters must not be split.
        let cut = clean_text("héllo wörld", 6);
        assert_eq!(cut, "héllo...");
    }

    #[test]
    fn test_non_trivial_token() {
        assert_eq!(non_trivial_token("  sidebar  "), Some("sidebar"));
        assert_eq!(non_trivial_token("ab"), None);
        assert_eq!(non_trivial_token(""), None);
    }
}
