//! Shared utilities

/// Truncate to `max` characters, appending "..." when something was cut
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte, _)) => format!("{}...", &s[..byte]),
        None => s.to_string(),
    }
}

/// Characters of `current` past the first `printed` characters
pub fn unprinted_suffix(current: &str, printed: usize) -> &str {
    match current.char_indices().nth(printed) {
        Some((byte, _)) => &current[byte..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("कानुन ऐन", 5), "कानुन...");
    }

    #[test]
    fn test_unprinted_suffix() {
        assert_eq!(unprinted_suffix("Hello, world", 7), "world");
        assert_eq!(unprinted_suffix("Hello", 5), "");
        assert_eq!(unprinted_suffix("Hello", 9), "");
        assert_eq!(unprinted_suffix("नमस्ते", 2), "स्ते");
    }
}
