use once_cell::sync::Lazy;
use regex::Regex;

static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link regex is valid"));

/// Value following `prefix` in a card body, up to end of line. Bold
/// markers and surrounding whitespace are stripped.
pub fn grab(prefix: &str, text: &str) -> Option<String> {
    let (_, rest) = text.split_once(prefix)?;
    let line = rest.lines().next().unwrap_or(rest);
    let value = line.trim().trim_matches(|c| c == '*').trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// First `[label](url)` pair in the text.
pub fn link_parts(text: &str) -> Option<(String, String)> {
    let caps = MD_LINK.captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Char-boundary-safe truncation. Discord rejects labels over their
/// limit outright, so cutting is better than erroring.
pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}

/// Strips one of the known first-line markers from a card, returning
/// the remainder of that line. Markers vary because older cards were
/// posted without the emoji prefix.
pub fn strip_marker<'a>(text: &str, markers: &[&'a str]) -> Option<String> {
    for marker in markers {
        if let Some((_, rest)) = text.split_once(marker) {
            let line = rest.lines().next().unwrap_or(rest);
            let value = line.trim().trim_matches(|c| c == '*').trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
