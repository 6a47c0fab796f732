//! Conversation titles suggested by the model

use advisor_wire::ChatRequest;

/// Longest title kept from a suggestion
pub const SUGGESTED_TITLE_MAX_CHARS: usize = 60;

/// Opening line of every title request
pub const TITLE_PROMPT: &str =
    "Suggest a short, descriptive title for this conversation. Reply with the title only.";

/// Build the request asking for a title for one question and its answer
pub fn title_request(question: &str, answer: &str, model: &str) -> ChatRequest {
    ChatRequest::new(format!(
        "{}\n\nUser: {}\nAssistant: {}",
        TITLE_PROMPT, question, answer
    ))
    .with_model(model)
}

/// The question a title request was built from; `None` for ordinary requests
pub fn title_question(request: &ChatRequest) -> Option<&str> {
    let rest = request.text.strip_prefix(TITLE_PROMPT)?;
    let start = rest.find("User: ")? + "User: ".len();
    let rest = &rest[start..];
    Some(rest.split("\nAssistant: ").next().unwrap_or(rest))
}

/// Reduce a model reply to a usable title.
///
/// Keeps the first non-empty line without markup, quotes, a "Title:" label or a
/// trailing period. `None` when nothing is left.
pub fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = strip_markup(line);
    let line = strip_markup(strip_label(line));
    let line = line.strip_suffix('.').unwrap_or(line).trim_end();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(SUGGESTED_TITLE_MAX_CHARS).collect())
}

fn strip_markup(s: &str) -> &str {
    s.trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '#' | '`' | '“' | '”') || c.is_whitespace())
}

fn strip_label(s: &str) -> &str {
    match s.get(..6) {
        Some(label) if label.eq_ignore_ascii_case("title:") => &s[6..],
        _ => s,
    }
}
