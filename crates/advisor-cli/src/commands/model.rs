//! /model command - list and switch models

use super::CommandResult;
use crate::locale::Locale;

/// Models the chat endpoint accepts
pub const MODELS: [&str; 3] = ["ChatGPT", "Gemini Pro", "Gemini Flash"];

pub struct ModelCommand;

impl ModelCommand {
    /// List models if no args, or switch to the matching model
    pub fn execute(args: &str, current: &str, locale: &Locale) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(list_models(current, locale));
        }
        match find_model(args) {
            Some(model) => CommandResult::ChangeModel(model.to_string()),
            None => {
                let models = MODELS.join(", ");
                CommandResult::Message(locale.t_with(
                    "model.unknown",
                    &[("model", args), ("models", models.as_str())],
                ))
            }
        }
    }
}

fn list_models(current: &str, locale: &Locale) -> String {
    let mut output = locale.t_with("model.current", &[("model", current)]);
    output.push('\n');
    for model in MODELS {
        let marker = if model == current { " *" } else { "" };
        output.push_str(&format!("\n  {}{}", model, marker));
    }
    output.push_str("\n\nSwitch with: /model <name>");
    output
}

/// Exact (case-insensitive) match first, then the first partial match
pub fn find_model(query: &str) -> Option<&'static str> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return None;
    }

    if let Some(model) = MODELS.iter().find(|m| m.to_lowercase() == query_lower) {
        return Some(*model);
    }

    MODELS
        .iter()
        .find(|m| m.to_lowercase().contains(&query_lower))
        .copied()
}
