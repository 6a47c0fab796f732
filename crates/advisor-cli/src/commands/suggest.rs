//! /suggest

use super::{CommandResult, usage};
use crate::{locale::Locale, render};

pub struct SuggestCommand;

impl SuggestCommand {
    /// List the suggested questions, or ask the n-th one
    pub fn execute(args: &str, locale: &Locale) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(render::suggestions(locale));
        }
        match args.parse::<usize>().ok().and_then(|n| render::suggestion(n, locale)) {
            Some(question) => CommandResult::Ask(question),
            None => usage(&format!("/suggest [1-{}]", render::SUGGESTION_COUNT), locale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Language;

    #[test]
    fn test_list_and_pick() {
        let en = Locale::new(Language::English);
        assert!(matches!(
            SuggestCommand::execute("", &en),
            CommandResult::Message(m) if m.starts_with("  1. Explain the fundamental rights")
        ));
        assert_eq!(
            SuggestCommand::execute("3", &en),
            CommandResult::Ask("How do I register a private limited company?".into())
        );
        assert_eq!(
            SuggestCommand::execute("9", &en),
            CommandResult::Message("Usage: /suggest [1-4]".into())
        );
    }
}
