//! /lang command

use super::CommandResult;
use crate::locale::{Language, Locale};

pub struct LanguageCommand;

impl LanguageCommand {
    pub fn execute(args: &str, locale: &Locale) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(
                locale.t_with("lang.current", &[("language", locale.language().name())]),
            );
        }
        match Language::parse(args) {
            Some(language) => CommandResult::ChangeLanguage(language),
            None => CommandResult::Message(locale.t_with("lang.unknown", &[("language", args)])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_switch() {
        let en = Locale::new(Language::English);
        assert_eq!(
            LanguageCommand::execute("", &en),
            CommandResult::Message("Language: English".into())
        );
        assert_eq!(
            LanguageCommand::execute("ne", &en),
            CommandResult::ChangeLanguage(Language::Nepali)
        );
        assert_eq!(
            LanguageCommand::execute("", &Locale::new(Language::Nepali)),
            CommandResult::Message("भाषा: नेपाली".into())
        );
    }

    #[test]
    fn test_unknown_language() {
        let ne = Locale::new(Language::Nepali);
        // no Nepali text for this key, English is used
        assert_eq!(
            LanguageCommand::execute("fr", &ne),
            CommandResult::Message("Unknown language 'fr'. Use en or ne.".into())
        );
    }
}
