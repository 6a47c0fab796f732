//! Slash commands for interactive mode

mod conversation;
mod feedback;
mod language;
mod model;
mod revise;
mod suggest;

pub use conversation::ConversationCommand;
pub use feedback::FeedbackCommand;
pub use language::LanguageCommand;
pub use model::{MODELS, ModelCommand, find_model};
pub use revise::ReviseCommand;
pub use suggest::SuggestCommand;

use advisor_chat::{Conversation, ConversationList, User};

use crate::locale::{Language, Locale};

/// What a command sees of the advisor
pub struct CommandContext<'a> {
    pub conversations: &'a ConversationList,
    pub active: Option<&'a Conversation>,
    pub user: Option<&'a User>,
    pub model: &'a str,
    pub locale: &'a Locale,
}

/// Result of executing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Show a message to the user
    Message(String),
    /// Clear the active selection
    NewConversation,
    /// Select a conversation by id
    Open(String),
    Rename { id: String, title: String },
    Delete(String),
    /// Print the active conversation
    ShowHistory,
    /// Send a question as if it had been typed
    Ask(String),
    /// Replace a question and ask again
    Edit { message_id: String, text: String },
    /// Answer the last question again
    Regenerate,
    /// Set (or with 0 clear) the rating of an assistant message
    Rate { message_id: String, rating: u8 },
    Comment { message_id: String, comment: String },
    ChangeModel(String),
    ChangeLanguage(Language),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, ctx: &CommandContext<'_>) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(ctx.locale.t("help.text")),

        "new" | "n" => CommandResult::NewConversation,

        "list" | "ls" | "l" => ConversationCommand::list(args, ctx),

        "open" | "o" => ConversationCommand::open(args, ctx),

        "rename" => ConversationCommand::rename(args, ctx),

        "delete" | "rm" => ConversationCommand::delete(args, ctx),

        "history" | "hist" => ConversationCommand::history(ctx),

        "edit" | "e" => ReviseCommand::edit(args, ctx),

        "regenerate" | "regen" => ReviseCommand::regenerate(ctx),

        "suggest" | "s" => SuggestCommand::execute(args, ctx.locale),

        "rate" | "r" => FeedbackCommand::rate(args, ctx),

        "comment" => FeedbackCommand::comment(args, ctx),

        "model" | "m" => ModelCommand::execute(args, ctx.model, ctx.locale),

        "lang" | "language" => LanguageCommand::execute(args, ctx.locale),

        "whoami" => CommandResult::Message(match ctx.user {
            Some(user) => ctx
                .locale
                .t_with("auth.whoami", &[("name", user.label()), ("uid", user.uid.as_str())]),
            None => ctx.locale.t("auth.anonymous"),
        }),

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

/// `Usage: <syntax>` in the interface language
pub(crate) fn usage(syntax: &str, locale: &Locale) -> CommandResult {
    CommandResult::Message(locale.t_with("cmd.usage", &[("usage", syntax)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use advisor_chat::{Conversation, ConversationList, Message};

    pub fn conversations() -> ConversationList {
        let mut rated = Message::assistant_with_id("a2", "Second answer");
        rated.rating = 3;
        ConversationList::new(vec![
            Conversation {
                id: "c-rent".into(),
                title: "Rental agreement".into(),
                messages: vec![
                    Message::user("Can my landlord raise rent?"),
                    Message::assistant_with_id("a1", "First answer"),
                    Message::user("And the deposit?"),
                    rated,
                ],
                created_at: 2,
            },
            Conversation {
                id: "c-labor".into(),
                title: "Labor Act leave".into(),
                messages: vec![Message::user("How much leave do I get?")],
                created_at: 1,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Language;

    fn run(input: &str) -> Option<CommandResult> {
        let conversations = test_support::conversations();
        let locale = Locale::new(Language::English);
        let user = User {
            uid: "u1".into(),
            display_name: "Sita".into(),
            email: None,
        };
        let ctx = CommandContext {
            conversations: &conversations,
            active: conversations.get("c-rent"),
            user: Some(&user),
            model: "Gemini Flash",
            locale: &locale,
        };
        execute_command(input, &ctx)
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(run("What is the Labor Act?"), None);
    }

    #[test]
    fn test_aliases_and_case() {
        assert_eq!(run("/NEW"), Some(CommandResult::NewConversation));
        assert_eq!(run("/q"), Some(CommandResult::Exit));
        assert_eq!(run("  /exit  "), Some(CommandResult::Exit));
        assert!(matches!(run("/help"), Some(CommandResult::Message(m)) if m.contains("/rename")));
        assert_eq!(run("/regen"), Some(CommandResult::Regenerate));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            run("/frobnicate now"),
            Some(CommandResult::Unknown("frobnicate".into()))
        );
    }

    #[test]
    fn test_whoami() {
        assert_eq!(run("/whoami"), Some(CommandResult::Message("Sita (u1)".into())));
    }

    #[test]
    fn test_help_and_usage_follow_language() {
        let conversations = test_support::conversations();
        let locale = Locale::new(Language::Nepali);
        let ctx = CommandContext {
            conversations: &conversations,
            active: None,
            user: None,
            model: "Gemini Flash",
            locale: &locale,
        };
        assert!(matches!(
            execute_command("/help", &ctx),
            Some(CommandResult::Message(m)) if m.starts_with("उपलब्ध आदेशहरू")
        ));
        assert_eq!(
            execute_command("/open", &ctx),
            Some(CommandResult::Message("प्रयोग: /open <n|id>".into()))
        );
    }
}
