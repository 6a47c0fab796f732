//! /edit and /regenerate

use super::{CommandContext, CommandResult, usage};
use advisor_chat::{Message, Role};

pub struct ReviseCommand;

impl ReviseCommand {
    /// `/edit [#n] <text>`: replace the n-th question (default: the last) and ask again
    pub fn edit(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let (index, text) = match args.strip_prefix('#') {
            Some(rest) => match rest.split_once(' ') {
                Some((n, text)) => match n.parse::<usize>() {
                    Ok(n) if n >= 1 => (Some(n), text.trim()),
                    _ => return edit_usage(ctx),
                },
                None => return edit_usage(ctx),
            },
            None => (None, args),
        };
        if text.is_empty() {
            return edit_usage(ctx);
        }

        match question(ctx, index) {
            Ok(message) => CommandResult::Edit {
                message_id: message.id.clone(),
                text: text.to_string(),
            },
            Err(result) => result,
        }
    }

    pub fn regenerate(ctx: &CommandContext<'_>) -> CommandResult {
        match question(ctx, None) {
            Ok(_) => CommandResult::Regenerate,
            Err(result) => result,
        }
    }
}

/// The n-th (1-based) user message of the active conversation, or the last
fn question<'a>(
    ctx: &CommandContext<'a>,
    index: Option<usize>,
) -> Result<&'a Message, CommandResult> {
    let conversation = ctx
        .active
        .ok_or_else(|| CommandResult::Message(ctx.locale.t("chat.no_active")))?;
    let mut questions = conversation.messages.iter().filter(|m| m.role == Role::User);
    let found = match index {
        Some(n) => questions.nth(n - 1),
        None => questions.last(),
    };
    found.ok_or_else(|| CommandResult::Message(ctx.locale.t("chat.no_question")))
}

fn edit_usage(ctx: &CommandContext<'_>) -> CommandResult {
    usage("/edit [#n] <text>", ctx.locale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::conversations;
    use crate::locale::{Language, Locale};
    use advisor_chat::ConversationList;

    fn with_ctx<T>(active: Option<&str>, f: impl FnOnce(&CommandContext<'_>) -> T) -> T {
        let list: ConversationList = conversations();
        let locale = Locale::new(Language::English);
        let ctx = CommandContext {
            conversations: &list,
            active: active.and_then(|id| list.get(id)),
            user: None,
            model: "Gemini Flash",
            locale: &locale,
        };
        f(&ctx)
    }

    fn question_id(list: &ConversationList, n: usize) -> String {
        list.get("c-rent")
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .nth(n)
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn test_edit_last_and_nth_question() {
        let list = conversations();
        with_ctx(Some("c-rent"), |ctx| {
            assert_eq!(
                ReviseCommand::edit("And the security deposit?", ctx),
                CommandResult::Edit {
                    message_id: question_id(&list, 1),
                    text: "And the security deposit?".into()
                }
            );
            assert_eq!(
                ReviseCommand::edit("#1 Can my landlord raise rent twice?", ctx),
                CommandResult::Edit {
                    message_id: question_id(&list, 0),
                    text: "Can my landlord raise rent twice?".into()
                }
            );
        });
    }

    #[test]
    fn test_edit_rejects_bad_input() {
        with_ctx(Some("c-rent"), |ctx| {
            for args in ["", "#", "#0 text", "#x text", "#2"] {
                assert!(
                    matches!(ReviseCommand::edit(args, ctx), CommandResult::Message(m) if m.starts_with("Usage")),
                    "args {:?}",
                    args
                );
            }
            assert_eq!(
                ReviseCommand::edit("#5 text", ctx),
                CommandResult::Message("There is no question to answer again.".into())
            );
        });
    }

    #[test]
    fn test_regenerate_needs_an_open_question() {
        with_ctx(None, |ctx| {
            assert_eq!(
                ReviseCommand::regenerate(ctx),
                CommandResult::Message("No conversation is open.".into())
            );
        });
        with_ctx(Some("c-labor"), |ctx| {
            assert_eq!(ReviseCommand::regenerate(ctx), CommandResult::Regenerate);
        });
    }
}
