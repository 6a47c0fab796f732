//! /rate and /comment

use super::{CommandContext, CommandResult, usage};
use advisor_chat::{Message, conversation::MAX_RATING};

pub struct FeedbackCommand;

impl FeedbackCommand {
    /// `/rate <stars> [n]`: rate the n-th answer (default: the last).
    /// Giving an answer the stars it already has clears the rating.
    pub fn rate(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let mut parts = args.split_whitespace();
        let Some(stars) = parts.next().and_then(|s| s.parse::<u8>().ok()) else {
            return rate_usage(ctx);
        };
        if stars > MAX_RATING {
            return rate_usage(ctx);
        }
        let index = match parts.next() {
            Some(n) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Some(n),
                _ => return rate_usage(ctx),
            },
            None => None,
        };

        let message = match answer(ctx, index) {
            Ok(message) => message,
            Err(result) => return result,
        };
        let rating = if message.rating == stars { 0 } else { stars };
        CommandResult::Rate {
            message_id: message.id.clone(),
            rating,
        }
    }

    /// `/comment <text>` on the last answer
    pub fn comment(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        if args.is_empty() {
            return usage("/comment <text>", ctx.locale);
        }
        match answer(ctx, None) {
            Ok(message) => CommandResult::Comment {
                message_id: message.id.clone(),
                comment: args.to_string(),
            },
            Err(result) => result,
        }
    }
}

/// The n-th (1-based) assistant message of the active conversation, or the last
fn answer<'a>(
    ctx: &CommandContext<'a>,
    index: Option<usize>,
) -> Result<&'a Message, CommandResult> {
    let conversation = ctx
        .active
        .ok_or_else(|| CommandResult::Message(ctx.locale.t("chat.no_active")))?;
    let mut answers = conversation.messages.iter().filter(|m| m.is_assistant());
    let found = match index {
        Some(n) => answers.nth(n - 1),
        None => answers.last(),
    };
    found.ok_or_else(|| CommandResult::Message(ctx.locale.t("chat.no_answer")))
}

fn rate_usage(ctx: &CommandContext<'_>) -> CommandResult {
    usage(&format!("/rate <0-{}> [n]", MAX_RATING), ctx.locale)
}
