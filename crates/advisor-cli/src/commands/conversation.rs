//! /list, /open, /rename, /delete, /history

use super::{CommandContext, CommandResult, usage};
use crate::render;
use advisor_chat::{Conversation, ConversationList};

pub struct ConversationCommand;

impl ConversationCommand {
    /// List all conversations, or those whose title contains `args`
    pub fn list(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let locale = ctx.locale;
        if ctx.conversations.is_empty() {
            return CommandResult::Message(locale.t("list.empty"));
        }

        let active_id = ctx.active.map(|c| c.id.as_str());
        let body = if args.is_empty() {
            render::conversation_list(ctx.conversations.iter().enumerate(), active_id)
        } else {
            let matches = ctx.conversations.search(args);
            if matches.is_empty() {
                return CommandResult::Message(locale.t_with("list.no_match", &[("term", args)]));
            }
            let entries = matches
                .iter()
                .filter_map(|c| ctx.conversations.position(&c.id).map(|i| (i, c)));
            render::conversation_list(entries, active_id)
        };
        CommandResult::Message(format!("{}\n{}", locale.t("list.header"), body))
    }

    pub fn open(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        if args.is_empty() {
            return usage("/open <n|id>", ctx.locale);
        }
        match resolve_target(args, ctx.conversations) {
            Some(c) => CommandResult::Open(c.id.clone()),
            None => not_found(args, ctx),
        }
    }

    pub fn rename(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        let (target, title) = match args.split_once(' ') {
            Some((target, title)) if !title.trim().is_empty() => (target, title.trim()),
            _ => return usage("/rename <n|id> <title>", ctx.locale),
        };
        match resolve_target(target, ctx.conversations) {
            Some(c) => CommandResult::Rename {
                id: c.id.clone(),
                title: title.to_string(),
            },
            None => not_found(target, ctx),
        }
    }

    pub fn delete(args: &str, ctx: &CommandContext<'_>) -> CommandResult {
        if args.is_empty() {
            return usage("/delete <n|id>", ctx.locale);
        }
        match resolve_target(args, ctx.conversations) {
            Some(c) => CommandResult::Delete(c.id.clone()),
            None => not_found(args, ctx),
        }
    }

    pub fn history(ctx: &CommandContext<'_>) -> CommandResult {
        match ctx.active {
            Some(_) => CommandResult::ShowHistory,
            None => CommandResult::Message(ctx.locale.t("chat.no_active")),
        }
    }
}

/// Find a conversation by 1-based list position or by id
pub fn resolve_target<'a>(target: &str, conversations: &'a ConversationList) -> Option<&'a Conversation> {
    let target = target.trim();
    if let Ok(n) = target.parse::<usize>() {
        if n >= 1 {
            if let Some(c) = conversations.as_slice().get(n - 1) {
                return Some(c);
            }
        }
    }
    conversations.get(target)
}

fn not_found(target: &str, ctx: &CommandContext<'_>) -> CommandResult {
    CommandResult::Message(ctx.locale.t_with("cmd.not_found", &[("target", target)]))
}
