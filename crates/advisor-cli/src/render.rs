//! Plain-text rendering of conversations, steps and lists

use advisor_chat::{
    Conversation, ConversationList, Message, Notice, Role, ThinkingStep, conversation::MAX_RATING,
};
use chrono::{DateTime, Datelike, TimeZone};

use crate::{locale::Locale, utils::truncate_chars};

/// Date separator label: "Today", "Yesterday", else "Month D, YYYY"
pub fn date_label<Tz: TimeZone>(timestamp_ms: i64, now: &DateTime<Tz>, locale: &Locale) -> String {
    let Some(when) = now.timezone().timestamp_millis_opt(timestamp_ms).single() else {
        return String::new();
    };
    let day = when.date_naive();
    let today = now.date_naive();

    if day == today {
        locale.t("date.today")
    } else if today.pred_opt() == Some(day) {
        locale.t("date.yesterday")
    } else {
        format!("{} {}, {}", locale.month(day.month()), day.day(), day.year())
    }
}

/// One thinking step: `<emoji> <message> (<duration>)`
pub fn step_line(step: &ThinkingStep) -> String {
    let mut line = if step.icon.emoji.is_empty() {
        step.message.clone()
    } else {
        format!("{} {}", step.icon.emoji, step.message)
    };
    if let Some(duration) = &step.duration {
        line.push_str(&format!(" ({})", duration));
    }
    line
}

/// Star rating, e.g. `★★★☆☆`
pub fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Numbered conversation list; numbers are positions in the full list and the
/// active conversation is marked with `*`
pub fn conversation_list<'a>(
    entries: impl IntoIterator<Item = (usize, &'a Conversation)>,
    active_id: Option<&str>,
) -> String {
    entries
        .into_iter()
        .map(|(i, c)| {
            let marker = if Some(c.id.as_str()) == active_id { "*" } else { " " };
            format!(
                "{}{:>3}. {}  ({})",
                marker,
                i + 1,
                truncate_chars(&c.title, 50),
                c.messages.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Output of `--list`: the numbered list, or the load failure notice
pub fn list_report(
    loaded: &advisor_chat::Result<()>,
    conversations: &ConversationList,
    locale: &Locale,
) -> Result<String, String> {
    if loaded.is_err() {
        return Err(locale.t(Notice::LoadFailed.key()));
    }
    if conversations.is_empty() {
        Ok(locale.t("list.empty"))
    } else {
        Ok(conversation_list(conversations.iter().enumerate(), None))
    }
}

/// Number of suggested questions in the catalogue
pub const SUGGESTION_COUNT: usize = 4;

/// The n-th (1-based) suggested question
pub fn suggestion(n: usize, locale: &Locale) -> Option<String> {
    (1..=SUGGESTION_COUNT)
        .contains(&n)
        .then(|| locale.t(&format!("prompt.{}.title", n)))
}

/// Numbered suggested questions with their topics
pub fn suggestions(locale: &Locale) -> String {
    (1..=SUGGESTION_COUNT)
        .map(|n| {
            format!(
                "  {}. {}\n     {}",
                n,
                locale.t(&format!("prompt.{}.title", n)),
                locale.t(&format!("prompt.{}.subtitle", n))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Greeting shown when no conversation is open
pub fn welcome(locale: &Locale) -> String {
    format!(
        "{}\n{}\n\n{}\n{}\n\n{}",
        locale.t("welcome.title"),
        locale.t("welcome.subtitle"),
        locale.t("welcome.try"),
        suggestions(locale),
        locale.t("welcome.disclaimer")
    )
}

fn message_block(message: &Message, locale: &Locale) -> String {
    let who = match message.role {
        Role::User => locale.t("chat.you"),
        Role::Assistant => locale.t("chat.advisor"),
    };
    let mut block = format!("{}: {}", who, message.content);
    if message.is_assistant() && message.rating > 0 {
        block.push_str(&format!("\n  {}", stars(message.rating)));
    }
    if !message.comment.is_empty() {
        block.push_str(&format!("\n  \"{}\"", message.comment));
    }
    block
}

/// Full message history with a date separator whenever the day changes
pub fn history<Tz: TimeZone>(conversation: &Conversation, now: &DateTime<Tz>, locale: &Locale) -> String {
    if conversation.messages.is_empty() {
        return locale.t("chat.empty_history");
    }

    let mut out = Vec::new();
    let mut last_label: Option<String> = None;
    for message in &conversation.messages {
        let label = date_label(message.created_at, now, locale);
        if last_label.as_deref() != Some(label.as_str()) {
            out.push(format!("── {} ──", label));
            last_label = Some(label);
        }
        out.push(message_block(message, locale));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Language;
    use advisor_wire::{StepIcon, StepStatus};
    use chrono::Utc;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn message(role: Role, content: &str, when: DateTime<Utc>) -> Message {
        let base = match role {
            Role::User => Message::user(content),
            Role::Assistant => Message::assistant(content),
        };
        Message {
            created_at: when.timestamp_millis(),
            ..base
        }
    }

    #[test]
    fn test_date_labels() {
        let en = Locale::new(Language::English);
        let now = at(2024, 3, 10, 15);

        assert_eq!(date_label(at(2024, 3, 10, 1).timestamp_millis(), &now, &en), "Today");
        assert_eq!(date_label(at(2024, 3, 9, 23).timestamp_millis(), &now, &en), "Yesterday");
        assert_eq!(
            date_label(at(2024, 1, 5, 12).timestamp_millis(), &now, &en),
            "January 5, 2024"
        );

        let ne = Locale::new(Language::Nepali);
        assert_eq!(date_label(at(2024, 3, 9, 8).timestamp_millis(), &now, &ne), "हिजो");
        assert_eq!(
            date_label(at(2023, 12, 25, 8).timestamp_millis(), &now, &ne),
            "डिसेम्बर 25, 2023"
        );
    }

    #[test]
    fn test_step_line() {
        let mut step = ThinkingStep {
            step: "Searching".into(),
            status: StepStatus::Processing,
            message: "Searching legal sources".into(),
            icon: StepIcon::new("🔎"),
            start_time: Some(0),
            duration: None,
        };
        assert_eq!(step_line(&step), "🔎 Searching legal sources");

        step.status = StepStatus::Result;
        step.duration = Some("1.25s".into());
        assert_eq!(step_line(&step), "🔎 Searching legal sources (1.25s)");

        step.icon = StepIcon::default();
        assert_eq!(step_line(&step), "Searching legal sources (1.25s)");
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(9), "★★★★★");
    }

    #[test]
    fn test_history_separators() {
        let en = Locale::new(Language::English);
        let now = at(2024, 3, 10, 15);
        let mut rated = message(Role::Assistant, "Hi there", at(2024, 3, 9, 10));
        rated.rating = 4;
        rated.comment = "Helpful".into();

        let conversation = Conversation {
            id: "c1".into(),
            title: "Hello".into(),
            messages: vec![
                message(Role::User, "Hello", at(2024, 3, 9, 10)),
                rated,
                message(Role::User, "Thanks", at(2024, 3, 10, 9)),
            ],
            created_at: 0,
        };

        let text = history(&conversation, &now, &en);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "── Yesterday ──",
                "You: Hello",
                "Advisor: Hi there",
                "  ★★★★☆",
                "  \"Helpful\"",
                "── Today ──",
                "You: Thanks",
            ]
        );
    }

    #[test]
    fn test_conversation_list_marks_active() {
        let conversations = vec![
            Conversation {
                id: "a".into(),
                title: "Rental agreement".into(),
                messages: vec![],
                created_at: 2,
            },
            Conversation {
                id: "b".into(),
                title: "Labor Act".into(),
                messages: vec![],
                created_at: 1,
            },
        ];
        let text = conversation_list(conversations.iter().enumerate(), Some("b"));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "   1. Rental agreement  (0)");
        assert_eq!(lines[1], "*  2. Labor Act  (0)");
    }

    #[test]
    fn test_list_report_surfaces_load_failure() {
        let en = Locale::new(Language::English);
        let empty = ConversationList::default();

        let failed = Err(advisor_chat::Error::store("disk unavailable"));
        assert_eq!(
            list_report(&failed, &empty, &en),
            Err("Could not fetch your conversation history.".to_string())
        );
        assert_eq!(list_report(&Ok(()), &empty, &en), Ok("No conversations yet.".to_string()));
    }

    #[test]
    fn test_welcome_lists_suggestions() {
        let en = Locale::new(Language::English);
        let text = welcome(&en);
        assert!(text.starts_with("AI-powered legal help for Nepal"));
        assert!(text.contains("  3. How do I register a private limited company?\n     Companies Act 2063"));
        assert!(text.ends_with("Consult a licensed lawyer about your case."));

        assert_eq!(
            suggestion(2, &Locale::new(Language::Nepali)).as_deref(),
            Some("एउटा साधारण घर भाडा सम्झौता तयार गर्नुहोस्")
        );
        assert_eq!(suggestion(0, &en), None);
        assert_eq!(suggestion(SUGGESTION_COUNT + 1, &en), None);
    }
}
