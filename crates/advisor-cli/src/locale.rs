//! Interface strings in English and Nepali

use serde::{Deserialize, Serialize};

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ne")]
    Nepali,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Nepali => "ne",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Nepali => "नेपाली",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "ne" | "np" | "nepali" | "नेपाली" => Some(Language::Nepali),
            _ => None,
        }
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::English => EN,
            Language::Nepali => NE,
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("app.title", "Legal Advisor"),
    ("app.tagline", "Ask anything about the laws of Nepal."),
    ("app.hint", "Type a question, or /help for commands. Ctrl-C stops a response."),
    ("app.signed_in_as", "Signed in as {name}"),
    ("app.model", "Model: {model}"),
    ("auth.required", "You are not signed in. Run: legal-advisor --login <name> [--email <email>]"),
    ("auth.signed_out", "Signed out."),
    ("auth.whoami", "{name} ({uid})"),
    ("auth.anonymous", "Not signed in."),
    ("chat.you", "You"),
    ("chat.advisor", "Advisor"),
    ("chat.thinking", "Thinking..."),
    ("chat.stopped", "[stopped]"),
    ("chat.new", "Started a new chat. Your next message opens a conversation."),
    ("chat.opened", "Opened \"{title}\""),
    ("chat.renamed", "Renamed to \"{title}\""),
    ("chat.deleted", "Deleted \"{title}\""),
    ("chat.rated", "Rated {stars}"),
    ("chat.rating_cleared", "Rating cleared"),
    ("chat.commented", "Comment saved"),
    ("chat.no_active", "No conversation is open."),
    ("chat.no_answer", "There is no answer to give feedback on yet."),
    ("chat.empty_history", "No messages yet."),
    ("chat.no_question", "There is no question to answer again."),
    ("chat.titled", "Titled \"{title}\""),
    ("welcome.title", "AI-powered legal help for Nepal"),
    ("welcome.subtitle", "Questions about the Constitution, Acts and legal procedures of Nepal."),
    ("welcome.try", "Try one of these with /suggest <n>:"),
    ("welcome.disclaimer", "Answers are general information, not legal advice. Consult a licensed lawyer about your case."),
    ("prompt.1.title", "Explain the fundamental rights in the Constitution of Nepal"),
    ("prompt.1.subtitle", "Constitution of Nepal 2072"),
    ("prompt.2.title", "Draft a simple house rental agreement"),
    ("prompt.2.subtitle", "Legal document drafting"),
    ("prompt.3.title", "How do I register a private limited company?"),
    ("prompt.3.subtitle", "Companies Act 2063"),
    ("prompt.4.title", "Translate a legal notice from English to Nepali"),
    ("prompt.4.subtitle", "Legal translation"),
    ("list.empty", "No conversations yet."),
    ("list.no_match", "No conversations match \"{term}\"."),
    ("list.header", "Conversations:"),
    ("date.today", "Today"),
    ("date.yesterday", "Yesterday"),
    ("model.current", "Current model: {model}"),
    ("model.set", "Model set to {model}"),
    ("model.unknown", "Unknown model '{model}'. Available: {models}"),
    ("lang.current", "Language: {language}"),
    ("lang.set", "Language set to {language}"),
    ("lang.unknown", "Unknown language '{language}'. Use en or ne."),
    ("cmd.unknown", "Unknown command: /{command}\nType /help for available commands."),
    ("cmd.not_found", "No conversation matches '{target}'. Use /list to see them."),
    ("cmd.busy", "Please wait for the current response to finish."),
    ("cmd.error", "Error: {error}"),
    ("cmd.usage", "Usage: {usage}"),
    ("help.text", r#"Available commands:
  /help, /h, /?             Show this help message
  /new, /n                  Start a new conversation
  /list, /ls [term]         List conversations, optionally filtered by title
  /open, /o <n|id>          Open a conversation
  /rename <n|id> <title>    Rename a conversation
  /delete, /rm <n|id>       Delete a conversation
  /history                  Show the messages of the open conversation
  /edit [#n] <text>         Rewrite the last (or n-th) question and ask again
  /regenerate, /regen       Answer the last question again
  /suggest [n]              Show suggested questions, or ask the n-th one
  /rate, /r <0-5> [n]       Rate the last (or n-th) answer; same stars again clears
  /comment <text>           Comment on the last answer
  /model, /m [name]         List models or switch to a model
  /lang [en|ne]             Show or set the interface language
  /whoami                   Show the signed-in user
  /quit, /exit, /q          Exit

Examples:
  /list rent                Conversations with "rent" in the title
  /open 2                   Open the second conversation in the list
  /edit #1 Can my landlord raise rent twice a year?
  /rate 5                   Give the last answer five stars
  /model pro                Switch to Gemini Pro"#),
    ("notice.load_failed", "Could not fetch your conversation history."),
    ("notice.create_failed", "Could not create a new chat. Please try again."),
    ("notice.response_failed", "Failed to get a response. Please try again."),
    ("notice.save_failed", "Failed to save the conversation."),
    ("notice.rename_failed", "Failed to rename conversation."),
    ("notice.delete_failed", "Failed to delete conversation."),
    ("notice.rating_failed", "Failed to save rating."),
    ("notice.comment_failed", "Failed to save comment."),
];

const NE: &[(&str, &str)] = &[
    ("app.title", "कानुनी सल्लाहकार"),
    ("app.tagline", "नेपालको कानुनबारे जे पनि सोध्नुहोस्।"),
    ("app.hint", "प्रश्न लेख्नुहोस्, वा आदेशहरूका लागि /help। जवाफ रोक्न Ctrl-C।"),
    ("app.signed_in_as", "{name} को रूपमा साइन इन"),
    ("app.model", "मोडेल: {model}"),
    ("auth.required", "तपाईं साइन इन हुनुहुन्न। चलाउनुहोस्: legal-advisor --login <name> [--email <email>]"),
    ("auth.signed_out", "साइन आउट भयो।"),
    ("auth.anonymous", "साइन इन गरिएको छैन।"),
    ("chat.you", "तपाईं"),
    ("chat.advisor", "सल्लाहकार"),
    ("chat.thinking", "सोच्दै..."),
    ("chat.stopped", "[रोकियो]"),
    ("chat.new", "नयाँ कुराकानी सुरु भयो। अर्को सन्देशले कुराकानी खोल्नेछ।"),
    ("chat.opened", "\"{title}\" खोलियो"),
    ("chat.renamed", "नाम \"{title}\" राखियो"),
    ("chat.deleted", "\"{title}\" मेटाइयो"),
    ("chat.rated", "मूल्याङ्कन {stars}"),
    ("chat.rating_cleared", "मूल्याङ्कन हटाइयो"),
    ("chat.commented", "टिप्पणी सुरक्षित भयो"),
    ("chat.no_active", "कुनै कुराकानी खुला छैन।"),
    ("chat.no_answer", "प्रतिक्रिया दिनका लागि अझै कुनै जवाफ छैन।"),
    ("chat.empty_history", "अहिलेसम्म कुनै सन्देश छैन।"),
    ("chat.no_question", "फेरि जवाफ दिनका लागि कुनै प्रश्न छैन।"),
    ("chat.titled", "शीर्षक \"{title}\" राखियो"),
    ("welcome.title", "नेपालका लागि एआई कानुनी सहायता"),
    ("welcome.subtitle", "नेपालको संविधान, ऐन र कानुनी प्रक्रियाबारे प्रश्नहरू।"),
    ("welcome.try", "/suggest <n> प्रयोग गरेर यीमध्ये एउटा सोध्नुहोस्:"),
    ("welcome.disclaimer", "जवाफहरू सामान्य जानकारी हुन्, कानुनी सल्लाह होइनन्। आफ्नो मुद्दाका लागि इजाजतप्राप्त वकिलसँग परामर्श गर्नुहोस्।"),
    ("prompt.1.title", "नेपालको संविधानमा रहेका मौलिक हकहरू बुझाउनुहोस्"),
    ("prompt.1.subtitle", "नेपालको संविधान २०७२"),
    ("prompt.2.title", "एउटा साधारण घर भाडा सम्झौता तयार गर्नुहोस्"),
    ("prompt.2.subtitle", "कानुनी कागजात मस्यौदा"),
    ("prompt.3.title", "प्राइभेट लिमिटेड कम्पनी कसरी दर्ता गर्ने?"),
    ("prompt.3.subtitle", "कम्पनी ऐन २०६३"),
    ("prompt.4.title", "अङ्ग्रेजीबाट नेपालीमा कानुनी सूचना अनुवाद गर्नुहोस्"),
    ("prompt.4.subtitle", "कानुनी अनुवाद"),
    ("list.empty", "अहिलेसम्म कुनै कुराकानी छैन।"),
    ("list.no_match", "\"{term}\" सँग मिल्ने कुनै कुराकानी छैन।"),
    ("list.header", "कुराकानीहरू:"),
    ("date.today", "आज"),
    ("date.yesterday", "हिजो"),
    ("model.current", "हालको मोडेल: {model}"),
    ("model.set", "मोडेल {model} मा सेट भयो"),
    ("lang.current", "भाषा: {language}"),
    ("lang.set", "भाषा {language} मा सेट भयो"),
    ("cmd.unknown", "अज्ञात आदेश: /{command}\nउपलब्ध आदेशहरूका लागि /help लेख्नुहोस्।"),
    ("cmd.busy", "कृपया हालको जवाफ सकिन पर्खनुहोस्।"),
    ("cmd.error", "त्रुटि: {error}"),
    ("cmd.usage", "प्रयोग: {usage}"),
    ("help.text", r#"उपलब्ध आदेशहरू:
  /help, /h, /?             यो सहायता देखाउनुहोस्
  /new, /n                  नयाँ कुराकानी सुरु गर्नुहोस्
  /list, /ls [शब्द]          कुराकानीहरूको सूची, शीर्षकले छान्न सकिन्छ
  /open, /o <n|id>          कुराकानी खोल्नुहोस्
  /rename <n|id> <शीर्षक>    कुराकानीको नाम बदल्नुहोस्
  /delete, /rm <n|id>       कुराकानी मेटाउनुहोस्
  /history                  खुला कुराकानीका सन्देशहरू देखाउनुहोस्
  /edit [#n] <पाठ>           अन्तिम (वा n औं) प्रश्न बदलेर फेरि सोध्नुहोस्
  /regenerate, /regen       अन्तिम प्रश्नको फेरि जवाफ लिनुहोस्
  /suggest [n]              सुझाव गरिएका प्रश्नहरू, वा n औं प्रश्न सोध्नुहोस्
  /rate, /r <0-5> [n]       अन्तिम (वा n औं) जवाफको मूल्याङ्कन; उही तारा फेरि दिँदा हट्छ
  /comment <पाठ>            अन्तिम जवाफमा टिप्पणी
  /model, /m [नाम]          मोडेलहरू हेर्नुहोस् वा बदल्नुहोस्
  /lang [en|ne]             इन्टरफेसको भाषा हेर्नुहोस् वा बदल्नुहोस्
  /whoami                   साइन इन गरिएको प्रयोगकर्ता
  /quit, /exit, /q          बाहिर निस्कनुहोस्"#),
    ("notice.load_failed", "तपाईंको कुराकानी इतिहास ल्याउन सकिएन।"),
    ("notice.create_failed", "नयाँ कुराकानी बनाउन सकिएन। फेरि प्रयास गर्नुहोस्।"),
    ("notice.response_failed", "जवाफ प्राप्त गर्न असफल। फेरि प्रयास गर्नुहोस्।"),
    ("notice.save_failed", "कुराकानी सुरक्षित गर्न असफल।"),
    ("notice.rename_failed", "कुराकानीको नाम परिवर्तन गर्न असफल।"),
    ("notice.delete_failed", "कुराकानी मेटाउन असफल।"),
    ("notice.rating_failed", "मूल्याङ्कन सुरक्षित गर्न असफल।"),
    ("notice.comment_failed", "टिप्पणी सुरक्षित गर्न असफल।"),
];

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_NE: [&str; 12] = [
    "जनवरी", "फेब्रुअरी", "मार्च", "अप्रिल", "मे", "जुन", "जुलाई", "अगस्ट", "सेप्टेम्बर",
    "अक्टोबर", "नोभेम्बर", "डिसेम्बर",
];

/// String lookup for one language
#[derive(Debug, Clone, Copy, Default)]
pub struct Locale {
    language: Language,
}

impl Locale {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Look up `key`, falling back to English and then to the key itself
    pub fn t(&self, key: &str) -> String {
        lookup(self.language.table(), key)
            .or_else(|| lookup(EN, key))
            .unwrap_or(key)
            .to_string()
    }

    /// Look up `key` and replace each `{name}` placeholder
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .fold(self.t(key), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }

    /// Month name, 1-based
    pub fn month(&self, month: u32) -> &'static str {
        let names = match self.language {
            Language::English => &MONTHS_EN,
            Language::Nepali => &MONTHS_NE,
        };
        names[(month.clamp(1, 12) - 1) as usize]
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_fallbacks() {
        let en = Locale::new(Language::English);
        let ne = Locale::new(Language::Nepali);

        assert_eq!(en.t("date.today"), "Today");
        assert_eq!(ne.t("date.today"), "आज");
        // missing in Nepali table, present in English
        assert_eq!(ne.t("auth.whoami"), en.t("auth.whoami"));
        // missing everywhere
        assert_eq!(ne.t("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_placeholders() {
        let en = Locale::new(Language::English);
        assert_eq!(
            en.t_with("model.set", &[("model", "Gemini Pro")]),
            "Model set to Gemini Pro"
        );
        assert_eq!(
            en.t_with("auth.whoami", &[("name", "Sita"), ("uid", "u1")]),
            "Sita (u1)"
        );
        // unknown params are ignored, unmatched placeholders stay
        assert_eq!(en.t_with("model.set", &[("x", "y")]), "Model set to {model}");
    }

    #[test]
    fn test_every_notice_has_english_text() {
        use advisor_chat::Notice;
        let en = Locale::new(Language::English);
        for notice in [
            Notice::LoadFailed,
            Notice::CreateFailed,
            Notice::ResponseFailed,
            Notice::SaveFailed,
            Notice::RenameFailed,
            Notice::DeleteFailed,
            Notice::RatingFailed,
            Notice::CommentFailed,
        ] {
            assert_ne!(en.t(notice.key()), notice.key());
        }
    }

    #[test]
    fn test_nepali_covers_help_and_suggestions() {
        let ne = Locale::new(Language::Nepali);
        for key in ["help.text", "cmd.usage", "welcome.title", "prompt.4.title"] {
            assert!(lookup(NE, key).is_some(), "missing Nepali text for {}", key);
        }
        assert!(ne.t("help.text").contains("/regenerate"));
    }

    #[test]
    fn test_language_parse_and_serde() {
        assert_eq!(Language::parse("NE"), Some(Language::Nepali));
        assert_eq!(Language::parse("english"), Some(Language::English));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(serde_json::to_string(&Language::Nepali).unwrap(), "\"ne\"");
    }

    #[test]
    fn test_months() {
        let en = Locale::new(Language::English);
        assert_eq!(en.month(1), "January");
        assert_eq!(en.month(12), "December");
        assert_eq!(Locale::new(Language::Nepali).month(3), "मार्च");
    }
}
