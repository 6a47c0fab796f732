//! legal-advisor - ask questions about the laws of Nepal from the terminal

mod auth;
mod commands;
mod config;
mod locale;
mod render;
mod store;
mod utils;

use advisor_chat::{
    Advisor, AdvisorConfig, AdvisorEvent, AuthProvider, ChatTransport, ConversationStore,
    Credentials, Error as ChatError, HttpTransport, MemoryStore, Notice, ScriptedTransport,
    TurnHandle, TurnOutcome, conversation::default_title,
};
use advisor_wire::ChatClient;
use clap::Parser;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::auth::ProfileAuth;
use crate::commands::{CommandContext, CommandResult};
use crate::config::Config;
use crate::locale::{Language, Locale};
use crate::store::FileStore;

/// legal-advisor - AI legal assistant for Nepalese law
#[derive(Parser, Debug)]
#[command(name = "legal-advisor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model to use (ChatGPT, Gemini Pro, Gemini Flash)
    #[arg(short, long)]
    model: Option<String>,

    /// Interface language (en, ne)
    #[arg(short, long)]
    language: Option<String>,

    /// Use the offline demo backend and in-memory history
    #[arg(long)]
    mock: bool,

    /// Ask a single question and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Open a conversation by ID
    #[arg(long)]
    resume: Option<String>,

    /// Start without reopening the last conversation
    #[arg(long)]
    new: bool,

    /// List conversations and exit
    #[arg(long)]
    list: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Sign in with a display name
    #[arg(long, value_name = "NAME")]
    login: Option<String>,

    /// Email for --login
    #[arg(long, requires = "login")]
    email: Option<String>,

    /// Sign out
    #[arg(long)]
    logout: bool,

    /// Show the signed-in user
    #[arg(long)]
    whoami: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so streamed answers on stdout stay clean
    if args.verbose || std::env::var_os("RUST_LOG").is_some() {
        let filter = if args.verbose {
            EnvFilter::new("legal_advisor=debug,advisor_chat=debug,advisor_wire=debug")
        } else {
            EnvFilter::from_default_env()
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Merge config with CLI args (CLI takes precedence)
    let mut cfg = Config::load();
    if let Some(endpoint) = args.endpoint.clone() {
        cfg.endpoint = endpoint;
    }
    if let Some(ref model) = args.model {
        cfg.model = match commands::find_model(model) {
            Some(known) => known.to_string(),
            None => {
                eprintln!(
                    "Warning: '{}' is not one of {}; sending it as given",
                    model,
                    commands::MODELS.join(", ")
                );
                model.clone()
            }
        };
    }
    if let Some(ref language) = args.language {
        match Language::parse(language) {
            Some(language) => cfg.language = language,
            None => eprintln!("Warning: unknown language '{}', using {}", language, cfg.language.code()),
        }
    }
    cfg.mock |= args.mock;

    let locale = Locale::new(cfg.language);
    let auth = Arc::new(ProfileAuth::open(Config::config_dir().join("profile.json")));

    if let Some(name) = args.login.clone() {
        return handle_login(&auth, name, args.email.clone(), &locale).await;
    }
    if args.logout {
        auth.sign_out().await?;
        println!("{}", locale.t("auth.signed_out"));
        return Ok(());
    }
    if args.whoami {
        match auth.current_user() {
            Some(user) => println!(
                "{}",
                locale.t_with("auth.whoami", &[("name", user.label()), ("uid", user.uid.as_str())])
            ),
            None => println!("{}", locale.t("auth.anonymous")),
        }
        return Ok(());
    }

    let Some(user) = auth.current_user() else {
        eprintln!("{}", locale.t("auth.required"));
        std::process::exit(1);
    };

    let file_store = (!cfg.mock).then(|| Arc::new(FileStore::new(Config::data_dir())));
    let store: Arc<dyn ConversationStore> = match &file_store {
        Some(fs) => fs.clone(),
        None => Arc::new(MemoryStore::new()),
    };
    let transport: Arc<dyn ChatTransport> = if cfg.mock {
        Arc::new(ScriptedTransport::new())
    } else {
        let client = ChatClient::new(cfg.endpoint.clone())?.with_shape(cfg.request_shape);
        Arc::new(HttpTransport::new(client).with_retry_config(cfg.retry.to_retry_config()))
    };

    let advisor = Arc::new(Advisor::new(
        AdvisorConfig {
            model: cfg.model.clone(),
            suggest_titles: cfg.suggest_titles,
        },
        auth.clone(),
        store,
        transport,
    ));

    let preferred = match (&args.resume, &file_store) {
        (Some(id), _) => Some(id.clone()),
        (None, Some(fs)) if !args.new => fs.last_active(&user.uid).await,
        _ => None,
    };
    // Nobody is subscribed yet, so a load failure is printed here
    let loaded = advisor.load(preferred.as_deref()).await;

    if args.list {
        match render::list_report(&loaded, &advisor.conversations(), &locale) {
            Ok(text) => println!("{}", text),
            Err(text) => {
                eprintln!("{}", text);
                std::process::exit(1);
            }
        }
        return Ok(());
    }
    if let Err(e) = &loaded {
        tracing::debug!(error = %e, "continuing without history");
        eprintln!("{}", locale.t(Notice::LoadFailed.key()));
    }

    let locale = Arc::new(Mutex::new(locale));
    let (turn_done_tx, turn_done_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(
        advisor.subscribe(),
        Arc::clone(&locale),
        turn_done_tx,
    ));

    let mut session = Session {
        advisor,
        locale,
        config: cfg,
        file_store,
        uid: user.uid.clone(),
        turn_done: turn_done_rx,
    };

    let result = match args.command {
        Some(question) => session.run_command(&question).await,
        None => {
            spawn_interrupt_handler(session.advisor.handle());
            let _sync = session.advisor.spawn_auth_sync();
            session.run_interactive(&user).await
        }
    };

    printer.abort();
    result
}

async fn handle_login(
    auth: &ProfileAuth,
    name: String,
    email: Option<String>,
    locale: &Locale,
) -> anyhow::Result<()> {
    let mut credentials = Credentials::new(name);
    if let Some(email) = email {
        credentials = credentials.with_email(email);
    }
    match auth.sign_in(credentials).await {
        Ok(user) => {
            println!("{}", locale.t_with("app.signed_in_as", &[("name", user.label())]));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", locale.t_with("cmd.error", &[("error", e.to_string().as_str())]));
            std::process::exit(1);
        }
    }
}

/// Ctrl-C stops a running response; at the prompt it exits
fn spawn_interrupt_handler(handle: TurnHandle) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if handle.is_running() {
                handle.abort();
            } else {
                println!();
                std::process::exit(130);
            }
        }
    });
}

/// Print streamed steps, answer text and notices as they arrive
async fn print_events(
    mut receiver: tokio::sync::broadcast::Receiver<AdvisorEvent>,
    locale: Arc<Mutex<Locale>>,
    turn_done: mpsc::UnboundedSender<()>,
) {
    // step name -> whether its finished line has been printed
    let mut printed_steps: HashMap<String, bool> = HashMap::new();
    let mut answer: Option<(String, usize)> = None;

    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "event printer lagged");
                continue;
            }
            Err(_) => break,
        };
        let locale = *locale.lock();

        match event {
            AdvisorEvent::TurnStart { .. } => {
                printed_steps.clear();
                answer = None;
                println!("{}", locale.t("chat.thinking"));
            }
            AdvisorEvent::StepsUpdated { steps, .. } => {
                for step in &steps {
                    let done = step.is_done();
                    match printed_steps.get(&step.step) {
                        Some(true) => {}
                        Some(false) if !done => {}
                        _ => {
                            println!("  {}", render::step_line(step));
                            printed_steps.insert(step.step.clone(), done);
                        }
                    }
                }
            }
            AdvisorEvent::AnswerUpdated {
                message_id,
                content,
                ..
            } => {
                let printed = match &answer {
                    Some((id, printed)) if *id == message_id => *printed,
                    _ => {
                        print!("\n{}: ", locale.t("chat.advisor"));
                        0
                    }
                };
                print!("{}", utils::unprinted_suffix(&content, printed));
                io::stdout().flush().ok();
                answer = Some((message_id, content.chars().count()));
            }
            AdvisorEvent::TurnEnd { outcome, .. } => {
                if answer.is_some() {
                    println!();
                }
                if outcome == TurnOutcome::Aborted {
                    println!("{}", locale.t("chat.stopped"));
                }
                let _ = turn_done.send(());
            }
            AdvisorEvent::Notice { notice } => {
                eprintln!("{}", locale.t(notice.key()));
            }
            AdvisorEvent::UserChanged { user: None } => {
                eprintln!("{}", locale.t("auth.signed_out"));
            }
            _ => {}
        }
    }
}

struct Session {
    advisor: Arc<Advisor>,
    locale: Arc<Mutex<Locale>>,
    config: Config,
    file_store: Option<Arc<FileStore>>,
    uid: String,
    turn_done: mpsc::UnboundedReceiver<()>,
}

impl Session {
    fn locale(&self) -> Locale {
        *self.locale.lock()
    }

    /// Ask one question and wait for the printer to finish the turn
    async fn ask(&mut self, question: &str) {
        let starts_conversation = self.advisor.active_id().is_none();
        self.drain_turn_signals();
        let result = self.advisor.send(question).await;
        let sent = result.is_ok();
        self.after_turn(result).await;

        if starts_conversation && sent {
            if let Some(active) = self.advisor.active_conversation() {
                if active.title != default_title(question) {
                    let locale = self.locale();
                    println!("{}", locale.t_with("chat.titled", &[("title", active.title.as_str())]));
                }
            }
        }
    }

    fn drain_turn_signals(&mut self) {
        while self.turn_done.try_recv().is_ok() {}
    }

    /// Wait for the printer to finish a turn, or report why it never started
    async fn after_turn(&mut self, result: advisor_chat::Result<TurnOutcome>) {
        match result {
            Ok(_) => {
                let _ = tokio::time::timeout(Duration::from_secs(1), self.turn_done.recv()).await;
            }
            Err(e) => self.report(&e),
        }
        self.remember_active().await;
    }

    async fn run_command(&mut self, question: &str) -> anyhow::Result<()> {
        println!("> {}", question);
        println!();
        self.ask(question).await;
        Ok(())
    }

    async fn run_interactive(&mut self, user: &advisor_chat::User) -> anyhow::Result<()> {
        let locale = self.locale();
        if std::io::IsTerminal::is_terminal(&io::stderr()) {
            eprintln!("{} ({})", locale.t("app.title"), self.advisor.model());
            eprintln!("{}", locale.t_with("app.signed_in_as", &[("name", user.label())]));
            eprintln!("{}", locale.t("app.tagline"));
            eprintln!("{}", locale.t("app.hint"));
            if let Some(active) = self.advisor.active_conversation() {
                eprintln!("{}", locale.t_with("chat.opened", &[("title", active.title.as_str())]));
            }
            eprintln!();
            if self.advisor.active_id().is_none() {
                println!("{}", render::welcome(&locale));
                println!();
            }
        }

        loop {
            print!("> ");
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                // EOF
                break;
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            let result = {
                let conversations = self.advisor.conversations();
                let active = self.advisor.active_conversation();
                let user = self.advisor.user();
                let model = self.advisor.model();
                let locale = self.locale();
                let ctx = CommandContext {
                    conversations: &conversations,
                    active: active.as_ref(),
                    user: user.as_ref(),
                    model: &model,
                    locale: &locale,
                };
                commands::execute_command(input, &ctx)
            };

            match result {
                Some(CommandResult::Exit) => break,
                Some(result) => self.apply(result).await,
                None => self.ask(input).await,
            }
            println!();
        }

        self.remember_active().await;
        Ok(())
    }

    async fn apply(&mut self, result: CommandResult) {
        let locale = self.locale();
        match result {
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::NewConversation => {
                self.advisor.new_conversation();
                println!("{}", locale.t("chat.new"));
                self.remember_active().await;
            }
            CommandResult::Open(id) => match self.advisor.select(&id) {
                Ok(()) => {
                    if let Some(active) = self.advisor.active_conversation() {
                        println!("{}", locale.t_with("chat.opened", &[("title", active.title.as_str())]));
                        println!();
                        println!("{}", render::history(&active, &chrono::Local::now(), &locale));
                    }
                    self.remember_active().await;
                }
                Err(e) => self.report(&e),
            },
            CommandResult::Rename { id, title } => match self.advisor.rename(&id, &title).await {
                Ok(()) => println!("{}", locale.t_with("chat.renamed", &[("title", title.as_str())])),
                Err(e) => self.report(&e),
            },
            CommandResult::Delete(id) => {
                let title = self
                    .advisor
                    .conversations()
                    .get(&id)
                    .map(|c| c.title.clone())
                    .unwrap_or_default();
                match self.advisor.delete(&id).await {
                    Ok(()) => {
                        println!("{}", locale.t_with("chat.deleted", &[("title", title.as_str())]));
                        self.remember_active().await;
                    }
                    Err(e) => self.report(&e),
                }
            }
            CommandResult::Ask(question) => {
                println!("> {}", question);
                println!();
                self.ask(&question).await;
            }
            CommandResult::Edit { message_id, text } => {
                println!("> {}", text);
                println!();
                self.drain_turn_signals();
                let result = self.advisor.edit(&message_id, &text).await;
                self.after_turn(result).await;
            }
            CommandResult::Regenerate => {
                self.drain_turn_signals();
                let result = self.advisor.regenerate().await;
                self.after_turn(result).await;
            }
            CommandResult::ShowHistory => {
                if let Some(active) = self.advisor.active_conversation() {
                    println!("{}", render::history(&active, &chrono::Local::now(), &locale));
                }
            }
            CommandResult::Rate { message_id, rating } => {
                match self.advisor.rate(&message_id, rating).await {
                    Ok(()) if rating == 0 => println!("{}", locale.t("chat.rating_cleared")),
                    Ok(()) => println!(
                        "{}",
                        locale.t_with("chat.rated", &[("stars", render::stars(rating).as_str())])
                    ),
                    Err(e) => self.report(&e),
                }
            }
            CommandResult::Comment {
                message_id,
                comment,
            } => match self.advisor.comment(&message_id, &comment).await {
                Ok(()) => println!("{}", locale.t("chat.commented")),
                Err(e) => self.report(&e),
            },
            CommandResult::ChangeModel(model) => {
                self.advisor.set_model(model.clone());
                println!("{}", locale.t_with("model.set", &[("model", model.as_str())]));
                self.config.model = model;
                self.persist_config();
            }
            CommandResult::ChangeLanguage(language) => {
                let locale = Locale::new(language);
                *self.locale.lock() = locale;
                println!("{}", locale.t_with("lang.set", &[("language", language.name())]));
                self.config.language = language;
                self.persist_config();
            }
            CommandResult::Unknown(cmd) => {
                println!("{}", locale.t_with("cmd.unknown", &[("command", cmd.as_str())]));
            }
            CommandResult::Exit => {}
        }
    }

    /// Print an advisor error unless the event printer already showed a notice for it
    fn report(&self, error: &ChatError) {
        let locale = self.locale();
        match error {
            ChatError::Store(_) => {}
            ChatError::TurnInProgress => eprintln!("{}", locale.t("cmd.busy")),
            ChatError::NotSignedIn => eprintln!("{}", locale.t("auth.required")),
            ChatError::NoActiveConversation => eprintln!("{}", locale.t("chat.no_active")),
            ChatError::NothingToRegenerate => eprintln!("{}", locale.t("chat.no_question")),
            e => eprintln!("{}", locale.t_with("cmd.error", &[("error", e.to_string().as_str())])),
        }
    }

    async fn remember_active(&self) {
        let Some(store) = &self.file_store else {
            return;
        };
        let active = self.advisor.active_id();
        if let Err(e) = store.set_last_active(&self.uid, active.as_deref()).await {
            tracing::warn!(error = %e, "failed to remember active conversation");
        }
    }

    fn persist_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::warn!(error = %e, "failed to save config");
        }
    }
}
