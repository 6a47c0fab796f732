//! Advisor state management and turn execution

use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use advisor_wire::{ChatRequest, WireEvent};

use crate::{
    answer::upsert_answer,
    auth::{AuthProvider, User},
    conversation::{Conversation, ConversationList, MAX_RATING, Message, Role, now_millis},
    error::{Error, Result},
    events::{AdvisorEvent, Notice},
    handle::TurnHandle,
    steps::ThinkingStep,
    store::{ConversationStore, ScopedStore},
    title::{clean_title, title_request},
    transport::ChatTransport,
    turn::{Turn, TurnOutcome, TurnPhase, TurnUpdate},
};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "Gemini Flash";

/// Advisor configuration
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Model name sent with every request
    pub model: String,
    /// Ask the model for a title after the first answer of a new conversation
    pub suggest_titles: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            suggest_titles: true,
        }
    }
}

/// What a turn sends
#[derive(Debug, Clone, Copy)]
enum Prompt<'a> {
    /// A new question for the active conversation, or for a new one
    Ask(&'a str),
    /// Replace a user message, dropping everything after it
    Edit { message_id: &'a str, text: &'a str },
    /// Answer the last user message again
    Regenerate,
}

/// Releases the turn when `start_turn` returns or its future is dropped
struct TurnGuard<'a> {
    advisor: &'a Advisor,
    cancel: CancellationToken,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.cancel.cancel();
        {
            let mut state = self.advisor.state.lock();
            state.streaming_id = None;
            state.thinking_steps.clear();
            if state.phase != TurnPhase::Idle && !state.phase.is_terminal() {
                state.phase = TurnPhase::Aborted;
            }
        }
        self.advisor.handle.finish();
    }
}

#[derive(Debug, Default)]
struct ChatState {
    user: Option<User>,
    conversations: ConversationList,
    active_id: Option<String>,
    thinking_steps: Vec<ThinkingStep>,
    phase: TurnPhase,
    /// Conversation the in-flight turn writes to
    streaming_id: Option<String>,
    model: String,
}

/// Orchestrates conversations, turns and the store for one signed-in user
pub struct Advisor {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn ConversationStore>,
    transport: Arc<dyn ChatTransport>,
    state: Mutex<ChatState>,
    event_tx: broadcast::Sender<AdvisorEvent>,
    handle: TurnHandle,
    suggest_titles: bool,
}

impl Advisor {
    /// Create an advisor; the current user is taken from `auth`
    pub fn new(
        config: AdvisorConfig,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn ConversationStore>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        let state = ChatState {
            user: auth.current_user(),
            model: config.model,
            ..ChatState::default()
        };
        Self {
            auth,
            store,
            transport,
            state: Mutex::new(state),
            event_tx,
            handle: TurnHandle::new(),
            suggest_titles: config.suggest_titles,
        }
    }

    /// Subscribe to advisor events
    pub fn subscribe(&self) -> broadcast::Receiver<AdvisorEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for stopping turns from outside
    pub fn handle(&self) -> TurnHandle {
        self.handle.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.lock().user.clone()
    }

    /// Snapshot of the conversation list, newest first
    pub fn conversations(&self) -> ConversationList {
        self.state.lock().conversations.clone()
    }

    pub fn active_id(&self) -> Option<String> {
        self.state.lock().active_id.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        let state = self.state.lock();
        state
            .active_id
            .as_deref()
            .and_then(|id| state.conversations.get(id))
            .cloned()
    }

    pub fn thinking_steps(&self) -> Vec<ThinkingStep> {
        self.state.lock().thinking_steps.clone()
    }

    /// Phase of the current or most recent turn
    pub fn phase(&self) -> TurnPhase {
        self.state.lock().phase
    }

    pub fn is_generating(&self) -> bool {
        self.handle.is_running()
    }

    pub fn model(&self) -> String {
        self.state.lock().model.clone()
    }

    /// Set the model for subsequent turns
    pub fn set_model(&self, model: impl Into<String>) {
        self.state.lock().model = model.into();
    }

    /// Conversations whose title contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<Conversation> {
        self.state.lock().conversations.search(term)
    }

    fn emit(&self, event: AdvisorEvent) {
        let _ = self.event_tx.send(event);
    }

    fn notice(&self, notice: Notice) {
        self.emit(AdvisorEvent::Notice { notice });
    }

    fn scoped(&self) -> Result<ScopedStore> {
        let user = self.state.lock().user.clone().ok_or(Error::NotSignedIn)?;
        Ok(ScopedStore::new(Arc::clone(&self.store), user.uid))
    }

    /// Cancel the in-flight turn and drop its transient state.
    /// Called with the state lock held so no stale update can slip in after.
    fn abort_locked(&self, state: &mut ChatState) {
        if state.streaming_id.is_some() {
            self.handle.abort();
            state.thinking_steps.clear();
        }
    }

    /// Load the user's conversations and select `preferred_active` if it exists
    pub async fn load(&self, preferred_active: Option<&str>) -> Result<()> {
        let scoped = self.scoped()?;
        let items = match scoped.list().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load conversations");
                self.notice(Notice::LoadFailed);
                return Err(e);
            }
        };

        let active = {
            let mut state = self.state.lock();
            let conversations = ConversationList::new(items);
            let active = preferred_active
                .filter(|id| conversations.contains(id))
                .map(str::to_string);
            state.conversations = conversations;
            state.active_id = active.clone();
            active
        };
        tracing::info!(count = self.conversations().len(), "loaded conversations");

        self.emit(AdvisorEvent::ConversationsChanged);
        self.emit(AdvisorEvent::ActiveChanged {
            conversation_id: active,
        });
        Ok(())
    }

    /// Reconcile with the auth collaborator's current user
    pub async fn sync_auth(&self) -> Result<()> {
        let user = self.auth.current_user();
        let changed = {
            let mut state = self.state.lock();
            if state.user == user {
                false
            } else {
                self.abort_locked(&mut state);
                state.user = user.clone();
                state.conversations = ConversationList::default();
                state.active_id = None;
                true
            }
        };
        if !changed {
            return Ok(());
        }

        tracing::info!(signed_in = user.is_some(), "auth state changed");
        self.emit(AdvisorEvent::UserChanged { user: user.clone() });
        self.emit(AdvisorEvent::ConversationsChanged);
        self.emit(AdvisorEvent::ActiveChanged {
            conversation_id: None,
        });

        if user.is_some() {
            self.load(None).await?;
        }
        Ok(())
    }

    /// Follow auth changes in the background until the provider goes away
    pub fn spawn_auth_sync(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let advisor = Arc::clone(self);
        let mut rx = self.auth.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if let Err(e) = advisor.sync_auth().await {
                    tracing::debug!(error = %e, "auth sync failed");
                }
            }
        })
    }

    /// Clear the active selection so the next message starts a new conversation
    pub fn new_conversation(&self) {
        {
            let mut state = self.state.lock();
            self.abort_locked(&mut state);
            state.active_id = None;
        }
        self.emit(AdvisorEvent::ActiveChanged {
            conversation_id: None,
        });
    }

    /// Make `id` the active conversation
    pub fn select(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !state.conversations.contains(id) {
                return Err(Error::ConversationNotFound(id.to_string()));
            }
            if state.active_id.as_deref() == Some(id) {
                return Ok(());
            }
            self.abort_locked(&mut state);
            state.active_id = Some(id.to_string());
        }
        self.emit(AdvisorEvent::ActiveChanged {
            conversation_id: Some(id.to_string()),
        });
        Ok(())
    }

    /// Stop the in-flight turn, keeping whatever was received
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Send a message to the active conversation (or a new one) and stream the reply
    pub async fn send(&self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.start_turn(Prompt::Ask(text)).await
    }

    /// Replace a user message of the active conversation with `text`, drop
    /// everything after it and stream a new reply
    pub async fn edit(&self, message_id: &str, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.start_turn(Prompt::Edit { message_id, text }).await
    }

    /// Answer the last user message of the active conversation again,
    /// replacing the replies that followed it
    pub async fn regenerate(&self) -> Result<TurnOutcome> {
        self.start_turn(Prompt::Regenerate).await
    }

    async fn start_turn(&self, prompt: Prompt<'_>) -> Result<TurnOutcome> {
        let scoped = self.scoped()?;
        let cancel = self.handle.begin().ok_or(Error::TurnInProgress)?;
        let _guard = TurnGuard {
            advisor: self,
            cancel: cancel.clone(),
        };
        self.run_turn(&scoped, prompt, &cancel).await
    }

    /// Apply `prompt` to the conversation list.
    /// Returns the conversation id, the conversation if one was created, and the request text.
    fn prepare_locked(
        state: &mut ChatState,
        prompt: Prompt<'_>,
    ) -> Result<(String, Option<Conversation>, String)> {
        let active = state
            .active_id
            .clone()
            .filter(|id| state.conversations.contains(id));

        match prompt {
            Prompt::Ask(text) => {
                let user_message = Message::user(text);
                match active {
                    Some(id) => {
                        state.conversations = state
                            .conversations
                            .map(&id, |c| c.with_message(user_message));
                        Ok((id, None, text.to_string()))
                    }
                    None => {
                        let conversation = Conversation::start(user_message);
                        let id = conversation.id.clone();
                        state.conversations = state.conversations.prepend(conversation.clone());
                        state.active_id = Some(id.clone());
                        Ok((id, Some(conversation), text.to_string()))
                    }
                }
            }
            Prompt::Edit { message_id, text } => {
                let id = active.ok_or(Error::NoActiveConversation)?;
                let mut messages = state
                    .conversations
                    .get(&id)
                    .and_then(|c| {
                        let index = c
                            .messages
                            .iter()
                            .position(|m| m.id == message_id && m.role == Role::User)?;
                        Some(c.messages[..index].to_vec())
                    })
                    .ok_or_else(|| Error::MessageNotFound(message_id.to_string()))?;
                messages.push(Message::user(text));
                state.conversations = state.conversations.map(&id, |c| c.with_messages(messages));
                Ok((id, None, text.to_string()))
            }
            Prompt::Regenerate => {
                let id = active.ok_or(Error::NoActiveConversation)?;
                let (messages, text) = state
                    .conversations
                    .get(&id)
                    .and_then(|c| {
                        let index = c.messages.iter().rposition(|m| m.role == Role::User)?;
                        Some((c.messages[..=index].to_vec(), c.messages[index].content.clone()))
                    })
                    .ok_or(Error::NothingToRegenerate)?;
                state.conversations = state.conversations.map(&id, |c| c.with_messages(messages));
                Ok((id, None, text))
            }
        }
    }

    async fn run_turn(
        &self,
        scoped: &ScopedStore,
        prompt: Prompt<'_>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let (conversation_id, created, text, model) = {
            let mut state = self.state.lock();
            let (id, created, text) = Self::prepare_locked(&mut state, prompt)?;
            state.streaming_id = Some(id.clone());
            state.thinking_steps.clear();
            state.phase = TurnPhase::AwaitingFirstEvent;
            (id, created, text, state.model.clone())
        };
        let is_new = created.is_some();

        self.emit(AdvisorEvent::ConversationsChanged);

        if let Some(conversation) = created {
            self.emit(AdvisorEvent::ActiveChanged {
                conversation_id: Some(conversation_id.clone()),
            });
            if let Err(e) = scoped.create(&conversation).await {
                tracing::warn!(conversation_id = %conversation_id, error = %e, "failed to create conversation");
                {
                    let mut state = self.state.lock();
                    state.conversations = state.conversations.remove(&conversation_id).0;
                    if state.active_id.as_deref() == Some(conversation_id.as_str()) {
                        state.active_id = None;
                    }
                    state.phase = TurnPhase::Idle;
                }
                self.emit(AdvisorEvent::ConversationsChanged);
                self.emit(AdvisorEvent::ActiveChanged {
                    conversation_id: None,
                });
                self.notice(Notice::CreateFailed);
                return Err(e);
            }
        }

        tracing::info!(conversation_id = %conversation_id, model = %model, "turn started");
        self.emit(AdvisorEvent::TurnStart {
            conversation_id: conversation_id.clone(),
        });

        let request = ChatRequest::new(text).with_model(model.as_str());
        let mut turn = Turn::start(&conversation_id);

        let outcome = match self.transport.open(&request, cancel.clone()).await {
            Err(e) if e.is_aborted() || cancel.is_cancelled() => turn.abort(),
            Err(e) => turn.fail(e.to_string()),
            Ok(mut stream) => loop {
                match stream.next().await {
                    None if cancel.is_cancelled() => break turn.abort(),
                    None => break turn.complete(),
                    Some(Err(e)) if e.is_aborted() || cancel.is_cancelled() => break turn.abort(),
                    Some(Err(e)) => break turn.fail(e.to_string()),
                    Some(Ok(event)) => {
                        let update = turn.apply(event, now_millis());
                        if !self.apply_update(cancel, &conversation_id, update) {
                            break turn.abort();
                        }
                    }
                }
            },
        };

        self.finish_turn(scoped, &conversation_id, &turn, &outcome)
            .await;

        tracing::info!(conversation_id = %conversation_id, outcome = ?outcome, "turn ended");
        self.emit(AdvisorEvent::TurnEnd {
            conversation_id: conversation_id.clone(),
            outcome: outcome.clone(),
        });

        if is_new && self.suggest_titles && outcome == TurnOutcome::Completed {
            self.suggest_title(&conversation_id, &model, cancel).await;
        }
        Ok(outcome)
    }

    /// Ask the model to title a fresh conversation. Any failure keeps the default title.
    async fn suggest_title(&self, conversation_id: &str, model: &str, cancel: &CancellationToken) {
        let request = {
            let state = self.state.lock();
            state.conversations.get(conversation_id).and_then(|c| {
                let question = c.messages.iter().find(|m| m.role == Role::User)?;
                let answer = c.messages.iter().rev().find(|m| m.is_assistant())?;
                Some(title_request(&question.content, &answer.content, model))
            })
        };
        let Some(request) = request else {
            return;
        };

        let raw = match self.collect_answer(&request, cancel).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "title suggestion failed");
                return;
            }
        };
        let Some(title) = clean_title(&raw) else {
            tracing::debug!(conversation_id, "title suggestion was blank");
            return;
        };
        if cancel.is_cancelled() {
            return;
        }

        tracing::info!(conversation_id, title = %title, "suggested title");
        // a failed rename reports its own notice
        let _ = self.rename(conversation_id, &title).await;
    }

    /// Run `request` to completion and return the answer text, ignoring steps
    async fn collect_answer(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> advisor_wire::Result<String> {
        let mut stream = self.transport.open(request, cancel.clone()).await?;
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            if let WireEvent::Answer(fragment) = event? {
                text.push_str(&fragment);
            }
        }
        Ok(text)
    }

    /// Apply one turn update unless the turn was cancelled.
    /// Returns `false` if the update was dropped.
    fn apply_update(&self, cancel: &CancellationToken, conversation_id: &str, update: TurnUpdate) -> bool {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            if cancel.is_cancelled() {
                tracing::debug!(conversation_id, "dropping update from cancelled turn");
                return false;
            }
            match update {
                TurnUpdate::Steps(steps) => {
                    state.phase = TurnPhase::Thinking;
                    state.thinking_steps = steps.clone();
                    events.push(AdvisorEvent::StepsUpdated {
                        conversation_id: conversation_id.to_string(),
                        steps,
                    });
                }
                TurnUpdate::Answer {
                    message_id,
                    content,
                    first,
                } => {
                    if first {
                        state.phase = TurnPhase::Answering;
                        state.thinking_steps.clear();
                        events.push(AdvisorEvent::StepsUpdated {
                            conversation_id: conversation_id.to_string(),
                            steps: Vec::new(),
                        });
                    }
                    state.conversations = state
                        .conversations
                        .map(conversation_id, |c| upsert_answer(c, &message_id, &content));
                    events.push(AdvisorEvent::AnswerUpdated {
                        conversation_id: conversation_id.to_string(),
                        message_id,
                        content,
                    });
                }
                TurnUpdate::Ignored => {}
            }
        }
        for event in events {
            self.emit(event);
        }
        true
    }

    async fn finish_turn(
        &self,
        scoped: &ScopedStore,
        conversation_id: &str,
        turn: &Turn,
        outcome: &TurnOutcome,
    ) {
        let messages = {
            let mut state = self.state.lock();
            state.thinking_steps.clear();
            state.phase = outcome.phase();
            match outcome {
                // partial content stays in memory; nothing is written
                TurnOutcome::Aborted => None,
                TurnOutcome::Completed => state
                    .conversations
                    .get(conversation_id)
                    .map(|c| c.messages.clone()),
                TurnOutcome::Failed(_) => {
                    if let Some(message_id) = turn.answer_message_id() {
                        state.conversations = state
                            .conversations
                            .map(conversation_id, |c| c.without_message(message_id));
                    }
                    state
                        .conversations
                        .get(conversation_id)
                        .map(|c| c.messages.clone())
                }
            }
        };

        if let TurnOutcome::Failed(reason) = outcome {
            tracing::warn!(conversation_id, reason = %reason, "turn failed");
            self.emit(AdvisorEvent::ConversationsChanged);
            self.notice(Notice::ResponseFailed);
        }

        if let Some(messages) = messages {
            if let Err(e) = scoped.save(conversation_id, messages).await {
                tracing::warn!(conversation_id, error = %e, "failed to save conversation");
                self.notice(Notice::SaveFailed);
            }
        }
    }

    /// Rename a conversation. A blank title is ignored.
    pub async fn rename(&self, id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }
        let scoped = self.scoped()?;

        let previous = {
            let mut state = self.state.lock();
            let previous = state
                .conversations
                .get(id)
                .map(|c| c.title.clone())
                .ok_or_else(|| Error::ConversationNotFound(id.to_string()))?;
            state.conversations = state.conversations.map(id, |c| c.with_title(title));
            previous
        };
        self.emit(AdvisorEvent::ConversationsChanged);

        if let Err(e) = scoped.rename(id, title).await {
            tracing::warn!(conversation_id = id, error = %e, "failed to rename conversation");
            {
                let mut state = self.state.lock();
                state.conversations = state.conversations.map(id, |c| c.with_title(&previous));
            }
            self.emit(AdvisorEvent::ConversationsChanged);
            self.notice(Notice::RenameFailed);
            return Err(e);
        }
        Ok(())
    }

    /// Delete a conversation, clearing the selection if it was active
    pub async fn delete(&self, id: &str) -> Result<()> {
        let scoped = self.scoped()?;

        let (index, removed, was_active) = {
            let mut state = self.state.lock();
            let (list, removed) = state.conversations.remove(id);
            let (index, removed) =
                removed.ok_or_else(|| Error::ConversationNotFound(id.to_string()))?;
            if state.streaming_id.as_deref() == Some(id) {
                self.abort_locked(&mut state);
            }
            state.conversations = list;
            let was_active = state.active_id.as_deref() == Some(id);
            if was_active {
                state.active_id = None;
            }
            (index, removed, was_active)
        };
        self.emit(AdvisorEvent::ConversationsChanged);
        if was_active {
            self.emit(AdvisorEvent::ActiveChanged {
                conversation_id: None,
            });
        }

        if let Err(e) = scoped.delete(id).await {
            tracing::warn!(conversation_id = id, error = %e, "failed to delete conversation");
            {
                let mut state = self.state.lock();
                state.conversations = state.conversations.insert_at(index, removed);
            }
            self.emit(AdvisorEvent::ConversationsChanged);
            self.notice(Notice::DeleteFailed);
            return Err(e);
        }
        Ok(())
    }

    /// Rate a message of the active conversation; 0 clears the rating
    pub async fn rate(&self, message_id: &str, rating: u8) -> Result<()> {
        if rating > MAX_RATING {
            return Err(Error::InvalidRating(rating));
        }
        self.update_message(message_id, Notice::RatingFailed, |m| m.with_rating(rating))
            .await
    }

    /// Attach a comment to a message of the active conversation
    pub async fn comment(&self, message_id: &str, comment: &str) -> Result<()> {
        let comment = comment.trim();
        self.update_message(message_id, Notice::CommentFailed, |m| {
            m.with_comment(comment)
        })
        .await
    }

    async fn update_message(
        &self,
        message_id: &str,
        failure: Notice,
        f: impl FnOnce(&Message) -> Message,
    ) -> Result<()> {
        let scoped = self.scoped()?;

        let (conversation_id, original, messages) = {
            let mut state = self.state.lock();
            let conversation = state
                .active_id
                .as_deref()
                .and_then(|id| state.conversations.get(id))
                .ok_or_else(|| Error::MessageNotFound(message_id.to_string()))?;
            let original = conversation
                .message(message_id)
                .cloned()
                .ok_or_else(|| Error::MessageNotFound(message_id.to_string()))?;
            let updated = f(&original);
            let conversation = conversation.map_message(message_id, |_| updated);
            let conversation_id = conversation.id.clone();
            let messages = conversation.messages.clone();
            state.conversations = state
                .conversations
                .map(&conversation_id, |_| conversation);
            (conversation_id, original, messages)
        };
        self.emit(AdvisorEvent::ConversationsChanged);

        if let Err(e) = scoped.save(&conversation_id, messages).await {
            tracing::warn!(conversation_id = %conversation_id, error = %e, "failed to update message");
            {
                let mut state = self.state.lock();
                state.conversations = state.conversations.map(&conversation_id, |c| {
                    c.map_message(message_id, |m| Message {
                        rating: original.rating,
                        comment: original.comment.clone(),
                        ..m.clone()
                    })
                });
            }
            self.emit(AdvisorEvent::ConversationsChanged);
            self.notice(failure);
            return Err(e);
        }
        Ok(())
    }
}
