use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_api::{
    ApiError, ApiResult, BoxFuture, ChatBackend, ChatDetail, ChatId, ChatSummary, Message,
    MessageReply, OutboundMessage, User,
};

use crate::attachment::{AttachmentReader, PendingAttachment};
use crate::controller::ChatController;
use crate::error::{AttachmentError, AttachmentResult};
use crate::identity::{IdentityDisplay, UserMenu};
use crate::navigation::Navigation;
use crate::state::MessageSlot;
use crate::surface::{ChatSurface, RenderedMessage, Sender};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn status(path: &str, status: u16) -> ApiError {
    ApiError::Status {
        stage: "scripted-backend",
        path: path.to_string(),
        status,
        body: String::new(),
    }
}

fn unauthorized(path: &str) -> ApiError {
    ApiError::Unauthorized {
        stage: "scripted-backend",
        path: path.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListFailure {
    Unauthorized,
    Unavailable,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerChat {
    pub chat_id: ChatId,
    pub title: String,
    pub history: Vec<Message>,
}

#[derive(Debug, Default)]
struct ServerState {
    user: Option<User>,
    chats: Vec<ServerChat>,
    next_id: u64,
    list_failure: Option<ListFailure>,
    failing_deletes: Vec<ChatId>,
    fail_creates: bool,
    fail_sends: bool,
    calls: Vec<String>,
    sent: Vec<(ChatId, OutboundMessage)>,
}

/// In-memory backend that behaves like the real one and records every call.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    state: Mutex<ServerState>,
}

impl ScriptedBackend {
    pub fn signed_in() -> Self {
        let backend = Self::default();
        lock(&backend.state).user = Some(User {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            picture: None,
            is_guest: false,
        });
        backend
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn with_chat(self, id: &str, title: &str, history: Vec<Message>) -> Self {
        lock(&self.state).chats.push(ServerChat {
            chat_id: ChatId::new(id),
            title: title.to_string(),
            history,
        });
        self
    }

    pub fn set_list_failure(&self, failure: Option<ListFailure>) {
        lock(&self.state).list_failure = failure;
    }

    pub fn fail_delete(&self, id: &str) {
        lock(&self.state).failing_deletes.push(ChatId::new(id));
    }

    pub fn fail_creates(&self) {
        lock(&self.state).fail_creates = true;
    }

    pub fn fail_sends(&self) {
        lock(&self.state).fail_sends = true;
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    pub fn server_chat_ids(&self) -> Vec<ChatId> {
        lock(&self.state)
            .chats
            .iter()
            .map(|chat| chat.chat_id.clone())
            .collect()
    }

    pub fn sent(&self) -> Vec<(ChatId, OutboundMessage)> {
        lock(&self.state).sent.clone()
    }

    fn record(&self, call: String) -> MutexGuard<'_, ServerState> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state
    }
}

impl ChatBackend for ScriptedBackend {
    fn current_user(&self) -> BoxFuture<'_, ApiResult<User>> {
        Box::pin(async move {
            let state = self.record("GET /api/user".to_string());
            state.user.clone().ok_or_else(|| unauthorized("/api/user"))
        })
    }

    fn list_chats(&self) -> BoxFuture<'_, ApiResult<Vec<ChatSummary>>> {
        Box::pin(async move {
            let state = self.record("GET /api/chats".to_string());
            match state.list_failure {
                Some(ListFailure::Unauthorized) => Err(unauthorized("/api/chats")),
                Some(ListFailure::Unavailable) => Err(status("/api/chats", 503)),
                None => Ok(state
                    .chats
                    .iter()
                    .map(|chat| ChatSummary {
                        chat_id: chat.chat_id.clone(),
                        title: chat.title.clone(),
                    })
                    .collect()),
            }
        })
    }

    fn create_chat(&self) -> BoxFuture<'_, ApiResult<ChatSummary>> {
        Box::pin(async move {
            let mut state = self.record("POST /api/chats".to_string());
            if state.fail_creates {
                return Err(status("/api/chats", 500));
            }
            state.next_id += 1;
            let chat_id = ChatId::new(format!("new-{}", state.next_id));
            state.chats.push(ServerChat {
                chat_id: chat_id.clone(),
                title: "New Chat".to_string(),
                history: Vec::new(),
            });
            Ok(ChatSummary {
                chat_id,
                title: "New Chat".to_string(),
            })
        })
    }

    fn get_chat<'a>(&'a self, chat_id: &'a ChatId) -> BoxFuture<'a, ApiResult<ChatDetail>> {
        Box::pin(async move {
            let state = self.record(format!("GET /api/chats/{chat_id}"));
            state
                .chats
                .iter()
                .find(|chat| &chat.chat_id == chat_id)
                .map(|chat| ChatDetail {
                    chat_id: chat.chat_id.clone(),
                    title: chat.title.clone(),
                    history: chat.history.clone(),
                })
                .ok_or_else(|| status("/api/chats/:id", 404))
        })
    }

    fn delete_chat<'a>(&'a self, chat_id: &'a ChatId) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let mut state = self.record(format!("DELETE /api/chats/{chat_id}"));
            if state.failing_deletes.contains(chat_id) {
                return Err(status("/api/chats/:id", 500));
            }
            let before = state.chats.len();
            state.chats.retain(|chat| &chat.chat_id != chat_id);
            if state.chats.len() == before {
                return Err(status("/api/chats/:id", 404));
            }
            Ok(())
        })
    }

    fn send_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, ApiResult<MessageReply>> {
        Box::pin(async move {
            let mut state = self.record(format!("POST /api/chats/{chat_id}/message"));
            state.sent.push((chat_id.clone(), message.clone()));
            if state.fail_sends {
                return Err(status("/api/chats/:id/message", 500));
            }

            let reply = format!("echo: {}", message.message);
            let chat = state
                .chats
                .iter_mut()
                .find(|chat| &chat.chat_id == chat_id)
                .ok_or_else(|| status("/api/chats/:id/message", 404))?;
            let shown = message
                .message
                .split("\n\nAttached files:")
                .next()
                .unwrap_or_default()
                .to_string();
            chat.history.push(Message::user(shown.clone()));
            chat.history.push(Message::assistant(reply.clone()));
            if chat.title == "New Chat" && chat.history.len() == 2 {
                let mut title: String = shown.chars().take(30).collect();
                if shown.chars().count() > 30 {
                    title.push_str("...");
                }
                chat.title = title;
            }
            Ok(MessageReply { reply })
        })
    }
}

/// Snapshot of what a real surface would be showing.
#[derive(Debug, Clone, Default)]
pub(crate) struct SurfaceView {
    pub identity: Option<IdentityDisplay>,
    pub menu: Option<UserMenu>,
    pub sidebar: Vec<ChatSummary>,
    pub active: Option<ChatId>,
    pub messages: Vec<(MessageSlot, RenderedMessage)>,
    pub replacements: Vec<(MessageSlot, String)>,
    pub alerts: Vec<String>,
    pub prompts: Vec<String>,
    pub navigations: Vec<Navigation>,
    pub composer_clears: usize,
}

impl SurfaceView {
    pub fn texts(&self) -> Vec<(Sender, String)> {
        self.messages
            .iter()
            .map(|(_, message)| (message.sender, message.text.clone()))
            .collect()
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    view: Mutex<SurfaceView>,
    confirm_answer: AtomicBool,
}

impl RecordingSurface {
    pub fn answering(answer: bool) -> Self {
        Self {
            view: Mutex::default(),
            confirm_answer: AtomicBool::new(answer),
        }
    }

    pub fn snapshot(&self) -> SurfaceView {
        lock(&self.view).clone()
    }
}

impl ChatSurface for RecordingSurface {
    fn show_identity(&self, identity: IdentityDisplay) {
        lock(&self.view).identity = Some(identity);
    }

    fn show_user_menu(&self, menu: UserMenu) {
        lock(&self.view).menu = Some(menu);
    }

    fn rebuild_sidebar(&self, chats: &[ChatSummary]) {
        lock(&self.view).sidebar = chats.to_vec();
    }

    fn prepend_sidebar_entry(&self, chat: &ChatSummary) {
        lock(&self.view).sidebar.insert(0, chat.clone());
    }

    fn remove_sidebar_entry(&self, chat_id: &ChatId) {
        lock(&self.view)
            .sidebar
            .retain(|chat| &chat.chat_id != chat_id);
    }

    fn mark_active(&self, chat_id: Option<&ChatId>) {
        lock(&self.view).active = chat_id.cloned();
    }

    fn clear_messages(&self) {
        lock(&self.view).messages.clear();
    }

    fn append_message(&self, slot: MessageSlot, message: RenderedMessage) {
        lock(&self.view).messages.push((slot, message));
    }

    fn replace_message_text(&self, slot: MessageSlot, text: &str) {
        let mut view = lock(&self.view);
        view.replacements.push((slot, text.to_string()));
        if let Some((_, message)) = view.messages.iter_mut().find(|(id, _)| *id == slot) {
            message.text = text.to_string();
        }
    }

    fn clear_composer(&self) {
        lock(&self.view).composer_clears += 1;
    }

    fn alert(&self, notice: &str) {
        lock(&self.view).alerts.push(notice.to_string());
    }

    fn confirm(&self, prompt: String) -> BoxFuture<'_, bool> {
        lock(&self.view).prompts.push(prompt);
        let answer = self.confirm_answer.load(Ordering::SeqCst);
        Box::pin(async move { answer })
    }

    fn navigate(&self, target: Navigation) {
        lock(&self.view).navigations.push(target);
    }
}

/// Serves attachment contents from memory; unknown names fail to read.
#[derive(Debug, Default)]
pub(crate) struct ScriptedReader {
    images: HashMap<String, String>,
    texts: HashMap<String, String>,
}

impl ScriptedReader {
    pub fn with_image(mut self, name: &str, data_url: &str) -> Self {
        self.images.insert(name.to_string(), data_url.to_string());
        self
    }

    pub fn with_text(mut self, name: &str, text: &str) -> Self {
        self.texts.insert(name.to_string(), text.to_string());
        self
    }

    fn missing(attachment: &PendingAttachment) -> AttachmentError {
        AttachmentError::ReadFile {
            stage: "scripted-read",
            path: attachment.path.clone(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }
}

impl AttachmentReader for ScriptedReader {
    fn read_data_url<'a>(
        &'a self,
        attachment: &'a PendingAttachment,
    ) -> BoxFuture<'a, AttachmentResult<String>> {
        let result = self
            .images
            .get(&attachment.name)
            .cloned()
            .ok_or_else(|| Self::missing(attachment));
        Box::pin(async move { result })
    }

    fn read_text<'a>(
        &'a self,
        attachment: &'a PendingAttachment,
    ) -> BoxFuture<'a, AttachmentResult<String>> {
        let result = self
            .texts
            .get(&attachment.name)
            .cloned()
            .ok_or_else(|| Self::missing(attachment));
        Box::pin(async move { result })
    }
}

pub(crate) struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub surface: Arc<RecordingSurface>,
    pub controller: ChatController,
}

impl Harness {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self::build(backend, RecordingSurface::answering(true), ScriptedReader::default())
    }

    pub fn build(
        backend: ScriptedBackend,
        surface: RecordingSurface,
        reader: ScriptedReader,
    ) -> Self {
        let backend = Arc::new(backend);
        let surface = Arc::new(surface);
        let controller = ChatController::new(backend.clone(), surface.clone(), Arc::new(reader));
        Self {
            backend,
            surface,
            controller,
        }
    }
}
