use parley_api::{BoxFuture, ChatId, ChatSummary, Role};

use crate::attachment::{AttachmentKind, ProcessedAttachment};
use crate::identity::{IdentityDisplay, UserMenu};
use crate::navigation::Navigation;
use crate::state::MessageSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl From<Role> for Sender {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

/// Attachment chip shown under a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPreview {
    pub name: String,
    pub media_type: String,
    pub kind: AttachmentKind,
    pub data_url: Option<String>,
}

impl From<&ProcessedAttachment> for AttachmentPreview {
    fn from(processed: &ProcessedAttachment) -> Self {
        Self {
            name: processed.name.clone(),
            media_type: processed.media_type.clone(),
            kind: processed.kind,
            data_url: processed.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub sender: Sender,
    /// Plain text; `\n` marks a line break.
    pub text: String,
    pub attachments: Vec<AttachmentPreview>,
}

impl RenderedMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<AttachmentPreview>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Everything the controller needs from whatever draws the chat.
///
/// Calls are fire-and-forget except `confirm`, which resolves once the user
/// answers. Implementations must be cheap to call from any thread.
pub trait ChatSurface: Send + Sync {
    fn show_identity(&self, identity: IdentityDisplay);
    fn show_user_menu(&self, menu: UserMenu);

    fn rebuild_sidebar(&self, chats: &[ChatSummary]);
    fn prepend_sidebar_entry(&self, chat: &ChatSummary);
    fn remove_sidebar_entry(&self, chat_id: &ChatId);
    /// Highlights `chat_id` and clears every other entry. `None` clears all.
    fn mark_active(&self, chat_id: Option<&ChatId>);

    fn clear_messages(&self);
    fn append_message(&self, slot: MessageSlot, message: RenderedMessage);
    fn replace_message_text(&self, slot: MessageSlot, text: &str);
    fn clear_composer(&self);

    fn alert(&self, notice: &str);
    fn confirm(&self, prompt: String) -> BoxFuture<'_, bool>;
    fn navigate(&self, target: Navigation);
}
