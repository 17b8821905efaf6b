use parley_client::{ChatId, MenuAction};

/// Emitted when a sidebar row is clicked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatSelected {
    pub chat_id: ChatId,
}

/// Emitted by the per-row delete button. Confirmation happens later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteChatRequested {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewChatRequested;

/// Emitted when the composer is submitted with text, attachments or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub text: String,
}

impl Submit {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachRequested;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentRemoved {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuActionChosen {
    pub action: MenuAction,
}
