pub mod attachment;
pub mod controller;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod state;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use attachment::{
    AttachmentKind, AttachmentReader, FsAttachmentReader, PendingAttachment, ProcessedAttachment,
};
pub use controller::{ChatController, SendOutcome};
pub use error::{ControllerError, ControllerResult};
pub use identity::{Avatar, IdentityDisplay, MenuAction, UserMenu};
pub use navigation::Navigation;
pub use state::{AppState, ChatDirectory, MessageSlot};
pub use surface::{AttachmentPreview, ChatSurface, RenderedMessage, Sender};

pub use parley_api::{ChatBackend, ChatId, ChatSummary};

pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
pub const THINKING_PLACEHOLDER: &str = "💭 Thinking...";
pub const SEND_FAILURE_REPLY: &str = "Sorry, I couldn't connect to the server. Please try again.";
pub const NO_CHATS_TO_CLEAR: &str = "No chats to clear!";
pub const DELETE_FAILED: &str = "Failed to delete chat. Please try again.";
pub const CLEAR_ALL_FAILED: &str = "Failed to clear all chats. Please try again.";
