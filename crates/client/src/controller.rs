use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use parley_api::{ChatBackend, ChatId, ChatSummary, Message, OutboundMessage, User};
use snafu::ResultExt;

use crate::attachment::{
    AttachmentReader, PendingAttachment, compose_payload, process_attachments,
};
use crate::error::{
    BackendSnafu, ClearAllIncompleteSnafu, ControllerResult, UnauthenticatedSnafu,
};
use crate::identity::{IdentityDisplay, MenuAction, UserMenu};
use crate::navigation::Navigation;
use crate::state::AppState;
use crate::surface::{AttachmentPreview, ChatSurface, RenderedMessage, Sender};
use crate::{
    CLEAR_ALL_FAILED, DELETE_FAILED, GREETING, NO_CHATS_TO_CLEAR, SEND_FAILURE_REPLY,
    THINKING_PLACEHOLDER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send, or no chat is open.
    Skipped,
    Replied,
    /// The placeholder now shows the apology.
    Failed,
}

struct Inner {
    backend: Arc<dyn ChatBackend>,
    surface: Arc<dyn ChatSurface>,
    reader: Arc<dyn AttachmentReader>,
    state: Mutex<AppState>,
}

/// Drives the chat session: talks to the backend, keeps `AppState`, and
/// tells the surface what to draw.
///
/// Cloning is cheap and every clone shares the same state, so each UI action
/// can run on its own task. The state lock is never held across an await.
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<Inner>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn ChatSurface>,
        reader: Arc<dyn AttachmentReader>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                surface,
                reader,
                state: Mutex::new(AppState::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn surface(&self) -> &dyn ChatSurface {
        self.inner.surface.as_ref()
    }

    pub fn current_chat(&self) -> Option<ChatId> {
        self.state().current.clone()
    }

    pub fn chats(&self) -> Vec<ChatSummary> {
        self.state().chats.summaries()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    /// Startup sequence: identity, chat list, then a fresh chat.
    ///
    /// Existing chats stay in the sidebar; a session always opens on a new one.
    pub async fn bootstrap(&self) -> ControllerResult<()> {
        tracing::info!("bootstrapping chat session");
        self.load_user().await?;

        if let Err(error) = self.refresh().await
            && matches!(error, crate::ControllerError::Unauthenticated { .. })
        {
            return Err(error);
        }

        self.create().await.map(|_| ())
    }

    /// Fetches the signed-in user. Any failure sends the user to sign in.
    pub async fn load_user(&self) -> ControllerResult<User> {
        let user = self
            .inner
            .backend
            .current_user()
            .await
            .inspect_err(|error| {
                tracing::warn!(%error, "no usable session, redirecting to sign-in");
                self.surface().navigate(Navigation::SignIn);
            })
            .context(UnauthenticatedSnafu {
                stage: "load-current-user",
            })?;

        self.state().user = Some(user.clone());
        self.surface().show_identity(IdentityDisplay::for_user(&user));
        self.surface().show_user_menu(UserMenu::for_user(&user));
        tracing::info!(user = %user.name, guest = user.is_guest, "session user loaded");
        Ok(user)
    }

    /// Reloads the chat list and rebuilds the sidebar from it.
    pub async fn refresh(&self) -> ControllerResult<()> {
        let chats = match self.inner.backend.list_chats().await {
            Ok(chats) => chats,
            Err(error) if error.is_unauthorized() => {
                tracing::warn!(%error, "chat list rejected, redirecting to sign-in");
                self.surface().navigate(Navigation::SignIn);
                return Err(error).context(UnauthenticatedSnafu {
                    stage: "refresh-chat-list",
                });
            }
            Err(error) => {
                tracing::warn!(%error, "failed to refresh chat list, keeping the previous one");
                return Err(error).context(BackendSnafu {
                    stage: "refresh-chat-list",
                });
            }
        };

        let current = {
            let mut state = self.state();
            state.chats.replace_all(chats.clone());
            state.current.clone()
        };
        self.surface().rebuild_sidebar(&chats);
        self.surface().mark_active(current.as_ref());
        tracing::debug!(count = chats.len(), "chat list refreshed");
        Ok(())
    }

    /// Refresh after a mutation; failures were already logged by `refresh`.
    async fn refresh_after_change(&self) {
        if let Err(error) = self.refresh().await {
            tracing::debug!(%error, "sidebar left as it was");
        }
    }

    pub async fn create(&self) -> ControllerResult<ChatId> {
        let chat = self
            .inner
            .backend
            .create_chat()
            .await
            .inspect_err(|error| tracing::error!(%error, "failed to create chat"))
            .context(BackendSnafu {
                stage: "create-chat",
            })?;

        let greeting_slot = {
            let mut state = self.state();
            state.chats.prepend(chat.clone());
            state.current = Some(chat.chat_id.clone());
            state.alloc_slot()
        };

        let surface = self.surface();
        surface.prepend_sidebar_entry(&chat);
        surface.mark_active(Some(&chat.chat_id));
        surface.clear_messages();
        surface.append_message(greeting_slot, RenderedMessage::new(Sender::Assistant, GREETING));
        tracing::info!(chat_id = %chat.chat_id, "created chat");
        Ok(chat.chat_id)
    }

    /// Opens a chat and renders its history.
    pub async fn load(&self, chat_id: &ChatId) -> ControllerResult<()> {
        let detail = self
            .inner
            .backend
            .get_chat(chat_id)
            .await
            .inspect_err(|error| tracing::error!(%chat_id, %error, "failed to load chat"))
            .context(BackendSnafu { stage: "load-chat" })?;

        let rendered: Vec<RenderedMessage> = if detail.history.is_empty() {
            vec![RenderedMessage::new(Sender::Assistant, GREETING)]
        } else {
            detail
                .history
                .iter()
                .map(|message| RenderedMessage::new(message.role.into(), message.content.clone()))
                .collect()
        };

        let slotted: Vec<_> = {
            let mut state = self.state();
            state.current = Some(chat_id.clone());
            state.chats.set_history(chat_id, detail.history);
            rendered
                .into_iter()
                .map(|message| (state.alloc_slot(), message))
                .collect()
        };

        let surface = self.surface();
        surface.clear_messages();
        for (slot, message) in slotted {
            surface.append_message(slot, message);
        }
        surface.mark_active(Some(chat_id));
        Ok(())
    }

    /// Deletes one chat after the user confirms. Returns whether it was deleted.
    pub async fn delete(&self, chat_id: &ChatId) -> ControllerResult<bool> {
        let title = self.state().chats.title_of(chat_id).map(str::to_string);
        if !self.surface().confirm(delete_prompt(title.as_deref())).await {
            return Ok(false);
        }

        if let Err(error) = self.inner.backend.delete_chat(chat_id).await {
            tracing::error!(%chat_id, %error, "failed to delete chat");
            self.surface().alert(DELETE_FAILED);
            return Err(error).context(BackendSnafu {
                stage: "delete-chat",
            });
        }

        let was_current = {
            let mut state = self.state();
            state.chats.remove(chat_id);
            let was_current = state.is_current(chat_id);
            if was_current {
                state.current = None;
            }
            was_current
        };
        self.surface().remove_sidebar_entry(chat_id);
        tracing::info!(%chat_id, was_current, "deleted chat");

        let replacement = if was_current {
            self.surface().clear_messages();
            self.create().await.map(|_| ())
        } else {
            Ok(())
        };
        self.refresh_after_change().await;
        replacement.map(|()| true)
    }

    /// Deletes every chat after the user confirms, then starts a fresh one.
    ///
    /// Deletions run concurrently. If any of them fails nothing is reset
    /// locally; the next refresh shows what the backend still has.
    pub async fn clear_all(&self) -> ControllerResult<bool> {
        let ids = self.state().chats.ids();
        if ids.is_empty() {
            self.surface().alert(NO_CHATS_TO_CLEAR);
            return Ok(false);
        }
        if !self.surface().confirm(clear_all_prompt(ids.len())).await {
            return Ok(false);
        }

        let backend = self.inner.backend.as_ref();
        let results = join_all(ids.iter().map(|chat_id| backend.delete_chat(chat_id))).await;
        let failures: Vec<_> = ids
            .iter()
            .zip(&results)
            .filter_map(|(chat_id, result)| result.as_ref().err().map(|error| (chat_id, error)))
            .collect();

        if !failures.is_empty() {
            for (chat_id, error) in &failures {
                tracing::error!(%chat_id, %error, "chat deletion failed while clearing all");
            }
            self.surface().alert(CLEAR_ALL_FAILED);
            return ClearAllIncompleteSnafu {
                stage: "clear-all-chats",
                failed: failures.len(),
                total: ids.len(),
            }
            .fail();
        }

        {
            let mut state = self.state();
            state.chats.clear();
            state.current = None;
        }
        self.surface().rebuild_sidebar(&[]);
        self.surface().clear_messages();
        tracing::info!(count = ids.len(), "cleared all chats");

        let replacement = self.create().await;
        self.refresh_after_change().await;
        replacement.map(|_| true)
    }

    pub fn attach(&self, attachment: PendingAttachment) {
        self.state().attachments.push(attachment);
    }

    pub fn remove_attachment(&self, index: usize) -> Option<PendingAttachment> {
        let mut state = self.state();
        (index < state.attachments.len()).then(|| state.attachments.remove(index))
    }

    pub fn pending_attachments(&self) -> Vec<PendingAttachment> {
        self.state().attachments.clone()
    }

    /// Sends the composer contents to the open chat.
    ///
    /// The user's message and a placeholder reply are drawn before the
    /// request goes out; the placeholder is replaced exactly once, by the
    /// reply or by an apology.
    pub async fn send(&self, text: &str) -> ControllerResult<SendOutcome> {
        let text = text.trim().to_string();
        let prepared = {
            let mut state = self.state();
            match state.current.clone() {
                Some(chat_id) if !text.is_empty() || !state.attachments.is_empty() => {
                    Some((chat_id, std::mem::take(&mut state.attachments)))
                }
                _ => None,
            }
        };
        let Some((chat_id, pending)) = prepared else {
            return Ok(SendOutcome::Skipped);
        };

        let processed = process_attachments(self.inner.reader.as_ref(), &pending).await;
        let summaries: Vec<&str> = processed.iter().map(|item| item.summary.as_str()).collect();
        let outbound = OutboundMessage {
            message: compose_payload(&text, &summaries),
            files: pending.iter().map(PendingAttachment::file_meta).collect(),
        };
        let previews = processed.iter().map(AttachmentPreview::from).collect();

        let (user_slot, reply_slot) = {
            let mut state = self.state();
            (state.alloc_slot(), state.alloc_slot())
        };
        let surface = self.surface();
        surface.append_message(
            user_slot,
            RenderedMessage::new(Sender::User, text.clone()).with_attachments(previews),
        );
        surface.clear_composer();
        surface.append_message(
            reply_slot,
            RenderedMessage::new(Sender::Assistant, THINKING_PLACEHOLDER),
        );

        match self.inner.backend.send_message(&chat_id, &outbound).await {
            Ok(reply) => {
                surface.replace_message_text(reply_slot, &reply.reply);
                self.state()
                    .chats
                    .append_history(&chat_id, [Message::user(text), Message::assistant(reply.reply)]);
                self.refresh_after_change().await;
                Ok(SendOutcome::Replied)
            }
            Err(error) => {
                tracing::error!(%chat_id, %error, "failed to send message");
                surface.replace_message_text(reply_slot, SEND_FAILURE_REPLY);
                Ok(SendOutcome::Failed)
            }
        }
    }

    pub fn sign_in(&self) {
        self.surface().navigate(Navigation::Login);
    }

    pub fn sign_out(&self) {
        self.surface().navigate(Navigation::Logout);
    }

    pub fn exit_guest(&self) {
        self.surface().navigate(Navigation::Logout);
    }

    pub fn manage_account(&self) {
        self.surface().navigate(Navigation::ManageAccount);
    }

    /// Runs a user-menu entry. `Settings` belongs to the front-end and is ignored here.
    pub async fn run_menu_action(&self, action: MenuAction) -> ControllerResult<()> {
        match action {
            MenuAction::SignIn => self.sign_in(),
            MenuAction::ManageAccount => self.manage_account(),
            MenuAction::SignOut => self.sign_out(),
            MenuAction::ExitGuest => self.exit_guest(),
            MenuAction::ClearAll => {
                self.clear_all().await?;
            }
            MenuAction::Settings => {}
        }
        Ok(())
    }
}

pub fn delete_prompt(title: Option<&str>) -> String {
    format!(
        "Are you sure you want to delete \"{}\"? This action cannot be undone.",
        title.unwrap_or("this chat")
    )
}

pub fn clear_all_prompt(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Are you sure you want to delete all {count} chat{plural}? This action cannot be undone.")
}
