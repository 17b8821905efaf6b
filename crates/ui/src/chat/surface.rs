use parley_api::BoxFuture;
use parley_client::{
    ChatId, ChatSummary, ChatSurface, IdentityDisplay, MessageSlot, Navigation, RenderedMessage,
    UserMenu,
};
use tokio::sync::{mpsc, oneshot};

/// One surface call, queued for the UI thread.
#[derive(Debug)]
pub enum SurfaceEvent {
    Identity(IdentityDisplay),
    UserMenu(UserMenu),
    RebuildSidebar(Vec<ChatSummary>),
    PrependSidebarEntry(ChatSummary),
    RemoveSidebarEntry(ChatId),
    MarkActive(Option<ChatId>),
    ClearMessages,
    AppendMessage {
        slot: MessageSlot,
        message: RenderedMessage,
    },
    ReplaceMessageText {
        slot: MessageSlot,
        text: String,
    },
    ClearComposer,
    Alert(String),
    Confirm {
        prompt: String,
        reply: oneshot::Sender<bool>,
    },
    Navigate(Navigation),
}

/// Forwards controller calls from the tokio side to the GPUI views.
///
/// Sends never block. Once the receiving view is gone events are dropped
/// and every confirmation resolves to `false`.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl ChannelSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SurfaceEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("chat surface receiver dropped, discarding event");
        }
    }
}

impl ChatSurface for ChannelSurface {
    fn show_identity(&self, identity: IdentityDisplay) {
        self.send(SurfaceEvent::Identity(identity));
    }

    fn show_user_menu(&self, menu: UserMenu) {
        self.send(SurfaceEvent::UserMenu(menu));
    }

    fn rebuild_sidebar(&self, chats: &[ChatSummary]) {
        self.send(SurfaceEvent::RebuildSidebar(chats.to_vec()));
    }

    fn prepend_sidebar_entry(&self, chat: &ChatSummary) {
        self.send(SurfaceEvent::PrependSidebarEntry(chat.clone()));
    }

    fn remove_sidebar_entry(&self, chat_id: &ChatId) {
        self.send(SurfaceEvent::RemoveSidebarEntry(chat_id.clone()));
    }

    fn mark_active(&self, chat_id: Option<&ChatId>) {
        self.send(SurfaceEvent::MarkActive(chat_id.cloned()));
    }

    fn clear_messages(&self) {
        self.send(SurfaceEvent::ClearMessages);
    }

    fn append_message(&self, slot: MessageSlot, message: RenderedMessage) {
        self.send(SurfaceEvent::AppendMessage { slot, message });
    }

    fn replace_message_text(&self, slot: MessageSlot, text: &str) {
        self.send(SurfaceEvent::ReplaceMessageText {
            slot,
            text: text.to_string(),
        });
    }

    fn clear_composer(&self) {
        self.send(SurfaceEvent::ClearComposer);
    }

    fn alert(&self, notice: &str) {
        self.send(SurfaceEvent::Alert(notice.to_string()));
    }

    fn confirm(&self, prompt: String) -> BoxFuture<'_, bool> {
        let (reply, answer) = oneshot::channel();
        self.send(SurfaceEvent::Confirm { prompt, reply });
        Box::pin(async move { answer.await.unwrap_or(false) })
    }

    fn navigate(&self, target: Navigation) {
        self.send(SurfaceEvent::Navigate(target));
    }
}

#[cfg(test)]
mod tests {
    use parley_client::Sender;

    use super::*;

    #[tokio::test]
    async fn calls_arrive_in_order() {
        let (surface, mut rx) = ChannelSurface::new();
        let chat_id = ChatId::new("c1");

        surface.mark_active(Some(&chat_id));
        surface.append_message(MessageSlot::new(3), RenderedMessage::new(Sender::User, "hi"));
        surface.replace_message_text(MessageSlot::new(3), "hello");

        assert!(matches!(rx.recv().await, Some(SurfaceEvent::MarkActive(Some(id))) if id == chat_id));
        assert!(matches!(
            rx.recv().await,
            Some(SurfaceEvent::AppendMessage { slot, .. }) if slot == MessageSlot::new(3)
        ));
        assert!(matches!(
            rx.recv().await,
            Some(SurfaceEvent::ReplaceMessageText { text, .. }) if text == "hello"
        ));
    }

    #[tokio::test]
    async fn confirm_resolves_with_the_answer() {
        let (surface, mut rx) = ChannelSurface::new();

        let answering = tokio::spawn(async move {
            match rx.recv().await {
                Some(SurfaceEvent::Confirm { prompt, reply }) => {
                    assert_eq!(prompt, "Delete?");
                    let _ = reply.send(true);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        });

        assert!(surface.confirm("Delete?".to_string()).await);
        answering.await.expect("answering task");
    }

    #[tokio::test]
    async fn unanswered_confirm_is_a_no() {
        let (surface, mut rx) = ChannelSurface::new();

        let dropping = tokio::spawn(async move {
            drop(rx.recv().await);
        });

        assert!(!surface.confirm("Clear?".to_string()).await);
        dropping.await.expect("dropping task");
    }

    #[tokio::test]
    async fn closed_receiver_declines_confirmation() {
        let (surface, rx) = ChannelSurface::new();
        drop(rx);

        surface.alert("ignored");
        assert!(!surface.confirm("Delete?".to_string()).await);
    }
}
