pub use futures::future::BoxFuture;

use crate::error::ApiResult;
use crate::ids::ChatId;
use crate::types::{ChatDetail, ChatSummary, MessageReply, OutboundMessage, User};

/// The REST chat backend the client talks to.
///
/// Every method maps onto exactly one HTTP request. Implementations never
/// retry; callers decide how a failure is surfaced.
pub trait ChatBackend: Send + Sync {
    /// `GET /api/user`
    fn current_user(&self) -> BoxFuture<'_, ApiResult<User>>;

    /// `GET /api/chats`
    fn list_chats(&self) -> BoxFuture<'_, ApiResult<Vec<ChatSummary>>>;

    /// `POST /api/chats`
    fn create_chat(&self) -> BoxFuture<'_, ApiResult<ChatSummary>>;

    /// `GET /api/chats/:id`
    fn get_chat<'a>(&'a self, chat_id: &'a ChatId) -> BoxFuture<'a, ApiResult<ChatDetail>>;

    /// `DELETE /api/chats/:id`
    fn delete_chat<'a>(&'a self, chat_id: &'a ChatId) -> BoxFuture<'a, ApiResult<()>>;

    /// `POST /api/chats/:id/message`
    fn send_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, ApiResult<MessageReply>>;
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn boxed_futures_fit_backend_methods() {
        let reply: BoxFuture<'static, ApiResult<MessageReply>> = async {
            Ok(MessageReply {
                reply: "hi".to_string(),
            })
        }
        .boxed();

        assert_eq!(reply.await.map(|reply| reply.reply).ok().as_deref(), Some("hi"));
    }
}
