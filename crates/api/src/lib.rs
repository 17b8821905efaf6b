pub mod backend;
pub mod error;
pub mod http;
pub mod ids;
pub mod types;

pub use backend::{BoxFuture, ChatBackend};
pub use error::{ApiError, ApiResult};
pub use http::{BackendConfig, DEFAULT_BACKEND_URL, HttpBackend};
pub use ids::ChatId;
pub use types::{
    ChatDetail, ChatSummary, FileMeta, Message, MessageReply, OutboundMessage, Role, User,
};
