pub mod events;
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod sidebar;
/// Channel-backed `ChatSurface` feeding the GPUI views.
pub mod surface;
pub mod user_menu;
pub mod view;

pub use events::{
    AttachRequested, AttachmentRemoved, ChatSelected, DeleteChatRequested, MenuActionChosen,
    NewChatRequested, Submit,
};
pub use message::MessageRow;
pub use message_input::MessageInput;
pub use message_list::MessageList;
pub use sidebar::ChatSidebar;
pub use surface::{ChannelSurface, SurfaceEvent};
pub use user_menu::UserPanel;
pub use view::ChatView;
