use std::rc::Rc;

use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable, VirtualListScrollHandle,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    list::ListItem,
    v_flex, v_virtual_list,
};
use parley_client::{ChatId, ChatSummary};

use crate::chat::events::{ChatSelected, DeleteChatRequested, NewChatRequested};
use crate::chat::user_menu::UserPanel;

const CHAT_ROW_HEIGHT: f32 = 40.0;

/// Chat list in server order, with a title filter and the identity panel.
pub struct ChatSidebar {
    search_input: Entity<InputState>,
    search_query: String,
    chats: Vec<ChatSummary>,
    active: Option<ChatId>,
    visible: Vec<ChatSummary>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_handle: VirtualListScrollHandle,
    user_panel: Entity<UserPanel>,
}

impl EventEmitter<ChatSelected> for ChatSidebar {}
impl EventEmitter<DeleteChatRequested> for ChatSidebar {}
impl EventEmitter<NewChatRequested> for ChatSidebar {}

impl ChatSidebar {
    pub fn new(user_panel: Entity<UserPanel>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let search_input = cx.new(|cx| InputState::new(window, cx).placeholder("Search chats..."));

        cx.subscribe_in(
            &search_input,
            window,
            |this, _, _event: &InputEvent, _window, cx| {
                this.search_query = this.search_input.read(cx).value().to_string();
                this.rebuild_visible();
                cx.notify();
            },
        )
        .detach();

        Self {
            search_input,
            search_query: String::new(),
            chats: Vec::new(),
            active: None,
            visible: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_handle: VirtualListScrollHandle::new(),
            user_panel,
        }
    }

    pub fn rebuild(&mut self, chats: Vec<ChatSummary>, cx: &mut Context<Self>) {
        self.chats = chats;
        self.rebuild_visible();
        cx.notify();
    }

    pub fn prepend(&mut self, chat: ChatSummary, cx: &mut Context<Self>) {
        self.chats.retain(|existing| existing.chat_id != chat.chat_id);
        self.chats.insert(0, chat);
        self.rebuild_visible();
        cx.notify();
    }

    pub fn remove(&mut self, chat_id: &ChatId, cx: &mut Context<Self>) {
        self.chats.retain(|existing| &existing.chat_id != chat_id);
        if self.active.as_ref() == Some(chat_id) {
            self.active = None;
        }
        self.rebuild_visible();
        cx.notify();
    }

    /// Highlights the row whose id matches; `None` clears the highlight.
    pub fn set_active(&mut self, chat_id: Option<ChatId>, cx: &mut Context<Self>) {
        self.active = chat_id;
        cx.notify();
    }

    fn rebuild_visible(&mut self) {
        let query = self.search_query.trim().to_lowercase();
        self.visible = self
            .chats
            .iter()
            .filter(|chat| matches_query(chat, &query))
            .cloned()
            .collect();
        self.item_sizes = Rc::new(
            self.visible
                .iter()
                .map(|_| size(px(0.), px(CHAT_ROW_HEIGHT)))
                .collect(),
        );
    }

    fn render_toolbar(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        h_flex()
            .w_full()
            .min_w_0()
            .gap_2()
            .px_3()
            .pt(px(8.))
            .pb_2()
            .child(Input::new(&self.search_input).w_full().small())
            .child(
                Button::new("new-chat")
                    .small()
                    .primary()
                    .icon(IconName::Plus)
                    .child("New")
                    .on_click(cx.listener(|_, _, _window, cx| {
                        cx.emit(NewChatRequested);
                    })),
            )
    }

    fn render_empty_state(&mut self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let message = if self.chats.is_empty() {
            "No chats yet"
        } else {
            "No chats match your search"
        };

        v_flex()
            .flex_1()
            .items_center()
            .justify_center()
            .px_4()
            .child(
                Label::new(message)
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }

    fn render_chat_list(&mut self, cx: &mut Context<Self>) -> AnyElement {
        if self.visible.is_empty() {
            return self.render_empty_state(cx);
        }

        let active = self.active.clone();
        let item_sizes = self.item_sizes.clone();
        let items = self.visible.clone();

        v_flex()
            .flex_1()
            .min_h_0()
            .child(
                v_virtual_list(
                    cx.entity().clone(),
                    "chat-list",
                    item_sizes,
                    move |_this, visible_range, _window, cx| {
                        visible_range
                            .map(|index| {
                                let chat = &items[index];
                                let is_active = active.as_ref() == Some(&chat.chat_id);
                                let select_id = chat.chat_id.clone();
                                let delete_id = chat.chat_id.clone();

                                div()
                                    .w_full()
                                    .h(px(CHAT_ROW_HEIGHT))
                                    .px_2()
                                    .child(
                                        ListItem::new(("chat", index))
                                            .w_full()
                                            .h_full()
                                            .px_3()
                                            .py_2()
                                            .rounded_md()
                                            .selected(is_active)
                                            .on_click(cx.listener(
                                                move |_this, _event: &ClickEvent, _window, cx| {
                                                    cx.emit(ChatSelected {
                                                        chat_id: select_id.clone(),
                                                    });
                                                },
                                            ))
                                            .child(
                                                h_flex()
                                                    .w_full()
                                                    .items_center()
                                                    .gap_1()
                                                    .child(
                                                        div().flex_1().min_w_0().truncate().child(
                                                            Label::new(chat.title.clone())
                                                                .text_sm(),
                                                        ),
                                                    )
                                                    .child(
                                                        Button::new(("delete-chat", index))
                                                            .ghost()
                                                            .xsmall()
                                                            .icon(IconName::Delete)
                                                            .on_click(cx.listener(
                                                                move |_this,
                                                                      _event: &ClickEvent,
                                                                      _window,
                                                                      cx| {
                                                                    // Keep the row from also being selected.
                                                                    cx.stop_propagation();
                                                                    cx.emit(DeleteChatRequested {
                                                                        chat_id: delete_id.clone(),
                                                                    });
                                                                },
                                                            )),
                                                    ),
                                            ),
                                    )
                                    .into_any_element()
                            })
                            .collect()
                    },
                )
                .w_full()
                .flex_1()
                .track_scroll(&self.scroll_handle),
            )
            .into_any_element()
    }
}

impl Render for ChatSidebar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let background = cx.theme().background;

        v_flex()
            .size_full()
            .min_w_0()
            .overflow_hidden()
            .bg(background)
            .child(self.render_toolbar(cx))
            .child(self.render_chat_list(cx))
            .child(self.user_panel.clone())
    }
}

fn matches_query(chat: &ChatSummary, query: &str) -> bool {
    query.is_empty() || chat.title.to_lowercase().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: &str, title: &str) -> ChatSummary {
        ChatSummary {
            chat_id: ChatId::new(id),
            title: title.to_string(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches_query(&chat("a", "Anything"), ""));
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        assert!(matches_query(&chat("a", "Rust Lifetimes"), "lifetime"));
        assert!(!matches_query(&chat("b", "Travel plans"), "rust"));
    }
}
