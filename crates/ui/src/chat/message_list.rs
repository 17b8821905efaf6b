use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, Icon, IconName, h_flex, label::Label, v_flex};
use parley_client::MessageSlot;

use crate::chat::message::{AttachmentView, MessageRow};

const USER_BUBBLE_MAX_WIDTH: Pixels = px(540.);
const USER_BUBBLE_PADDING_X: Pixels = px(14.);
const USER_BUBBLE_PADDING_Y: Pixels = px(10.);
const THUMBNAIL_MAX_WIDTH: Pixels = px(220.);
const THUMBNAIL_MAX_HEIGHT: Pixels = px(160.);

pub struct MessageList {
    rows: Vec<MessageRow>,
    scroll_handle: ScrollHandle,
    pending_scroll: bool,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            rows: Vec::new(),
            scroll_handle: ScrollHandle::new(),
            pending_scroll: false,
        }
    }

    pub fn clear(&mut self, cx: &mut Context<Self>) {
        self.rows.clear();
        cx.notify();
    }

    pub fn push(&mut self, row: MessageRow, cx: &mut Context<Self>) {
        self.rows.push(row);
        self.pending_scroll = true;
        cx.notify();
    }

    /// Rewrites one row in place. Unknown slots are ignored, e.g. after the
    /// transcript was cleared by a chat switch.
    pub fn replace_text(&mut self, slot: MessageSlot, text: &str, cx: &mut Context<Self>) {
        if replace_row_text(&mut self.rows, slot, text) {
            self.pending_scroll = true;
            cx.notify();
        } else {
            tracing::debug!(slot = slot.0, "message row no longer shown, skipping update");
        }
    }

    fn render_row(&self, index: usize, row: &MessageRow, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let lines = row.lines();

        if row.is_user() {
            return v_flex()
                .id(("message-row", index))
                .w_full()
                .items_end()
                .gap_1()
                .child(
                    v_flex()
                        .max_w(USER_BUBBLE_MAX_WIDTH)
                        .px(USER_BUBBLE_PADDING_X)
                        .py(USER_BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.accent)
                        .text_color(theme.accent_foreground)
                        .children(lines.into_iter().map(|line| Label::new(line).text_sm()))
                        .when(!row.attachments.is_empty(), |bubble| {
                            bubble.child(
                                h_flex().flex_wrap().gap_1().pt_2().children(
                                    row.attachments
                                        .iter()
                                        .map(|attachment| render_attachment(attachment, cx)),
                                ),
                            )
                        }),
                )
                .child(
                    Label::new(row.time.clone())
                        .text_xs()
                        .text_color(theme.foreground.opacity(0.5)),
                )
                .into_any_element();
        }

        v_flex()
            .id(("message-row", index))
            .w_full()
            .gap_2()
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(div().size(px(8.)).rounded_full().bg(theme.primary))
                    .child(
                        Label::new("Assistant")
                            .text_xs()
                            .text_color(theme.foreground.opacity(0.5)),
                    )
                    .child(
                        Label::new(row.time.clone())
                            .text_xs()
                            .text_color(theme.foreground.opacity(0.4)),
                    ),
            )
            .child(
                v_flex()
                    .w_full()
                    .children(lines.into_iter().map(|line| Label::new(line).text_sm())),
            )
            .into_any_element()
    }

    fn render_empty_state(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .size_full()
            .items_center()
            .justify_center()
            .gap_2()
            .child(
                Icon::new(IconName::CircleUser)
                    .size(px(28.))
                    .text_color(theme.foreground.opacity(0.4)),
            )
            .child(
                Label::new("No messages yet")
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.rows.is_empty() {
            return self.render_empty_state(cx);
        }

        if std::mem::take(&mut self.pending_scroll) {
            self.scroll_handle.scroll_to_bottom();
        }

        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.render_row(index, row, cx))
            .collect::<Vec<_>>();

        div()
            .id("message-list")
            .size_full()
            .min_h_0()
            .overflow_y_scroll()
            .track_scroll(&self.scroll_handle)
            .child(v_flex().w_full().px_4().py_3().gap_4().children(rows))
            .into_any_element()
    }
}

fn render_attachment(attachment: &AttachmentView, cx: &Context<MessageList>) -> AnyElement {
    let theme = cx.theme();

    match attachment.image.clone() {
        Some(image) => img(image)
            .max_w(THUMBNAIL_MAX_WIDTH)
            .max_h(THUMBNAIL_MAX_HEIGHT)
            .rounded_md()
            .into_any_element(),
        None => div()
            .px_2()
            .py(px(2.))
            .rounded_md()
            .border_1()
            .border_color(theme.accent_foreground.opacity(0.3))
            .child(Label::new(attachment.label.clone()).text_xs())
            .into_any_element(),
    }
}

fn replace_row_text(rows: &mut [MessageRow], slot: MessageSlot, text: &str) -> bool {
    match rows.iter_mut().find(|row| row.slot == slot) {
        Some(row) => {
            row.text = text.to_string();
            true
        }
        None => false,
    }
}
