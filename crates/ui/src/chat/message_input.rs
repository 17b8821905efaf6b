use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    v_flex,
};

use crate::chat::events::{AttachRequested, AttachmentRemoved, Submit};

/// Composer: multi-line text plus the chips of files queued for the next send.
///
/// Submitting empties the composer in the same turn, so a second Enter
/// cannot resend the text that is still in flight.
pub struct MessageInput {
    input_state: Entity<InputState>,
    attachment_names: Vec<String>,
    pending_newline: bool,
}

impl EventEmitter<Submit> for MessageInput {}
impl EventEmitter<AttachRequested> for MessageInput {}
impl EventEmitter<AttachmentRemoved> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Type your message...")
                .clean_on_escape()
                .auto_grow(3, 10)
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { secondary } = event {
                    if *secondary {
                        this.pending_newline = false;
                        return;
                    }

                    if this.pending_newline {
                        // Shift+Enter already inserted the newline; drop the enter that follows it.
                        this.pending_newline = false;
                    } else {
                        this.trim_trailing_newline(window, cx);
                        this.handle_submit(window, cx);
                    }
                }
            },
        )
        .detach();

        Self {
            input_state,
            attachment_names: Vec::new(),
            pending_newline: false,
        }
    }

    pub fn set_attachments(&mut self, names: Vec<String>, cx: &mut Context<Self>) {
        self.attachment_names = names;
        cx.notify();
    }

    /// Empties the text and the attachment chips.
    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        self.attachment_names.clear();
        self.pending_newline = false;
        cx.notify();
    }

    fn handle_shift_enter(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.pending_newline = true;
        self.input_state.update(cx, |state, cx| {
            state.insert("\n", window, cx);
        });
        cx.notify();
    }

    fn trim_trailing_newline(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            let value = state.value().to_string();
            if let Some(trimmed) = value.strip_suffix('\n') {
                state.set_value(trimmed.to_string(), window, cx);
            }
        });
    }

    fn handle_submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let text = self.input_state.read(cx).value().to_string();
        let Some(text) = take_submission(text, self.attachment_names.len()) else {
            return;
        };

        self.clear(window, cx);
        cx.emit(Submit::new(text));
    }

    fn render_attachments(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .flex_wrap()
            .gap_2()
            .children(self.attachment_names.iter().enumerate().map(|(index, name)| {
                h_flex()
                    .id(("attachment-chip", index))
                    .gap_1()
                    .items_center()
                    .pl_2()
                    .rounded_md()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.muted)
                    .child(Label::new(name.clone()).text_xs())
                    .child(
                        Button::new(("remove-attachment", index))
                            .ghost()
                            .xsmall()
                            .icon(IconName::CircleX)
                            .on_click(cx.listener(move |_, _, _window, cx| {
                                cx.emit(AttachmentRemoved { index });
                            })),
                    )
            }))
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let has_attachments = !self.attachment_names.is_empty();

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_3()
            .when(has_attachments, |column| {
                column.child(self.render_attachments(cx))
            })
            .child(
                div()
                    .w_full()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                        if event.keystroke.key == "enter" && event.keystroke.modifiers.shift {
                            this.handle_shift_enter(window, cx);
                        }
                    }))
                    .child(Input::new(&self.input_state).w_full()),
            )
            .child(
                h_flex()
                    .w_full()
                    .justify_between()
                    .child(
                        Button::new("attach")
                            .small()
                            .ghost()
                            .icon(IconName::Plus)
                            .child("Attach")
                            .on_click(cx.listener(|_, _, _window, cx| {
                                cx.emit(AttachRequested);
                            })),
                    )
                    .child(
                        Button::new("send")
                            .small()
                            .primary()
                            .icon(IconName::ArrowUp)
                            .child("Send")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.handle_submit(window, cx);
                            })),
                    ),
            )
    }
}

fn should_submit(text: &str, attachment_count: usize) -> bool {
    !text.trim().is_empty() || attachment_count > 0
}

/// What goes out on submit, or `None` when there is nothing to send.
fn take_submission(text: String, attachment_count: usize) -> Option<String> {
    should_submit(&text, attachment_count).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_without_files_is_not_submitted() {
        assert!(!should_submit("  \n ", 0));
        assert!(should_submit("", 1));
        assert!(should_submit("hi", 0));
    }

    #[test]
    fn cleared_composer_does_not_submit_twice() {
        let first = take_submission("hello".to_string(), 1);
        assert_eq!(first.as_deref(), Some("hello"));

        // After the first submit the composer is empty and has no chips.
        assert_eq!(take_submission(String::new(), 0), None);
    }
}
