use std::path::PathBuf;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};

use crate::chat::ChatView;

/// Directory watched for extra theme presets.
pub fn default_themes_path() -> PathBuf {
    PathBuf::from("./themes")
}

pub const SIDEBAR_DEFAULT_WIDTH: f32 = 280.0;
pub const SIDEBAR_MIN_WIDTH: f32 = 220.0;
pub const SIDEBAR_MAX_WIDTH: f32 = 420.0;
pub const SIDEBAR_COLLAPSED_WIDTH: f32 = 56.0;
const _: () = {
    assert!(SIDEBAR_COLLAPSED_WIDTH > 0.0);
    assert!(SIDEBAR_MIN_WIDTH < SIDEBAR_DEFAULT_WIDTH);
    assert!(SIDEBAR_DEFAULT_WIDTH < SIDEBAR_MAX_WIDTH);
};

/// Clamps a dragged sidebar edge to the allowed width range.
pub fn compute_sidebar_width(drag_x: f32) -> f32 {
    drag_x.clamp(SIDEBAR_MIN_WIDTH, SIDEBAR_MAX_WIDTH)
}

/// Left and right title bar insets that keep clear of the native window buttons.
fn title_bar_insets() -> (Pixels, Pixels) {
    let left = if cfg!(target_os = "macos") { px(78.) } else { px(12.) };
    let right = if cfg!(target_os = "windows") { px(120.) } else { px(12.) };
    (left, right)
}

fn title_bar_height(window: &Window) -> Pixels {
    (1.75 * window.rem_size()).max(px(34.0))
}

gpui::actions!(shell, [NewChat, ToggleSidebar, OpenSettings, Quit]);

#[derive(Debug, Clone, Copy, PartialEq)]
struct SidebarLayout {
    width: f32,
    collapsed: bool,
}

impl Default for SidebarLayout {
    fn default() -> Self {
        Self {
            width: SIDEBAR_DEFAULT_WIDTH,
            collapsed: false,
        }
    }
}

impl SidebarLayout {
    fn shown_width(self) -> f32 {
        if self.collapsed {
            SIDEBAR_COLLAPSED_WIDTH
        } else {
            self.width
        }
    }

    fn toggled(self) -> Self {
        Self {
            collapsed: !self.collapsed,
            ..self
        }
    }

    /// Resizing remembers the width even while collapsed.
    fn resized(self, drag_x: f32) -> Self {
        Self {
            width: compute_sidebar_width(drag_x),
            ..self
        }
    }
}

/// Drag payload for the sidebar edge. It doubles as the (empty) drag preview.
#[derive(Clone)]
struct SidebarResize;

impl Render for SidebarResize {
    fn render(&mut self, _: &mut Window, _: &mut Context<Self>) -> impl IntoElement {
        div()
    }
}

/// Root layout: a title bar carrying the shell controls, the chat sidebar and
/// the chat pane.
pub struct AppShell {
    chat_view: Entity<ChatView>,
    layout: SidebarLayout,
    dragging_title_bar: bool,
}

impl AppShell {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        Self {
            chat_view: cx.new(|cx| ChatView::new(window, cx)),
            layout: SidebarLayout::default(),
            dragging_title_bar: false,
        }
    }

    fn toggle_sidebar(&mut self, cx: &mut Context<Self>) {
        self.layout = self.layout.toggled();
        cx.notify();
    }

    fn new_chat(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.create_chat(cx));
    }

    fn open_settings(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.open_settings_panel(cx));
    }

    fn shell_button(
        id: &'static str,
        icon: IconName,
        cx: &Context<Self>,
        on_click: impl Fn(&mut Self, &mut Context<Self>) + 'static,
    ) -> Button {
        Button::new(id)
            .ghost()
            .small()
            .icon(icon)
            .on_click(cx.listener(move |this, _, _window, cx| on_click(this, cx)))
    }

    fn render_title_bar(&self, window: &Window, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let (inset_left, inset_right) = title_bar_insets();
        let backend_label = self.chat_view.read(cx).backend_label(cx);
        let toggle_icon = if self.layout.collapsed {
            IconName::PanelLeftOpen
        } else {
            IconName::PanelLeftClose
        };

        h_flex()
            .id("title-bar")
            .window_control_area(WindowControlArea::Drag)
            .w_full()
            .h(title_bar_height(window))
            .flex_shrink_0()
            .pl(inset_left)
            .pr(inset_right)
            .gap_2()
            .items_center()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| this.dragging_title_bar = true),
            )
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| this.dragging_title_bar = false),
            )
            .on_mouse_down_out(cx.listener(|this, _, _window, _cx| {
                this.dragging_title_bar = false;
            }))
            .on_mouse_move(cx.listener(|this, _, window, _cx| {
                if std::mem::take(&mut this.dragging_title_bar) {
                    window.start_window_move();
                }
            }))
            .child(
                h_flex()
                    .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                    .child(Self::shell_button(
                        "title-toggle-sidebar",
                        toggle_icon,
                        cx,
                        Self::toggle_sidebar,
                    )),
            )
            .child(
                div()
                    .flex_1()
                    .text_sm()
                    .font_weight(FontWeight::SEMIBOLD)
                    .text_color(theme.foreground)
                    .child("Parley"),
            )
            .child(
                div()
                    .id("backend-host")
                    .px_2()
                    .py_1()
                    .rounded_full()
                    .bg(theme.muted)
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(backend_label),
            )
            .child(
                h_flex()
                    .gap_1()
                    // Buttons keep their clicks; only the bare bar moves the window.
                    .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                    .child(Self::shell_button("title-new-chat", IconName::Plus, cx, Self::new_chat))
                    .child(Self::shell_button(
                        "title-settings",
                        IconName::Settings,
                        cx,
                        Self::open_settings,
                    ))
                    .when(cfg!(target_os = "linux"), |controls| {
                        controls.child(render_window_controls(window))
                    }),
            )
            .when(
                cfg!(target_os = "linux") && window.window_controls().window_menu,
                |bar| {
                    bar.on_mouse_down(MouseButton::Right, |event, window, _| {
                        window.show_window_menu(event.position);
                    })
                },
            )
    }

    fn render_sidebar(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let content = if self.layout.collapsed {
            v_flex()
                .id("collapsed-sidebar")
                .size_full()
                .items_center()
                .py_3()
                .gap_2()
                .child(Self::shell_button(
                    "collapsed-new-chat",
                    IconName::Plus,
                    cx,
                    Self::new_chat,
                ))
                .into_any_element()
        } else {
            self.chat_view.read(cx).sidebar().clone().into_any_element()
        };

        div()
            .id("sidebar-container")
            .h_full()
            .min_w_0()
            .flex_shrink_0()
            .w(px(self.layout.shown_width()))
            .overflow_hidden()
            .bg(theme.background)
            .border_r_1()
            .border_color(theme.border)
            .child(content)
    }

    fn render_resize_handle(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("sidebar-resize-handle")
            .w(px(1.0))
            .h_full()
            .flex_shrink_0()
            .cursor(CursorStyle::ResizeLeftRight)
            .bg(theme.border)
            .hover(|el| el.bg(theme.primary))
            .on_drag(SidebarResize, |drag, _, _, cx| cx.new(|_| drag.clone()))
            .on_drag_move::<SidebarResize>(cx.listener(
                |this, event: &DragMoveEvent<SidebarResize>, _window, cx| {
                    this.layout = this.layout.resized(event.event.position.x.into());
                    cx.notify();
                },
            ))
    }
}

/// Client-side window buttons for Linux, where the title bar is drawn by the app.
fn render_window_controls(window: &Window) -> impl IntoElement {
    let maximize_icon = if window.is_maximized() {
        IconName::WindowRestore
    } else {
        IconName::WindowMaximize
    };
    let controls: [(&'static str, IconName, fn(&mut Window)); 3] = [
        ("window-minimize", IconName::WindowMinimize, |window| {
            window.minimize_window()
        }),
        ("window-maximize", maximize_icon, |window| window.zoom_window()),
        ("window-close", IconName::WindowClose, |window| window.remove_window()),
    ];

    h_flex()
        .id("window-controls")
        .ml_2()
        .gap_1()
        .on_mouse_down(MouseButton::Right, |_, _, cx| cx.stop_propagation())
        .children(controls.into_iter().map(|(id, icon, action)| {
            Button::new(id)
                .ghost()
                .small()
                .icon(icon)
                .on_click(move |_, window, _| action(window))
        }))
}

impl Render for AppShell {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("app-shell")
            .size_full()
            .bg(theme.background)
            .on_action(cx.listener(|this, _: &NewChat, _window, cx| this.new_chat(cx)))
            .on_action(cx.listener(|this, _: &ToggleSidebar, _window, cx| {
                this.toggle_sidebar(cx)
            }))
            .on_action(cx.listener(|this, _: &OpenSettings, _window, cx| {
                this.open_settings(cx)
            }))
            .child(self.render_title_bar(window, cx))
            .child(
                h_flex()
                    .id("app-shell-body")
                    .flex_1()
                    .min_w_0()
                    .min_h_0()
                    .overflow_hidden()
                    .child(self.render_sidebar(cx))
                    .when(!self.layout.collapsed, |body| {
                        body.child(self.render_resize_handle(cx))
                    })
                    .child(
                        v_flex()
                            .id("main-content")
                            .flex_1()
                            .h_full()
                            .min_w_0()
                            .min_h_0()
                            .overflow_hidden()
                            .child(self.chat_view.clone()),
                    ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_width_is_clamped() {
        assert_eq!(compute_sidebar_width(10.0), SIDEBAR_MIN_WIDTH);
        assert_eq!(compute_sidebar_width(300.0), 300.0);
        assert_eq!(compute_sidebar_width(2000.0), SIDEBAR_MAX_WIDTH);
    }

    #[test]
    fn collapsed_sidebar_keeps_its_width_for_later() {
        let layout = SidebarLayout::default().resized(330.0).toggled();

        assert_eq!(layout.shown_width(), SIDEBAR_COLLAPSED_WIDTH);
        assert_eq!(layout.toggled().shown_width(), 330.0);
    }

    #[test]
    fn themes_load_from_the_working_directory() {
        assert_eq!(default_themes_path(), PathBuf::from("./themes"));
    }
}
