use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, Root, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};
use gpui_tokio_bridge::Tokio;
use parley_api::{BackendConfig, HttpBackend};
use parley_client::{
    ChatController, ControllerResult, FsAttachmentReader, MenuAction, Navigation,
    PendingAttachment,
};
use tokio::sync::{mpsc, oneshot};

use crate::chat::events::{
    AttachRequested, AttachmentRemoved, ChatSelected, DeleteChatRequested, MenuActionChosen,
    NewChatRequested, Submit,
};
use crate::chat::message::MessageRow;
use crate::chat::surface::{ChannelSurface, SurfaceEvent};
use crate::chat::user_menu::UserPanel;
use crate::chat::{ChatSidebar, MessageInput, MessageList};
use crate::settings::{SettingsChanged, SettingsClose, SettingsState, SettingsView};

/// A confirmation the controller is waiting on.
struct PendingConfirm {
    prompt: String,
    reply: oneshot::Sender<bool>,
}

/// Parent coordinator: owns the controller and turns surface calls into view updates.
pub struct ChatView {
    sidebar: Entity<ChatSidebar>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    user_panel: Entity<UserPanel>,
    settings_state: Entity<SettingsState>,
    settings_window: Option<WindowHandle<Root>>,
    controller: Option<ChatController>,
    backend_config: Option<BackendConfig>,
    surface_task: Option<Task<()>>,
    pending_confirm: Option<PendingConfirm>,
    alert: Option<String>,
    connection_error: Option<String>,
}

impl ChatView {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let user_panel = cx.new(UserPanel::new);
        let sidebar = cx.new(|cx| ChatSidebar::new(user_panel.clone(), window, cx));
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));
        let settings_state = SettingsState::new(cx);

        cx.subscribe(&sidebar, |this, _, event: &ChatSelected, cx| {
            let chat_id = event.chat_id.clone();
            this.run(cx, "load-chat", move |controller| async move {
                controller.load(&chat_id).await
            });
        })
        .detach();

        cx.subscribe(&sidebar, |this, _, event: &DeleteChatRequested, cx| {
            let chat_id = event.chat_id.clone();
            this.run(cx, "delete-chat", move |controller| async move {
                controller.delete(&chat_id).await.map(|_| ())
            });
        })
        .detach();

        cx.subscribe(&sidebar, |this, _, _event: &NewChatRequested, cx| {
            this.create_chat(cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            let text = event.text.clone();
            this.run(cx, "send-message", move |controller| async move {
                controller.send(&text).await.map(|_| ())
            });
        })
        .detach();

        cx.subscribe(&message_input, |this, _, _event: &AttachRequested, cx| {
            this.prompt_for_attachments(cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, event: &AttachmentRemoved, cx| {
            if let Some(controller) = this.controller.as_ref() {
                controller.remove_attachment(event.index);
            }
            this.sync_attachment_chips(cx);
        })
        .detach();

        cx.subscribe(&user_panel, |this, _, event: &MenuActionChosen, cx| {
            this.handle_menu_action(event.action, cx);
        })
        .detach();

        cx.subscribe_in(
            &settings_state,
            window,
            |this, _, event: &SettingsChanged, window, cx| {
                this.handle_settings_changed(event, window, cx);
            },
        )
        .detach();

        let mut this = Self {
            sidebar,
            message_list,
            message_input,
            user_panel,
            settings_state,
            settings_window: None,
            controller: None,
            backend_config: None,
            surface_task: None,
            pending_confirm: None,
            alert: None,
            connection_error: None,
        };
        this.connect(window, cx);
        this
    }

    pub fn sidebar(&self) -> &Entity<ChatSidebar> {
        &self.sidebar
    }

    /// Host shown in the title bar, or the raw setting when it does not parse.
    pub fn backend_label(&self, cx: &App) -> String {
        match self.backend_config.as_ref() {
            Some(config) => host_label(config),
            None => self.settings_state.read(cx).settings().backend_url.clone(),
        }
    }

    pub fn create_chat(&mut self, cx: &mut Context<Self>) {
        self.run(cx, "create-chat", |controller| async move {
            controller.create().await.map(|_| ())
        });
    }

    pub fn open_settings_panel(&mut self, cx: &mut Context<Self>) {
        self.open_settings(cx);
    }

    /// Builds a fresh backend and controller from the saved settings and bootstraps.
    fn connect(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.disconnect(cx);

        let settings = self.settings_state.read(cx).settings();
        let backend = match settings
            .backend_config()
            .and_then(|config| HttpBackend::new(config.clone()).map(|backend| (config, backend)))
        {
            Ok((config, backend)) => {
                self.backend_config = Some(config);
                backend
            }
            Err(error) => {
                tracing::error!(%error, "cannot reach chat backend with current settings");
                self.connection_error = Some(format!("Cannot connect: {error}"));
                cx.notify();
                return;
            }
        };

        let (surface, events) = ChannelSurface::new();
        let controller = ChatController::new(
            Arc::new(backend),
            Arc::new(surface),
            Arc::new(FsAttachmentReader),
        );
        self.controller = Some(controller);
        self.connection_error = None;
        self.spawn_surface_reader(events, window, cx);

        self.run(cx, "bootstrap", |controller| async move {
            controller.bootstrap().await
        });
        cx.notify();
    }

    /// Drops the controller and everything it drew. Pending confirmations resolve to `false`.
    fn disconnect(&mut self, cx: &mut Context<Self>) {
        self.surface_task = None;
        self.controller = None;
        self.backend_config = None;
        self.pending_confirm = None;
        self.alert = None;

        self.sidebar.update(cx, |sidebar, cx| {
            sidebar.rebuild(Vec::new(), cx);
            sidebar.set_active(None, cx);
        });
        self.message_list.update(cx, |list, cx| list.clear(cx));
        self.message_input
            .update(cx, |input, cx| input.set_attachments(Vec::new(), cx));
    }

    fn spawn_surface_reader(
        &mut self,
        mut events: mpsc::UnboundedReceiver<SurfaceEvent>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.surface_task = Some(cx.spawn_in(window, async move |this, cx| {
            while let Some(event) = events.recv().await {
                if this
                    .update_in(cx, |this, window, cx| {
                        this.apply_surface_event(event, window, cx);
                    })
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    /// Runs one controller operation on the tokio runtime.
    fn run<F, Fut>(&self, cx: &mut Context<Self>, operation: &'static str, task: F)
    where
        F: FnOnce(ChatController) -> Fut,
        Fut: Future<Output = ControllerResult<()>> + Send + 'static,
    {
        let Some(controller) = self.controller.clone() else {
            tracing::warn!(operation, "no chat backend connection");
            return;
        };

        let work = task(controller);
        Tokio::spawn(cx, async move {
            if let Err(error) = work.await {
                tracing::debug!(operation, %error, "chat operation ended with an error");
            }
        })
        .detach();
    }

    fn apply_surface_event(
        &mut self,
        event: SurfaceEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        match event {
            SurfaceEvent::Identity(identity) => {
                self.user_panel
                    .update(cx, |panel, cx| panel.set_identity(identity, cx));
            }
            SurfaceEvent::UserMenu(menu) => {
                self.user_panel.update(cx, |panel, cx| panel.set_menu(menu, cx));
            }
            SurfaceEvent::RebuildSidebar(chats) => {
                self.sidebar.update(cx, |sidebar, cx| sidebar.rebuild(chats, cx));
            }
            SurfaceEvent::PrependSidebarEntry(chat) => {
                self.sidebar.update(cx, |sidebar, cx| sidebar.prepend(chat, cx));
            }
            SurfaceEvent::RemoveSidebarEntry(chat_id) => {
                self.sidebar
                    .update(cx, |sidebar, cx| sidebar.remove(&chat_id, cx));
            }
            SurfaceEvent::MarkActive(chat_id) => {
                self.sidebar
                    .update(cx, |sidebar, cx| sidebar.set_active(chat_id, cx));
            }
            SurfaceEvent::ClearMessages => {
                self.message_list.update(cx, |list, cx| list.clear(cx));
            }
            SurfaceEvent::AppendMessage { slot, message } => {
                let row = MessageRow::new(slot, message, Local::now());
                self.message_list.update(cx, |list, cx| list.push(row, cx));
            }
            SurfaceEvent::ReplaceMessageText { slot, text } => {
                self.message_list
                    .update(cx, |list, cx| list.replace_text(slot, &text, cx));
            }
            SurfaceEvent::ClearComposer => {
                // The text went out with the submit; only the chips lag behind.
                self.sync_attachment_chips(cx);
            }
            SurfaceEvent::Alert(notice) => {
                self.alert = Some(notice);
                cx.notify();
            }
            SurfaceEvent::Confirm { prompt, reply } => {
                // A newer question supersedes one left unanswered.
                if let Some(stale) = self.pending_confirm.take() {
                    let _ = stale.reply.send(false);
                }
                self.pending_confirm = Some(PendingConfirm { prompt, reply });
                cx.notify();
            }
            SurfaceEvent::Navigate(target) => self.open_in_browser(target, cx),
        }
    }

    fn answer_confirm(&mut self, accepted: bool, cx: &mut Context<Self>) {
        if let Some(pending) = self.pending_confirm.take() {
            let _ = pending.reply.send(accepted);
        }
        cx.notify();
    }

    fn dismiss_alert(&mut self, cx: &mut Context<Self>) {
        self.alert = None;
        cx.notify();
    }

    fn open_in_browser(&mut self, target: Navigation, cx: &mut Context<Self>) {
        let Some(config) = self.backend_config.as_ref() else {
            return;
        };

        let url = target.url(config);
        tracing::info!(%url, ?target, "opening page in browser");
        if let Err(error) = open::that_detached(url.as_str()) {
            tracing::error!(%url, %error, "failed to open browser");
            self.alert = Some(format!("Open {url} in your browser to continue."));
            cx.notify();
        }
    }

    fn handle_menu_action(&mut self, action: MenuAction, cx: &mut Context<Self>) {
        if action == MenuAction::Settings {
            self.open_settings(cx);
            return;
        }

        self.run(cx, "menu-action", move |controller| async move {
            controller.run_menu_action(action).await
        });
    }

    fn prompt_for_attachments(&mut self, cx: &mut Context<Self>) {
        if self.controller.is_none() {
            return;
        }

        let paths = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: true,
            prompt: None,
        });

        cx.spawn(async move |this, cx| {
            match paths.await {
                Ok(Ok(Some(paths))) => {
                    let _ = this.update(cx, |this, cx| this.attach_paths(paths, cx));
                }
                Ok(Ok(None)) | Err(_) => {}
                Ok(Err(error)) => {
                    tracing::warn!(%error, "file picker failed");
                }
            }
        })
        .detach();
    }

    fn attach_paths(&mut self, paths: Vec<PathBuf>, cx: &mut Context<Self>) {
        let Some(controller) = self.controller.as_ref() else {
            return;
        };

        for path in paths {
            let attachment = PendingAttachment::from_path(path);
            tracing::debug!(name = %attachment.name, media_type = %attachment.media_type, "attachment queued");
            controller.attach(attachment);
        }
        self.sync_attachment_chips(cx);
    }

    fn sync_attachment_chips(&mut self, cx: &mut Context<Self>) {
        let names = self
            .controller
            .as_ref()
            .map(|controller| {
                controller
                    .pending_attachments()
                    .into_iter()
                    .map(|attachment| attachment.name)
                    .collect()
            })
            .unwrap_or_default();
        self.message_input
            .update(cx, |input, cx| input.set_attachments(names, cx));
    }

    fn open_settings(&mut self, cx: &mut Context<Self>) {
        if let Some(settings_window) = self.settings_window.as_ref()
            && settings_window
                .update(cx, |_, window, _| {
                    window.activate_window();
                })
                .is_ok()
        {
            return;
        }

        self.settings_window = None;

        let settings_state = self.settings_state.clone();
        let chat_view = cx.entity().downgrade();
        let settings_bounds = Bounds::centered(None, size(px(720.), px(520.)), cx);
        let settings_window = cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(settings_bounds)),
                titlebar: Some(TitlebarOptions {
                    appears_transparent: true,
                    traffic_light_position: Some(point(px(14.), px(14.))),
                    ..Default::default()
                }),
                ..Default::default()
            },
            move |window, cx| {
                let settings_view = cx.new(|cx| SettingsView::new(&settings_state, window, cx));
                cx.subscribe(&settings_view, move |_, _event: &SettingsClose, cx| {
                    let _ = chat_view.update(cx, |this, _| this.settings_window = None);
                })
                .detach();
                cx.new(|cx| Root::new(settings_view, window, cx))
            },
        );

        match settings_window {
            Ok(settings_window) => {
                self.settings_window = Some(settings_window);
            }
            Err(error) => {
                tracing::error!("failed to open settings window: {}", error);
            }
        }
    }

    fn handle_settings_changed(
        &mut self,
        event: &SettingsChanged,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        event.settings.apply_theme(None, cx);
        cx.refresh_windows();

        tracing::info!(backend_url = %event.settings.backend_url, "settings changed, reconnecting");
        self.connect(window, cx);
    }

    fn render_banner(
        &self,
        id: &'static str,
        text: String,
        action: Option<Button>,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id(id)
            .w_full()
            .gap_2()
            .px_4()
            .py_2()
            .items_center()
            .justify_between()
            .border_b_1()
            .border_color(theme.border)
            .bg(theme.muted)
            .child(
                div()
                    .flex_1()
                    .min_w_0()
                    .child(Label::new(text).text_sm().text_color(theme.danger)),
            )
            .when_some(action, |row, button| row.child(button))
    }

    fn render_confirm(&self, pending: &PendingConfirm, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("confirm-overlay")
            .absolute()
            .inset_0()
            .flex()
            .items_center()
            .justify_center()
            .bg(theme.background.opacity(0.6))
            .child(
                v_flex()
                    .id("confirm-dialog")
                    .w(px(360.))
                    .gap_4()
                    .p_4()
                    .rounded_lg()
                    .shadow_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.popover)
                    .child(Label::new(pending.prompt.clone()).text_sm())
                    .child(
                        h_flex()
                            .gap_2()
                            .justify_end()
                            .child(
                                Button::new("confirm-cancel")
                                    .ghost()
                                    .small()
                                    .child("Cancel")
                                    .on_click(cx.listener(|this, _, _window, cx| {
                                        this.answer_confirm(false, cx);
                                    })),
                            )
                            .child(
                                Button::new("confirm-accept")
                                    .danger()
                                    .small()
                                    .child("OK")
                                    .on_click(cx.listener(|this, _, _window, cx| {
                                        this.answer_confirm(true, cx);
                                    })),
                            ),
                    ),
            )
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        let connection_banner = self.connection_error.clone().map(|error| {
            let button = Button::new("connection-settings")
                .ghost()
                .small()
                .child("Settings")
                .on_click(cx.listener(|this, _, _window, cx| this.open_settings(cx)));
            self.render_banner("connection-error", error, Some(button), cx)
        });
        let alert_banner = self.alert.clone().map(|notice| {
            let button = Button::new("alert-dismiss")
                .ghost()
                .small()
                .child("Dismiss")
                .on_click(cx.listener(|this, _, _window, cx| this.dismiss_alert(cx)));
            self.render_banner("chat-alert", notice, Some(button), cx)
        });
        let confirm = self
            .pending_confirm
            .as_ref()
            .map(|pending| self.render_confirm(pending, cx));

        div()
            .size_full()
            .relative()
            .bg(theme.background)
            .child(
                v_flex()
                    .size_full()
                    .min_h_0()
                    .children(connection_banner)
                    .children(alert_banner)
                    .child(
                        div()
                            .flex_1()
                            .min_h_0()
                            .overflow_hidden()
                            .child(self.message_list.clone()),
                    )
                    .child(self.message_input.clone()),
            )
            .children(confirm)
    }
}

fn host_label(config: &BackendConfig) -> String {
    let url = config.base_url();
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => url.to_string(),
    }
}
