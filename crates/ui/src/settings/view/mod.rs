use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, IndexPath, Sizable, ThemeMode, ThemeRegistry,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputState},
    select::{Select, SelectState},
    v_flex,
};
use parley_api::BackendConfig;

use crate::settings::state::{ClientSettings, SettingsState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCategory {
    Connection,
    Theme,
}

impl SettingsCategory {
    const ALL: [SettingsCategory; 2] = [SettingsCategory::Connection, SettingsCategory::Theme];

    fn label(self) -> &'static str {
        match self {
            SettingsCategory::Connection => "Connection",
            SettingsCategory::Theme => "Theme",
        }
    }

    fn id(self) -> &'static str {
        match self {
            SettingsCategory::Connection => "settings-category-connection",
            SettingsCategory::Theme => "settings-category-theme",
        }
    }
}

pub struct SettingsView {
    state: Entity<SettingsState>,
    category: SettingsCategory,
    backend_url_input: Entity<InputState>,
    session_cookie_input: Entity<InputState>,
    timeout_input: Entity<InputState>,
    theme_preset_select: Entity<SelectState<Vec<SharedString>>>,
    theme_mode: ThemeMode,
    error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsClose;

impl EventEmitter<SettingsClose> for SettingsView {}

impl SettingsView {
    fn theme_names(cx: &App) -> Vec<SharedString> {
        ThemeRegistry::global(cx)
            .sorted_themes()
            .iter()
            .map(|theme| theme.name.clone())
            .collect()
    }

    fn selected_theme_index(
        theme_names: &[SharedString],
        selected_theme_name: &str,
    ) -> Option<IndexPath> {
        if selected_theme_name.trim().is_empty() {
            return None;
        }

        theme_names
            .iter()
            .position(|theme_name| theme_name.as_ref() == selected_theme_name.trim())
            .map(|index| IndexPath::default().row(index))
    }

    pub fn new(state: &Entity<SettingsState>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let settings = state.read(cx).settings();

        let backend_url_input = cx.new(|cx| {
            InputState::new(window, cx).placeholder("Server address (e.g., http://127.0.0.1:5500)")
        });
        let session_cookie_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Session cookie (session=...)"));
        let timeout_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Request timeout in seconds"));

        let theme_names = Self::theme_names(cx);
        let selected_theme_index = Self::selected_theme_index(&theme_names, &settings.theme_name);
        let theme_preset_select = cx.new(|cx| {
            SelectState::new(theme_names, selected_theme_index, window, cx).searchable(true)
        });

        let mut view = Self {
            state: state.clone(),
            category: SettingsCategory::Connection,
            backend_url_input,
            session_cookie_input,
            timeout_input,
            theme_preset_select,
            theme_mode: settings.theme_mode,
            error_message: None,
        };
        view.fill_inputs(&settings, window, cx);
        view
    }

    fn fill_inputs(&mut self, settings: &ClientSettings, window: &mut Window, cx: &mut Context<Self>) {
        self.backend_url_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.backend_url.clone(), window, cx);
        });
        self.session_cookie_input.update(cx, |input_state, cx| {
            input_state.set_value(settings.session_cookie.clone(), window, cx);
        });
        let timeout = settings
            .request_timeout_secs
            .map(|secs| secs.to_string())
            .unwrap_or_default();
        self.timeout_input.update(cx, |input_state, cx| {
            input_state.set_value(timeout, window, cx);
        });
    }

    fn select_category(&mut self, category: SettingsCategory, cx: &mut Context<Self>) {
        if self.category != category {
            self.category = category;
            cx.notify();
        }
    }

    fn select_theme_mode(&mut self, mode: ThemeMode, cx: &mut Context<Self>) {
        if self.theme_mode != mode {
            self.theme_mode = mode;
            cx.notify();
        }
    }

    fn collect_settings(&self, cx: &App) -> Result<ClientSettings, String> {
        let backend_url = self.backend_url_input.read(cx).value().to_string();
        let session_cookie = self.session_cookie_input.read(cx).value().to_string();
        let request_timeout_secs = parse_timeout(&self.timeout_input.read(cx).value())?;
        let theme_name = self
            .theme_preset_select
            .read(cx)
            .selected_value()
            .map(|theme_name| theme_name.to_string())
            .unwrap_or_default();

        let settings = ClientSettings {
            backend_url,
            session_cookie,
            request_timeout_secs,
            theme_mode: self.theme_mode,
            theme_name,
        }
        .normalized();

        settings
            .backend_config()
            .map_err(|error| format!("Invalid server address: {error}"))?;
        Ok(settings)
    }

    fn save_settings(&mut self, _event: &ClickEvent, window: &mut Window, cx: &mut Context<Self>) {
        let new_settings = match self.collect_settings(cx) {
            Ok(settings) => settings,
            Err(message) => {
                self.error_message = Some(message);
                cx.notify();
                return;
            }
        };

        match self
            .state
            .update(cx, |state, cx| state.update_settings(new_settings, cx))
        {
            Ok(()) => {
                self.error_message = None;
                cx.emit(SettingsClose);
                window.remove_window();
            }
            Err(error) => {
                tracing::warn!(%error, "failed to save settings");
                self.error_message = Some(format!("Failed to save settings: {error}"));
                cx.notify();
            }
        }
    }

    fn cancel(&mut self, _event: &ClickEvent, window: &mut Window, cx: &mut Context<Self>) {
        self.error_message = None;
        cx.emit(SettingsClose);
        window.remove_window();
    }

    fn render_category_list(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .w(px(160.))
            .h_full()
            .gap_1()
            .p_2()
            .border_r_1()
            .border_color(theme.border)
            .bg(theme.muted)
            .children(SettingsCategory::ALL.into_iter().map(|category| {
                Button::new(category.id())
                    .small()
                    .w_full()
                    .when(self.category == category, |button| button.primary())
                    .when(self.category != category, |button| button.ghost())
                    .child(category.label())
                    .on_click(cx.listener(move |this, _event, _window, cx| {
                        this.select_category(category, cx);
                    }))
            }))
    }

    fn render_connection(&self, cx: &Context<Self>) -> AnyElement {
        let resolved = describe_backend(&self.backend_url_input.read(cx).value())
            .map(|url| format!("Requests go to {url}"));

        settings_section("settings-connection", "Connection", cx)
            .child(settings_field(
                "Server",
                Input::new(&self.backend_url_input).w_full(),
                resolved,
                cx,
            ))
            .child(settings_field(
                "Session Cookie",
                Input::new(&self.session_cookie_input).w_full(),
                Some("Copied from a browser that is signed in to the server.".to_string()),
                cx,
            ))
            .child(settings_field(
                "Request Timeout",
                Input::new(&self.timeout_input).w_full(),
                Some("Seconds. Leave blank to wait as long as the server needs.".to_string()),
                cx,
            ))
            .into_any_element()
    }

    fn render_appearance(&self, cx: &Context<Self>) -> AnyElement {
        let mode_buttons = h_flex().gap_2().children(
            [("Light", ThemeMode::Light), ("Dark", ThemeMode::Dark)].map(|(label, mode)| {
                Button::new(SharedString::from(format!("settings-mode-{label}")))
                    .small()
                    .when(self.theme_mode == mode, |button| button.primary())
                    .when(self.theme_mode != mode, |button| button.ghost())
                    .child(label)
                    .on_click(cx.listener(move |this, _, _window, cx| {
                        this.select_theme_mode(mode, cx);
                    }))
            }),
        );
        let preset = Select::new(&self.theme_preset_select)
            .w_full()
            .placeholder("Follow mode")
            .search_placeholder("Search theme preset")
            .cleanable(true);

        settings_section("settings-appearance", "Appearance", cx)
            .child(settings_field("Mode", mode_buttons, None, cx))
            .child(settings_field(
                "Preset",
                preset,
                Some("A preset overrides the mode with its own palette.".to_string()),
                cx,
            ))
            .into_any_element()
    }

    fn render_footer(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .gap_2()
            .p_4()
            .when_some(self.error_message.clone(), |el, error| {
                el.child(div().text_sm().text_color(theme.danger).child(error))
            })
            .child(
                h_flex()
                    .gap_2()
                    .justify_end()
                    .child(
                        Button::new("settings-cancel")
                            .ghost()
                            .small()
                            .child("Cancel")
                            .on_click(cx.listener(Self::cancel)),
                    )
                    .child(
                        Button::new("settings-save")
                            .primary()
                            .small()
                            .child("Save")
                            .on_click(cx.listener(Self::save_settings)),
                    ),
            )
    }
}

impl Render for SettingsView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let body = match self.category {
            SettingsCategory::Connection => self.render_connection(cx),
            SettingsCategory::Theme => self.render_appearance(cx),
        };
        let background = cx.theme().background;

        h_flex()
            .id("settings-view")
            .size_full()
            .bg(background)
            .child(self.render_category_list(cx))
            .child(
                v_flex()
                    .flex_1()
                    .h_full()
                    .justify_between()
                    .child(div().flex_1().overflow_y_scroll().child(body))
                    .child(self.render_footer(cx)),
            )
    }
}

fn settings_section(
    id: &'static str,
    title: &'static str,
    cx: &Context<SettingsView>,
) -> Stateful<Div> {
    let theme = cx.theme();

    v_flex().id(id).gap_4().p_4().child(
        div()
            .text_lg()
            .font_weight(FontWeight::SEMIBOLD)
            .text_color(theme.foreground)
            .child(title),
    )
}

fn settings_field(
    label: &'static str,
    control: impl IntoElement,
    hint: Option<String>,
    cx: &Context<SettingsView>,
) -> Div {
    let theme = cx.theme();

    v_flex()
        .gap_1()
        .child(div().text_sm().text_color(theme.foreground).child(label))
        .child(control)
        .when_some(hint, |field, hint| {
            field.child(div().text_xs().text_color(theme.muted_foreground).child(hint))
        })
}

/// Blank means no timeout.
fn parse_timeout(raw: &str) -> Result<Option<u64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| format!("Request timeout must be a whole number of seconds, got `{raw}`"))
}

/// Shown next to the address field so the user sees where requests go.
fn describe_backend(raw: &str) -> Option<String> {
    BackendConfig::parse(raw.trim())
        .ok()
        .map(|config| config.base_url().to_string())
}
