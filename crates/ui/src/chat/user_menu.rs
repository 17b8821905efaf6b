use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};
use parley_client::{Avatar, IdentityDisplay, MenuAction, UserMenu};

use crate::chat::events::MenuActionChosen;

const AVATAR_SIZE: Pixels = px(32.);

/// Identity block at the bottom of the sidebar, with the account menu.
pub struct UserPanel {
    identity: Option<IdentityDisplay>,
    menu: Option<UserMenu>,
    menu_open: bool,
}

impl EventEmitter<MenuActionChosen> for UserPanel {}

impl UserPanel {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            identity: None,
            menu: None,
            menu_open: false,
        }
    }

    pub fn set_identity(&mut self, identity: IdentityDisplay, cx: &mut Context<Self>) {
        self.identity = Some(identity);
        cx.notify();
    }

    pub fn set_menu(&mut self, menu: UserMenu, cx: &mut Context<Self>) {
        self.menu = Some(menu);
        cx.notify();
    }

    fn toggle_menu(&mut self, cx: &mut Context<Self>) {
        self.menu_open = !self.menu_open && self.menu.is_some();
        cx.notify();
    }

    fn choose(&mut self, action: MenuAction, cx: &mut Context<Self>) {
        self.menu_open = false;
        cx.emit(MenuActionChosen { action });
        cx.notify();
    }

    fn render_avatar(&self, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let frame = div()
            .id("user-avatar")
            .size(AVATAR_SIZE)
            .flex_shrink_0()
            .rounded_full()
            .overflow_hidden()
            .border_1()
            .border_color(theme.border)
            .bg(theme.muted)
            .flex()
            .items_center()
            .justify_center();

        match self.identity.as_ref().map(|identity| &identity.avatar) {
            Some(Avatar::Picture(url)) => frame
                .child(img(url.clone()).size_full().rounded_full())
                .into_any_element(),
            Some(Avatar::Initials(initials)) => frame
                .child(
                    Label::new(initials.clone())
                        .text_xs()
                        .text_color(theme.foreground),
                )
                .into_any_element(),
            Some(Avatar::Guest) | None => frame
                .child(
                    Icon::new(IconName::CircleUser)
                        .size(px(18.))
                        .text_color(theme.foreground),
                )
                .into_any_element(),
        }
    }

    fn render_menu(&self, menu: UserMenu, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("user-menu")
            .w_full()
            .gap_1()
            .p_1()
            .rounded_md()
            .border_1()
            .border_color(theme.border)
            .bg(theme.popover)
            .children(menu.actions().iter().copied().map(|action| {
                let button = Button::new(menu_item_id(action))
                    .ghost()
                    .small()
                    .w_full()
                    .child(action.label())
                    .on_click(cx.listener(move |this, _, _window, cx| {
                        this.choose(action, cx);
                    }));
                if matches!(action, MenuAction::ClearAll) {
                    button.icon(IconName::Delete)
                } else {
                    button
                }
            }))
    }
}

impl Render for UserPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let (name, subtitle) = self
            .identity
            .as_ref()
            .map(|identity| (identity.name.clone(), identity.subtitle.clone()))
            .unwrap_or_else(|| ("Connecting...".to_string(), String::new()));
        let open_menu = self.menu.filter(|_| self.menu_open);

        v_flex()
            .w_full()
            .gap_2()
            .px_3()
            .py_2()
            .border_t_1()
            .border_color(theme.border)
            .when_some(open_menu, |column, menu| {
                column.child(self.render_menu(menu, cx))
            })
            .child(
                h_flex()
                    .w_full()
                    .min_w_0()
                    .gap_2()
                    .items_center()
                    .child(self.render_avatar(cx))
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w_0()
                            .child(div().truncate().child(Label::new(name).text_sm()))
                            .when(!subtitle.is_empty(), |column| {
                                column.child(
                                    div().truncate().child(
                                        Label::new(subtitle)
                                            .text_xs()
                                            .text_color(theme.muted_foreground),
                                    ),
                                )
                            }),
                    )
                    .when(self.menu.is_some(), |row| {
                        row.child(
                            Button::new("user-menu-toggle")
                                .ghost()
                                .small()
                                .icon(IconName::ChevronDown)
                                .on_click(cx.listener(|this, _, _window, cx| {
                                    this.toggle_menu(cx);
                                })),
                        )
                    }),
            )
    }
}

fn menu_item_id(action: MenuAction) -> &'static str {
    match action {
        MenuAction::SignIn => "user-menu-sign-in",
        MenuAction::ManageAccount => "user-menu-manage-account",
        MenuAction::Settings => "user-menu-settings",
        MenuAction::ClearAll => "user-menu-clear-all",
        MenuAction::SignOut => "user-menu-sign-out",
        MenuAction::ExitGuest => "user-menu-exit-guest",
    }
}
