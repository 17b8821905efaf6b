use parley_api::User;

pub const GUEST_NOTICE: &str = "Guest session: sign in to keep your chats";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Picture(String),
    Initials(String),
    Guest,
}

/// What the identity block in the sidebar shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDisplay {
    pub name: String,
    pub subtitle: String,
    pub avatar: Avatar,
}

impl IdentityDisplay {
    pub fn for_user(user: &User) -> Self {
        let subtitle = if user.is_guest {
            GUEST_NOTICE.to_string()
        } else {
            user.email.clone()
        };

        let avatar = if user.is_guest {
            Avatar::Guest
        } else if let Some(picture) = user.picture_url() {
            Avatar::Picture(picture.to_string())
        } else {
            Avatar::Initials(initials(&user.name))
        };

        Self {
            name: user.name.clone(),
            subtitle,
            avatar,
        }
    }
}

/// First letter of each space-separated name part, uppercased.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SignIn,
    ManageAccount,
    Settings,
    ClearAll,
    SignOut,
    ExitGuest,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::SignIn => "Sign in",
            Self::ManageAccount => "Manage account",
            Self::Settings => "Settings",
            Self::ClearAll => "Clear all chats",
            Self::SignOut => "Sign out",
            Self::ExitGuest => "Exit guest mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMenu {
    Guest,
    Full,
}

impl UserMenu {
    pub fn for_user(user: &User) -> Self {
        if user.is_guest { Self::Guest } else { Self::Full }
    }

    pub fn actions(self) -> &'static [MenuAction] {
        match self {
            Self::Guest => &[
                MenuAction::SignIn,
                MenuAction::Settings,
                MenuAction::ClearAll,
                MenuAction::ExitGuest,
            ],
            Self::Full => &[
                MenuAction::ManageAccount,
                MenuAction::Settings,
                MenuAction::ClearAll,
                MenuAction::SignOut,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, picture: Option<&str>, is_guest: bool) -> User {
        User {
            name: name.to_string(),
            email: "someone@example.com".to_string(),
            picture: picture.map(str::to_string),
            is_guest,
        }
    }

    #[test]
    fn initials_skip_repeated_spaces() {
        assert_eq!(initials("ada  king lovelace"), "AKL");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn guest_gets_notice_icon_and_guest_menu() {
        let guest = user("Guest User", Some(""), true);
        let identity = IdentityDisplay::for_user(&guest);

        assert_eq!(identity.subtitle, GUEST_NOTICE);
        assert_eq!(identity.avatar, Avatar::Guest);
        assert_eq!(UserMenu::for_user(&guest).actions()[0], MenuAction::SignIn);
        assert!(UserMenu::Guest.actions().contains(&MenuAction::ExitGuest));
    }

    #[test]
    fn full_user_avatar_prefers_picture_then_initials() {
        let with_picture = user("Ada Lovelace", Some("https://example.com/ada.png"), false);
        let without_picture = user("Ada Lovelace", Some(" "), false);

        assert_eq!(
            IdentityDisplay::for_user(&with_picture).avatar,
            Avatar::Picture("https://example.com/ada.png".to_string())
        );
        assert_eq!(
            IdentityDisplay::for_user(&without_picture).avatar,
            Avatar::Initials("AL".to_string())
        );
        assert_eq!(
            IdentityDisplay::for_user(&without_picture).subtitle,
            "someone@example.com"
        );
        assert_eq!(
            UserMenu::for_user(&with_picture).actions(),
            &[
                MenuAction::ManageAccount,
                MenuAction::Settings,
                MenuAction::ClearAll,
                MenuAction::SignOut,
            ]
        );
    }
}
