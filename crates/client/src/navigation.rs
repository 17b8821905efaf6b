use parley_api::BackendConfig;
use url::Url;

pub const MANAGE_ACCOUNT_URL: &str = "https://myaccount.google.com/";

/// Pages outside the chat client the user is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Landing page for unauthenticated sessions.
    SignIn,
    /// Starts the sign-in flow from a guest session.
    Login,
    /// Ends the session, guest or not.
    Logout,
    ManageAccount,
}

impl Navigation {
    pub fn page(self) -> Option<&'static str> {
        match self {
            Self::SignIn => Some("signin"),
            Self::Login => Some("login"),
            Self::Logout => Some("logout"),
            Self::ManageAccount => None,
        }
    }

    pub fn url(self, config: &BackendConfig) -> Url {
        match self.page() {
            Some(page) => config.endpoint(&[page]),
            None => Url::parse(MANAGE_ACCOUNT_URL).unwrap_or_else(|_| config.base_url().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_resolve_against_backend() {
        let config = BackendConfig::parse("http://localhost:5500").expect("URL parses");

        assert_eq!(Navigation::SignIn.url(&config).as_str(), "http://localhost:5500/signin");
        assert_eq!(Navigation::Login.url(&config).as_str(), "http://localhost:5500/login");
        assert_eq!(Navigation::Logout.url(&config).as_str(), "http://localhost:5500/logout");
        assert_eq!(Navigation::ManageAccount.url(&config).as_str(), MANAGE_ACCOUNT_URL);
    }
}
