use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use snafu::{OptionExt, ResultExt, ensure};
use url::Url;

use crate::backend::{BoxFuture, ChatBackend};
use crate::error::{
    ApiResult, BuildClientSnafu, DecodeSnafu, InvalidBaseUrlSnafu, InvalidCookieSnafu,
    OpaqueBaseUrlSnafu, RequestSnafu, StatusSnafu, UnauthorizedSnafu,
};
use crate::ids::ChatId;
use crate::types::{ChatDetail, ChatSummary, MessageReply, OutboundMessage, User};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5500";

/// Where the backend lives and how requests authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base_url: Url,
    session_cookie: Option<String>,
    request_timeout: Option<Duration>,
}

impl BackendConfig {
    pub fn parse(raw: &str) -> ApiResult<Self> {
        let raw = raw.trim();
        let base_url = Url::parse(raw).context(InvalidBaseUrlSnafu {
            stage: "parse-backend-url",
            raw,
        })?;
        ensure!(
            !base_url.cannot_be_a_base(),
            OpaqueBaseUrlSnafu {
                stage: "parse-backend-url",
                raw,
            }
        );

        Ok(Self {
            base_url,
            session_cookie: None,
            request_timeout: None,
        })
    }

    /// Raw `Cookie` header value, e.g. `session=abc123`. Blank means none.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        self.session_cookie = if cookie.trim().is_empty() {
            None
        } else {
            Some(cookie.trim().to_string())
        };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie).ok().context(InvalidCookieSnafu {
                stage: "build-cookie-header",
            })?;
            headers.insert(COOKIE, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(BuildClientSnafu {
            stage: "build-http-client",
        })?;

        tracing::info!(base_url = %config.base_url, "chat backend client ready");
        Ok(Self { client, config })
    }

    async fn execute(
        &self,
        stage: &'static str,
        request: RequestBuilder,
        path: &str,
    ) -> ApiResult<Response> {
        let response = request.send().await.context(RequestSnafu { stage, path })?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return UnauthorizedSnafu { stage, path }.fail();
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(stage, path, status = status.as_u16(), "backend rejected request");
            return StatusSnafu {
                stage,
                path,
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        request: RequestBuilder,
        path: &str,
    ) -> ApiResult<T> {
        let response = self.execute(stage, request, path).await?;
        response.json::<T>().await.context(DecodeSnafu { stage, path })
    }
}

impl ChatBackend for HttpBackend {
    fn current_user(&self) -> BoxFuture<'_, ApiResult<User>> {
        Box::pin(async move {
            let url = self.config.endpoint(&["api", "user"]);
            let path = url.path().to_string();
            self.fetch_json("fetch-current-user", self.client.get(url), &path)
                .await
        })
    }

    fn list_chats(&self) -> BoxFuture<'_, ApiResult<Vec<ChatSummary>>> {
        Box::pin(async move {
            let url = self.config.endpoint(&["api", "chats"]);
            let path = url.path().to_string();
            self.fetch_json("list-chats", self.client.get(url), &path)
                .await
        })
    }

    fn create_chat(&self) -> BoxFuture<'_, ApiResult<ChatSummary>> {
        Box::pin(async move {
            let url = self.config.endpoint(&["api", "chats"]);
            let path = url.path().to_string();
            self.fetch_json("create-chat", self.client.post(url), &path)
                .await
        })
    }

    fn get_chat<'a>(&'a self, chat_id: &'a ChatId) -> BoxFuture<'a, ApiResult<ChatDetail>> {
        Box::pin(async move {
            let url = self.config.endpoint(&["api", "chats", chat_id.as_str()]);
            let path = url.path().to_string();
            let mut detail: ChatDetail = self
                .fetch_json("fetch-chat-detail", self.client.get(url), &path)
                .await?;
            if detail.chat_id.is_empty() {
                detail.chat_id = chat_id.clone();
            }
            Ok(detail)
        })
    }

    fn delete_chat<'a>(&'a self, chat_id: &'a ChatId) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let url = self.config.endpoint(&["api", "chats", chat_id.as_str()]);
            let path = url.path().to_string();
            self.execute("delete-chat", self.client.delete(url), &path)
                .await?;
            Ok(())
        })
    }

    fn send_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, ApiResult<MessageReply>> {
        Box::pin(async move {
            let url = self
                .config
                .endpoint(&["api", "chats", chat_id.as_str(), "message"]);
            let path = url.path().to_string();
            self.fetch_json("send-chat-message", self.client.post(url).json(message), &path)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn endpoint_appends_segments_to_root_url() {
        let config = BackendConfig::parse(DEFAULT_BACKEND_URL).expect("default URL parses");

        assert_eq!(
            config.endpoint(&["api", "chats"]).as_str(),
            "http://127.0.0.1:5500/api/chats"
        );
    }

    #[test]
    fn endpoint_keeps_mount_prefix_and_encodes_ids() {
        let config =
            BackendConfig::parse("https://chat.example.com/app/").expect("prefixed URL parses");

        assert_eq!(
            config.endpoint(&["api", "chats", "a/b c", "message"]).as_str(),
            "https://chat.example.com/app/api/chats/a%2Fb%20c/message"
        );
    }

    #[test]
    fn opaque_urls_are_rejected() {
        let error = BackendConfig::parse("mailto:someone@example.com")
            .expect_err("mailto cannot carry paths");

        assert!(matches!(error, ApiError::OpaqueBaseUrl { .. }));
    }

    #[test]
    fn blank_cookie_is_dropped() {
        let config = BackendConfig::parse(DEFAULT_BACKEND_URL)
            .expect("default URL parses")
            .with_session_cookie("   ");

        assert_eq!(config.session_cookie, None);
    }

    #[test]
    fn cookie_with_newline_fails_client_build() {
        let config = BackendConfig::parse(DEFAULT_BACKEND_URL)
            .expect("default URL parses")
            .with_session_cookie("session=abc\nInjected: yes");

        let error = HttpBackend::new(config)
            .err()
            .expect("header value must be rejected");
        assert!(matches!(error, ApiError::InvalidCookie { .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_reports_request_error() {
        let config = BackendConfig::parse("http://127.0.0.1:9")
            .expect("URL parses")
            .with_request_timeout(Some(Duration::from_secs(2)));
        let backend = HttpBackend::new(config).expect("client builds");

        let error = backend
            .list_chats()
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(error, ApiError::Request { .. }));
        assert!(!error.is_unauthorized());
    }
}
