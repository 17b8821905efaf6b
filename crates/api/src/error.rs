use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("failed to build HTTP client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("backend URL '{raw}' is invalid on `{stage}`: {source}"))]
    InvalidBaseUrl {
        stage: &'static str,
        raw: String,
        source: url::ParseError,
    },
    #[snafu(display("backend URL '{raw}' cannot carry request paths on `{stage}`"))]
    OpaqueBaseUrl { stage: &'static str, raw: String },
    #[snafu(display("session cookie is not a valid header value on `{stage}`"))]
    InvalidCookie { stage: &'static str },
    #[snafu(display("request to {path} failed on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        path: String,
        source: reqwest::Error,
    },
    #[snafu(display("request to {path} was rejected as unauthenticated on `{stage}`"))]
    Unauthorized { stage: &'static str, path: String },
    #[snafu(display("request to {path} returned HTTP {status} on `{stage}`: {body}"))]
    Status {
        stage: &'static str,
        path: String,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode response from {path} on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        path: String,
        source: reqwest::Error,
    },
}

impl ApiError {
    /// True when the backend answered 401, i.e. the session is gone.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
