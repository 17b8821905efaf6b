use std::path::PathBuf;

use parley_api::ApiError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttachmentError {
    #[snafu(display("failed to read attachment {path:?} on `{stage}`: {source}"))]
    ReadFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("attachment {path:?} is not valid UTF-8 text on `{stage}`: {source}"))]
    DecodeText {
        stage: &'static str,
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ControllerError {
    #[snafu(display("no authenticated session on `{stage}`: {source}"))]
    Unauthenticated {
        stage: &'static str,
        source: ApiError,
    },
    #[snafu(display("chat backend call failed on `{stage}`: {source}"))]
    Backend {
        stage: &'static str,
        source: ApiError,
    },
    #[snafu(display("{failed} of {total} chat deletions failed on `{stage}`"))]
    ClearAllIncomplete {
        stage: &'static str,
        failed: usize,
        total: usize,
    },
}

pub type ControllerResult<T> = Result<T, ControllerError>;
