use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_api::{BoxFuture, FileMeta};
use snafu::ResultExt;

use crate::error::{AttachmentResult, DecodeTextSnafu, ReadFileSnafu};

/// Text attachments contribute at most this many characters to a message.
pub const TEXT_PREVIEW_CHARS: usize = 1000;

const ATTACHED_FILES_HEADER: &str = "Attached files:";

/// A file queued in the composer but not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub name: String,
    pub media_type: String,
    pub path: PathBuf,
}

impl PendingAttachment {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            path: path.into(),
        }
    }

    /// Builds an attachment for a file on disk, guessing the media type from its extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for(&path).to_string();
        Self {
            name,
            media_type,
            path,
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::classify(&self.name, &self.media_type)
    }

    pub fn file_meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            media_type: self.media_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Text,
    Other,
}

impl AttachmentKind {
    pub fn classify(name: &str, media_type: &str) -> Self {
        if media_type.starts_with("image/") {
            return Self::Image;
        }

        let text_type = matches!(media_type, "text/plain" | "application/json" | "text/csv");
        let lowered = name.to_ascii_lowercase();
        let text_extension = [".txt", ".json", ".csv"]
            .iter()
            .any(|extension| lowered.ends_with(extension));

        if text_type || text_extension {
            Self::Text
        } else {
            Self::Other
        }
    }
}

/// An attachment after its contents were read and summarized for the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedAttachment {
    pub name: String,
    pub media_type: String,
    pub kind: AttachmentKind,
    /// Inline `data:` URL, images only.
    pub data: Option<String>,
    /// Decoded text, possibly truncated.
    pub content: Option<String>,
    pub summary: String,
}

/// Reads attachment contents. `FsAttachmentReader` is the disk-backed one.
pub trait AttachmentReader: Send + Sync {
    fn read_data_url<'a>(
        &'a self,
        attachment: &'a PendingAttachment,
    ) -> BoxFuture<'a, AttachmentResult<String>>;

    fn read_text<'a>(
        &'a self,
        attachment: &'a PendingAttachment,
    ) -> BoxFuture<'a, AttachmentResult<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsAttachmentReader;

impl FsAttachmentReader {
    async fn read_bytes(attachment: &PendingAttachment) -> AttachmentResult<Vec<u8>> {
        tokio::fs::read(&attachment.path).await.context(ReadFileSnafu {
            stage: "read-attachment-file",
            path: attachment.path.clone(),
        })
    }
}

impl AttachmentReader for FsAttachmentReader {
    fn read_data_url<'a>(
        &'a self,
        attachment: &'a PendingAttachment,
    ) -> BoxFuture<'a, AttachmentResult<String>> {
        Box::pin(async move {
            let bytes = Self::read_bytes(attachment).await?;
            Ok(format!(
                "data:{};base64,{}",
                attachment.media_type,
                STANDARD.encode(bytes)
            ))
        })
    }

    fn read_text<'a>(
        &'a self,
        attachment: &'a PendingAttachment,
    ) -> BoxFuture<'a, AttachmentResult<String>> {
        Box::pin(async move {
            let bytes = Self::read_bytes(attachment).await?;
            String::from_utf8(bytes).context(DecodeTextSnafu {
                stage: "decode-attachment-text",
                path: attachment.path.clone(),
            })
        })
    }
}

/// Reads and summarizes every pending attachment in order.
///
/// A file that fails to read still yields an entry whose summary is an
/// error marker, so one bad file never drops the others.
pub async fn process_attachments(
    reader: &dyn AttachmentReader,
    pending: &[PendingAttachment],
) -> Vec<ProcessedAttachment> {
    let mut processed = Vec::with_capacity(pending.len());
    for attachment in pending {
        processed.push(process_one(reader, attachment).await);
    }
    processed
}

async fn process_one(
    reader: &dyn AttachmentReader,
    attachment: &PendingAttachment,
) -> ProcessedAttachment {
    let kind = attachment.kind();
    let mut processed = ProcessedAttachment {
        name: attachment.name.clone(),
        media_type: attachment.media_type.clone(),
        kind,
        data: None,
        content: None,
        summary: String::new(),
    };

    let outcome = match kind {
        AttachmentKind::Image => reader.read_data_url(attachment).await.map(|data_url| {
            processed.data = Some(data_url);
            format!("[Image: {}]", attachment.name)
        }),
        AttachmentKind::Text => reader.read_text(attachment).await.map(|text| {
            let (preview, truncated) = truncate_chars(&text, TEXT_PREVIEW_CHARS);
            let summary = format!(
                "[File: {}]\n{}{}",
                attachment.name,
                preview,
                if truncated { "..." } else { "" }
            );
            processed.content = Some(preview);
            summary
        }),
        AttachmentKind::Other => Ok(format!(
            "[File: {} - {}]",
            attachment.name, attachment.media_type
        )),
    };

    processed.summary = match outcome {
        Ok(summary) => summary,
        Err(error) => {
            tracing::warn!(file = %attachment.name, %error, "failed to read attachment");
            format!("[Error reading file: {}]", attachment.name)
        }
    };
    processed
}

/// First `limit` characters of `text`, and whether anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => (text[..cut].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Message body sent to the backend: the typed text followed by one
/// summary block per attachment.
pub fn compose_payload(text: &str, summaries: &[&str]) -> String {
    if summaries.is_empty() {
        return text.to_string();
    }

    let attached = summaries.join("\n\n");
    if text.is_empty() {
        format!("{ATTACHED_FILES_HEADER}\n{attached}")
    } else {
        format!("{text}\n\n{ATTACHED_FILES_HEADER}\n{attached}")
    }
}

fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "txt" | "log" => "text/plain",
        "json" => "application/json",
        "csv" => "text/csv",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedReader;

    #[test]
    fn classification_follows_media_type_then_extension() {
        assert_eq!(AttachmentKind::classify("cat.png", "image/png"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::classify("data", "application/json"), AttachmentKind::Text);
        assert_eq!(
            AttachmentKind::classify("Report.CSV", "application/octet-stream"),
            AttachmentKind::Text
        );
        assert_eq!(AttachmentKind::classify("notes.md", "text/markdown"), AttachmentKind::Other);
        assert_eq!(AttachmentKind::classify("paper.pdf", "application/pdf"), AttachmentKind::Other);
    }

    #[test]
    fn from_path_guesses_media_type() {
        let attachment = PendingAttachment::from_path("/tmp/photos/Beach.JPG");

        assert_eq!(attachment.name, "Beach.JPG");
        assert_eq!(attachment.media_type, "image/jpeg");
        assert_eq!(attachment.kind(), AttachmentKind::Image);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(1001);
        let (preview, truncated) = truncate_chars(&text, TEXT_PREVIEW_CHARS);

        assert!(truncated);
        assert_eq!(preview.chars().count(), 1000);

        let (preview, truncated) = truncate_chars("short", TEXT_PREVIEW_CHARS);
        assert!(!truncated);
        assert_eq!(preview, "short");
    }

    #[test]
    fn payload_layout() {
        assert_eq!(compose_payload("hi", &[]), "hi");
        assert_eq!(
            compose_payload("look", &["[Image: a.png]", "[File: b.pdf - application/pdf]"]),
            "look\n\nAttached files:\n[Image: a.png]\n\n[File: b.pdf - application/pdf]"
        );
        assert_eq!(
            compose_payload("", &["[Image: a.png]"]),
            "Attached files:\n[Image: a.png]"
        );
    }

    #[tokio::test]
    async fn long_text_attachment_is_cut_at_limit_with_ellipsis() {
        let reader = ScriptedReader::default().with_text("big.txt", &"x".repeat(1500));
        let pending = vec![PendingAttachment::new("big.txt", "text/plain", "big.txt")];

        let processed = process_attachments(&reader, &pending).await;

        assert_eq!(processed.len(), 1);
        let expected = format!("[File: big.txt]\n{}...", "x".repeat(1000));
        assert_eq!(processed[0].summary, expected);
        assert_eq!(processed[0].content.as_deref().map(str::len), Some(1000));
    }

    #[tokio::test]
    async fn exact_limit_text_has_no_ellipsis() {
        let reader = ScriptedReader::default().with_text("ok.json", &"y".repeat(1000));
        let pending = vec![PendingAttachment::new("ok.json", "application/json", "ok.json")];

        let processed = process_attachments(&reader, &pending).await;

        assert_eq!(processed[0].summary, format!("[File: ok.json]\n{}", "y".repeat(1000)));
    }

    #[tokio::test]
    async fn failed_read_becomes_marker_and_others_still_process() {
        let reader = ScriptedReader::default().with_image("a.png", "data:image/png;base64,AA==");
        let pending = vec![
            PendingAttachment::new("missing.txt", "text/plain", "missing.txt"),
            PendingAttachment::new("a.png", "image/png", "a.png"),
            PendingAttachment::new("b.pdf", "application/pdf", "b.pdf"),
        ];

        let processed = process_attachments(&reader, &pending).await;
        let summaries: Vec<_> = processed.iter().map(|item| item.summary.as_str()).collect();

        assert_eq!(
            summaries,
            vec![
                "[Error reading file: missing.txt]",
                "[Image: a.png]",
                "[File: b.pdf - application/pdf]",
            ]
        );
        assert_eq!(processed[1].data.as_deref(), Some("data:image/png;base64,AA=="));
    }

    #[tokio::test]
    async fn fs_reader_encodes_images_and_rejects_invalid_utf8() {
        let dir = std::env::temp_dir().join(format!("parley-attachments-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("temp dir");
        let image_path = dir.join("dot.png");
        let text_path = dir.join("bad.txt");
        tokio::fs::write(&image_path, [0u8, 1, 2]).await.expect("write image");
        tokio::fs::write(&text_path, [0xffu8, 0xfe]).await.expect("write text");

        let reader = FsAttachmentReader;
        let image = PendingAttachment::from_path(&image_path);
        let data_url = reader.read_data_url(&image).await.expect("image reads");
        assert_eq!(data_url, "data:image/png;base64,AAEC");

        let text = PendingAttachment::from_path(&text_path);
        let error = reader.read_text(&text).await.expect_err("not UTF-8");
        assert!(matches!(error, crate::error::AttachmentError::DecodeText { .. }));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
