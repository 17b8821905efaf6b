use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local};
use gpui::{Image, ImageFormat};
use parley_client::{AttachmentKind, AttachmentPreview, MessageSlot, RenderedMessage, Sender};

/// An attachment as shown under a user message. Images that decode carry
/// their pixels; everything else is drawn as a labelled chip.
#[derive(Debug, Clone)]
pub struct AttachmentView {
    pub label: String,
    pub image: Option<Arc<Image>>,
}

impl AttachmentView {
    fn from_preview(preview: &AttachmentPreview) -> Self {
        let image = match preview.kind {
            AttachmentKind::Image => preview
                .data_url
                .as_deref()
                .and_then(decode_image_data_url)
                .map(|(format, bytes)| Arc::new(Image::from_bytes(format, bytes))),
            AttachmentKind::Text | AttachmentKind::Other => None,
        };
        if preview.kind == AttachmentKind::Image && image.is_none() {
            tracing::debug!(name = %preview.name, "image attachment has no usable data, showing label");
        }

        Self {
            label: attachment_label(preview),
            image,
        }
    }
}

/// A message as drawn in the transcript.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub slot: MessageSlot,
    pub sender: Sender,
    pub text: String,
    pub attachments: Vec<AttachmentView>,
    /// Local wall-clock time the row was added, `HH:MM`.
    pub time: String,
}

impl MessageRow {
    pub fn new(slot: MessageSlot, message: RenderedMessage, at: DateTime<Local>) -> Self {
        Self {
            slot,
            sender: message.sender,
            text: message.text,
            attachments: message
                .attachments
                .iter()
                .map(AttachmentView::from_preview)
                .collect(),
            time: format_time(at),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Text split on `\n`. Empty lines stay so spacing survives.
    pub fn lines(&self) -> Vec<String> {
        split_lines(&self.text)
    }
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| if line.is_empty() { " ".to_string() } else { line.to_string() })
        .collect()
}

pub fn format_time(at: DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

pub fn attachment_label(preview: &AttachmentPreview) -> String {
    match preview.kind {
        AttachmentKind::Image => format!("Image: {}", preview.name),
        AttachmentKind::Text | AttachmentKind::Other => preview.name.clone(),
    }
}

/// Splits `data:<mime>;base64,<payload>` into a decodable image.
fn decode_image_data_url(data_url: &str) -> Option<(ImageFormat, Vec<u8>)> {
    let (header, payload) = data_url.strip_prefix("data:")?.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let format = ImageFormat::from_mime_type(mime)?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((format, bytes))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn lines_keep_blank_rows() {
        assert_eq!(split_lines("one\n\ntwo\r\n"), vec!["one", " ", "two", " "]);
    }

    #[test]
    fn rows_take_the_local_clock_time() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 0)
            .single()
            .expect("unambiguous local time");
        let row = MessageRow::new(
            MessageSlot::new(1),
            RenderedMessage::new(Sender::Assistant, "hi"),
            at,
        );

        assert_eq!(row.time, "07:05");
        assert!(!row.is_user());
    }

    #[test]
    fn image_chips_are_labelled() {
        let preview = AttachmentPreview {
            name: "cat.png".to_string(),
            media_type: "image/png".to_string(),
            kind: AttachmentKind::Image,
            data_url: Some("data:image/png;base64,AA==".to_string()),
        };

        assert_eq!(attachment_label(&preview), "Image: cat.png");
    }

    #[test]
    fn image_previews_decode_into_thumbnails() {
        let preview = AttachmentPreview {
            name: "cat.png".to_string(),
            media_type: "image/png".to_string(),
            kind: AttachmentKind::Image,
            data_url: Some("data:image/png;base64,AA==".to_string()),
        };
        let message = RenderedMessage::new(Sender::User, "look").with_attachments(vec![
            preview,
            AttachmentPreview {
                name: "notes.txt".to_string(),
                media_type: "text/plain".to_string(),
                kind: AttachmentKind::Text,
                data_url: None,
            },
        ]);

        let row = MessageRow::new(MessageSlot::new(1), message, Local::now());

        let thumbnail = row.attachments[0].image.as_ref().expect("image decoded");
        assert_eq!(thumbnail.format, ImageFormat::Png);
        assert_eq!(thumbnail.bytes, vec![0]);
        assert_eq!(row.attachments[1].label, "notes.txt");
        assert!(row.attachments[1].image.is_none());
    }

    #[test]
    fn malformed_data_urls_are_not_images() {
        assert_eq!(decode_image_data_url("https://example.com/cat.png"), None);
        assert_eq!(decode_image_data_url("data:image/png,AA=="), None);
        assert_eq!(decode_image_data_url("data:image/png;base64,@@@"), None);
    }
}
