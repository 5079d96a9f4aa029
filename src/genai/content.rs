use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::genai::wire::{Content, Part};

/// Encoded image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// One normalized prompt element, immutable once constructed.
///
/// `Text` and `Fetched` both read back as text; `Fetched` marks content
/// that was resolved from a remote URL rather than supplied literally.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(String),
    Image(ImageBlob),
    Fetched(String),
}

impl ContentItem {
    /// Text payload of the literal and fetched arms.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Fetched(text) => Some(text),
            Self::Image(_) => None,
        }
    }

    /// Wire part for this item.
    pub fn to_part(&self) -> Part {
        match self {
            Self::Text(text) | Self::Fetched(text) => Part::text(text.clone()),
            Self::Image(blob) => {
                Part::inline_data(blob.mime_type.clone(), STANDARD.encode(&blob.bytes))
            }
        }
    }
}

/// Ordered sequence of content items sent as one user message. Built
/// fresh per call and not retained by the caller beyond it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prompt {
    items: Vec<ContentItem>,
}

impl Prompt {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wire content block with the user role.
    pub fn to_content(&self) -> Content {
        Content::user(self.items.iter().map(ContentItem::to_part).collect())
    }

    /// Display form used when replaying history: text joined by newlines,
    /// images as a placeholder marker.
    pub fn display_text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                ContentItem::Text(text) | ContentItem::Fetched(text) => text.clone(),
                ContentItem::Image(blob) => format!("[image {}]", blob.mime_type),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_fetched_read_back_as_text() {
        assert_eq!(
            ContentItem::Text("hi".to_string()).as_text(),
            Some("hi")
        );
        assert_eq!(
            ContentItem::Fetched("{\"a\":1}".to_string()).as_text(),
            Some("{\"a\":1}")
        );
        let image = ContentItem::Image(ImageBlob {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        });
        assert!(image.as_text().is_none());
    }

    #[test]
    fn image_items_become_inline_data_parts() {
        let item = ContentItem::Image(ImageBlob {
            bytes: vec![0xff, 0x00],
            mime_type: "image/png".to_string(),
        });
        let part = item.to_part();
        let blob = part.inline_data.expect("inline data part");
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.data, STANDARD.encode([0xff, 0x00]));
    }

    #[test]
    fn prompt_preserves_item_order() {
        let prompt = Prompt::new(vec![
            ContentItem::Text("first".to_string()),
            ContentItem::Fetched("second".to_string()),
        ]);
        let content = prompt.to_content();
        assert_eq!(content.role, "user");
        assert_eq!(content.parts[0].text.as_deref(), Some("first"));
        assert_eq!(content.parts[1].text.as_deref(), Some("second"));
    }
}
