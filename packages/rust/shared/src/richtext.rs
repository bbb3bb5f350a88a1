//! Structured rich-text nodes as delivered by the content store.
//!
//! Blocks are opaque to the pipeline except for their plain text, which feeds
//! the reading-time estimate and title normalization. Everything else is kept
//! verbatim for the renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One block of authored rich text (paragraph, heading, list item, image...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    /// Block kind as named by the store, e.g. `paragraph` or `heading2`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Plain text of the block; absent for non-text blocks such as images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Inline formatting ranges over `text`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,

    /// Any other fields (image urls, dimensions, alt text...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RichTextBlock {
    /// Build a text block of the given kind with no spans.
    pub fn text(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: Some(text.into()),
            spans: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Build a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text("paragraph", text)
    }

    /// The block's plain text, empty for non-text blocks.
    pub fn plain_text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// An inline formatting range, in UTF-16 code unit offsets into the block text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A title field, which the store may deliver as a plain string or as rich text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Title {
    Plain(String),
    Rich(Vec<RichTextBlock>),
}

impl Title {
    /// Resolve either representation to plain text.
    pub fn into_plain(self) -> String {
        match self {
            Self::Plain(text) => text,
            Self::Rich(blocks) => as_text(&blocks),
        }
    }
}

impl Default for Title {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

/// Concatenate the plain text of every block, separated by single spaces.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_accepts_plain_string() {
        let title: Title = serde_json::from_str(r#""Como utilizar Hooks""#).unwrap();
        assert_eq!(title.into_plain(), "Como utilizar Hooks");
    }

    #[test]
    fn title_accepts_rich_text() {
        let json = r#"[{"type":"heading1","text":"Criando um app","spans":[]},
                       {"type":"paragraph","text":"do zero","spans":[]}]"#;
        let title: Title = serde_json::from_str(json).unwrap();
        assert_eq!(title.into_plain(), "Criando um app do zero");
    }

    #[test]
    fn block_keeps_unknown_fields() {
        let json = r#"{"type":"image","url":"https://images.example.com/a.png","alt":null}"#;
        let block: RichTextBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind, "image");
        assert_eq!(block.plain_text(), "");
        assert_eq!(block.extra["url"], "https://images.example.com/a.png");

        let back = serde_json::to_value(&block).unwrap();
        assert_eq!(back["url"], "https://images.example.com/a.png");
    }

    #[test]
    fn as_text_skips_non_text_blocks() {
        let mut image = RichTextBlock::paragraph("");
        image.kind = "image".into();
        image.text = None;
        let blocks = vec![RichTextBlock::paragraph("one two"), image, RichTextBlock::paragraph("three")];
        assert_eq!(as_text(&blocks), "one two three");
    }
}
