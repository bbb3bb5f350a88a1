//! Core domain types for article listings and article pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::richtext::{RichTextBlock, Title};

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Opaque continuation token addressing the next page of a listing.
///
/// Only the content store mints cursors. Callers pass them back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a token received from the content store.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// An article as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Store-wide unique document id.
    pub id: String,
    /// Human-readable identifier used for direct lookup.
    pub slug: String,
    /// First publication time, if the document has been published.
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationPage {
    /// Summaries in store order.
    pub results: Vec<ArticleSummary>,
    /// Token for the following page; `None` when this is the last page.
    pub next_cursor: Option<Cursor>,
}

impl PaginationPage {
    /// A page with no results and no continuation.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            next_cursor: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A headed group of rich-text blocks, in authoring order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// A full document as returned by the store, before view normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: String,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    pub title: Title,
    pub subtitle: Option<String>,
    pub author: String,
    pub banner_url: Option<String>,
    pub sections: Vec<Section>,
}

/// A full article ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Always plain text.
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub sections: Vec<Section>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_serializes_as_plain_string() {
        let cursor = Cursor::new("https://store.example.io/api/v2/documents/search?page=2");
        let json = serde_json::to_string(&cursor).unwrap();
        assert_eq!(json, r#""https://store.example.io/api/v2/documents/search?page=2""#);
        let back: Cursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn terminal_page_has_null_cursor() {
        let json = serde_json::to_value(PaginationPage::empty()).unwrap();
        assert!(json["next_cursor"].is_null());
        assert_eq!(json["results"].as_array().map(Vec::len), Some(0));
    }
}
