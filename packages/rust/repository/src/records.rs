//! Wire shapes of the content store API and their projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use spacetraveling_shared::{
    ArticleRecord, ArticleSummary, Cursor, PaginationPage, RichTextBlock, Section, Title,
};

/// Response of the API root: the available content releases.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiRoot {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiRoot {
    /// The ref of the published (master) release.
    pub fn master_ref(self) -> Option<String> {
        self.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
    }
}

/// Response of `documents/search`.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawDocument>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl SearchResponse {
    /// Project every result to a summary, keeping store order.
    pub fn into_page(self) -> PaginationPage {
        PaginationPage {
            results: self
                .results
                .into_iter()
                .map(RawDocument::into_summary)
                .collect(),
            next_cursor: self.next_page.map(Cursor::new),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "publication_date")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: RawData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawData {
    #[serde(default)]
    pub title: Option<Title>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub banner: Option<RawImage>,
    #[serde(default)]
    pub content: Option<Vec<RawSection>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSection {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Option<Vec<RichTextBlock>>,
}

impl RawDocument {
    fn slug(&self) -> String {
        self.uid.clone().unwrap_or_else(|| {
            tracing::debug!(id = %self.id, "document has no uid, using id as slug");
            self.id.clone()
        })
    }

    pub fn into_summary(self) -> ArticleSummary {
        let slug = self.slug();
        ArticleSummary {
            id: self.id,
            slug,
            published_at: self.first_publication_date,
            title: self.data.title.unwrap_or_default().into_plain(),
            subtitle: self.data.subtitle.unwrap_or_default(),
            author: self.data.author.unwrap_or_default(),
        }
    }

    pub fn into_record(self) -> ArticleRecord {
        let slug = self.slug();
        let sections = self
            .data
            .content
            .unwrap_or_default()
            .into_iter()
            .map(|s| Section {
                heading: s.heading.unwrap_or_default(),
                body: s.body.unwrap_or_default(),
            })
            .collect();

        ArticleRecord {
            id: self.id,
            slug,
            published_at: self.first_publication_date,
            title: self.data.title.unwrap_or_default(),
            subtitle: self.data.subtitle,
            author: self.data.author.unwrap_or_default(),
            banner_url: self.data.banner.and_then(|b| b.url),
            sections,
        }
    }
}

/// Accepts RFC 3339 as well as the store's `+0000` offset form; anything else is `None`.
fn publication_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_publication_date))
}

pub(crate) fn parse_publication_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
