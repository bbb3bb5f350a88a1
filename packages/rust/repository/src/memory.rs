//! In-process content store with the same paging contract as the HTTP store.
//!
//! Documents are listed newest-first (the order they were published in
//! reverse). Cursors are minted by this store and carry the offset of the next
//! page plus the store's cursor epoch; [`MemoryRepository::expire_cursors`]
//! bumps the epoch so outstanding cursors are rejected.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use spacetraveling_shared::{
    ArticleRecord, ArticleSummary, Cursor, PaginationPage, Result, SpacetravelingError,
};

use crate::ContentRepository;

const CURSOR_SCHEME: &str = "memory";

pub struct MemoryRepository {
    document_type: String,
    documents: RwLock<Vec<ArticleRecord>>,
    epoch: AtomicU64,
    unavailable: AtomicBool,
    requests: AtomicUsize,
}

impl MemoryRepository {
    /// Create an empty store for one document type.
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            documents: RwLock::new(Vec::new()),
            epoch: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        }
    }

    /// Create a store holding `documents` in listing order.
    pub fn with_documents(document_type: impl Into<String>, documents: Vec<ArticleRecord>) -> Self {
        let mut repo = Self::new(document_type);
        repo.documents = RwLock::new(documents);
        repo
    }

    /// Publish a document; it becomes the first entry of the listing.
    pub async fn publish(&self, record: ArticleRecord) {
        self.documents.write().await.insert(0, record);
    }

    /// Reject every cursor minted so far.
    pub fn expire_cursors(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Simulate a transport outage (or its end).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of requests served or refused so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin_request(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SpacetravelingError::Repository(
                "memory store unavailable".into(),
            ));
        }
        Ok(())
    }

    fn mint_cursor(&self, offset: usize, page_size: u32) -> Cursor {
        let epoch = self.epoch.load(Ordering::SeqCst);
        Cursor::new(format!("{CURSOR_SCHEME}:{epoch}:{offset}:{page_size}"))
    }

    fn decode_cursor(&self, cursor: &Cursor) -> Result<(usize, u32)> {
        let invalid = || SpacetravelingError::invalid_cursor(format!("unknown cursor '{cursor}'"));

        let mut parts = cursor.as_str().split(':');
        if parts.next() != Some(CURSOR_SCHEME) {
            return Err(invalid());
        }
        let epoch: u64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let offset: usize = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let page_size: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .filter(|&n| n > 0)
            .ok_or_else(invalid)?;

        if parts.next().is_some() || epoch != self.epoch.load(Ordering::SeqCst) {
            return Err(invalid());
        }
        Ok((offset, page_size))
    }

    async fn page_at(&self, offset: usize, page_size: u32) -> PaginationPage {
        let documents = self.documents.read().await;
        let end = offset.saturating_add(page_size as usize).min(documents.len());
        let results = documents
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(summarize)
            .collect();

        let next_cursor = (end < documents.len()).then(|| self.mint_cursor(end, page_size));
        PaginationPage {
            results,
            next_cursor,
        }
    }
}

fn summarize(record: &ArticleRecord) -> ArticleSummary {
    ArticleSummary {
        id: record.id.clone(),
        slug: record.slug.clone(),
        published_at: record.published_at,
        title: record.title.clone().into_plain(),
        subtitle: record.subtitle.clone().unwrap_or_default(),
        author: record.author.clone(),
    }
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    fn document_type(&self) -> &str {
        &self.document_type
    }

    async fn query_first_page(&self, page_size: NonZeroU32) -> Result<PaginationPage> {
        self.begin_request()?;
        Ok(self.page_at(0, page_size.get()).await)
    }

    async fn query_next_page(&self, cursor: &Cursor) -> Result<PaginationPage> {
        self.begin_request()?;
        let (offset, page_size) = self.decode_cursor(cursor)?;
        debug!(offset, page_size, "serving memory page");
        Ok(self.page_at(offset, page_size).await)
    }

    async fn get_by_identifier(&self, slug: &str) -> Result<ArticleRecord> {
        self.begin_request()?;
        self.documents
            .read()
            .await
            .iter()
            .find(|d| d.slug == slug)
            .cloned()
            .ok_or_else(|| SpacetravelingError::not_found(&self.document_type, slug))
    }
}
