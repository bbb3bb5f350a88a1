//! Content store access: paginated listing queries and single-document lookups.
//!
//! This crate provides:
//! - [`ContentRepository`]: the narrow interface the pipeline consumes
//! - [`HttpRepository`]: a client for a Prismic-style REST API (v2)
//! - [`MemoryRepository`]: an in-process store with the same paging contract

mod http;
mod memory;
mod query;
mod records;

use std::num::NonZeroU32;

use async_trait::async_trait;
use spacetraveling_shared::{ArticleRecord, Cursor, PaginationPage, Result};

pub use http::HttpRepository;
pub use memory::MemoryRepository;

/// Listing and lookup for one document type of a remote content store.
///
/// Implementations never retry and never cache: every call is a fresh request.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// The document type this repository is bound to (e.g. `posts`).
    fn document_type(&self) -> &str;

    /// Fetch the first page of summaries.
    async fn query_first_page(&self, page_size: NonZeroU32) -> Result<PaginationPage>;

    /// Fetch the page addressed by a cursor previously returned by this store.
    ///
    /// Fails with `InvalidCursor` when the store rejects the token.
    async fn query_next_page(&self, cursor: &Cursor) -> Result<PaginationPage>;

    /// Fetch one full document by slug, or `NotFound`.
    async fn get_by_identifier(&self, slug: &str) -> Result<ArticleRecord>;
}
