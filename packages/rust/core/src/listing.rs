//! Article listing assembly: the first page at publish time, or every page.

use std::num::NonZeroU32;

use tracing::{info, instrument};

use spacetraveling_repository::ContentRepository;
use spacetraveling_shared::Result;

use crate::pagination::ListingState;

/// Query the first page and start a listing from it.
#[instrument(skip_all, fields(document_type = repo.document_type(), page_size = page_size.get()))]
pub async fn build_initial<R>(repo: &R, page_size: NonZeroU32) -> Result<ListingState>
where
    R: ContentRepository + ?Sized,
{
    let page = repo.query_first_page(page_size).await?;
    let state = ListingState::initialize(page);

    info!(
        results = state.len(),
        exhausted = state.is_exhausted(),
        "listing initialized"
    );
    Ok(state)
}

/// Follow the cursor until the store reports no next page.
#[instrument(skip_all, fields(document_type = repo.document_type(), page_size = page_size.get()))]
pub async fn load_all<R>(repo: &R, page_size: NonZeroU32) -> Result<ListingState>
where
    R: ContentRepository + ?Sized,
{
    let mut state = build_initial(repo, page_size).await?;
    let mut pages = 1usize;

    while !state.is_exhausted() {
        state.load_more(repo).await?;
        pages += 1;
    }

    info!(pages, results = state.len(), "listing fully loaded");
    Ok(state)
}

/// Slugs of every document, in listing order. Used to pre-generate article pages.
pub async fn collect_slugs<R>(repo: &R, page_size: NonZeroU32) -> Result<Vec<String>>
where
    R: ContentRepository + ?Sized,
{
    let state = load_all(repo, page_size).await?;
    Ok(state.into_results().into_iter().map(|s| s.slug).collect())
}
