//! Single-article assembly: fetch, normalize, estimate reading time.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use spacetraveling_repository::ContentRepository;
use spacetraveling_shared::{Article, ArticleRecord, Result};

use crate::reading_time::ReadingTimeEstimator;

/// An article plus its estimated reading time, as handed to the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub article: Article,
    pub reading_time_minutes: u32,
}

/// Fetch the article for `slug` and assemble its view.
///
/// `NotFound` from the repository is returned unchanged.
#[instrument(skip_all, fields(document_type = repo.document_type(), slug = %slug))]
pub async fn build<R>(repo: &R, estimator: &ReadingTimeEstimator, slug: &str) -> Result<ArticleView>
where
    R: ContentRepository + ?Sized,
{
    let record = repo.get_by_identifier(slug).await?;
    let view = assemble(record, estimator);
    debug!(
        sections = view.article.sections.len(),
        minutes = view.reading_time_minutes,
        "article assembled"
    );
    Ok(view)
}

/// Normalize a record into an [`ArticleView`].
pub fn assemble(record: ArticleRecord, estimator: &ReadingTimeEstimator) -> ArticleView {
    let reading_time = estimator.estimate(&record.sections);

    ArticleView {
        article: Article {
            id: record.id,
            slug: record.slug,
            published_at: record.published_at,
            title: record.title.into_plain(),
            author: record.author,
            banner_url: record.banner_url,
            sections: record.sections,
        },
        reading_time_minutes: reading_time.minutes(),
    }
}
