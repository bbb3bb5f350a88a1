use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use spacetraveling_core::{HtmlRenderer, ListingState, ReadingTimeEstimator, RichTextRenderer};
use spacetraveling_repository::ContentRepository;

use crate::handlers::ArticlePage;
use crate::revalidate::Revalidating;

pub struct AppState {
    pub repository: Arc<dyn ContentRepository>,
    pub estimator: ReadingTimeEstimator,
    pub renderer: Arc<dyn RichTextRenderer>,
    pub page_size: NonZeroU32,
    pub listing: Arc<Revalidating<ListingState>>,
    pub articles: Arc<Revalidating<ArticlePage>>,
    pub paths: Arc<Revalidating<Vec<String>>>,
}

impl AppState {
    /// State with HTML rendering and one revalidation interval for every view.
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        estimator: ReadingTimeEstimator,
        page_size: NonZeroU32,
        revalidate: Duration,
    ) -> Self {
        Self {
            repository,
            estimator,
            renderer: Arc::new(HtmlRenderer),
            page_size,
            listing: Arc::new(Revalidating::new(revalidate)),
            articles: Arc::new(Revalidating::new(revalidate)),
            paths: Arc::new(Revalidating::new(revalidate)),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn RichTextRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn revalidate_interval(&self) -> Duration {
        self.listing.interval()
    }
}
