use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use spacetraveling_core::{ArticleView, ListingState, RichTextRenderer, detail, listing};
use spacetraveling_shared::{ArticleSummary, Cursor};

use crate::AppState;
use crate::error::ApiError;

/// First listing page as served to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub results: Vec<ArticleSummary>,
    pub next_page: Option<Cursor>,
}

impl From<&ListingState> for ListingResponse {
    fn from(state: &ListingState) -> Self {
        Self {
            results: state.accumulated().to_vec(),
            next_page: state.cursor().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSection {
    pub heading: String,
    pub html: String,
}

/// Article view plus each section body rendered to markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
    #[serde(flatten)]
    pub view: ArticleView,
    pub sections_html: Vec<RenderedSection>,
}

impl ArticlePage {
    pub fn render(view: ArticleView, renderer: &dyn RichTextRenderer) -> Self {
        let sections_html = view
            .article
            .sections
            .iter()
            .map(|section| RenderedSection {
                heading: section.heading.clone(),
                html: renderer.render(&section.body),
            })
            .collect();
        Self {
            view,
            sections_html,
        }
    }
}

fn cache_control(state: &AppState) -> [(header::HeaderName, HeaderValue); 1] {
    let value = format!(
        "s-maxage={}, stale-while-revalidate",
        state.revalidate_interval().as_secs()
    );
    let value = HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("no-cache"));
    [(header::CACHE_CONTROL, value)]
}

#[instrument(skip_all)]
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let repo = Arc::clone(&state.repository);
    let page_size = state.page_size;
    let initial = state
        .listing
        .get_or_generate("listing", move || async move {
            listing::build_initial(&*repo, page_size).await
        })
        .await?;

    Ok((cache_control(&state), Json(ListingResponse::from(&initial))))
}

/// Advance a client-held listing by one page.
#[instrument(skip_all, fields(accumulated = client_state.len()))]
pub async fn more_posts(
    State(state): State<Arc<AppState>>,
    Json(mut client_state): Json<ListingState>,
) -> Result<impl IntoResponse, ApiError> {
    let appended = client_state.load_more(&*state.repository).await?;
    debug!(appended, exhausted = client_state.is_exhausted(), "listing advanced");

    Ok((
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(client_state),
    ))
}

#[instrument(skip_all, fields(slug = %slug))]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = Arc::clone(&state.repository);
    let renderer = Arc::clone(&state.renderer);
    let estimator = state.estimator;
    let key = format!("post:{slug}");

    let page = state
        .articles
        .get_or_generate(&key, move || async move {
            let view = detail::build(&*repo, &estimator, &slug).await?;
            Ok(ArticlePage::render(view, &*renderer))
        })
        .await?;

    Ok((cache_control(&state), Json(page)))
}

#[instrument(skip_all)]
pub async fn list_paths(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let repo = Arc::clone(&state.repository);
    let page_size = state.page_size;
    let slugs = state
        .paths
        .get_or_generate("paths", move || async move {
            listing::collect_slugs(&*repo, page_size).await
        })
        .await?;

    Ok((cache_control(&state), Json(slugs)))
}
