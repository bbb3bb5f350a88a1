//! HTTP surface for the blog: the listing, load-more, article pages, and the
//! static path list, with time-based regeneration of generated views.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod revalidate;
pub mod state;

pub use error::ApiError;
pub use handlers::{ArticlePage, ListingResponse, RenderedSection};
pub use revalidate::Revalidating;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/:slug", get(handlers::get_post))
        .route("/api/listing/more", post(handlers::more_posts))
        .route("/api/paths", get(handlers::list_paths))
        .layer(cors)
        .with_state(Arc::new(state))
}
