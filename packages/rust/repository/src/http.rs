//! HTTP client for a Prismic-style content store (REST API v2).

use std::num::NonZeroU32;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use spacetraveling_shared::{
    ArticleRecord, Cursor, PaginationPage, RepositoryConfig, Result, SpacetravelingError,
};

use crate::ContentRepository;
use crate::query;
use crate::records::{ApiRoot, SearchResponse};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for content store requests.
const USER_AGENT: &str = concat!("spacetraveling/", env!("CARGO_PKG_VERSION"));

/// Content repository backed by the store's REST API.
pub struct HttpRepository {
    config: RepositoryConfig,
    client: Client,
}

impl HttpRepository {
    /// Create a repository with the given configuration.
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                SpacetravelingError::Repository(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Resolve the ref of the master release. Fetched fresh on every query.
    async fn master_ref(&self) -> Result<String> {
        let mut url = self.config.endpoint.clone();
        self.authorize(&mut url);

        let root: ApiRoot = self.get_json(url, Rejection::Repository).await?;
        root.master_ref().ok_or_else(|| {
            SpacetravelingError::parse(format!(
                "{}: API root lists no master ref",
                self.config.endpoint
            ))
        })
    }

    /// Run a `documents/search` query against the master ref.
    async fn search(&self, params: &[(&str, String)]) -> Result<SearchResponse> {
        let reference = self.master_ref().await?;

        let mut url = self.config.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SpacetravelingError::config(format!(
                    "endpoint cannot be a base URL: {}",
                    self.config.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(["documents", "search"]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        self.authorize(&mut url);

        self.get_json(url, Rejection::Repository).await
    }

    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.config.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
    }

    /// GET a URL and decode its JSON body, mapping failures onto the error taxonomy.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, rejection: Rejection) -> Result<T> {
        // Query strings may carry the access token, so only the path is reported.
        let path = url.path().to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SpacetravelingError::Repository(format!("{path}: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection.into_error(&path, status));
        }

        let body = response.text().await.map_err(|e| {
            SpacetravelingError::Repository(format!("{path}: failed to read body: {}", e.without_url()))
        })?;

        serde_json::from_str(&body)
            .map_err(|e| SpacetravelingError::parse(format!("{path}: unexpected response: {e}")))
    }
}

/// How a non-success status is classified.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    Repository,
    Cursor,
}

impl Rejection {
    fn into_error(self, path: &str, status: StatusCode) -> SpacetravelingError {
        let cursor_rejected = matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::GONE
        );

        match self {
            Self::Cursor if cursor_rejected => {
                SpacetravelingError::invalid_cursor(format!("{path}: HTTP {status}"))
            }
            _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                SpacetravelingError::Repository(format!(
                    "{path}: HTTP {status} (check the access token)"
                ))
            }
            _ => SpacetravelingError::Repository(format!("{path}: HTTP {status}")),
        }
    }
}

#[async_trait]
impl ContentRepository for HttpRepository {
    fn document_type(&self) -> &str {
        &self.config.document_type
    }

    #[instrument(skip_all, fields(document_type = %self.config.document_type, page_size = page_size.get()))]
    async fn query_first_page(&self, page_size: NonZeroU32) -> Result<PaginationPage> {
        let document_type = &self.config.document_type;
        let response = self
            .search(&[
                ("q", query::document_type(document_type)),
                ("fetch", query::summary_fields(document_type)),
                ("pageSize", page_size.to_string()),
            ])
            .await?;

        let page = response.into_page();
        info!(
            results = page.results.len(),
            has_next = page.next_cursor.is_some(),
            "fetched first page"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(document_type = %self.config.document_type))]
    async fn query_next_page(&self, cursor: &Cursor) -> Result<PaginationPage> {
        let url = Url::parse(cursor.as_str())
            .map_err(|e| SpacetravelingError::invalid_cursor(format!("not a URL: {e}")))?;

        // Only cursors minted by the configured store are followed.
        if url.origin() != self.config.endpoint.origin() {
            return Err(SpacetravelingError::invalid_cursor(format!(
                "cursor points outside the content store ({})",
                url.origin().ascii_serialization()
            )));
        }

        let response: SearchResponse = self.get_json(url, Rejection::Cursor).await?;
        let page = response.into_page();
        debug!(
            results = page.results.len(),
            has_next = page.next_cursor.is_some(),
            "fetched next page"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(document_type = %self.config.document_type, slug = %slug))]
    async fn get_by_identifier(&self, slug: &str) -> Result<ArticleRecord> {
        if slug.trim().is_empty() {
            return Err(SpacetravelingError::validation("slug must not be empty"));
        }

        let document_type = &self.config.document_type;
        let response = self
            .search(&[
                ("q", query::uid(document_type, slug)),
                ("pageSize", "1".to_string()),
            ])
            .await?;

        match response.results.into_iter().next() {
            Some(doc) => {
                debug!(id = %doc.id, "document found");
                Ok(doc.into_record())
            }
            None => Err(SpacetravelingError::not_found(document_type, slug)),
        }
    }
}
