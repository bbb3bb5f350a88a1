//! Incremental, cursor-driven article listing.
//!
//! [`ListingState`] is the serializable accumulation of pages for one listing
//! session. It only grows, by appending the page addressed by its cursor, and
//! stops growing once the store reports no next page.
//!
//! [`ListingSession`] wraps a state for interactive use: at most one load in
//! flight, an explicit [`LoadStatus`] for the view, and discarding of
//! responses that arrive after the load was abandoned.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use spacetraveling_repository::ContentRepository;
use spacetraveling_shared::{ArticleSummary, Cursor, PaginationPage, Result, SpacetravelingError};

// ---------------------------------------------------------------------------
// ListingState
// ---------------------------------------------------------------------------

/// Accumulated summaries plus the cursor of the next page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredListing")]
pub struct ListingState {
    accumulated: Vec<ArticleSummary>,
    cursor: Option<Cursor>,
    exhausted: bool,
}

/// Wire form, normalized on the way in so a state handed back by a client
/// cannot carry duplicate ids or a cursor that contradicts `exhausted`.
#[derive(Deserialize)]
struct StoredListing {
    #[serde(default)]
    accumulated: Vec<ArticleSummary>,
    #[serde(default)]
    cursor: Option<Cursor>,
    #[serde(default)]
    exhausted: bool,
}

impl From<StoredListing> for ListingState {
    fn from(stored: StoredListing) -> Self {
        let cursor = if stored.exhausted { None } else { stored.cursor };
        let mut state = Self {
            accumulated: Vec::with_capacity(stored.accumulated.len()),
            exhausted: cursor.is_none(),
            cursor,
        };
        state.append_unique(stored.accumulated);
        state
    }
}

impl ListingState {
    /// Start a listing from its first page.
    pub fn initialize(page: PaginationPage) -> Self {
        let mut state = Self {
            accumulated: Vec::with_capacity(page.results.len()),
            exhausted: page.next_cursor.is_none(),
            cursor: page.next_cursor,
        };
        state.append_unique(page.results);
        state
    }

    /// Summaries loaded so far, in store order.
    pub fn accumulated(&self) -> &[ArticleSummary] {
        &self.accumulated
    }

    /// Cursor of the next page, if any.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    pub fn into_results(self) -> Vec<ArticleSummary> {
        self.accumulated
    }

    /// Fetch the next page and append it. Returns the number of summaries added.
    ///
    /// A no-op returning `Ok(0)` once exhausted. A failed fetch leaves the
    /// state untouched, except that a rejected cursor ends the listing.
    pub async fn load_more<R>(&mut self, repo: &R) -> Result<usize>
    where
        R: ContentRepository + ?Sized,
    {
        let Some(cursor) = self.cursor.clone() else {
            return Ok(0);
        };

        match repo.query_next_page(&cursor).await {
            Ok(page) => Ok(self.apply_page(page)),
            Err(e @ SpacetravelingError::InvalidCursor { .. }) => {
                warn!(error = %e, "cursor rejected, ending listing");
                self.stop();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn apply_page(&mut self, page: PaginationPage) -> usize {
        let appended = self.append_unique(page.results);
        self.exhausted = page.next_cursor.is_none();
        self.cursor = page.next_cursor;
        debug!(
            appended,
            total = self.accumulated.len(),
            exhausted = self.exhausted,
            "page appended"
        );
        appended
    }

    fn stop(&mut self) {
        self.cursor = None;
        self.exhausted = true;
    }

    /// Append summaries whose id has not been seen, keeping their order.
    fn append_unique(&mut self, results: Vec<ArticleSummary>) -> usize {
        let mut seen: HashSet<String> = self.accumulated.iter().map(|s| s.id.clone()).collect();
        let before = self.accumulated.len();

        for summary in results {
            if seen.insert(summary.id.clone()) {
                self.accumulated.push(summary);
            } else {
                debug!(id = %summary.id, "dropping duplicate summary");
            }
        }

        self.accumulated.len() - before
    }
}

// ---------------------------------------------------------------------------
// ListingSession
// ---------------------------------------------------------------------------

/// What a view should show for the "load more" control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// More pages exist and nothing is in flight.
    Idle,
    /// A load is in flight; the control must stay disabled.
    Loading,
    /// The last load failed. Retrying makes sense only when `retryable`.
    Failed { message: String, retryable: bool },
    /// No more pages.
    Exhausted,
}

/// Permission to run one load, handed out by [`ListingSession::begin_load`].
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    cursor: Cursor,
}

impl LoadTicket {
    /// The cursor to fetch.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

/// Outcome of handing a response back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The page was appended.
    Applied { appended: usize },
    /// The fetch failed; see [`ListingSession::status`].
    Failed,
    /// The response belonged to an abandoned load and was ignored.
    Discarded,
}

/// Interactive wrapper around a [`ListingState`].
#[derive(Debug)]
pub struct ListingSession {
    state: ListingState,
    status: LoadStatus,
    generation: u64,
}

impl ListingSession {
    pub fn new(state: ListingState) -> Self {
        let status = if state.is_exhausted() {
            LoadStatus::Exhausted
        } else {
            LoadStatus::Idle
        };
        Self {
            state,
            status,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn into_state(self) -> ListingState {
        self.state
    }

    /// Whether the "load more" control should be enabled.
    pub fn can_load_more(&self) -> bool {
        match &self.status {
            LoadStatus::Idle => true,
            LoadStatus::Failed { retryable, .. } => *retryable,
            LoadStatus::Loading | LoadStatus::Exhausted => false,
        }
    }

    /// Claim the single in-flight slot. `None` while loading or once exhausted.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if !self.can_load_more() {
            return None;
        }
        let cursor = self.state.cursor.clone()?;

        self.generation += 1;
        self.status = LoadStatus::Loading;
        Some(LoadTicket {
            generation: self.generation,
            cursor,
        })
    }

    /// Apply the result of the load identified by `ticket`.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<PaginationPage>) -> Completion {
        if ticket.generation != self.generation || self.status != LoadStatus::Loading {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding response of abandoned load"
            );
            return Completion::Discarded;
        }

        match result {
            Ok(page) => {
                let appended = self.state.apply_page(page);
                self.status = if self.state.is_exhausted() {
                    LoadStatus::Exhausted
                } else {
                    LoadStatus::Idle
                };
                Completion::Applied { appended }
            }
            Err(e) => {
                let retryable = !matches!(e, SpacetravelingError::InvalidCursor { .. });
                if !retryable {
                    self.state.stop();
                }
                warn!(error = %e, retryable, "load more failed");
                self.status = LoadStatus::Failed {
                    message: e.to_string(),
                    retryable,
                };
                Completion::Failed
            }
        }
    }

    /// Give up on the in-flight load (e.g. the view went away).
    ///
    /// Its response, if it still arrives, will be discarded.
    pub fn abandon(&mut self) {
        self.generation += 1;
        if self.status == LoadStatus::Loading {
            self.status = if self.state.is_exhausted() {
                LoadStatus::Exhausted
            } else {
                LoadStatus::Idle
            };
        }
    }

    /// Begin, fetch and complete one load in a single call.
    pub async fn load_more<R>(&mut self, repo: &R) -> Option<Completion>
    where
        R: ContentRepository + ?Sized,
    {
        let ticket = self.begin_load()?;
        let result = repo.query_next_page(ticket.cursor()).await;
        Some(self.complete(ticket, result))
    }
}
