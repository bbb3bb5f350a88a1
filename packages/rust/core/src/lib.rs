//! Listing and article assembly for spacetraveling.
//!
//! This crate ties the content repository to the two view-facing shapes:
//! an incrementally loaded article listing and a single article page with
//! its estimated reading time.

pub mod detail;
pub mod listing;
pub mod pagination;
pub mod reading_time;
pub mod render;

pub use detail::ArticleView;
pub use pagination::{Completion, ListingSession, ListingState, LoadStatus, LoadTicket};
pub use reading_time::{ReadingTime, ReadingTimeEstimator};
pub use render::{HtmlRenderer, RichTextRenderer};
