//! Shared types, error model, and configuration for spacetraveling.
//!
//! This crate is the foundation depended on by all other spacetraveling crates.
//! It provides:
//! - [`SpacetravelingError`]: the unified error type
//! - Domain types ([`ArticleSummary`], [`Article`], [`PaginationPage`], [`Cursor`])
//! - Rich text nodes ([`RichTextBlock`], [`Title`]) and their plain-text form
//! - Configuration ([`AppConfig`], [`RepositoryConfig`], config loading)

pub mod config;
pub mod error;
pub mod richtext;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_WORDS_PER_MINUTE, ReadingConfig, RepositoryConfig, RepositorySection,
    ServerConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SpacetravelingError};
pub use richtext::{RichTextBlock, Span, Title, as_text};
pub use types::{Article, ArticleRecord, ArticleSummary, Cursor, PaginationPage, Section};
