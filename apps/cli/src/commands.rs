//! CLI command definitions, routing, and tracing setup.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use spacetraveling_core::{
    ArticleView, Completion, HtmlRenderer, ListingSession, LoadStatus, ReadingTimeEstimator,
    RichTextRenderer, detail, listing,
};
use spacetraveling_repository::{ContentRepository, HttpRepository};
use spacetraveling_shared::{
    AppConfig, ArticleSummary, RepositoryConfig, as_text, init_config, load_config,
    load_config_from,
};
use spacetraveling_web::{AppState, create_app};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// spacetraveling: a blog reader backed by a headless content store.
#[derive(Parser)]
#[command(
    name = "spacetraveling",
    version,
    about = "Browse, read and serve the articles of a headless-CMS blog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.spacetraveling/spacetraveling.toml.
    #[arg(long, global = true, env = "SPACETRAVELING_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the first page of the listing, or every page with --all.
    List {
        /// Follow the cursor until the last page.
        #[arg(long)]
        all: bool,

        /// Summaries per page (overrides repository.page_size).
        #[arg(long)]
        page_size: Option<u32>,

        /// Print the listing state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Page through the listing interactively.
    Browse {
        /// Summaries per page (overrides repository.page_size).
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Print one article with its reading time.
    Show {
        /// Article slug.
        slug: String,

        /// Render section bodies as HTML instead of plain text.
        #[arg(long)]
        html: bool,
    },

    /// Print the slug of every article.
    Paths,

    /// Serve the listing and article pages over HTTP.
    Serve {
        /// Address to bind (overrides server.bind).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "spacetraveling=info",
        1 => "spacetraveling=debug",
        _ => "spacetraveling=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::List {
            all,
            page_size,
            json,
        } => cmd_list(&config, all, page_size, json).await,
        Command::Browse { page_size } => cmd_browse(&config, page_size).await,
        Command::Show { slug, html } => cmd_show(&config, &slug, html).await,
        Command::Paths => cmd_paths(&config).await,
        Command::Serve { bind } => cmd_serve(&config, bind).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Repository wiring
// ---------------------------------------------------------------------------

fn repository(config: &AppConfig, page_size: Option<u32>) -> Result<(HttpRepository, NonZeroU32)> {
    let mut repo_config = RepositoryConfig::try_from(config)?;
    if let Some(size) = page_size {
        repo_config.page_size =
            NonZeroU32::new(size).ok_or_else(|| eyre!("--page-size must be greater than zero"))?;
    }
    let page_size = repo_config.page_size;
    info!(
        endpoint = %repo_config.endpoint,
        document_type = %repo_config.document_type,
        authenticated = repo_config.access_token.is_some(),
        "using content store"
    );
    Ok((HttpRepository::new(repo_config)?, page_size))
}

fn estimator(config: &AppConfig) -> Result<ReadingTimeEstimator> {
    Ok(ReadingTimeEstimator::new(config.reading.words_per_minute()?))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_list(config: &AppConfig, all: bool, page_size: Option<u32>, json: bool) -> Result<()> {
    let (repo, page_size) = repository(config, page_size)?;

    let progress = spinner("Fetching posts...");
    let state = if all {
        listing::load_all(&repo, page_size).await
    } else {
        listing::build_initial(&repo, page_size).await
    };
    progress.finish_and_clear();
    let state = state?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    for summary in state.accumulated() {
        print_summary(summary);
    }
    if state.is_empty() {
        println!("  No posts published yet.");
    }
    if let Some(cursor) = state.cursor() {
        println!("  More posts available (next page: {cursor})");
    }
    Ok(())
}

async fn cmd_browse(config: &AppConfig, page_size: Option<u32>) -> Result<()> {
    let (repo, page_size) = repository(config, page_size)?;

    let progress = spinner("Fetching posts...");
    let state = listing::build_initial(&repo, page_size).await;
    progress.finish_and_clear();

    let mut session = ListingSession::new(state?);
    for summary in session.state().accumulated() {
        print_summary(summary);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match session.status() {
            LoadStatus::Exhausted => {
                println!("  That's all the posts.");
                break;
            }
            LoadStatus::Failed {
                message,
                retryable: false,
            } => {
                println!("  Listing ended: {message}");
                break;
            }
            LoadStatus::Failed { message, .. } => {
                println!("  Loading failed: {message}");
                println!("  [Enter] retry  [q] quit");
            }
            LoadStatus::Idle | LoadStatus::Loading => {
                println!("  [Enter] load more posts  [q] quit");
            }
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        if prompt_action(line.as_deref()) == PromptAction::Quit {
            break;
        }

        let Some(ticket) = session.begin_load() else {
            continue;
        };
        let progress = spinner("Loading more posts...");
        let result = tokio::select! {
            result = repo.query_next_page(ticket.cursor()) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        progress.finish_and_clear();

        let Some(result) = result else {
            session.abandon();
            println!("  Cancelled.");
            continue;
        };

        let before = session.state().len();
        if let Completion::Applied { appended } = session.complete(ticket, result) {
            for summary in &session.state().accumulated()[before..] {
                print_summary(summary);
            }
            info!(appended, total = session.state().len(), "page loaded");
        }
    }
    Ok(())
}

/// What the browse prompt asks for. `None` is end of input or Ctrl-C.
#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    LoadMore,
    Quit,
}

fn prompt_action(line: Option<&str>) -> PromptAction {
    match line.map(str::trim) {
        None => PromptAction::Quit,
        Some(input) if input.eq_ignore_ascii_case("q") => PromptAction::Quit,
        Some(_) => PromptAction::LoadMore,
    }
}

async fn cmd_show(config: &AppConfig, slug: &str, html: bool) -> Result<()> {
    let (repo, _) = repository(config, None)?;
    let estimator = estimator(config)?;

    let progress = spinner("Fetching post...");
    let view = detail::build(&repo, &estimator, slug).await;
    progress.finish_and_clear();

    print_article(&view?, html.then_some(&HtmlRenderer as &dyn RichTextRenderer));
    Ok(())
}

async fn cmd_paths(config: &AppConfig) -> Result<()> {
    let (repo, page_size) = repository(config, None)?;
    for slug in listing::collect_slugs(&repo, page_size).await? {
        println!("/post/{slug}");
    }
    Ok(())
}

async fn cmd_serve(config: &AppConfig, bind: Option<String>) -> Result<()> {
    let (repo, page_size) = repository(config, None)?;
    let state = AppState::new(
        Arc::new(repo),
        estimator(config)?,
        page_size,
        config.server.revalidate_interval(),
    );

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| eyre!("cannot bind '{bind}': {e}"))?;

    info!(
        address = %listener.local_addr()?,
        revalidate_secs = config.server.revalidate_secs,
        "serving"
    );
    println!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn format_date(date: Option<chrono::DateTime<chrono::Utc>>) -> String {
    date
        .map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "unpublished".into())
}

fn print_summary(summary: &ArticleSummary) {
    println!();
    println!("  {}", summary.title);
    println!("  {}", summary.subtitle);
    println!(
        "  {}  ·  {}  ·  /post/{}",
        format_date(summary.published_at),
        summary.author,
        summary.slug
    );
}

fn print_article(view: &ArticleView, renderer: Option<&dyn RichTextRenderer>) {
    let article = &view.article;
    println!();
    println!("  {}", article.title);
    println!(
        "  {}  ·  {}  ·  {} min",
        format_date(article.published_at),
        article.author,
        view.reading_time_minutes
    );
    if let Some(banner) = &article.banner_url {
        println!("  Banner: {banner}");
    }

    for section in &article.sections {
        println!();
        println!("  ## {}", section.heading);
        match renderer {
            Some(renderer) => println!("{}", renderer.render(&section.body)),
            None => println!("{}", as_text(&section.body)),
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_quits_on_interrupt_or_end_of_input() {
        assert_eq!(prompt_action(None), PromptAction::Quit);
        assert_eq!(prompt_action(Some("q")), PromptAction::Quit);
        assert_eq!(prompt_action(Some(" Q ")), PromptAction::Quit);
    }

    #[test]
    fn prompt_loads_more_on_anything_else() {
        assert_eq!(prompt_action(Some("")), PromptAction::LoadMore);
        assert_eq!(prompt_action(Some("more")), PromptAction::LoadMore);
    }
}
