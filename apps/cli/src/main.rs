//! spacetraveling CLI: browse, read and serve the blog's articles.
//!
//! Talks to the headless content store configured in
//! `~/.spacetraveling/spacetraveling.toml`.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
