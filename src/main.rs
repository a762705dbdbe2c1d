//! Tululu-Catalog main entry point
//!
//! This is the command-line interface for the book catalog crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tululu_catalog::config::{load_or_default, Config};
use tululu_catalog::crawler::Crawler;
use tululu_catalog::output::{print_summary, write_catalog, RunStats};
use tululu_catalog::{Catalog, CatalogError};

/// Tululu-Catalog: download books and build a JSON catalog
///
/// Book texts are saved to `<dest-folder>/books`, covers to
/// `<dest-folder>/images`, and the catalog to the configured catalog path.
#[derive(Parser, Debug)]
#[command(name = "tululu-catalog")]
#[command(version)]
#[command(about = "Download books and build a JSON catalog", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Root folder for downloaded texts and covers
    #[arg(long, value_name = "DIR")]
    dest_folder: Option<PathBuf>,

    /// Do not download book texts
    #[arg(long)]
    skip_txt: bool,

    /// Do not download cover images
    #[arg(long)]
    skip_imgs: bool,

    /// Where to write the JSON catalog
    #[arg(long, value_name = "FILE")]
    catalog_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Catalog a contiguous range of book ids
    Books {
        /// First book id
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        start_id: u64,

        /// Last book id (inclusive)
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        end_id: u64,
    },

    /// Catalog the books listed in a category
    Category {
        /// Category id (55 is science fiction)
        #[arg(default_value_t = 55)]
        category_id: u32,

        /// First listing page
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        start_page: u32,

        /// Last listing page (inclusive); defaults to the category's last page
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        end_page: Option<u32>,
    },
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dest) = &self.dest_folder {
            config.download.dest_folder = dest.clone();
        }
        if let Some(path) = &self.catalog_path {
            config.output.catalog_path = path.clone();
        }
        config.download.skip_txt |= self.skip_txt;
        config.download.skip_imgs |= self.skip_imgs;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Invalid default configuration".to_string(),
    })?;
    cli.apply_overrides(&mut config);

    if let Command::Books { start_id, end_id } = cli.command {
        if start_id > end_id {
            bail!("--start-id ({}) must not exceed --end-id ({})", start_id, end_id);
        }
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let crawler = Crawler::new(&config, cancel).context("Failed to set up the crawler")?;

    let mut catalog = Catalog::new();
    let mut stats = RunStats::new();
    let result = run(&crawler, &cli.command, &mut catalog, &mut stats).await;
    stats.finish();

    // Keep whatever was resolved, even if the run was aborted
    if result.is_ok() || !catalog.is_empty() {
        write_catalog(&config.output.catalog_path, &catalog)
            .await
            .context("Failed to write the catalog")?;
    }

    if !cli.quiet {
        print_summary(&stats);
    }

    match result {
        Ok(()) => {
            tracing::info!("Catalog complete");
            Ok(())
        }
        Err(CatalogError::Cancelled) => {
            tracing::warn!("Interrupted; partial catalog kept");
            bail!("Interrupted by user")
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Runs the selected command, filling `catalog` and `stats`
async fn run(
    crawler: &Crawler,
    command: &Command,
    catalog: &mut Catalog,
    stats: &mut RunStats,
) -> Result<(), CatalogError> {
    let ids: Vec<u64> = match *command {
        Command::Books { start_id, end_id } => {
            tracing::info!("Cataloging books {}..={}", start_id, end_id);
            (start_id..=end_id).collect()
        }
        Command::Category {
            category_id,
            start_page,
            end_page,
        } => {
            let walk = crawler
                .walker
                .enumerate(category_id, start_page, end_page)
                .await?;
            if walk.clamped {
                println!(
                    "Category {} only has {} page(s); stopping at page {}",
                    category_id, walk.page_count, walk.effective_end
                );
            }
            stats.skipped_pages = walk.skipped_pages.len() as u64;
            walk.ids
        }
    };

    crawler.assembler.extend_catalog(catalog, &ids, stats).await
}

/// Cancels the token on Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            cancel.cancel();
        }
    });
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tululu_catalog=info,warn"),
            1 => EnvFilter::new("tululu_catalog=debug,info"),
            2 => EnvFilter::new("tululu_catalog=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
