use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod airtable;
mod cache;
mod chart;
mod config;
mod error;
mod export;
mod filter;
mod models;
mod report;
mod server;
mod summary;
mod table;

use config::SourceArgs;
use models::FellowTable;

#[derive(Parser)]
#[command(name = "fellow-dashboard")]
#[command(about = "Fellowship diagnostic dashboard for cohort survey records", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Sidebar filters for one-shot commands. Omitting a flag keeps every value.
#[derive(Debug, Clone, Args)]
struct FilterArgs {
    #[arg(long = "college")]
    colleges: Vec<String>,
    /// Also select fellows with no college
    #[arg(long)]
    blank_college: bool,
    #[arg(long = "grad-date")]
    grad_dates: Vec<String>,
    /// Also select fellows with no graduation date
    #[arg(long)]
    blank_grad_date: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(long, default_value = "127.0.0.1:8501")]
        addr: SocketAddr,
        #[arg(long, default_value_t = cache::DEFAULT_TTL.as_secs())]
        cache_ttl_secs: u64,
    },
    /// Write a static HTML snapshot of the dashboard
    Render {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "dashboard.html")]
        out: PathBuf,
    },
    /// Print the seven count tables as markdown
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export the filtered fellow table as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "fellows.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let source = cli.source.record_source()?;
    let query = cli.source.fetch_query();

    match cli.command {
        Commands::Serve {
            addr,
            cache_ttl_secs,
        } => {
            let state = server::AppState {
                source: Arc::new(source),
                query,
                cache: cache::SnapshotCache::new(
                    cache::DEFAULT_CAPACITY,
                    Duration::from_secs(cache_ttl_secs.max(1)),
                ),
                title: Arc::from(cli.source.title.as_str()),
            };
            server::serve(addr, state).await?;
        }
        Commands::Render { filters, out } => {
            let full = table::load_fellows(&source, &query)
                .await
                .context("failed to load fellow records")?;
            let (selection, filtered) = narrow(&full, &filters);
            let page = report::render_page(&report::Page {
                title: &cli.source.title,
                full: &full,
                filtered: &filtered,
                selection: &selection,
                interactive: false,
            })
            .context("failed to render dashboard")?;
            std::fs::write(&out, page)?;
            println!("Dashboard written to {}.", out.display());
        }
        Commands::Summary { filters } => {
            let full = table::load_fellows(&source, &query)
                .await
                .context("failed to load fellow records")?;
            let (_, filtered) = narrow(&full, &filters);
            let summaries = summary::summarize_all(&filtered);
            print!(
                "{}",
                report::build_text_summary(
                    &cli.source.title,
                    filtered.rows.len(),
                    full.rows.len(),
                    &summaries
                )
            );
        }
        Commands::Export { filters, out } => {
            let full = table::load_fellows(&source, &query)
                .await
                .context("failed to load fellow records")?;
            let (_, filtered) = narrow(&full, &filters);
            let written = export::export_csv(&filtered, &out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {written} fellows to {}.", out.display());
        }
    }

    Ok(())
}

fn narrow(full: &FellowTable, filters: &FilterArgs) -> (filter::FilterSelection, FellowTable) {
    let selection = filter::selection_from_args(
        full,
        filter::ArgValues {
            values: &filters.colleges,
            blank: filters.blank_college,
        },
        filter::ArgValues {
            values: &filters.grad_dates,
            blank: filters.blank_grad_date,
        },
    );
    let filtered = filter::apply_filter(full, &selection);
    (selection, filtered)
}
