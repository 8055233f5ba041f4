#![warn(clippy::all)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use stockwatch::{
    DetailLoader, FinnhubClient, MarketDataProvider, NewsKind, NewsStory, SearchDebouncer,
    SqliteKvStore, Symbol, WatchlistCoordinator, WatchlistStore,
};
use stockwatch_common::logging::init_logging_with_exclusions;
use stockwatch_common::Config;

/// Stockwatch - watchlist prices, metrics, news and symbol search.
#[derive(Parser, Debug)]
#[command(name = "stockwatch")]
#[command(version = "0.1.0")]
#[command(about = "Watchlist prices, metrics, news and symbol search.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate the watchlist once and print one line per symbol
    Watchlist,

    /// Show price change, metrics and company news for one symbol
    Detail {
        /// Ticker symbol
        symbol: String,
    },

    /// Show top stories, or company news with --symbol
    News {
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Search symbols by free text
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Add a symbol to the watchlist
    Add {
        symbol: String,
        /// Display name
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Remove a symbol from the watchlist
    Remove { symbol: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_env().context("Failed to load configuration")?;
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    if config.api.token.is_none() {
        tracing::warn!("No API token configured; set STOCKWATCH_API_TOKEN");
    }

    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(FinnhubClient::from_config(&config).context("Failed to create API client")?);

    match cli.command {
        Commands::Watchlist => {
            let store = open_store(&config)?;
            let mut coordinator =
                WatchlistCoordinator::new(Arc::clone(&provider), store, &config.aggregation);
            let update = coordinator.refresh().await?;
            for row in &update.rows {
                println!(
                    "{:<6} {:<28} {:>12} {:>9}",
                    row.symbol, row.company_name, row.price_display, row.change_display
                );
            }
            if update.stats.failed > 0 {
                eprintln!("{} symbol(s) had no data", update.stats.failed);
            }
        }

        Commands::Detail { symbol } => {
            let symbol = Symbol::parse(&symbol)?;
            let store = open_store(&config)?;
            let name = store
                .display_name(&symbol)?
                .unwrap_or_else(|| symbol.to_string());

            let loader = DetailLoader::new(provider, store, config.aggregation.history_days);
            let detail = loader.load(&symbol, &name, Vec::new()).await?;

            println!("{} ({})", detail.company_name, detail.symbol);
            println!(
                "  {}  {}{}",
                stockwatch::format::price(stockwatch::aggregate::latest_price(&detail.series)),
                stockwatch::format::percentage(detail.change_percentage),
                if detail.in_watchlist { "  [watchlist]" } else { "" }
            );
            for row in &detail.metric_rows {
                println!("  {:<12} {}", row.label, row.value);
            }
            print_news(&loader.company_news(&symbol).await);
        }

        Commands::News { symbol } => {
            let kind = match symbol {
                Some(raw) => NewsKind::Company(Symbol::parse(&raw)?),
                None => NewsKind::TopStories,
            };
            let stories = provider.news(&kind).await?;
            print_news(&stories);
        }

        Commands::Search { query } => {
            let query = query.join(" ");
            let mut debouncer = SearchDebouncer::from_config(provider, &config.search);
            let mut results = debouncer.subscribe();
            debouncer.query_changed(&query);

            let wait = Duration::from_millis(config.search.debounce_ms)
                + Duration::from_secs(config.api.timeout_secs);
            tokio::time::timeout(wait, results.changed())
                .await
                .context("Search timed out")?
                .context("Search pipeline closed")?;

            let hits = results.borrow().clone();
            if hits.is_empty() {
                println!("No results for '{}'", query);
            }
            for hit in hits {
                println!("{:<10} {:<10} {}", hit.display_symbol, hit.kind, hit.description);
            }
        }

        Commands::Add { symbol, name } => {
            let symbol = Symbol::parse(&symbol)?;
            let name = name.join(" ");
            if name.trim().is_empty() {
                bail!("Display name must not be blank");
            }
            open_store(&config)?.add(&symbol, name.trim())?;
            println!("Added {} ({})", symbol, name.trim());
        }

        Commands::Remove { symbol } => {
            let symbol = Symbol::parse(&symbol)?;
            open_store(&config)?.remove(&symbol)?;
            println!("Removed {}", symbol);
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<WatchlistStore>> {
    let path = config.storage.resolved_db_path();
    let kv = SqliteKvStore::open(&path)
        .with_context(|| format!("Failed to open watchlist at {}", path.display()))?;
    let store = WatchlistStore::open(Arc::new(kv), &config.watchlist.defaults)?;
    Ok(Arc::new(store))
}

fn print_news(stories: &[NewsStory]) {
    if stories.is_empty() {
        println!("No news");
        return;
    }
    for story in stories {
        println!(
            "{}  {}  ({})",
            story.published_at.format("%Y-%m-%d %H:%M"),
            story.headline,
            story.source
        );
        if !story.url.is_empty() {
            println!("    {}", story.url);
        }
    }
}
