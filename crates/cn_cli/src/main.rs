use clap::Parser;
use cn_cache::{create_cache, CacheConfig};
use cn_core::{Error, Result};
use cn_feeds::checker::CheckerConfig;
use cn_feeds::logging::{init_logging, DEFAULT_LOG_FILE};
use cn_feeds::runner::{DEFAULT_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES};
use cn_feeds::{run_periodic_check, FeedConfig, RssChecker, RssSource, Schedule};
use cn_inference::{create_model, EmbeddingGenerator};
use cn_storage::{create_article_store, create_vector_index};
use std::env;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Index new security news into a vector store", long_about = None)]
pub struct Cli {
    /// Minutes between successful checks
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MINUTES, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
    interval_minutes: u64,
}

fn backend(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

async fn build_checker() -> Result<RssChecker> {
    let store = create_article_store(&backend("ARTICLE_STORE", "sqlite")).await?;
    let index = create_vector_index(&backend("VECTOR_INDEX", "pinecone")).await?;
    let model = create_model(&backend("EMBEDDING_MODEL", "http"), cn_inference::Config::from_env()?).await?;
    let cache = create_cache(&backend("CACHE_BACKEND", "redis"), CacheConfig::from_env()?).await?;
    let source = RssSource::new(FeedConfig::from_env()?)?;

    info!(
        "Using {} index with {} embeddings ({} dimensions)",
        index.name(),
        model.name(),
        model.dimensions()
    );
    Ok(RssChecker::new(
        Arc::new(source),
        store,
        index,
        EmbeddingGenerator::new(model),
        CheckerConfig::from_env(),
    )
    .with_cache(cache))
}

/// Startup errors end the process; record them in the log file first.
fn log_fatal(e: Error) -> Error {
    error!("Fatal error: {}", e);
    e
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(DEFAULT_LOG_FILE)?;

    let checker = build_checker().await.map_err(log_fatal)?;
    info!("Checking feeds every {} minutes", cli.interval_minutes);
    run_periodic_check(&checker, Schedule::every_minutes(cli.interval_minutes), shutdown_signal()).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        let cli = Cli::try_parse_from(["cybernews"]).unwrap();
        assert_eq!(cli.interval_minutes, 180);
    }

    #[test]
    fn test_interval_flag() {
        let cli = Cli::try_parse_from(["cybernews", "--interval-minutes", "15"]).unwrap();
        assert_eq!(cli.interval_minutes, 15);
        assert!(Cli::try_parse_from(["cybernews", "--interval-minutes", "0"]).is_err());
        assert!(Cli::try_parse_from(["cybernews", "--verbose"]).is_err());
    }

    #[test]
    fn test_fatal_error_is_passed_through() {
        let err = log_fatal(Error::missing_env("PINECONE_API_KEY"));
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("PINECONE_API_KEY")));
    }

    #[test]
    fn test_interval_upper_bound() {
        let max = MAX_INTERVAL_MINUTES.to_string();
        let cli = Cli::try_parse_from(["cybernews", "--interval-minutes", max.as_str()]).unwrap();
        assert_eq!(cli.interval_minutes, MAX_INTERVAL_MINUTES);

        let too_long = (MAX_INTERVAL_MINUTES + 1).to_string();
        assert!(Cli::try_parse_from(["cybernews", "--interval-minutes", too_long.as_str()]).is_err());
        let overflow = u64::MAX.to_string();
        assert!(Cli::try_parse_from(["cybernews", "--interval-minutes", overflow.as_str()]).is_err());
    }
}
