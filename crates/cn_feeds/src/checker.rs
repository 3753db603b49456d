use chrono::{DateTime, Utc};
use cn_cache::CacheStore;
use cn_core::{Article, ArticleStore, IndexRecord, NewsCategory, NewsSource, Result, VectorIndex};
use cn_inference::EmbeddingGenerator;
use serde::Serialize;
use std::collections::HashSet;
use std::env;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use crate::logging::Logger;

pub const DEFAULT_NAMESPACE: &str = "c2si";
pub const LAST_CHECK_KEY: &str = "rss:last_check";

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub namespace: String,
    /// Categories checked on each pass, in order
    pub categories: Vec<NewsCategory>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            categories: NewsCategory::ALL.to_vec(),
        }
    }
}

impl CheckerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(namespace) = env::var("VECTOR_NAMESPACE") {
            if !namespace.trim().is_empty() {
                config.namespace = namespace.trim().to_string();
            }
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category: NewsCategory,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CategoryReport {
    fn new(category: NewsCategory) -> Self {
        Self {
            category,
            fetched: 0,
            inserted: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Outcome of one `check_and_update` pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
    pub failed_categories: Vec<NewsCategory>,
    pub duration_ms: u64,
}

impl PassReport {
    pub fn total_inserted(&self) -> usize {
        self.categories.iter().map(|c| c.inserted).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.categories.iter().map(|c| c.failed).sum()
    }

    pub fn category(&self, category: NewsCategory) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Pulls candidate articles per category and indexes the ones not seen before.
pub struct RssChecker {
    source: Arc<dyn NewsSource>,
    store: Arc<dyn ArticleStore>,
    index: Arc<dyn VectorIndex>,
    embeddings: EmbeddingGenerator,
    cache: Option<Arc<dyn CacheStore>>,
    config: CheckerConfig,
}

impl RssChecker {
    pub fn new(
        source: Arc<dyn NewsSource>,
        store: Arc<dyn ArticleStore>,
        index: Arc<dyn VectorIndex>,
        embeddings: EmbeddingGenerator,
        config: CheckerConfig,
    ) -> Self {
        Self {
            source,
            store,
            index,
            embeddings,
            cache: None,
            config,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub async fn get_existing_articles(&self) -> Result<HashSet<String>> {
        let urls = self.store.existing_urls().await?;
        debug!("{} articles already stored", urls.len());
        Ok(urls)
    }

    /// Embed and upsert every article whose URL is not in `seen`.
    /// Successfully indexed URLs are added to `seen`.
    pub async fn process_new_articles(
        &self,
        category: NewsCategory,
        articles: Vec<Article>,
        seen: &mut HashSet<String>,
        logger: &Logger,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(category);
        report.fetched = articles.len();

        for article in articles {
            if seen.contains(&article.url) {
                logger.debug(&format!("Already indexed: {}", article.url));
                report.skipped += 1;
                continue;
            }
            match self.process_article(&article).await {
                Ok(()) => {
                    logger.info(&format!("Inserted: {}", article.headline));
                    seen.insert(article.url);
                    report.inserted += 1;
                }
                Err(e) => {
                    logger.error(&format!("Error processing article {}: {}", article.url, e));
                    report.failed += 1;
                }
            }
        }
        report
    }

    pub async fn process_article(&self, article: &Article) -> Result<()> {
        let values = self.embeddings.generate_article_embedding(article).await?;
        let record = IndexRecord::new(article, values);
        self.index.upsert(&self.config.namespace, vec![record]).await
    }

    pub async fn check_category(
        &self,
        category: NewsCategory,
        seen: &mut HashSet<String>,
    ) -> Result<CategoryReport> {
        let logger = Logger::new().with_prefix(format!("[{}]", category));
        logger.info("Checking news");

        let articles = self.source.get_news(category).await?;
        if articles.is_empty() {
            logger.warn(&format!("No articles from {}", self.source.name()));
        }
        let report = self.process_new_articles(category, articles, seen, &logger).await;

        logger.info(&format!(
            "{} fetched, {} inserted, {} skipped, {} failed",
            report.fetched, report.inserted, report.skipped, report.failed
        ));
        Ok(report)
    }

    /// Run one pass over every configured category. Only a failure to read
    /// the existing articles aborts the pass.
    pub async fn check_and_update(&self) -> Result<PassReport> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let mut seen = self.get_existing_articles().await?;
        let mut categories = Vec::with_capacity(self.config.categories.len());
        let mut failed_categories = Vec::new();

        for &category in &self.config.categories {
            match self.check_category(category, &mut seen).await {
                Ok(report) => categories.push(report),
                Err(e) => {
                    error!("Error checking {} news: {}", category, e);
                    failed_categories.push(category);
                }
            }
        }

        let report = PassReport {
            started_at,
            categories,
            failed_categories,
            duration_ms: timer.elapsed().as_millis() as u64,
        };
        info!(
            "Pass finished: {} inserted, {} failed articles, {} failed categories",
            report.total_inserted(),
            report.total_failed(),
            report.failed_categories.len()
        );
        self.record_last_check(&report).await;
        Ok(report)
    }

    async fn record_last_check(&self, report: &PassReport) {
        let Some(cache) = &self.cache else {
            return;
        };
        match serde_json::to_string(report) {
            Ok(json) => {
                if !cache.set_cache(LAST_CHECK_KEY, &json, None).await {
                    warn!("Could not record last check in cache");
                }
            }
            Err(e) => warn!("Could not serialize pass report: {}", e),
        }
    }
}
