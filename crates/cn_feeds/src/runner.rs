use std::future::Future;
use std::time::{Duration, Instant};
use chrono::Local;
use tracing::{error, info};
use crate::checker::RssChecker;

pub const DEFAULT_INTERVAL_MINUTES: u64 = 180;
/// One year
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;
pub const RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Sleep after a successful pass
    pub interval: Duration,
    /// Sleep after a failed pass
    pub retry_delay: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::every_minutes(DEFAULT_INTERVAL_MINUTES)
    }
}

impl Schedule {
    /// Intervals above `MAX_INTERVAL_MINUTES` are clamped.
    pub fn every_minutes(minutes: u64) -> Self {
        Self {
            interval: Duration::from_secs(minutes.min(MAX_INTERVAL_MINUTES) * 60),
            retry_delay: RETRY_DELAY,
        }
    }
}

/// Alternate between checking and sleeping until `shutdown` resolves.
/// Shutdown is honoured both mid-pass and mid-sleep.
pub async fn run_periodic_check<F>(checker: &RssChecker, schedule: Schedule, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        info!("Starting RSS check at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let started = Instant::now();

        let outcome = tokio::select! {
            result = checker.check_and_update() => result,
            _ = &mut shutdown => break,
        };

        let delay = match outcome {
            Ok(report) => {
                info!(
                    "RSS check completed in {:.2} seconds ({} new articles)",
                    started.elapsed().as_secs_f64(),
                    report.total_inserted()
                );
                schedule.interval
            }
            Err(e) => {
                error!("Error in periodic check: {}", e);
                schedule.retry_delay
            }
        };

        info!("Next check in {} minutes", delay.as_secs() / 60);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut shutdown => break,
        }
    }

    info!("RSS checker stopped by user");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CheckerConfig;
    use async_trait::async_trait;
    use cn_core::{Article, ArticleStore, Error, NewsCategory, NewsSource, Result, StoredArticle};
    use cn_inference::models::dummy::DummyModel;
    use cn_inference::EmbeddingGenerator;
    use cn_storage::backends::MemoryIndex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct EmptySource;

    #[async_trait]
    impl NewsSource for EmptySource {
        fn name(&self) -> &str {
            "empty"
        }

        async fn get_news(&self, _category: NewsCategory) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }
    }

    /// Counts passes; fails every pass when `broken`.
    struct CountingStore {
        calls: AtomicUsize,
        broken: bool,
    }

    #[async_trait]
    impl ArticleStore for CountingStore {
        async fn list_articles(&self) -> Result<Vec<StoredArticle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(Error::Database("unavailable".to_string()));
            }
            Ok(Vec::new())
        }
    }

    fn checker(store: Arc<CountingStore>) -> RssChecker {
        RssChecker::new(
            Arc::new(EmptySource),
            store,
            Arc::new(MemoryIndex::new()),
            EmbeddingGenerator::new(Arc::new(DummyModel::new(None))),
            CheckerConfig::default(),
        )
    }

    async fn wait_for_passes(store: Arc<CountingStore>, passes: usize) {
        while store.calls.load(Ordering::SeqCst) < passes {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn test_schedule() {
        let schedule = Schedule::every_minutes(10);
        assert_eq!(schedule.interval, Duration::from_secs(600));
        assert_eq!(schedule.retry_delay, Duration::from_secs(300));
        assert_eq!(Schedule::default().interval, Duration::from_secs(180 * 60));
    }

    #[test]
    fn test_huge_interval_is_clamped() {
        let schedule = Schedule::every_minutes(u64::MAX);
        assert_eq!(schedule.interval, Duration::from_secs(MAX_INTERVAL_MINUTES * 60));
        assert_eq!(schedule.retry_delay, RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_runs_repeatedly_until_shutdown() {
        let store = Arc::new(CountingStore { calls: AtomicUsize::new(0), broken: false });
        let checker = checker(store.clone());
        let schedule = Schedule {
            interval: Duration::from_millis(10),
            retry_delay: Duration::from_secs(3600),
        };

        tokio::time::timeout(
            Duration::from_secs(5),
            run_periodic_check(&checker, schedule, wait_for_passes(store.clone(), 3)),
        )
        .await
        .unwrap();
        assert!(store.calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_failed_pass_uses_retry_delay() {
        let store = Arc::new(CountingStore { calls: AtomicUsize::new(0), broken: true });
        let checker = checker(store.clone());
        let schedule = Schedule {
            interval: Duration::from_secs(3600),
            retry_delay: Duration::from_millis(10),
        };

        tokio::time::timeout(
            Duration::from_secs(5),
            run_periodic_check(&checker, schedule, wait_for_passes(store.clone(), 2)),
        )
        .await
        .unwrap();
        assert!(store.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_during_sleep() {
        let store = Arc::new(CountingStore { calls: AtomicUsize::new(0), broken: false });
        let checker = checker(store.clone());

        tokio::time::timeout(
            Duration::from_secs(5),
            run_periodic_check(&checker, Schedule::default(), wait_for_passes(store.clone(), 1)),
        )
        .await
        .unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
