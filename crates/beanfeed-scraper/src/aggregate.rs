//! Catalog aggregation across every configured source.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use beanfeed_core::{CanonicalBean, SourceConfig};
use tokio_util::sync::CancellationToken;

use crate::batch::BatchScheduler;
use crate::error::AggregateError;
use crate::source::BeanSource;

/// Result of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Deduplicated by id; the first occurrence wins.
    pub beans: Vec<CanonicalBean>,
    /// Number of (merchant, collection) tasks that ran.
    pub task_count: usize,
    /// Tasks that produced at least one bean.
    pub success_count: usize,
    /// Tasks that produced zero beans, whether they failed or the collection
    /// was simply empty.
    pub failure_count: usize,
    pub duplicate_count: usize,
    pub duration: Duration,
}

/// Fans every collection of every source out through a [`BatchScheduler`].
pub struct Aggregator<S> {
    source: S,
    scheduler: BatchScheduler,
}

impl<S: BeanSource> Aggregator<S> {
    #[must_use]
    pub fn new(source: S, scheduler: BatchScheduler) -> Self {
        Self { source, scheduler }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches every collection and merges the results.
    ///
    /// Per-source failures only lower `success_count`; if every source fails
    /// the report has an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Cancelled`] when `cancel` fires mid-run.
    pub async fn run(
        &self,
        sources: &[SourceConfig],
        cancel: &CancellationToken,
    ) -> Result<AggregateReport, AggregateError> {
        let started = Instant::now();

        let tasks: Vec<_> = sources
            .iter()
            .flat_map(SourceConfig::collection_pairs)
            .map(|(merchant, url)| self.source.fetch_beans(merchant, url))
            .collect();
        let task_count = tasks.len();

        let results = self.scheduler.run(tasks, cancel).await?;

        let mut report = AggregateReport {
            task_count,
            ..AggregateReport::default()
        };
        let mut seen = HashSet::new();

        for beans in results {
            match beans {
                Some(beans) if !beans.is_empty() => {
                    report.success_count += 1;
                    for bean in beans {
                        if seen.insert(bean.id.clone()) {
                            report.beans.push(bean);
                        } else {
                            report.duplicate_count += 1;
                        }
                    }
                }
                _ => report.failure_count += 1,
            }
        }

        report.duration = started.elapsed();

        tracing::info!(
            sources = sources.len(),
            tasks = task_count,
            successful = report.success_count,
            failed = report.failure_count,
            beans = report.beans.len(),
            duplicates = report.duplicate_count,
            duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "aggregation complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::ScraperError;

    /// Serves canned beans per collection URL; unknown URLs fail.
    struct FakeSource {
        beans: HashMap<String, Vec<CanonicalBean>>,
    }

    impl BeanSource for FakeSource {
        async fn fetch_beans(
            &self,
            _merchant: &str,
            collection_url: &str,
        ) -> Result<Vec<CanonicalBean>, ScraperError> {
            self.beans
                .get(collection_url)
                .cloned()
                .ok_or_else(|| ScraperError::NotFound {
                    url: collection_url.to_owned(),
                })
        }
    }

    fn bean(merchant: &str, id: &str, name: &str) -> CanonicalBean {
        CanonicalBean {
            id: CanonicalBean::make_id(merchant, id),
            name: name.to_owned(),
            merchant: merchant.to_owned(),
            price: None,
            weight_grams: None,
            roast_level: None,
            origin: None,
            process: None,
            tasting_notes: Vec::new(),
            image: None,
            url: format!("https://{merchant}.example/products/{id}"),
            in_stock: true,
            fetch_date: None,
        }
    }

    fn source(name: &str, collections: &[&str]) -> SourceConfig {
        SourceConfig {
            name: name.to_owned(),
            collections: collections.iter().map(|c| (*c).to_owned()).collect(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn dedups_by_id_first_seen_wins() {
        let fake = FakeSource {
            beans: HashMap::from([
                (
                    "https://a/coffee".to_owned(),
                    vec![bean("A", "1", "first"), bean("A", "2", "two")],
                ),
                (
                    "https://a/single-origin".to_owned(),
                    vec![bean("A", "1", "second")],
                ),
            ]),
        };
        let aggregator = Aggregator::new(fake, BatchScheduler::new(2, Duration::ZERO));
        let report = aggregator
            .run(
                &[source("A", &["https://a/coffee", "https://a/single-origin"])],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.beans.len(), 2);
        assert_eq!(report.beans[0].name, "first");
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 0);
    }

    #[tokio::test]
    async fn same_source_id_under_different_merchants_is_kept() {
        let fake = FakeSource {
            beans: HashMap::from([
                ("https://a/c".to_owned(), vec![bean("A", "1", "a")]),
                ("https://b/c".to_owned(), vec![bean("B", "1", "b")]),
            ]),
        };
        let report = Aggregator::new(fake, BatchScheduler::new(5, Duration::ZERO))
            .run(
                &[source("A", &["https://a/c"]), source("B", &["https://b/c"])],
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(report.beans.len(), 2);
    }

    #[tokio::test]
    async fn every_source_failing_yields_empty_catalog() {
        let fake = FakeSource {
            beans: HashMap::new(),
        };
        let sources = [
            source("A", &["https://a/1", "https://a/2"]),
            source("B", &["https://b/1"]),
        ];
        let report = Aggregator::new(fake, BatchScheduler::new(2, Duration::ZERO))
            .run(&sources, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.beans.is_empty());
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failure_count, 3);
        assert_eq!(report.task_count, 3);
    }

    #[tokio::test]
    async fn empty_collection_counts_as_failure() {
        let fake = FakeSource {
            beans: HashMap::from([("https://a/c".to_owned(), Vec::new())]),
        };
        let report = Aggregator::new(fake, BatchScheduler::new(2, Duration::ZERO))
            .run(&[source("A", &["https://a/c"])], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.failure_count, 1);
    }

    #[tokio::test]
    async fn cancelled_run_returns_error() {
        let fake = FakeSource {
            beans: HashMap::new(),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = Aggregator::new(fake, BatchScheduler::new(1, Duration::ZERO))
            .run(&[source("A", &["https://a/c"])], &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AggregateError::Cancelled { .. }));
    }
}
