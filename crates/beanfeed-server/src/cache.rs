//! In-memory catalog cache with stale fallback.
//!
//! [`CatalogCache`] holds the last successful catalog and swaps it wholesale;
//! readers always see either the old or the new snapshot. [`CatalogService`]
//! owns the refresh policy around it: serve fresh data, otherwise refresh
//! once (concurrent misses share the run), otherwise fall back to the last
//! snapshot flagged stale.

use std::sync::Arc;
use std::time::Duration;

use beanfeed_core::{CanonicalBean, SourceConfig};
use beanfeed_scraper::{AggregateError, AggregateReport, Aggregator, BeanSource};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog refresh failed: {0}")]
    RefreshFailed(#[from] AggregateError),

    #[error("catalog refresh timed out after {timeout_secs}s")]
    RefreshTimedOut { timeout_secs: u64 },

    #[error("no source returned any beans ({failed} collections failed)")]
    NoSourcesSucceeded { failed: usize },
}

/// One stored catalog snapshot. Never mutated after creation.
#[derive(Debug)]
pub struct CacheEntry {
    pub beans: Arc<Vec<CanonicalBean>>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Time since the snapshot was stored; zero if the clock went backwards.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, freshness: Duration) -> bool {
        self.age_at(now) < freshness
    }
}

/// Process-wide holder of the latest catalog snapshot.
#[derive(Debug)]
pub struct CatalogCache {
    entry: RwLock<Option<Arc<CacheEntry>>>,
    freshness: Duration,
}

impl CatalogCache {
    #[must_use]
    pub fn new(freshness: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            freshness,
        }
    }

    #[must_use]
    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub async fn snapshot(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().await.clone()
    }

    /// `true` iff a snapshot exists and is younger than the freshness window.
    pub async fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now()).await
    }

    pub async fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.snapshot()
            .await
            .is_some_and(|entry| entry.is_fresh_at(now, self.freshness))
    }

    /// Replaces the snapshot, stamped with the current time.
    pub async fn set(&self, beans: Vec<CanonicalBean>) -> Arc<CacheEntry> {
        self.set_at(beans, Utc::now()).await
    }

    pub async fn set_at(
        &self,
        beans: Vec<CanonicalBean>,
        fetched_at: DateTime<Utc>,
    ) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            beans: Arc::new(beans),
            fetched_at,
        });
        *self.entry.write().await = Some(Arc::clone(&entry));
        entry
    }
}

/// Produces a fresh catalog. Implemented over the aggregator in production
/// and by canned fakes in tests.
pub trait CatalogRefresher: Send + Sync {
    fn refresh(
        &self,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<AggregateReport, AggregateError>>;
}

/// [`CatalogRefresher`] that aggregates a fixed list of sources.
pub struct AggregatorRefresher<S> {
    aggregator: Aggregator<S>,
    sources: Vec<SourceConfig>,
}

impl<S> AggregatorRefresher<S> {
    #[must_use]
    pub fn new(aggregator: Aggregator<S>, sources: Vec<SourceConfig>) -> Self {
        Self {
            aggregator,
            sources,
        }
    }
}

impl<S: BeanSource> CatalogRefresher for AggregatorRefresher<S> {
    fn refresh(
        &self,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<AggregateReport, AggregateError>> {
        Box::pin(async move { self.aggregator.run(&self.sources, &cancel).await })
    }
}

/// What a catalog read returned and how it was obtained.
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub beans: Arc<Vec<CanonicalBean>>,
    /// Served from the cache rather than a refresh made for this read.
    pub cached: bool,
    /// Refresh failed and this is an older snapshot.
    pub stale: bool,
    pub last_update: DateTime<Utc>,
    pub warning: Option<String>,
}

impl CatalogView {
    fn from_entry(entry: &CacheEntry, cached: bool) -> Self {
        Self {
            beans: Arc::clone(&entry.beans),
            cached,
            stale: false,
            last_update: entry.fetched_at,
            warning: None,
        }
    }
}

/// Summary of a completed refresh.
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub count: usize,
    pub fetch_time: Duration,
    pub last_update: DateTime<Utc>,
    pub success_count: usize,
    pub failure_count: usize,
}

pub struct CatalogService {
    cache: CatalogCache,
    refresher: Arc<dyn CatalogRefresher>,
    refresh_lock: Mutex<()>,
    refresh_timeout: Duration,
    shutdown: CancellationToken,
}

impl CatalogService {
    /// `shutdown` is the parent of every refresh's cancellation token.
    #[must_use]
    pub fn new(
        refresher: Arc<dyn CatalogRefresher>,
        freshness: Duration,
        refresh_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            cache: CatalogCache::new(freshness),
            refresher,
            refresh_lock: Mutex::new(()),
            refresh_timeout,
            shutdown,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Returns the catalog, refreshing it first if the cache is not fresh.
    ///
    /// A run in which no source produced a bean counts as a failed refresh.
    ///
    /// # Errors
    ///
    /// Fails only when the refresh fails and no earlier snapshot exists.
    pub async fn get_catalog(&self) -> Result<CatalogView, CatalogError> {
        if let Some(entry) = self.fresh_snapshot().await {
            return Ok(CatalogView::from_entry(&entry, true));
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited for the lock.
        if let Some(entry) = self.fresh_snapshot().await {
            return Ok(CatalogView::from_entry(&entry, true));
        }

        match self.refresh_locked().await {
            Ok((entry, _)) => Ok(CatalogView::from_entry(&entry, false)),
            Err(err) => {
                let Some(previous) = self.cache.snapshot().await else {
                    tracing::error!(error = %err, "catalog refresh failed with no cached fallback");
                    return Err(err);
                };
                tracing::warn!(
                    error = %err,
                    last_update = %previous.fetched_at,
                    beans = previous.beans.len(),
                    "catalog refresh failed; serving stale snapshot"
                );
                let mut view = CatalogView::from_entry(&previous, true);
                view.stale = true;
                view.warning = Some(format!(
                    "Refresh failed ({err}); serving data from {}",
                    previous.fetched_at.to_rfc3339()
                ));
                Ok(view)
            }
        }
    }

    /// Runs a full refresh regardless of cache freshness. A refresh already
    /// in flight finishes first.
    ///
    /// # Errors
    ///
    /// Returns the refresh error; the existing snapshot is left untouched.
    pub async fn force_refresh(&self) -> Result<RefreshSummary, CatalogError> {
        let _guard = self.refresh_lock.lock().await;
        let (entry, report) = self.refresh_locked().await?;
        Ok(RefreshSummary {
            count: entry.beans.len(),
            fetch_time: report.duration,
            last_update: entry.fetched_at,
            success_count: report.success_count,
            failure_count: report.failure_count,
        })
    }

    async fn fresh_snapshot(&self) -> Option<Arc<CacheEntry>> {
        self.cache
            .snapshot()
            .await
            .filter(|entry| entry.is_fresh_at(Utc::now(), self.cache.freshness()))
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<(Arc<CacheEntry>, AggregateReport), CatalogError> {
        let cancel = self.shutdown.child_token();
        let refresh = self.refresher.refresh(cancel.clone());

        let mut report = match tokio::time::timeout(self.refresh_timeout, refresh).await {
            Ok(result) => result?,
            Err(_) => {
                cancel.cancel();
                return Err(CatalogError::RefreshTimedOut {
                    timeout_secs: self.refresh_timeout.as_secs(),
                });
            }
        };

        // An all-failed run must not replace a good snapshot with nothing.
        if report.success_count == 0 && report.task_count > 0 {
            return Err(CatalogError::NoSourcesSucceeded {
                failed: report.failure_count,
            });
        }

        let beans = std::mem::take(&mut report.beans);
        let entry = self.cache.set(beans).await;
        tracing::info!(
            beans = entry.beans.len(),
            successful = report.success_count,
            failed = report.failure_count,
            "catalog cache updated"
        );
        Ok((entry, report))
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
