//! In-process feed response cache.
//!
//! Feed results are cached under [`FeedCriteria::cache_key`] with a fixed
//! time-to-live. Entries are never invalidated explicitly; imports become
//! visible once the TTL lapses.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use moka::future::Cache;

use craftfolio_feed_core::criteria::{FeedCacheKey, FeedCriteria};
use craftfolio_feed_core::models::FeedPreview;
use craftfolio_feed_core::ranking::get_filtered_feeds;
use craftfolio_feed_core::store::PortfolioStore;

use crate::config::CacheConfig;

/// Cached feed results keyed by canonical criteria.
#[derive(Clone)]
pub struct FeedCache {
    inner: Option<Cache<FeedCacheKey, Arc<Vec<FeedPreview>>>>,
}

impl FeedCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = config.enabled.then(|| {
            Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build()
        });
        Self { inner }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Return the cached feed for `criteria`, or compute and cache it.
    ///
    /// Store errors are returned and nothing is cached.
    pub async fn get_or_load<S: PortfolioStore + ?Sized>(
        &self,
        store: &S,
        criteria: &FeedCriteria,
    ) -> Result<Arc<Vec<FeedPreview>>> {
        let Some(cache) = &self.inner else {
            return Ok(Arc::new(get_filtered_feeds(store, criteria).await?));
        };

        let key = criteria.cache_key();
        if let Some(hit) = cache.get(&key).await {
            tracing::debug!(?key, "feed cache hit");
            return Ok(hit);
        }

        tracing::debug!(?key, "feed cache miss");
        let feeds = Arc::new(get_filtered_feeds(store, criteria).await?);
        cache.insert(key, feeds.clone()).await;
        Ok(feeds)
    }
}
