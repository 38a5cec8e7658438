//! Cross-conversation cache for catalog options

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CatalogError, CatalogOption, CatalogSource};

/// Caches a successful fetch for `ttl`; failures are never cached
pub struct CachedCatalog {
    inner: Arc<dyn CatalogSource>,
    ttl: Duration,
    cached: RwLock<Option<(Instant, Vec<CatalogOption>)>>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }
}

#[async_trait]
impl CatalogSource for CachedCatalog {
    async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError> {
        if let Some((fetched_at, options)) = self.cached.read().await.as_ref()
            && fetched_at.elapsed() < self.ttl
        {
            debug!(count = options.len(), "CachedCatalog::fetch_options: cache hit");
            return Ok(options.clone());
        }

        debug!("CachedCatalog::fetch_options: cache miss");
        let options = self.inner.fetch_options().await?;
        *self.cached.write().await = Some((Instant::now(), options.clone()));
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCatalog {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CatalogSource for CountingCatalog {
        async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::InvalidResponse("down".to_string()));
            }
            Ok(vec![CatalogOption::new("Design", "Logo", "SVG")])
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = CachedCatalog::new(inner.clone(), Duration::from_secs(60));

        assert_eq!(cache.fetch_options().await.unwrap().len(), 1);
        assert_eq!(cache.fetch_options().await.unwrap().len(), 1);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = CachedCatalog::new(inner.clone(), Duration::ZERO);

        cache.fetch_options().await.unwrap();
        cache.fetch_options().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingCatalog {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cache = CachedCatalog::new(inner.clone(), Duration::from_secs(60));

        assert!(cache.fetch_options().await.is_err());
        assert!(cache.fetch_options().await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
