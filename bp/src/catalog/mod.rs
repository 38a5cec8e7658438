//! Catalog of allowed (service, subservice, deliverable) options
//!
//! The catalog is read-only external data. Breakdown prompts embed it so the
//! model picks each step's service, subservice and deliverables from a fixed
//! list.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

mod airtable;
mod cache;
mod format;

pub use airtable::AirtableCatalog;
pub use cache::CachedCatalog;
pub use format::{NO_OPTIONS_SENTINEL, format_options};

use crate::config::CatalogConfig;

/// One allowed (service, subservice, deliverables) triple
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOption {
    pub service: String,
    pub subservice: String,
    pub deliverables: String,
}

impl CatalogOption {
    pub fn new(service: impl Into<String>, subservice: impl Into<String>, deliverables: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            subservice: subservice.into(),
            deliverables: deliverables.into(),
        }
    }
}

/// Errors from fetching catalog options
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog not configured: {0}")]
    NotConfigured(String),

    #[error("Catalog request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Catalog API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed catalog response: {0}")]
    InvalidResponse(String),
}

/// Source of catalog options
///
/// An empty list is a valid result.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError>;
}

/// Catalog with no options; prompts fall back to the sentinel line
#[derive(Debug, Clone, Default)]
pub struct EmptyCatalog;

#[async_trait]
impl CatalogSource for EmptyCatalog {
    async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError> {
        Ok(Vec::new())
    }
}

/// Fixed in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    options: Vec<CatalogOption>,
}

impl StaticCatalog {
    pub fn new(options: Vec<CatalogOption>) -> Self {
        Self { options }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError> {
        Ok(self.options.clone())
    }
}

/// Create the catalog source named in config, wrapped in a cache when enabled
pub fn create_catalog(config: &CatalogConfig) -> Result<Arc<dyn CatalogSource>, CatalogError> {
    debug!(provider = %config.provider, ttl = config.cache_ttl_secs, "create_catalog: called");
    let source: Arc<dyn CatalogSource> = match config.provider.as_str() {
        "airtable" => Arc::new(AirtableCatalog::from_config(config)?),
        "none" => Arc::new(EmptyCatalog),
        other => {
            return Err(CatalogError::NotConfigured(format!(
                "Unknown catalog provider: '{}'. Supported: airtable, none",
                other
            )));
        }
    };

    if config.cache_ttl_secs == 0 {
        return Ok(source);
    }
    Ok(Arc::new(CachedCatalog::new(
        source,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}

/// Fetch options, degrading to an empty list when the source fails
///
/// A missing catalog only weakens the prompt; it never fails a request.
pub async fn fetch_or_empty(catalog: &dyn CatalogSource) -> Vec<CatalogOption> {
    match catalog.fetch_options().await {
        Ok(options) => {
            debug!(count = options.len(), "fetch_or_empty: fetched options");
            options
        }
        Err(e) => {
            warn!(error = %e, "fetch_or_empty: catalog unavailable, continuing without options");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingCatalog;

    #[async_trait]
    impl CatalogSource for FailingCatalog {
        async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError> {
            Err(CatalogError::InvalidResponse("no records".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fetch_or_empty_degrades() {
        assert!(fetch_or_empty(&FailingCatalog).await.is_empty());
    }

    #[tokio::test]
    async fn test_static_catalog_returns_options() {
        let catalog = StaticCatalog::new(vec![CatalogOption::new("Design", "Logo", "SVG")]);
        let options = fetch_or_empty(&catalog).await;
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].service, "Design");
    }

    #[test]
    fn test_create_catalog_none_provider() {
        let config = CatalogConfig {
            provider: "none".to_string(),
            cache_ttl_secs: 0,
            ..CatalogConfig::default()
        };
        assert!(create_catalog(&config).is_ok());
    }

    #[test]
    fn test_create_catalog_unknown_provider() {
        let config = CatalogConfig {
            provider: "sheets".to_string(),
            ..CatalogConfig::default()
        };
        assert!(matches!(create_catalog(&config), Err(CatalogError::NotConfigured(_))));
    }
}
