//! Airtable-backed catalog source
//!
//! Lists every record of one table. Fields map as `picklist_id` -> service,
//! `values_label` -> subservice, `Deliverables` -> deliverables.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{CatalogError, CatalogOption, CatalogSource};
use crate::config::CatalogConfig;

/// Upper bound on followed pagination offsets
const MAX_PAGES: usize = 100;

/// Airtable REST client for the options table
pub struct AirtableCatalog {
    base_url: String,
    base_id: String,
    table: String,
    api_key: String,
    http: Client,
}

impl AirtableCatalog {
    /// Create from config, resolving base id, table and key from the environment
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        debug!(base_url = %config.base_url, "AirtableCatalog::from_config: called");
        let env = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CatalogError::NotConfigured(format!("{} is not set", name)))
        };

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            base_id: env(&config.base_id_env)?,
            table: env(&config.table_env)?,
            api_key: env(&config.api_key_env)?,
            http,
        })
    }

    fn records_url(&self) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CatalogError::NotConfigured(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::NotConfigured(format!("Unusable base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v0", self.base_id.as_str(), self.table.as_str()]);
        Ok(url)
    }

    async fn fetch_page(&self, url: &Url, offset: Option<&str>) -> Result<RecordsPage, CatalogError> {
        debug!(?offset, "fetch_page: called");
        let mut request = self.http.get(url.clone()).bearer_auth(&self.api_key);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for AirtableCatalog {
    async fn fetch_options(&self) -> Result<Vec<CatalogOption>, CatalogError> {
        let url = self.records_url()?;
        let mut options = Vec::new();
        let mut offset: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(&url, offset.as_deref()).await?;
            options.extend(page.records.into_iter().map(|r| r.into_option()));
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        info!(count = options.len(), "Fetched catalog options");
        Ok(options)
    }
}

#[derive(Debug, Deserialize)]
struct RecordsPage {
    records: Vec<Record>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    fn into_option(self) -> CatalogOption {
        let text = |key: &str| self.fields.get(key).map(field_text).unwrap_or_default();
        CatalogOption {
            service: text("picklist_id"),
            subservice: text("values_label"),
            deliverables: text("Deliverables"),
        }
    }
}

/// Render an Airtable cell as text; multi-value cells are comma-joined
fn field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items.iter().map(field_text).collect::<Vec<_>>().join(", "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog(base_url: &str, table: &str) -> AirtableCatalog {
        AirtableCatalog {
            base_url: base_url.to_string(),
            base_id: "appXYZ".to_string(),
            table: table.to_string(),
            api_key: "key".to_string(),
            http: Client::new(),
        }
    }

    #[test]
    fn test_records_url_encodes_table() {
        let catalog = test_catalog("https://api.airtable.com", "Service Options");
        let url = catalog.records_url().unwrap();
        assert_eq!(url.as_str(), "https://api.airtable.com/v0/appXYZ/Service%20Options");
    }

    #[test]
    fn test_records_url_trailing_slash() {
        let catalog = test_catalog("https://api.airtable.com/", "Options");
        let url = catalog.records_url().unwrap();
        assert_eq!(url.as_str(), "https://api.airtable.com/v0/appXYZ/Options");
    }

    #[test]
    fn test_record_field_mapping() {
        let page: RecordsPage = serde_json::from_str(
            r#"{
                "records": [
                    {"id": "rec1", "fields": {"picklist_id": "Design", "values_label": "Branding", "Deliverables": ["Logo", "Palette"]}},
                    {"id": "rec2", "fields": {"picklist_id": "Dev"}},
                    {"id": "rec3"}
                ],
                "offset": "itr123"
            }"#,
        )
        .unwrap();

        assert_eq!(page.offset.as_deref(), Some("itr123"));
        let options: Vec<CatalogOption> = page.records.into_iter().map(|r| r.into_option()).collect();
        assert_eq!(options[0], CatalogOption::new("Design", "Branding", "Logo, Palette"));
        assert_eq!(options[1], CatalogOption::new("Dev", "", ""));
        assert_eq!(options[2], CatalogOption::default());
    }

    #[test]
    fn test_field_text_numbers() {
        assert_eq!(field_text(&serde_json::json!(3)), "3");
        assert_eq!(field_text(&serde_json::Value::Null), "");
    }
}
