use crate::domain::model::{Listing, ListingsPage};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://pro-api.coinmarketcap.com/v1";
pub const LISTINGS_PATH: &str = "/cryptocurrency/listings/latest";
pub const QUOTE_CURRENCY: &str = "USD";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

#[derive(Debug, Deserialize)]
struct ListingsResponse {
    #[serde(default)]
    status: Option<ApiStatus>,
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Client for the CoinMarketCap listings API.
#[derive(Debug, Clone)]
pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl CoinMarketCapClient {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_endpoint().trim_end_matches('/').to_string(),
            api_key: config.api_key().to_string(),
            timeout: config.request_timeout(),
            retry_attempts: config.retry_attempts(),
            retry_delay: config.retry_delay(),
        }
    }

    pub fn listings_url(&self) -> String {
        format!("{}{}", self.base_url, LISTINGS_PATH)
    }

    /// Fetches one page of the latest listings, priced in USD.
    ///
    /// Elements of `data` that do not decode as a listing are logged and
    /// counted in `rejected`; a missing or null `data` is an empty page.
    pub async fn get_latest_listings(&self, start: u32, limit: u32) -> Result<ListingsPage> {
        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.request_listings(start, limit).await {
                Ok(response) => break response,
                Err(e) if e.is_retryable() && attempt <= self.retry_attempts => {
                    tracing::warn!(
                        "⚠️ Listings request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt,
                        self.retry_attempts + 1,
                        e,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(status) = &response.status {
            if status.error_code.unwrap_or(0) != 0 {
                tracing::warn!(
                    "API reported error code {:?}: {}",
                    status.error_code,
                    status.error_message.as_deref().unwrap_or("")
                );
            }
        }

        let data = response.data.unwrap_or_default();
        let total = data.len();
        let mut page = ListingsPage {
            listings: Vec::with_capacity(total),
            rejected: 0,
        };
        for (index, item) in data.into_iter().enumerate() {
            match serde_json::from_value::<Listing>(item) {
                Ok(listing) => page.listings.push(listing),
                Err(e) => {
                    tracing::error!("Error decoding listing at index {}: {}", index, e);
                    page.rejected += 1;
                }
            }
        }

        tracing::debug!("Decoded {}/{} listings", page.listings.len(), total);
        Ok(page)
    }

    async fn request_listings(&self, start: u32, limit: u32) -> Result<ListingsResponse> {
        let url = self.listings_url();
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("start", start.to_string()),
                ("limit", limit.to_string()),
                ("convert", QUOTE_CURRENCY.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::ApiStatusError {
                status: status.as_u16(),
                message: error_message_from_body(status, &body),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str::<ListingsResponse>(&body)?)
    }
}

fn error_message_from_body(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ListingsResponse>(body)
        .ok()
        .and_then(|r| r.status)
        .and_then(|s| s.error_message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}
