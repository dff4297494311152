use crate::adapters::coinmarketcap::CoinMarketCapClient;
use crate::core::transform::transform_listings;
use crate::core::{ConfigProvider, ListingsPage, LoadSummary, Pipeline, QuoteStore, TransformResult};
use crate::utils::error::Result;

/// Fetches the latest listings and stores them through a [`QuoteStore`].
pub struct ListingsPipeline<S: QuoteStore, C: ConfigProvider> {
    store: S,
    config: C,
    client: CoinMarketCapClient,
}

impl<S: QuoteStore, C: ConfigProvider> ListingsPipeline<S, C> {
    pub fn new(store: S, config: C) -> Self {
        let client = CoinMarketCapClient::from_config(&config);
        Self {
            store,
            config,
            client,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait::async_trait]
impl<S: QuoteStore, C: ConfigProvider> Pipeline for ListingsPipeline<S, C> {
    async fn prepare(&self) -> Result<()> {
        tracing::info!("Connecting to PostgreSQL database...");
        self.store.ensure_schema().await
    }

    async fn extract(&self) -> Result<ListingsPage> {
        tracing::info!("Fetching data from CoinMarketCap API");
        self.client
            .get_latest_listings(self.config.listing_start(), self.config.listing_limit())
            .await
    }

    async fn transform(&self, data: ListingsPage) -> Result<TransformResult> {
        let mut result = transform_listings(data.listings);
        result.skipped += data.rejected;
        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<LoadSummary> {
        if result.rows.is_empty() {
            tracing::info!("No valid data to insert.");
            return Ok(LoadSummary::default());
        }

        let attempted = result.rows.len();
        let inserted = self.store.insert_quotes(&result.rows).await.map_err(|e| {
            tracing::error!("Database insertion failed: {}", e);
            e
        })?;

        tracing::info!(
            "Successfully inserted {} records into the database ({} already present).",
            inserted,
            (attempted as u64).saturating_sub(inserted)
        );
        Ok(LoadSummary {
            attempted,
            inserted,
        })
    }
}
