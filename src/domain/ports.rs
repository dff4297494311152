use crate::domain::model::{ListingsPage, LoadSummary, QuoteRow, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait QuoteStore: Send + Sync {
    fn ensure_schema(&self) -> impl std::future::Future<Output = Result<()>> + Send;
    fn insert_quotes(
        &self,
        rows: &[QuoteRow],
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> &str;
    fn listing_start(&self) -> u32;
    fn listing_limit(&self) -> u32;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Runs before extraction; the default does nothing.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
    async fn extract(&self) -> Result<ListingsPage>;
    async fn transform(&self, data: ListingsPage) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<LoadSummary>;
}
