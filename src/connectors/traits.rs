use crate::types::Quote;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest price for `symbol`.
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
}
