use std::sync::Arc;

use async_trait::async_trait;

use crate::market::ProviderError;

/// One OHLCV bar as delivered by the provider. `timestamp` is unix seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// External market-data source. Implementations must bound every call in time.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest price for a provider ticker.
    async fn quote(&self, ticker: &str) -> Result<f64, ProviderError>;

    /// Historical bars for a provider ticker, oldest first. An unknown or
    /// empty series is `Ok(vec![])`.
    async fn history(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, ProviderError>;
}

/// Type alias for Arc-wrapped provider (for AppState)
pub type DynMarketDataProvider = Arc<dyn MarketDataProvider>;
