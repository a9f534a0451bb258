//! Yahoo Finance chart API client.
//!
//! Both quotes and history come from `/v8/finance/chart/{ticker}`: the quote is
//! `meta.regularMarketPrice`, the bars are the parallel `timestamp` and
//! `indicators.quote[0]` arrays.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::market::provider::{Bar, MarketDataProvider};
use crate::market::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// The chart endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) marketsquare/0.1";

pub struct YahooProvider {
    base_url: String,
    client: Client,
}

impl YahooProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, ticker: &str, range: &str, interval: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, ticker, range, interval
        )
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Option<ChartResult>, ProviderError> {
        let url = self.chart_url(ticker, range, interval);
        tracing::debug!("Fetching chart: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!("Provider has no chart for {}", ticker);
            return Ok(None);
        }
        if !status.is_success() {
            tracing::warn!("Provider returned {} for {}", status, ticker);
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_chart(&body)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn quote(&self, ticker: &str) -> Result<f64, ProviderError> {
        let chart = self
            .fetch_chart(ticker, "5d", "1d")
            .await?
            .ok_or_else(|| ProviderError::Malformed(format!("no chart for {}", ticker)))?;
        quote_from(&chart, ticker)
    }

    async fn history(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, ProviderError> {
        match self.fetch_chart(ticker, range, interval).await? {
            Some(chart) => Ok(bars_from(&chart)),
            None => Ok(Vec::new()),
        }
    }
}

// -- Wire types --

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartFault>,
}

#[derive(Debug, Deserialize)]
struct ChartFault {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// `Ok(None)` when the provider reports the ticker has no data.
fn parse_chart(body: &[u8]) -> Result<Option<ChartResult>, ProviderError> {
    let envelope: ChartEnvelope =
        serde_json::from_slice(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(fault) = envelope.chart.error {
        let code = fault.code.unwrap_or_default();
        if code.eq_ignore_ascii_case("Not Found") {
            return Ok(None);
        }
        return Err(ProviderError::Malformed(format!(
            "{}: {}",
            code,
            fault.description.unwrap_or_default()
        )));
    }

    Ok(envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next()))
}

fn quote_from(chart: &ChartResult, ticker: &str) -> Result<f64, ProviderError> {
    chart
        .meta
        .regular_market_price
        .ok_or_else(|| ProviderError::Malformed(format!("no price for {}", ticker)))
}

/// Zips the parallel columns into bars, skipping any bar with a missing price.
fn bars_from(chart: &ChartResult) -> Vec<Bar> {
    let Some(columns) = chart.indicators.quote.first() else {
        return Vec::new();
    };
    fn at(col: &[Option<f64>], i: usize) -> Option<f64> {
        col.get(i).copied().flatten()
    }

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &timestamp)| {
            Some(Bar {
                timestamp,
                open: at(&columns.open, i)?,
                high: at(&columns.high, i)?,
                low: at(&columns.low, i)?,
                close: at(&columns.close, i)?,
                volume: at(&columns.volume, i).unwrap_or(0.0),
            })
        })
        .collect()
}
