use chrono::DateTime;
use serde::Serialize;

use crate::market::format::round2;
use crate::market::provider::{Bar, MarketDataProvider};
use crate::market::{
    checked_quote, MarketError, Period, Symbol, TROY_OUNCE_GRAMS, USD_TRY_TICKER,
};

/// One chart bar. `time` is the bar's calendar date (`YYYY-MM-DD`, UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleRow {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandleSeries {
    pub symbol: &'static str,
    pub period: &'static str,
    pub data: Vec<CandleRow>,
}

fn bar_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// `None` for a bar whose timestamp has no calendar date.
fn to_row(bar: &Bar, factor: f64) -> Option<CandleRow> {
    Some(CandleRow {
        time: bar_date(bar.timestamp)?,
        open: round2(bar.open * factor),
        high: round2(bar.high * factor),
        low: round2(bar.low * factor),
        close: round2(bar.close * factor),
        volume: bar.volume,
    })
}

/// Price history for `symbol` over `period`, oldest bar first.
///
/// Gram gold is the ounce series rescaled by the *current* USD/TRY rate, so
/// older bars carry today's exchange rate.
pub async fn fetch_series(
    provider: &dyn MarketDataProvider,
    symbol: Symbol,
    period: Period,
) -> Result<CandleSeries, MarketError> {
    let history = provider.history(symbol.ticker(), period.range(), period.interval());

    let (bars, factor) = match symbol {
        Symbol::GoldGram => {
            let (bars, usd_try) = futures::try_join!(history, provider.quote(USD_TRY_TICKER))?;
            let usd_try = checked_quote(USD_TRY_TICKER, usd_try)?;
            (bars, usd_try / TROY_OUNCE_GRAMS)
        }
        _ => (history.await?, 1.0),
    };

    let data: Vec<CandleRow> = bars.iter().filter_map(|bar| to_row(bar, factor)).collect();
    if data.is_empty() {
        return Err(MarketError::NoData(symbol));
    }

    Ok(CandleSeries {
        symbol: symbol.key(),
        period: period.as_str(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::provider::fake::FakeProvider;
    use crate::market::{ProviderError, GOLD_OUNCE_TICKER};

    fn bar(timestamp: i64, close: f64) -> Bar {
        Bar {
            timestamp,
            open: close - 1.0,
            high: close + 2.0,
            low: close - 3.0,
            close,
            volume: 500.0,
        }
    }

    #[tokio::test]
    async fn one_row_per_bar_in_order() {
        let provider = FakeProvider::default().with_series(
            "BTC-USD",
            vec![bar(1704067200, 42000.126), bar(1704153600, 43000.0)],
        );

        let series = fetch_series(&provider, Symbol::Bitcoin, Period::Weekly)
            .await
            .unwrap();

        assert_eq!(series.symbol, "bitcoin");
        assert_eq!(series.period, "weekly");
        assert_eq!(series.data.len(), 2);
        assert_eq!(series.data[0].time, "2024-01-01");
        assert_eq!(series.data[0].close, 42000.13);
        assert_eq!(series.data[1].time, "2024-01-02");
        assert_eq!(series.data[1].volume, 500.0);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["history:BTC-USD:3y:1wk"]);
    }

    #[tokio::test]
    async fn gram_gold_rescales_ounce_series_by_current_rate() {
        let provider = FakeProvider::default()
            .with_series(GOLD_OUNCE_TICKER, vec![bar(1704067200, 3110.35)])
            .with_quote(USD_TRY_TICKER, 40.0);

        let series = fetch_series(&provider, Symbol::GoldGram, Period::Daily)
            .await
            .unwrap();

        assert_eq!(series.data.len(), 1);
        assert_eq!(series.data[0].close, 4000.0);
        // Volume is not a price and is left alone.
        assert_eq!(series.data[0].volume, 500.0);
    }

    #[tokio::test]
    async fn gram_gold_without_fx_rate_is_a_provider_error() {
        let provider = FakeProvider::default()
            .with_series(GOLD_OUNCE_TICKER, vec![bar(1704067200, 3110.35)]);

        assert!(matches!(
            fetch_series(&provider, Symbol::GoldGram, Period::Daily).await,
            Err(MarketError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn gram_gold_rejects_unusable_fx_rate() {
        for rate in [f64::NAN, 0.0, -40.0] {
            let provider = FakeProvider::default()
                .with_series(GOLD_OUNCE_TICKER, vec![bar(1704067200, 3110.35)])
                .with_quote(USD_TRY_TICKER, rate);

            assert!(
                matches!(
                    fetch_series(&provider, Symbol::GoldGram, Period::Daily).await,
                    Err(MarketError::Provider(ProviderError::Malformed(_)))
                ),
                "rate {} was accepted",
                rate
            );
        }
    }

    #[tokio::test]
    async fn bars_without_a_calendar_date_are_skipped() {
        let provider = FakeProvider::default().with_series(
            "ETH-USD",
            vec![bar(i64::MAX, 3000.0), bar(1704067200, 3210.0)],
        );

        let series = fetch_series(&provider, Symbol::Ethereum, Period::Daily)
            .await
            .unwrap();
        assert_eq!(series.data.len(), 1);
        assert_eq!(series.data[0].time, "2024-01-01");

        let provider = FakeProvider::default().with_series("ETH-USD", vec![bar(i64::MAX, 3000.0)]);
        assert!(matches!(
            fetch_series(&provider, Symbol::Ethereum, Period::Daily).await,
            Err(MarketError::NoData(Symbol::Ethereum))
        ));
    }

    #[tokio::test]
    async fn empty_series_is_no_data() {
        let provider = FakeProvider::default();
        assert!(matches!(
            fetch_series(&provider, Symbol::Ethereum, Period::Monthly).await,
            Err(MarketError::NoData(Symbol::Ethereum))
        ));
    }

    #[test]
    fn dates_are_utc_calendar_days() {
        assert_eq!(bar_date(0).as_deref(), Some("1970-01-01"));
        assert_eq!(bar_date(1704153599).as_deref(), Some("2024-01-01"));
        assert_eq!(bar_date(i64::MAX), None);
    }
}
