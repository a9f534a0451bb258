use std::collections::BTreeMap;

use serde::Serialize;

use crate::market::format::{try_amount, usd_amount};
use crate::market::provider::MarketDataProvider;
use crate::market::{
    checked_quote, gram_gold, ProviderError, Symbol, GOLD_OUNCE_TICKER, USD_TRY_TICKER,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub name: &'static str,
    pub value: String,
    pub logo: &'static str,
}

/// Symbol key -> board card.
pub type Snapshot = BTreeMap<&'static str, SnapshotEntry>;

/// Latest values for every symbol. One bad quote fails the whole snapshot so
/// the board never mixes fresh and missing values.
pub async fn fetch_snapshot(provider: &dyn MarketDataProvider) -> Result<Snapshot, ProviderError> {
    let (ounce, usd_try, btc, eth) = futures::try_join!(
        provider.quote(GOLD_OUNCE_TICKER),
        provider.quote(USD_TRY_TICKER),
        provider.quote(Symbol::Bitcoin.ticker()),
        provider.quote(Symbol::Ethereum.ticker())
    )?;

    let ounce = checked_quote(GOLD_OUNCE_TICKER, ounce)?;
    let usd_try = checked_quote(USD_TRY_TICKER, usd_try)?;
    let btc = checked_quote(Symbol::Bitcoin.ticker(), btc)?;
    let eth = checked_quote(Symbol::Ethereum.ticker(), eth)?;

    let values = [
        (Symbol::GoldGram, try_amount(gram_gold(ounce, usd_try))),
        (Symbol::UsdTry, try_amount(usd_try)),
        (Symbol::Bitcoin, usd_amount(btc)),
        (Symbol::Ethereum, usd_amount(eth)),
    ];

    Ok(values
        .into_iter()
        .map(|(symbol, value)| {
            (
                symbol.key(),
                SnapshotEntry {
                    name: symbol.display_name(),
                    value,
                    logo: symbol.logo(),
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::provider::fake::FakeProvider;

    fn full_provider() -> FakeProvider {
        FakeProvider::default()
            .with_quote(GOLD_OUNCE_TICKER, 3110.35)
            .with_quote(USD_TRY_TICKER, 40.0)
            .with_quote("BTC-USD", 104250.5)
            .with_quote("ETH-USD", 3210.0)
    }

    #[tokio::test]
    async fn snapshot_has_every_symbol_formatted() {
        let snapshot = fetch_snapshot(&full_provider()).await.unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot["gold_gram"].value, "4.000,00 ₺");
        assert_eq!(snapshot["gold_gram"].name, "Gram Altın");
        assert_eq!(snapshot["usd_try"].value, "40,00 ₺");
        assert_eq!(snapshot["bitcoin"].value, "$104,250.50");
        assert_eq!(snapshot["ethereum"].value, "$3,210.00");
        assert_eq!(snapshot["bitcoin"].logo, "₿");
    }

    #[tokio::test]
    async fn one_missing_quote_fails_everything() {
        let provider = FakeProvider::default()
            .with_quote(GOLD_OUNCE_TICKER, 3110.35)
            .with_quote(USD_TRY_TICKER, 40.0)
            .with_quote("BTC-USD", 104250.5);

        assert!(fetch_snapshot(&provider).await.is_err());
    }

    #[tokio::test]
    async fn nan_quote_fails_everything() {
        let provider = full_provider().with_quote("ETH-USD", f64::NAN);
        assert!(matches!(
            fetch_snapshot(&provider).await,
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn zero_fx_rate_fails_everything() {
        let provider = full_provider().with_quote(USD_TRY_TICKER, 0.0);
        assert!(fetch_snapshot(&provider).await.is_err());
    }
}
