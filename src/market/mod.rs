pub mod calendar;
pub mod candles;
pub mod format;
pub mod provider;
pub mod snapshot;
pub mod yahoo;

use std::fmt;

use thiserror::Error;

use crate::error::AppError;

pub use provider::{Bar, DynMarketDataProvider, MarketDataProvider};

/// Grams in one troy ounce.
pub const TROY_OUNCE_GRAMS: f64 = 31.1035;

/// Gold futures, quoted in USD per troy ounce.
pub const GOLD_OUNCE_TICKER: &str = "GC=F";
/// USD/TRY spot.
pub const USD_TRY_TICKER: &str = "TRY=X";

/// Gram gold in TRY from an ounce price in USD and the USD/TRY rate.
pub fn gram_gold(ounce_usd: f64, usd_try: f64) -> f64 {
    ounce_usd / TROY_OUNCE_GRAMS * usd_try
}

/// Rejects quotes that cannot be a price: NaN, infinite, zero or negative.
pub fn checked_quote(ticker: &str, value: f64) -> Result<f64, ProviderError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ProviderError::Malformed(format!(
            "{} quoted as {}",
            ticker, value
        )))
    }
}

/// Assets shown on the board. Assets are not persisted; comments refer to them by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    GoldGram,
    UsdTry,
    Bitcoin,
    Ethereum,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [
        Symbol::GoldGram,
        Symbol::UsdTry,
        Symbol::Bitcoin,
        Symbol::Ethereum,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Symbol::GoldGram => "gold_gram",
            Symbol::UsdTry => "usd_try",
            Symbol::Bitcoin => "bitcoin",
            Symbol::Ethereum => "ethereum",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Symbol::GoldGram => "Gram Altın",
            Symbol::UsdTry => "Dolar/TL",
            Symbol::Bitcoin => "Bitcoin",
            Symbol::Ethereum => "Ethereum",
        }
    }

    pub fn logo(self) -> &'static str {
        match self {
            Symbol::GoldGram => "🥇",
            Symbol::UsdTry => "💵",
            Symbol::Bitcoin => "₿",
            Symbol::Ethereum => "Ξ",
        }
    }

    /// Provider ticker whose series backs this symbol. Gram gold is derived
    /// from the ounce series.
    pub fn ticker(self) -> &'static str {
        match self {
            Symbol::GoldGram => GOLD_OUNCE_TICKER,
            Symbol::UsdTry => USD_TRY_TICKER,
            Symbol::Bitcoin => "BTC-USD",
            Symbol::Ethereum => "ETH-USD",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Chart period: how far back to look and how wide each bar is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Unrecognized or missing values fall back to `Daily`.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("weekly") => Period::Weekly,
            Some("monthly") => Period::Monthly,
            _ => Period::Daily,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    /// Lookback span, in provider notation.
    pub fn range(self) -> &'static str {
        match self {
            Period::Daily => "1y",
            Period::Weekly => "3y",
            Period::Monthly => "5y",
        }
    }

    /// Bar width, in provider notation.
    pub fn interval(self) -> &'static str {
        match self {
            Period::Daily => "1d",
            Period::Weekly => "1wk",
            Period::Monthly => "1mo",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request timed out")]
    Timeout,

    #[error("Provider unreachable: {0}")]
    Unavailable(String),

    #[error("Provider returned HTTP {0}")]
    Status(u16),

    #[error("Malformed provider payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("No data for {0}")]
    NoData(Symbol),
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Provider(e) => AppError::Provider(e),
            MarketError::UnknownSymbol(_) | MarketError::NoData(_) => {
                AppError::NotFound(err.to_string())
            }
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_keys_round_trip() {
        for symbol in Symbol::ALL {
            assert_eq!(Symbol::from_key(symbol.key()), Some(symbol));
        }
        assert_eq!(Symbol::from_key("dogecoin"), None);
        assert_eq!(Symbol::from_key("Bitcoin"), None);
    }

    #[test]
    fn period_mapping() {
        assert_eq!((Period::Daily.range(), Period::Daily.interval()), ("1y", "1d"));
        assert_eq!((Period::Weekly.range(), Period::Weekly.interval()), ("3y", "1wk"));
        assert_eq!((Period::Monthly.range(), Period::Monthly.interval()), ("5y", "1mo"));
    }

    #[test]
    fn unknown_period_falls_back_to_daily() {
        assert_eq!(Period::from_query(None), Period::Daily);
        assert_eq!(Period::from_query(Some("hourly")), Period::Daily);
        assert_eq!(Period::from_query(Some("")), Period::Daily);
        assert_eq!(Period::from_query(Some("Weekly")), Period::Weekly);
        assert_eq!(Period::from_query(Some("monthly")), Period::Monthly);
    }

    #[test]
    fn gram_gold_derivation() {
        // One ounce at 3110.35 USD is 100 USD per gram; at 40 TRY/USD that is 4000 TRY.
        let value = gram_gold(3110.35, 40.0);
        assert!((value - 4000.0).abs() < 1e-9);
    }
}
