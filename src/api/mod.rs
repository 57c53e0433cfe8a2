pub mod binance;
pub mod synthetic;

pub use binance::BinanceClient;
pub use synthetic::{SyntheticFeed, SyntheticScenario};

use crate::error::FetchError;
use crate::models::PricePoint;
use std::future::Future;

/// Source of seed history and live prices
///
/// Implementations do not retry; the caller decides how to recover.
pub trait PriceFeed: Send + Sync {
    /// Fetch historical candles, mapped to (open time, close price)
    fn fetch_seed(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<PricePoint>, FetchError>> + Send;

    /// Fetch the latest traded price
    fn fetch_latest(&self, symbol: &str) -> impl Future<Output = Result<f64, FetchError>> + Send;
}

/// Parse a decimal price string, rejecting non-finite values
pub(crate) fn parse_price(raw: &str) -> Result<f64, FetchError> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FetchError::Malformed(format!("invalid price {:?}", raw)))?;

    if !price.is_finite() {
        return Err(FetchError::Malformed(format!("non-finite price {:?}", raw)));
    }

    Ok(price)
}
