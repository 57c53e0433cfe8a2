use super::{parse_price, PriceFeed};
use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::PricePoint;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const KLINES_PATH: &str = "/api/v3/klines";
const TICKER_PRICE_PATH: &str = "/api/v3/ticker/price";

// Position of fields inside a kline record
const KLINE_OPEN_TIME: usize = 0;
const KLINE_CLOSE: usize = 4;

type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Response from /ticker/price
#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[allow(dead_code)]
    symbol: Option<String>,
    price: String,
}

/// Binance spot REST client for klines and ticker prices
///
/// Cloneable; all clones share one rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<BinanceRateLimiter>,
}

impl BinanceClient {
    pub fn new(api: &ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(api.request_timeout_ms))
            .build()
            .map_err(FetchError::from_request)?;

        let per_second = NonZeroU32::new(api.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rate-limited GET returning the body of a 2xx response
    async fn get_body(&self, path: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(FetchError::from_request)
    }
}

fn kline_to_point(record: &[Value]) -> Result<PricePoint, FetchError> {
    let timestamp = record
        .get(KLINE_OPEN_TIME)
        .and_then(Value::as_i64)
        .ok_or_else(|| FetchError::Malformed("kline without open time".to_string()))?;

    let price = match record.get(KLINE_CLOSE) {
        Some(Value::String(raw)) => parse_price(raw)?,
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|p| p.is_finite())
            .ok_or_else(|| FetchError::Malformed(format!("invalid close {}", n)))?,
        _ => {
            return Err(FetchError::Malformed(
                "kline without close price".to_string(),
            ))
        }
    };

    Ok(PricePoint::new(timestamp, price))
}

/// Map a klines payload to price points, preserving order
pub fn parse_klines(body: &str) -> Result<Vec<PricePoint>, FetchError> {
    let records: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("klines: {}", e)))?;

    records.iter().map(|r| kline_to_point(r)).collect()
}

/// Extract the price from a ticker payload
pub fn parse_ticker(body: &str) -> Result<f64, FetchError> {
    let ticker: TickerPrice = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("ticker: {}", e)))?;

    parse_price(&ticker.price)
}

impl PriceFeed for BinanceClient {
    async fn fetch_seed(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<PricePoint>, FetchError> {
        tracing::debug!(symbol, interval, limit, "Fetching klines");

        let body = self
            .get_body(
                KLINES_PATH,
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let points = parse_klines(&body)?;
        tracing::debug!("Fetched {} klines for {}", points.len(), symbol);

        Ok(points)
    }

    async fn fetch_latest(&self, symbol: &str) -> Result<f64, FetchError> {
        let body = self
            .get_body(TICKER_PRICE_PATH, &[("symbol", symbol.to_string())])
            .await?;

        parse_ticker(&body)
    }
}
