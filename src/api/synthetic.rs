use super::PriceFeed;
use crate::error::FetchError;
use crate::models::PricePoint;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Market behaviour for the synthetic feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticScenario {
    /// Small noise around a flat mean (±0.05%)
    Calm,
    /// Upward drift with noise
    Trending,
    /// Large swings (±0.5%)
    Volatile,
    /// Calm prices, but every `n`th latest-price fetch fails
    Flaky(u64),
}

/// Offline price feed producing a seeded random walk
pub struct SyntheticFeed {
    rng: Mutex<StdRng>,
    last_price: Mutex<f64>,
    scenario: SyntheticScenario,
    fetches: AtomicU64,
}

impl SyntheticFeed {
    /// Create a new feed with a seed for reproducibility
    pub fn new(seed: u64, scenario: SyntheticScenario) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            last_price: Mutex::new(2_000.0),
            scenario,
            fetches: AtomicU64::new(0),
        }
    }

    pub fn with_base_price(self, base_price: f64) -> Self {
        if let Ok(mut last) = self.last_price.lock() {
            *last = base_price;
        }
        self
    }

    fn step(&self) -> Result<f64, FetchError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        let mut last = self
            .last_price
            .lock()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let change = match self.scenario {
            SyntheticScenario::Calm | SyntheticScenario::Flaky(_) => {
                rng.gen_range(-0.0005..0.0005)
            }
            SyntheticScenario::Trending => 0.0002 + rng.gen_range(-0.0004..0.0004),
            SyntheticScenario::Volatile => rng.gen_range(-0.005..0.005),
        };

        *last = (*last * (1.0 + change)).max(0.01);
        Ok(*last)
    }
}

/// Milliseconds per candle for a kline interval like "1s", "5m", "1h"
pub fn interval_to_millis(interval: &str) -> Option<i64> {
    let split = interval.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = interval.split_at(split);
    let count: i64 = count.parse().ok()?;

    let unit_ms = match unit {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return None,
    };

    Some(count * unit_ms)
}

impl PriceFeed for SyntheticFeed {
    async fn fetch_seed(
        &self,
        _symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let step_ms = interval_to_millis(interval)
            .ok_or_else(|| FetchError::Malformed(format!("unsupported interval {:?}", interval)))?;

        // Align to candle open times, newest candle open at or before now
        let now = Utc::now().timestamp_millis();
        let newest_open = now - now.rem_euclid(step_ms);
        let oldest_open = newest_open - (limit as i64 - 1) * step_ms;

        (0..limit as i64)
            .map(|i| -> Result<PricePoint, FetchError> {
                Ok(PricePoint::new(oldest_open + i * step_ms, self.step()?))
            })
            .collect()
    }

    async fn fetch_latest(&self, _symbol: &str) -> Result<f64, FetchError> {
        let count = self.fetches.fetch_add(1, Ordering::Relaxed) + 1;

        if let SyntheticScenario::Flaky(every) = self.scenario {
            if every > 0 && count % every == 0 {
                tracing::debug!(fetch = count, "Synthetic fetch failure");
                return Err(FetchError::Timeout);
            }
        }

        self.step()
    }
}
