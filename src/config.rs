use crate::error::ConfigError;
use crate::models::Direction;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SYMBOL: &str = "ETHUSDT";
pub const DEFAULT_MAX_POINTS: usize = 67;
pub const DEFAULT_WINDOW_DURATION_MS: i64 = 60_000;
pub const DEFAULT_AXIS_LEAD_MS: i64 = 15_000;

/// Tick cadence. Only the two supported periods deserialize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "u64", into = "u64")]
pub enum TickInterval {
    #[default]
    Normal,
    Smooth,
}

impl TickInterval {
    pub fn as_millis(&self) -> u64 {
        match self {
            TickInterval::Normal => 1000,
            TickInterval::Smooth => 250,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl TryFrom<u64> for TickInterval {
    type Error = String;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        match ms {
            1000 => Ok(TickInterval::Normal),
            250 => Ok(TickInterval::Smooth),
            other => Err(format!(
                "interval_ms must be 1000 (normal) or 250 (smooth), got {}",
                other
            )),
        }
    }
}

impl From<TickInterval> for u64 {
    fn from(interval: TickInterval) -> u64 {
        interval.as_millis()
    }
}

/// Colour tokens for the chart surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub up_color: String,
    pub down_color: String,
    pub line_color: String,
    pub plot_line_color: String,
    pub grid_line_color: String,
    pub axis_text_color: String,
    pub background_color: String,
    pub marker_radius: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            up_color: "#00ff00".to_string(),
            down_color: "#ff0000".to_string(),
            line_color: "rgba(204, 253, 7, 1)".to_string(),
            plot_line_color: "#fd853a".to_string(),
            grid_line_color: "rgba(255, 255, 255, 0.08)".to_string(),
            axis_text_color: "#9da4ae".to_string(),
            background_color: "#111927".to_string(),
            marker_radius: 4,
        }
    }
}

impl Theme {
    pub fn color_for(&self, direction: Direction) -> &str {
        match direction {
            Direction::Up => &self.up_color,
            Direction::Down => &self.down_color,
        }
    }
}

/// Price API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub requests_per_second: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            request_timeout_ms: 5_000,
            requests_per_second: 10,
        }
    }
}

/// Settings for one chart session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub symbol: String,
    /// Candle interval used for the historical seed, e.g. "1s"
    pub seed_interval: String,
    pub seed_limit: u32,
    pub interval_ms: TickInterval,
    pub max_points: usize,
    pub window_duration_ms: i64,
    pub axis_lead_ms: i64,
    pub theme: Theme,
    pub api: ApiConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            seed_interval: "1s".to_string(),
            seed_limit: 65,
            interval_ms: TickInterval::Normal,
            max_points: DEFAULT_MAX_POINTS,
            window_duration_ms: DEFAULT_WINDOW_DURATION_MS,
            axis_lead_ms: DEFAULT_AXIS_LEAD_MS,
            theme: Theme::default(),
            api: ApiConfig::default(),
        }
    }
}

impl ChartConfig {
    /// Load defaults, layered with an optional TOML/JSON/YAML file
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Self::finish(builder.build()?)
    }

    /// Load defaults layered with an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let built = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Self::finish(built)
    }

    fn finish(built: Config) -> Result<Self, ConfigError> {
        let config: ChartConfig = built.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.max_points < 2 {
            return Err(ConfigError::Invalid(format!(
                "max_points must be at least 2, got {}",
                self.max_points
            )));
        }
        if self.window_duration_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "window_duration_ms must be positive, got {}",
                self.window_duration_ms
            )));
        }
        if self.axis_lead_ms < 0 {
            return Err(ConfigError::Invalid(format!(
                "axis_lead_ms must not be negative, got {}",
                self.axis_lead_ms
            )));
        }
        if self.seed_limit == 0 {
            return Err(ConfigError::Invalid("seed_limit must be at least 1".into()));
        }
        if self.api.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "api.requests_per_second must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn smooth(mut self) -> Self {
        self.interval_ms = TickInterval::Smooth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChartConfig::default();

        assert_eq!(config.symbol, "ETHUSDT");
        assert_eq!(config.seed_limit, 65);
        assert_eq!(config.interval_ms.as_millis(), 1000);
        assert_eq!(config.max_points, 67);
        assert_eq!(config.window_duration_ms, 60_000);
        assert_eq!(config.axis_lead_ms, 15_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ChartConfig::load(None).unwrap();
        assert_eq!(config, ChartConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let config = ChartConfig::from_toml_str(
            r##"
            symbol = "BTCUSDT"
            interval_ms = 250
            max_points = 30

            [theme]
            up_color = "#0f0"
            "##,
        )
        .unwrap();

        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.interval_ms, TickInterval::Smooth);
        assert_eq!(config.max_points, 30);
        assert_eq!(config.theme.up_color, "#0f0");
        // Untouched keys keep their defaults
        assert_eq!(config.theme.down_color, "#ff0000");
        assert_eq!(config.window_duration_ms, 60_000);
    }

    #[test]
    fn test_rejects_unsupported_interval() {
        let result = ChartConfig::from_toml_str("interval_ms = 500");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_tiny_buffer() {
        let result = ChartConfig::from_toml_str("max_points = 1");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_smooth_period() {
        let config = ChartConfig::default().smooth();
        assert_eq!(config.interval_ms.period(), Duration::from_millis(250));
    }

    #[test]
    fn test_theme_colors() {
        let theme = Theme::default();
        assert_eq!(theme.color_for(Direction::Up), "#00ff00");
        assert_eq!(theme.color_for(Direction::Down), "#ff0000");
    }
}
