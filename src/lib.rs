// Core modules
pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod models;
pub mod render;

// Re-export commonly used types
pub use api::PriceFeed;
pub use chart::{ChartController, ChartSession};
pub use config::ChartConfig;
pub use error::{BufferError, ConfigError, FetchError, RenderError};
pub use models::*;
pub use render::Renderer;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
