//! `WeatherHub` - data access and derived analytics for a weather dashboard
//!
//! This library provides the core functionality behind the dashboard UI:
//! cached, retrying API clients for the Open-Meteo weather provider and
//! the Nominatim geocoding provider, daily aggregation of hourly series,
//! ranked weather insights with trend classification, and CSV export.

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod geocoding;
pub mod http;
pub mod insights;
pub mod models;
pub mod weather;

// Re-export core types for public API
pub use cache::ApiCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DashboardConfig, init_logging};
pub use error::{ApiError, Result};
pub use geocoding::{AddressDetails, GeocodingClient, GeocodingResult};
pub use http::{HttpClient, should_retry};
pub use insights::{
    InsightKind, TrendDirection, WeatherInsight, WeatherTrend, analyze_trend, comfort_level,
    generate_insights,
};
pub use models::{Coordinate, DailyForecast, DailySummary, WeatherRecord};
pub use weather::{MAX_FORECAST_DAYS, WeatherClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
