//! Domain records produced by the API clients and consumed by the
//! aggregation, insight, and export layers.

use crate::error::{ApiError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, validating the WGS84 ranges.
    ///
    /// # Errors
    /// Returns [`ApiError::Validation`] when latitude is outside
    /// [-90, 90] or longitude is outside [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ApiError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ApiError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// One hourly weather observation or forecast point.
///
/// Immutable value object; one per (location, hour). Timestamps are local
/// to the provider-detected timezone of the queried location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Timestamp of this record, provider-local
    pub time: NaiveDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Precipitation amount in mm
    pub precipitation: f64,
    /// WMO weather code
    pub weather_code: i32,
    /// Sunrise for this record's calendar day, when the provider
    /// includes its daily sun block
    pub sunrise: Option<NaiveDateTime>,
    /// Sunset for this record's calendar day, when included
    pub sunset: Option<NaiveDateTime>,
    /// UV index, when the provider includes it
    pub uv_index: Option<f64>,
    /// Atmospheric pressure in hPa, when included
    pub pressure: Option<f64>,
    /// Visibility in meters, when included
    pub visibility: Option<f64>,
    /// Apparent ("feels like") temperature in Celsius, when included
    pub apparent_temperature: Option<f64>,
}

/// Per-calendar-day rollup of hourly records.
///
/// Always derived from the hourly series via the aggregation engine;
/// never fetched or persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Minimum temperature across the day's hours, Celsius
    pub temp_min: f64,
    /// Maximum temperature across the day's hours, Celsius
    pub temp_max: f64,
    /// Summed precipitation across the day's hours, mm
    pub rain_total: f64,
    /// Maximum wind speed across the day's hours, m/s
    pub wind_max: f64,
}

/// One day of the provider's daily forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather_code: i32,
    pub precipitation_sum: f64,
    pub wind_speed_max: f64,
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_description(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Emoji icon for a WMO weather code, matching the dashboard cards
#[must_use]
pub fn weather_code_icon(code: i32) -> &'static str {
    match code {
        0 | 1 => "☀️",
        2 => "⛅",
        3 => "☁️",
        45 | 48 => "🌫️",
        51..=55 => "🌦️",
        61..=65 => "🌧️",
        71..=77 => "❄️",
        80..=82 => "🌧️",
        85..=86 => "🌨️",
        95..=99 => "⛈️",
        _ => "🌡️",
    }
}
