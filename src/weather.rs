//! Weather provider client for Open-Meteo
//!
//! Translates coordinates and optional date ranges into parsed hourly
//! record sequences, daily summaries, and forecasts, with response
//! caching and retry handled by the layers below.

use crate::aggregate;
use crate::cache::ApiCache;
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{Coordinate, DailyForecast, DailySummary, WeatherRecord};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Hourly fields requested from the provider
const HOURLY_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation,weather_code";

/// Daily fields requested from the forecast endpoint
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,weather_code,precipitation_sum,wind_speed_10m_max";

/// Longest forecast horizon Open-Meteo serves. Callers are responsible
/// for clamping `forecast_days` to this.
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Weather API client for Open-Meteo.
///
/// All fallible operations surface [`crate::ApiError`]; provider errors
/// are never swallowed here.
pub struct WeatherClient {
    http: HttpClient,
    cache: Arc<ApiCache>,
    base_url: String,
}

impl WeatherClient {
    /// Create a client with its own cache sized from the cache section
    /// of the configuration.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let cache = Arc::new(ApiCache::new(std::time::Duration::from_secs(
            config.cache.ttl_seconds,
        )));
        Self::new(config, cache)
    }

    /// Create a client from configuration and a shared response cache.
    pub fn new(config: &DashboardConfig, cache: Arc<ApiCache>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(&config.weather)?,
            cache,
            base_url: config.weather.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the hourly series for a coordinate, optionally bounded by a
    /// date range (ISO dates, provider-local).
    #[instrument(skip(self), fields(lat = coord.latitude, lon = coord.longitude))]
    pub async fn fetch_hourly(
        &self,
        coord: Coordinate,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<WeatherRecord>> {
        let cache_key = format!(
            "weather-{}-{}-{}-{}",
            coord.latitude,
            coord.longitude,
            start_date.map_or_else(|| "none".to_string(), |d| d.to_string()),
            end_date.map_or_else(|| "none".to_string(), |d| d.to_string()),
        );

        if let Some(cached) = self.cache.get::<Vec<WeatherRecord>>(&cache_key) {
            debug!(cache_key, "Serving hourly weather from cache");
            return Ok(cached);
        }

        let mut url = format!(
            "{}/forecast?latitude={}&longitude={}&hourly={HOURLY_FIELDS}&timezone=auto",
            self.base_url, coord.latitude, coord.longitude
        );
        if let Some(start) = start_date {
            url.push_str(&format!("&start_date={start}"));
        }
        if let Some(end) = end_date {
            url.push_str(&format!("&end_date={end}"));
        }

        let response: open_meteo::HourlyResponse = self.http.get_json(&url).await?;
        let records = response.into_records()?;

        info!(count = records.len(), "Fetched hourly weather");
        self.cache.put(&cache_key, &records)?;
        Ok(records)
    }

    /// Chronologically last hourly record, or `None` for an empty series.
    pub async fn fetch_latest(&self, coord: Coordinate) -> Result<Option<WeatherRecord>> {
        let mut records = self.fetch_hourly(coord, None, None).await?;
        Ok(records.pop())
    }

    /// Hourly series rolled up into per-calendar-day summaries.
    pub async fn fetch_daily_summary(
        &self,
        coord: Coordinate,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailySummary>> {
        let records = self.fetch_hourly(coord, start_date, end_date).await?;
        Ok(aggregate::rollup_daily(&records))
    }

    /// Daily forecast from the provider's daily endpoint.
    ///
    /// `forecast_days` is passed through as-is; callers clamp it to
    /// [`MAX_FORECAST_DAYS`].
    #[instrument(skip(self), fields(lat = coord.latitude, lon = coord.longitude))]
    pub async fn fetch_forecast(
        &self,
        coord: Coordinate,
        forecast_days: u32,
    ) -> Result<Vec<DailyForecast>> {
        let cache_key = format!(
            "forecast-{}-{}-{}",
            coord.latitude, coord.longitude, forecast_days
        );

        if let Some(cached) = self.cache.get::<Vec<DailyForecast>>(&cache_key) {
            debug!(cache_key, "Serving forecast from cache");
            return Ok(cached);
        }

        let url = format!(
            "{}/forecast?latitude={}&longitude={}&daily={DAILY_FIELDS}&timezone=auto&forecast_days={forecast_days}",
            self.base_url, coord.latitude, coord.longitude
        );

        let response: open_meteo::DailyResponse = self.http.get_json(&url).await?;
        let forecasts = response.daily.into_forecasts()?;

        info!(count = forecasts.len(), "Fetched daily forecast");
        self.cache.put(&cache_key, &forecasts)?;
        Ok(forecasts)
    }

    /// Daily summaries for two locations, fetched concurrently.
    ///
    /// Either failure fails the pair; downstream comparison never runs on
    /// half the data.
    pub async fn fetch_comparison(
        &self,
        coord_a: Coordinate,
        coord_b: Coordinate,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<(Vec<DailySummary>, Vec<DailySummary>)> {
        futures::try_join!(
            self.fetch_daily_summary(coord_a, start_date, end_date),
            self.fetch_daily_summary(coord_b, start_date, end_date),
        )
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Open-Meteo API response structures and conversion into domain records.
///
/// The provider serializes series as parallel arrays indexed by
/// timestamp. Conversion zips them by index and treats any length
/// mismatch as a malformed response rather than truncating.
mod open_meteo {
    use crate::error::{ApiError, Result};
    use crate::models::{DailyForecast, WeatherRecord};
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::Deserialize;
    use std::collections::HashMap;

    const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

    /// Sunrise/sunset pair for one calendar day
    type SunTimes = (Option<NaiveDateTime>, Option<NaiveDateTime>);

    #[derive(Debug, Deserialize)]
    pub struct HourlyResponse {
        pub hourly: HourlyData,
        /// Daily sun block, present when the request asked for it
        #[serde(default)]
        pub daily: Option<SunData>,
    }

    impl HourlyResponse {
        pub fn into_records(self) -> Result<Vec<WeatherRecord>> {
            let sun_by_date = match &self.daily {
                Some(daily) => daily.by_date()?,
                None => HashMap::new(),
            };
            self.hourly.into_records(&sun_by_date)
        }
    }

    /// Per-day sunrise/sunset arrays riding alongside the hourly block
    #[derive(Debug, Deserialize)]
    pub struct SunData {
        pub time: Vec<String>,
        #[serde(default)]
        pub sunrise: Option<Vec<String>>,
        #[serde(default)]
        pub sunset: Option<Vec<String>>,
    }

    impl SunData {
        fn by_date(&self) -> Result<HashMap<NaiveDate, SunTimes>> {
            let n = self.time.len();
            for (name, series) in [("sunrise", &self.sunrise), ("sunset", &self.sunset)] {
                if let Some(series) = series {
                    check_len(name, series.len(), n)?;
                }
            }

            let mut by_date = HashMap::with_capacity(n);
            for (i, date) in self.time.iter().enumerate() {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                    ApiError::malformed(format!("invalid daily date `{date}`: {e}"))
                })?;
                let sunrise = self
                    .sunrise
                    .as_ref()
                    .map(|s| parse_sun_time(&s[i]))
                    .transpose()?;
                let sunset = self
                    .sunset
                    .as_ref()
                    .map(|s| parse_sun_time(&s[i]))
                    .transpose()?;
                by_date.insert(date, (sunrise, sunset));
            }
            Ok(by_date)
        }
    }

    fn parse_sun_time(raw: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, HOURLY_TIME_FORMAT)
            .map_err(|e| ApiError::malformed(format!("invalid sun timestamp `{raw}`: {e}")))
    }

    /// Hourly parallel arrays from Open-Meteo
    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Vec<f64>,
        #[serde(rename = "relative_humidity_2m")]
        pub humidity: Vec<f64>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Vec<f64>,
        pub precipitation: Vec<f64>,
        pub weather_code: Vec<i32>,
        #[serde(default)]
        pub uv_index: Option<Vec<f64>>,
        #[serde(rename = "pressure_msl", default)]
        pub pressure: Option<Vec<f64>>,
        #[serde(default)]
        pub visibility: Option<Vec<f64>>,
        #[serde(default)]
        pub apparent_temperature: Option<Vec<f64>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyResponse {
        pub daily: DailyData,
    }

    /// Daily parallel arrays from Open-Meteo
    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m_max")]
        pub temp_max: Vec<f64>,
        #[serde(rename = "temperature_2m_min")]
        pub temp_min: Vec<f64>,
        pub weather_code: Vec<i32>,
        pub precipitation_sum: Vec<f64>,
        #[serde(rename = "wind_speed_10m_max")]
        pub wind_speed_max: Vec<f64>,
    }

    fn check_len(field: &str, actual: usize, expected: usize) -> Result<()> {
        if actual == expected {
            Ok(())
        } else {
            Err(ApiError::malformed(format!(
                "field `{field}` has {actual} entries, expected {expected}"
            )))
        }
    }

    impl HourlyData {
        /// Zip the parallel arrays into one record per timestamp index,
        /// attaching each day's sun times where known.
        fn into_records(self, sun_by_date: &HashMap<NaiveDate, SunTimes>) -> Result<Vec<WeatherRecord>> {
            let n = self.time.len();
            check_len("temperature_2m", self.temperature.len(), n)?;
            check_len("relative_humidity_2m", self.humidity.len(), n)?;
            check_len("wind_speed_10m", self.wind_speed.len(), n)?;
            check_len("precipitation", self.precipitation.len(), n)?;
            check_len("weather_code", self.weather_code.len(), n)?;
            for (name, series) in [
                ("uv_index", &self.uv_index),
                ("pressure_msl", &self.pressure),
                ("visibility", &self.visibility),
                ("apparent_temperature", &self.apparent_temperature),
            ] {
                if let Some(series) = series {
                    check_len(name, series.len(), n)?;
                }
            }

            self.time
                .iter()
                .enumerate()
                .map(|(i, time)| {
                    let time = NaiveDateTime::parse_from_str(time, HOURLY_TIME_FORMAT)
                        .map_err(|e| {
                            ApiError::malformed(format!("invalid hourly timestamp `{time}`: {e}"))
                        })?;
                    let (sunrise, sunset) = sun_by_date
                        .get(&time.date())
                        .copied()
                        .unwrap_or((None, None));

                    Ok(WeatherRecord {
                        time,
                        temperature: self.temperature[i],
                        humidity: self.humidity[i],
                        wind_speed: self.wind_speed[i],
                        precipitation: self.precipitation[i],
                        weather_code: self.weather_code[i],
                        sunrise,
                        sunset,
                        uv_index: self.uv_index.as_ref().map(|s| s[i]),
                        pressure: self.pressure.as_ref().map(|s| s[i]),
                        visibility: self.visibility.as_ref().map(|s| s[i]),
                        apparent_temperature: self.apparent_temperature.as_ref().map(|s| s[i]),
                    })
                })
                .collect()
        }
    }

    impl DailyData {
        /// Zip the parallel arrays into one forecast entry per day.
        pub fn into_forecasts(self) -> Result<Vec<DailyForecast>> {
            let n = self.time.len();
            check_len("temperature_2m_max", self.temp_max.len(), n)?;
            check_len("temperature_2m_min", self.temp_min.len(), n)?;
            check_len("weather_code", self.weather_code.len(), n)?;
            check_len("precipitation_sum", self.precipitation_sum.len(), n)?;
            check_len("wind_speed_10m_max", self.wind_speed_max.len(), n)?;

            self.time
                .iter()
                .enumerate()
                .map(|(i, date)| {
                    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                        ApiError::malformed(format!("invalid forecast date `{date}`: {e}"))
                    })?;

                    Ok(DailyForecast {
                        date,
                        temp_min: self.temp_min[i],
                        temp_max: self.temp_max[i],
                        weather_code: self.weather_code[i],
                        precipitation_sum: self.precipitation_sum[i],
                        wind_speed_max: self.wind_speed_max[i],
                    })
                })
                .collect()
        }
    }
}
