//! Forward and reverse geocoding via Nominatim (OpenStreetMap).
//!
//! Unlike the weather paths, geocoding is best-effort: a failed lookup
//! degrades to an empty result instead of an error, since the dashboard
//! can always fall back to raw coordinates.

use crate::config::GeocodingConfig;
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One match from the Nominatim search endpoint.
///
/// Nominatim serializes coordinates as strings; they are parsed to `f64`
/// during wire decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub place_id: i64,
    #[serde(rename = "lat", deserialize_with = "de_string_f64")]
    pub latitude: f64,
    #[serde(rename = "lon", deserialize_with = "de_string_f64")]
    pub longitude: f64,
    pub display_name: String,
    #[serde(default)]
    pub address: Option<AddressDetails>,
}

/// Structured address fields attached when `addressdetails=1` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressDetails {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

fn de_string_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Short, human-friendly name for a match: the most specific settlement
/// field, falling back to the first segment of the full display name.
#[must_use]
pub fn display_name(result: &GeocodingResult) -> String {
    if let Some(address) = &result.address {
        if let Some(place) = address
            .city
            .as_ref()
            .or(address.town.as_ref())
            .or(address.village.as_ref())
        {
            return place.clone();
        }
    }

    result
        .display_name
        .split(',')
        .next()
        .unwrap_or(&result.display_name)
        .trim()
        .to_string()
}

/// Nominatim client with an unbounded per-query cache.
///
/// Geocoding results for a fixed query are effectively static, so cached
/// entries never expire.
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
    result_limit: u32,
    cache: Mutex<HashMap<String, Vec<GeocodingResult>>>,
}

impl GeocodingClient {
    /// Create a client from the geocoding section of the configuration.
    ///
    /// Nominatim's usage policy requires a descriptive User-Agent, so it
    /// is set on every request.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            result_limit: config.result_limit,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Search for locations matching a free-text query.
    ///
    /// Queries shorter than two characters after trimming return empty
    /// without touching the network. Lookup failures are logged and also
    /// surface as an empty list.
    pub async fn search(&self, query: &str) -> Vec<GeocodingResult> {
        let trimmed = query.trim();
        if trimmed.chars().count() < 2 {
            return Vec::new();
        }

        let cache_key = trimmed.to_lowercase();
        {
            let cache = match self.cache.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = cache.get(&cache_key) {
                debug!(query = %trimmed, "Serving geocoding results from cache");
                return hit.clone();
            }
        }

        let url = format!(
            "{}/search?q={}&format=json&addressdetails=1&limit={}",
            self.base_url,
            urlencoding::encode(trimmed),
            self.result_limit
        );

        let results = match self.fetch_results(&url).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query = %trimmed, error = %e, "Geocoding search failed");
                return Vec::new();
            }
        };

        info!(query = %trimmed, count = results.len(), "Geocoding search completed");

        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.insert(cache_key, results.clone());
        results
    }

    /// Resolve coordinates back to the nearest named place.
    ///
    /// Not cached; callers typically hold on to the result themselves.
    /// Returns `None` on any failure so the caller can fall back to raw
    /// coordinates.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Option<GeocodingResult> {
        let url = format!(
            "{}/reverse?lat={latitude}&lon={longitude}&format=json&addressdetails=1",
            self.base_url
        );

        match self.fetch_one(&url).await {
            Ok(result) => {
                debug!(latitude, longitude, place = %result.display_name, "Reverse geocoded");
                Some(result)
            }
            Err(e) => {
                warn!(latitude, longitude, error = %e, "Reverse geocoding failed");
                None
            }
        }
    }

    async fn fetch_results(&self, url: &str) -> Result<Vec<GeocodingResult>> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn fetch_one(&self, url: &str) -> Result<GeocodingResult> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}
