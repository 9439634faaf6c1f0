//! Insight and trend derivation from current conditions and forecasts.
//!
//! Insight generation walks a fixed, ordered rule table against the
//! current record; each firing rule consumes one step of a decreasing
//! priority counter, so rule order alone determines display rank when
//! several fire at once. All functions here are pure.

use crate::models::{DailyForecast, DailySummary, WeatherRecord};
use serde::{Deserialize, Serialize};

/// Display category of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Info,
    Warning,
    Success,
    Tip,
}

/// One ranked, human-readable observation about current conditions.
/// Ephemeral: regenerated on every evaluation, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInsight {
    /// Stable slug identifying the rule that produced this insight
    pub id: &'static str,
    pub kind: InsightKind,
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    /// Higher sorts first
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

/// Temperature trend over a sample window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTrend {
    pub direction: TrendDirection,
    /// Difference between the window's half-means, rounded to 1 decimal
    pub change: f64,
    pub description: String,
}

struct RuleInput<'a> {
    current: &'a WeatherRecord,
    forecast: Option<&'a [DailyForecast]>,
}

struct InsightDraft {
    id: &'static str,
    kind: InsightKind,
    icon: &'static str,
    title: String,
    description: String,
}

impl InsightDraft {
    fn new(
        id: &'static str,
        kind: InsightKind,
        icon: &'static str,
        title: &str,
        description: String,
    ) -> Self {
        Self {
            id,
            kind,
            icon,
            title: title.to_string(),
            description,
        }
    }
}

/// The temperature rules form an if/else-if chain, so at most one fires.
fn temperature_rule(input: &RuleInput) -> Option<InsightDraft> {
    let t = input.current.temperature;
    if t > 35.0 {
        Some(InsightDraft::new(
            "extreme-heat",
            InsightKind::Warning,
            "🔥",
            "Extreme heat",
            "Temperatures above 35°C. Stay hydrated and avoid the midday sun.".to_string(),
        ))
    } else if t > 30.0 {
        Some(InsightDraft::new(
            "hot-weather",
            InsightKind::Warning,
            "☀️",
            "Hot weather",
            "It's hot outside. Drink plenty of water and seek shade.".to_string(),
        ))
    } else if t < 10.0 {
        Some(InsightDraft::new(
            "cold-weather",
            InsightKind::Warning,
            "🥶",
            "Cold weather",
            "Bundle up, temperatures are below 10°C.".to_string(),
        ))
    } else if (20.0..=28.0).contains(&t) {
        Some(InsightDraft::new(
            "perfect-weather",
            InsightKind::Success,
            "🌤️",
            "Perfect weather",
            "Comfortable temperatures, ideal conditions outside.".to_string(),
        ))
    } else {
        None
    }
}

fn precipitation_rule(input: &RuleInput) -> Option<InsightDraft> {
    let p = input.current.precipitation;
    if p > 10.0 {
        Some(InsightDraft::new(
            "heavy-rain",
            InsightKind::Warning,
            "⛈️",
            "Heavy rain",
            "Heavy rainfall right now. Expect wet roads and poor visibility.".to_string(),
        ))
    } else if p > 2.0 {
        Some(InsightDraft::new(
            "light-rain",
            InsightKind::Info,
            "🌧️",
            "Light rain expected",
            "Some rain is falling. An umbrella would not hurt.".to_string(),
        ))
    } else {
        None
    }
}

fn humidity_rule(input: &RuleInput) -> Option<InsightDraft> {
    let h = input.current.humidity;
    if h > 80.0 {
        Some(InsightDraft::new(
            "high-humidity",
            InsightKind::Info,
            "💧",
            "High humidity",
            "Very humid air. It may feel warmer than the thermometer says.".to_string(),
        ))
    } else if h < 30.0 {
        Some(InsightDraft::new(
            "low-humidity",
            InsightKind::Info,
            "🏜️",
            "Low humidity",
            "Dry air. Consider extra hydration.".to_string(),
        ))
    } else {
        None
    }
}

fn wind_rule(input: &RuleInput) -> Option<InsightDraft> {
    let w = input.current.wind_speed;
    if w > 40.0 {
        Some(InsightDraft::new(
            "strong-wind",
            InsightKind::Warning,
            "💨",
            "Strong wind",
            "Strong winds right now. Secure loose objects outdoors.".to_string(),
        ))
    } else if w > 20.0 {
        Some(InsightDraft::new(
            "moderate-wind",
            InsightKind::Info,
            "🌬️",
            "Moderate wind",
            "Noticeably windy conditions outside.".to_string(),
        ))
    } else {
        None
    }
}

/// Compound rule, evaluated independently of the threshold chains above.
fn outdoor_rule(input: &RuleInput) -> Option<InsightDraft> {
    let c = input.current;
    let good = (15.0..=30.0).contains(&c.temperature)
        && c.precipitation < 1.0
        && c.wind_speed < 25.0;
    good.then(|| {
        InsightDraft::new(
            "outdoor-activities",
            InsightKind::Tip,
            "🏃",
            "Good for outdoor activity",
            "Mild temperatures, little rain, and calm winds. Great time to be outside."
                .to_string(),
        )
    })
}

fn thunderstorm_rule(input: &RuleInput) -> Option<InsightDraft> {
    (input.current.weather_code >= 95).then(|| {
        InsightDraft::new(
            "thunderstorm",
            InsightKind::Warning,
            "⚡",
            "Thunderstorm alert",
            "Thunderstorm conditions reported. Stay indoors if possible.".to_string(),
        )
    })
}

fn temp_change_rule(input: &RuleInput) -> Option<InsightDraft> {
    let tomorrow = input.forecast?.first()?;
    let diff = tomorrow.temp_max - input.current.temperature;
    if diff.abs() <= 5.0 {
        return None;
    }

    // Halves round toward positive infinity, so -6.5 reports 6, not 7.
    let amount = ((diff + 0.5).floor()).abs() as i64;
    if diff > 0.0 {
        Some(InsightDraft::new(
            "temp-change",
            InsightKind::Info,
            "📈",
            "Getting warmer",
            format!("Tomorrow will be about {amount}°C warmer than right now."),
        ))
    } else {
        Some(InsightDraft::new(
            "temp-change",
            InsightKind::Info,
            "📉",
            "Getting cooler",
            format!("Tomorrow will be about {amount}°C cooler than right now."),
        ))
    }
}

fn rain_coming_rule(input: &RuleInput) -> Option<InsightDraft> {
    let forecast = input.forecast?;
    let rainy_soon = forecast
        .iter()
        .take(3)
        .any(|day| day.precipitation_sum > 5.0);
    (rainy_soon && input.current.precipitation < 1.0).then(|| {
        InsightDraft::new(
            "rain-coming",
            InsightKind::Info,
            "☔",
            "Rain coming soon",
            "Significant rain is expected within the next few days.".to_string(),
        )
    })
}

/// Fixed evaluation order; earlier rules outrank later ones when several
/// fire in the same evaluation.
const RULES: &[fn(&RuleInput) -> Option<InsightDraft>] = &[
    temperature_rule,
    precipitation_rule,
    humidity_rule,
    wind_rule,
    outdoor_rule,
    thunderstorm_rule,
    temp_change_rule,
    rain_coming_rule,
];

const BASE_PRIORITY: i32 = 100;

/// Evaluate the rule table against the current record and optional
/// forecast context, returning insights sorted by priority descending.
#[must_use]
pub fn generate_insights(
    current: &WeatherRecord,
    forecast: Option<&[DailyForecast]>,
) -> Vec<WeatherInsight> {
    let input = RuleInput { current, forecast };
    let mut priority = BASE_PRIORITY;
    let mut insights = Vec::new();

    for rule in RULES {
        if let Some(draft) = rule(&input) {
            insights.push(WeatherInsight {
                id: draft.id,
                kind: draft.kind,
                icon: draft.icon,
                title: draft.title,
                description: draft.description,
                priority,
            });
            priority -= 1;
        }
    }

    insights.sort_by(|a, b| b.priority.cmp(&a.priority));
    insights
}

/// Anything that can contribute a representative temperature to a trend
/// window.
pub trait TemperatureSample {
    fn representative_temperature(&self) -> f64;
}

impl TemperatureSample for WeatherRecord {
    fn representative_temperature(&self) -> f64 {
        self.temperature
    }
}

impl TemperatureSample for DailySummary {
    fn representative_temperature(&self) -> f64 {
        (self.temp_max + self.temp_min) / 2.0
    }
}

/// Trend window: at most the last 7 samples
const TREND_WINDOW: usize = 7;

/// Threshold below which a half-mean difference counts as stable, °C
const STABLE_THRESHOLD: f64 = 1.0;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Classify the temperature trend of a sample series.
///
/// The window is the last 7 samples (or all, if fewer), split into two
/// halves with the extra element of an odd window going to the second
/// half. `change` is the second half's mean minus the first half's.
#[must_use]
pub fn analyze_trend<T: TemperatureSample>(series: &[T]) -> WeatherTrend {
    if series.len() < 2 {
        return WeatherTrend {
            direction: TrendDirection::Stable,
            change: 0.0,
            description: "Temperatures are holding steady.".to_string(),
        };
    }

    let temperatures: Vec<f64> = series
        .iter()
        .map(TemperatureSample::representative_temperature)
        .collect();
    let window = &temperatures[temperatures.len().saturating_sub(TREND_WINDOW)..];
    let (first, second) = window.split_at(window.len() / 2);

    // Classification uses the raw difference; only the reported value
    // and description are rounded.
    let raw_change = mean(second) - mean(first);
    let change = round1(raw_change);
    let amount = change.abs();

    let (direction, description) = if raw_change.abs() < STABLE_THRESHOLD {
        (
            TrendDirection::Stable,
            "Temperatures are holding steady.".to_string(),
        )
    } else if change > 0.0 {
        (
            TrendDirection::Rising,
            format!("Temperatures are rising by about {amount}°C."),
        )
    } else {
        (
            TrendDirection::Falling,
            format!("Temperatures are falling by about {amount}°C."),
        )
    };

    WeatherTrend {
        direction,
        change,
        description,
    }
}

/// Comfort description from a simplified heat index of temperature and
/// humidity.
#[must_use]
pub fn comfort_level(temperature: f64, humidity: f64) -> &'static str {
    let heat_index = temperature + 0.5555 * (humidity / 100.0 - 0.1) * (temperature - 14.5);

    if heat_index < 15.0 {
        "Cold"
    } else if heat_index < 20.0 {
        "Cool"
    } else if heat_index < 25.0 {
        "Comfortable"
    } else if heat_index < 30.0 {
        "Warm"
    } else if heat_index < 35.0 {
        "Hot"
    } else {
        "Very Hot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rstest::rstest;

    fn record(temperature: f64, humidity: f64, wind_speed: f64, precipitation: f64) -> WeatherRecord {
        WeatherRecord {
            time: NaiveDateTime::parse_from_str("2024-06-01T12:00", "%Y-%m-%dT%H:%M").unwrap(),
            temperature,
            humidity,
            wind_speed,
            precipitation,
            weather_code: 0,
            sunrise: None,
            sunset: None,
            uv_index: None,
            pressure: None,
            visibility: None,
            apparent_temperature: None,
        }
    }

    fn forecast_day(date: &str, temp_max: f64, precipitation_sum: f64) -> DailyForecast {
        DailyForecast {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            temp_min: temp_max - 8.0,
            temp_max,
            weather_code: 0,
            precipitation_sum,
            wind_speed_max: 5.0,
        }
    }

    fn ids(insights: &[WeatherInsight]) -> Vec<&'static str> {
        insights.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_extreme_heat_excludes_other_temperature_insights() {
        let insights = generate_insights(&record(40.0, 50.0, 5.0, 0.0), None);
        let ids = ids(&insights);
        assert!(ids.contains(&"extreme-heat"));
        assert!(!ids.contains(&"hot-weather"));
        assert!(!ids.contains(&"cold-weather"));
        assert!(!ids.contains(&"perfect-weather"));
    }

    #[rstest]
    #[case(40.0, "extreme-heat")]
    #[case(32.0, "hot-weather")]
    #[case(5.0, "cold-weather")]
    #[case(24.0, "perfect-weather")]
    fn test_temperature_chain(#[case] temperature: f64, #[case] expected: &str) {
        let insights = generate_insights(&record(temperature, 50.0, 5.0, 0.0), None);
        assert!(ids(&insights).contains(&expected));
    }

    #[test]
    fn test_boundary_temperatures_do_not_fire_chain() {
        // 28 < t < 30 falls between "perfect" and "hot".
        let insights = generate_insights(&record(29.0, 50.0, 30.0, 0.0), None);
        let ids = ids(&insights);
        assert!(!ids.contains(&"extreme-heat"));
        assert!(!ids.contains(&"hot-weather"));
        assert!(!ids.contains(&"perfect-weather"));
        assert!(ids.contains(&"moderate-wind"));
    }

    #[test]
    fn test_temperature_rule_outranks_wind_rule() {
        let insights = generate_insights(&record(40.0, 50.0, 45.0, 0.0), None);
        let heat = insights.iter().position(|i| i.id == "extreme-heat").unwrap();
        let wind = insights.iter().position(|i| i.id == "strong-wind").unwrap();
        assert!(heat < wind);
        assert!(insights[heat].priority > insights[wind].priority);
    }

    #[test]
    fn test_priorities_strictly_decrease_in_rule_order() {
        // Fires temperature, precipitation, humidity, and wind rules.
        let insights = generate_insights(&record(5.0, 85.0, 22.0, 3.0), None);
        assert!(insights.len() >= 4);
        for pair in insights.windows(2) {
            assert!(pair[0].priority > pair[1].priority);
        }
        assert_eq!(insights[0].priority, 100);
    }

    #[test]
    fn test_outdoor_rule_requires_all_conditions() {
        let good = generate_insights(&record(22.0, 50.0, 10.0, 0.0), None);
        assert!(ids(&good).contains(&"outdoor-activities"));

        let too_windy = generate_insights(&record(22.0, 50.0, 26.0, 0.0), None);
        assert!(!ids(&too_windy).contains(&"outdoor-activities"));

        let too_wet = generate_insights(&record(22.0, 50.0, 10.0, 1.5), None);
        assert!(!ids(&too_wet).contains(&"outdoor-activities"));
    }

    #[test]
    fn test_thunderstorm_code_fires_alert() {
        let mut current = record(22.0, 50.0, 10.0, 0.0);
        current.weather_code = 95;
        assert!(ids(&generate_insights(&current, None)).contains(&"thunderstorm"));
    }

    #[test]
    fn test_temp_change_names_direction_and_amount() {
        let current = record(12.0, 50.0, 5.0, 0.0);
        let forecast = vec![forecast_day("2024-06-02", 19.4, 0.0)];
        let insights = generate_insights(&current, Some(&forecast));

        let change = insights.iter().find(|i| i.id == "temp-change").unwrap();
        assert_eq!(change.title, "Getting warmer");
        assert!(change.description.contains("7°C"));
    }

    #[test]
    fn test_temp_change_half_degree_drop_rounds_down() {
        // diff = 13.5 - 20.0 = -6.5; the reported amount is 6.
        let current = record(20.0, 50.0, 5.0, 0.0);
        let forecast = vec![forecast_day("2024-06-02", 13.5, 0.0)];
        let insights = generate_insights(&current, Some(&forecast));

        let change = insights.iter().find(|i| i.id == "temp-change").unwrap();
        assert_eq!(change.title, "Getting cooler");
        assert!(change.description.contains("6°C"));
    }

    #[test]
    fn test_small_temp_change_is_silent() {
        let current = record(20.0, 50.0, 5.0, 0.0);
        let forecast = vec![forecast_day("2024-06-02", 24.0, 0.0)];
        let insights = generate_insights(&current, Some(&forecast));
        assert!(!ids(&insights).contains(&"temp-change"));
    }

    #[test]
    fn test_rain_coming_checks_first_three_days_only() {
        let current = record(20.0, 50.0, 5.0, 0.0);
        let near = vec![
            forecast_day("2024-06-02", 21.0, 0.0),
            forecast_day("2024-06-03", 21.0, 8.0),
            forecast_day("2024-06-04", 21.0, 0.0),
        ];
        assert!(ids(&generate_insights(&current, Some(&near))).contains(&"rain-coming"));

        let far = vec![
            forecast_day("2024-06-02", 21.0, 0.0),
            forecast_day("2024-06-03", 21.0, 0.0),
            forecast_day("2024-06-04", 21.0, 0.0),
            forecast_day("2024-06-05", 21.0, 8.0),
        ];
        assert!(!ids(&generate_insights(&current, Some(&far))).contains(&"rain-coming"));
    }

    #[test]
    fn test_rain_coming_suppressed_while_already_raining() {
        let current = record(20.0, 50.0, 5.0, 2.5);
        let forecast = vec![forecast_day("2024-06-02", 21.0, 8.0)];
        assert!(!ids(&generate_insights(&current, Some(&forecast))).contains(&"rain-coming"));
    }

    fn hourly_series(temperatures: &[f64]) -> Vec<WeatherRecord> {
        temperatures
            .iter()
            .map(|&t| record(t, 50.0, 5.0, 0.0))
            .collect()
    }

    #[test]
    fn test_trend_short_series_is_stable() {
        let trend = analyze_trend(&hourly_series(&[17.0]));
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.change, 0.0);
    }

    #[test]
    fn test_trend_constant_series_is_stable() {
        let trend = analyze_trend(&hourly_series(&[15.0, 15.0, 15.0, 15.0]));
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.change, 0.0);
    }

    #[test]
    fn test_trend_rising_half_means() {
        let trend = analyze_trend(&hourly_series(&[10.0, 10.0, 10.0, 20.0, 20.0, 20.0]));
        assert_eq!(trend.direction, TrendDirection::Rising);
        assert_eq!(trend.change, 10.0);
        assert!(trend.description.contains("10"));
    }

    #[test]
    fn test_trend_change_just_under_threshold_stays_stable() {
        // Raw half-mean difference 0.96 rounds up to 1.0 for display but
        // still classifies as stable.
        let trend = analyze_trend(&hourly_series(&[10.0, 10.96]));
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.change, 1.0);
    }

    #[test]
    fn test_trend_change_just_over_threshold_is_rising() {
        let trend = analyze_trend(&hourly_series(&[10.0, 11.04]));
        assert_eq!(trend.direction, TrendDirection::Rising);
        assert_eq!(trend.change, 1.0);
    }

    #[test]
    fn test_trend_uses_last_seven_samples() {
        // Early outliers fall outside the window and cannot affect the result.
        let trend = analyze_trend(&hourly_series(&[
            50.0, 50.0, 20.0, 20.0, 20.0, 10.0, 10.0, 10.0, 10.0,
        ]));
        assert_eq!(trend.direction, TrendDirection::Falling);
        assert_eq!(trend.change, -10.0);
    }

    #[test]
    fn test_trend_odd_window_extra_sample_in_second_half() {
        // 5 samples: first half [10, 10], second half [10, 16, 16].
        let trend = analyze_trend(&hourly_series(&[10.0, 10.0, 10.0, 16.0, 16.0]));
        assert_eq!(trend.direction, TrendDirection::Rising);
        assert_eq!(trend.change, 4.0);
    }

    #[test]
    fn test_trend_daily_summaries_use_midpoint() {
        let days: Vec<DailySummary> = [(0.0, 10.0), (0.0, 10.0), (10.0, 20.0), (10.0, 20.0)]
            .iter()
            .enumerate()
            .map(|(i, &(lo, hi))| DailySummary {
                date: NaiveDate::from_ymd_opt(2024, 6, 1 + i as u32).unwrap(),
                temp_min: lo,
                temp_max: hi,
                rain_total: 0.0,
                wind_max: 3.0,
            })
            .collect();

        let trend = analyze_trend(&days);
        assert_eq!(trend.direction, TrendDirection::Rising);
        assert_eq!(trend.change, 10.0);
    }

    #[rstest]
    #[case(5.0, 50.0, "Cold")]
    #[case(18.0, 50.0, "Cool")]
    #[case(22.0, 40.0, "Comfortable")]
    #[case(27.0, 50.0, "Warm")]
    #[case(31.0, 40.0, "Hot")]
    #[case(38.0, 70.0, "Very Hot")]
    fn test_comfort_levels(#[case] temperature: f64, #[case] humidity: f64, #[case] expected: &str) {
        assert_eq!(comfort_level(temperature, humidity), expected);
    }
}
