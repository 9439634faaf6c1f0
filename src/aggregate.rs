//! Daily rollup of hourly weather records.

use crate::models::{DailySummary, WeatherRecord};
use std::collections::BTreeMap;

/// Group hourly records by calendar date and reduce each group to a
/// per-day summary: min/max temperature, summed precipitation, max wind.
///
/// Output is sorted ascending by date. Records are grouped by the date
/// component of their timestamp, so a series crossing midnight yields
/// one summary per calendar day.
#[must_use]
pub fn rollup_daily(records: &[WeatherRecord]) -> Vec<DailySummary> {
    let mut days: BTreeMap<chrono::NaiveDate, DailySummary> = BTreeMap::new();

    for record in records {
        let date = record.time.date();
        days.entry(date)
            .and_modify(|day| {
                day.temp_min = day.temp_min.min(record.temperature);
                day.temp_max = day.temp_max.max(record.temperature);
                day.rain_total += record.precipitation;
                day.wind_max = day.wind_max.max(record.wind_speed);
            })
            .or_insert_with(|| DailySummary {
                date,
                temp_min: record.temperature,
                temp_max: record.temperature,
                rain_total: record.precipitation,
                wind_max: record.wind_speed,
            });
    }

    days.into_values().collect()
}
