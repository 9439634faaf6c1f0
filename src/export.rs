//! CSV encoders for download/export.
//!
//! Pure text transformations over domain records; triggering the actual
//! file save is the consuming UI's job. Fields containing the delimiter
//! are quoted, absent values render as empty cells.

use crate::models::{DailySummary, WeatherRecord};
use std::collections::BTreeMap;
use std::fmt::Write;

const HOURLY_HEADER: &str =
    "Date Time,Temperature (°C),Humidity (%),Wind Speed (m/s),Precipitation (mm),Weather Code";

const DAILY_HEADER: &str =
    "Date,Min Temperature (°C),Max Temperature (°C),Total Rain (mm),Max Wind Speed (m/s)";

/// Quote a field when it contains the delimiter.
fn field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Encode hourly records, one row per record.
///
/// Temperature, wind, and precipitation carry two decimals; humidity one.
#[must_use]
pub fn encode_hourly(records: &[WeatherRecord]) -> String {
    let mut out = String::from(HOURLY_HEADER);

    for record in records {
        let _ = write!(
            out,
            "\n{},{:.2},{:.1},{:.2},{:.2},{}",
            record.time.format("%Y-%m-%d %H:%M:%S"),
            record.temperature,
            record.humidity,
            record.wind_speed,
            record.precipitation,
            record.weather_code,
        );
    }

    out
}

/// Encode daily summaries, one row per day, two decimals per metric.
#[must_use]
pub fn encode_daily_summary(days: &[DailySummary]) -> String {
    let mut out = String::from(DAILY_HEADER);

    for day in days {
        let _ = write!(
            out,
            "\n{},{:.2},{:.2},{:.2},{:.2}",
            day.date, day.temp_min, day.temp_max, day.rain_total, day.wind_max,
        );
    }

    out
}

/// Metric cells for one side of a comparison row, empty when that side
/// has no summary for the date.
fn side_cells(summary: Option<&DailySummary>) -> String {
    match summary {
        Some(day) => format!(
            "{:.2},{:.2},{:.2},{:.2}",
            day.temp_min, day.temp_max, day.rain_total, day.wind_max
        ),
        None => ",,,".to_string(),
    }
}

/// Encode two locations' daily summaries side by side, outer-joined by
/// date.
///
/// A date present on only one side still produces a row; the other
/// side's four columns stay empty. Rows are sorted ascending by date.
#[must_use]
pub fn encode_comparison(
    days_a: &[DailySummary],
    days_b: &[DailySummary],
    name_a: &str,
    name_b: &str,
) -> String {
    let mut by_date: BTreeMap<chrono::NaiveDate, (Option<&DailySummary>, Option<&DailySummary>)> =
        BTreeMap::new();
    for day in days_a {
        by_date.entry(day.date).or_default().0 = Some(day);
    }
    for day in days_b {
        by_date.entry(day.date).or_default().1 = Some(day);
    }

    let mut out = String::from("Date");
    for name in [name_a, name_b] {
        for metric in ["Min Temp (°C)", "Max Temp (°C)", "Rain (mm)", "Max Wind (m/s)"] {
            out.push(',');
            out.push_str(&field(&format!("{name} {metric}")));
        }
    }

    for (date, (left, right)) in by_date {
        let _ = write!(out, "\n{date},{},{}", side_cells(left), side_cells(right));
    }

    out
}
