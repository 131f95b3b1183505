// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Turns raw feeds into what the charts show: x-axis labels and one value series per field.

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

use crate::channel::Feed;

/// Number of labels shown on the x-axis of a chart.
pub const MAX_AXIS_LABELS: usize = 3;

/// Day, month, hour and minute, e.g. `20/11, 14:03`.
const TIMESTAMP_FORMAT: &str = "%d/%m, %H:%M";

/// A plain 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// The values of one chart and how to style them.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    pub legend: &'static str,
    pub unit_suffix: &'static str,
    pub color: Rgb,
    pub values: Vec<f64>,
}

/// Everything the dashboard needs to draw its two charts.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayModel {
    pub labels: Vec<String>,
    pub voltage: ChartSeries,
    pub temperature: ChartSeries,
}

impl DisplayModel {
    pub const VOLTAGE_COLOR: Rgb = Rgb::new(0x00, 0x7b, 0xff);
    pub const TEMPERATURE_COLOR: Rgb = Rgb::new(0xff, 0x57, 0x33);

    /// Builds the model with timestamps in the local time zone.
    pub fn from_feeds(feeds: &[Feed]) -> Self {
        Self::from_feeds_in(feeds, &Local)
    }

    pub fn from_feeds_in<Tz: TimeZone>(feeds: &[Feed], tz: &Tz) -> Self
    where
        Tz::Offset: Display,
    {
        let formatted: Vec<String> = feeds
            .iter()
            .map(|feed| format_timestamp_in(&feed.created_at, tz))
            .collect();

        Self {
            labels: axis_labels(&formatted),
            voltage: ChartSeries {
                legend: "Voltage (V)",
                unit_suffix: " V",
                color: Self::VOLTAGE_COLOR,
                values: feeds
                    .iter()
                    .map(|feed| parse_reading(feed.field1.as_deref()))
                    .collect(),
            },
            temperature: ChartSeries {
                legend: "Temperature (°C)",
                unit_suffix: " °C",
                color: Self::TEMPERATURE_COLOR,
                values: feeds
                    .iter()
                    .map(|feed| parse_reading(feed.field2.as_deref()))
                    .collect(),
            },
        }
    }
}

/// Formats a feed timestamp in the local time zone.
pub fn format_timestamp(raw: &str) -> String {
    format_timestamp_in(raw, &Local)
}

/// Formats an RFC 3339 timestamp in `tz`. Anything unparsable is returned unchanged.
pub fn format_timestamp_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(time) => time.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        Err(e) => {
            log::warn!("Cannot parse timestamp {raw:?}: {e}");
            raw.to_string()
        }
    }
}

/// Picks the x-axis labels: all of them if there are at most three,
/// otherwise the first, the middle (lower one on even lengths) and the last.
pub fn axis_labels(formatted: &[String]) -> Vec<String> {
    if formatted.len() <= MAX_AXIS_LABELS {
        return formatted.to_vec();
    }

    let last = formatted.len() - 1;
    vec![
        formatted[0].clone(),
        formatted[formatted.len() / 2].clone(),
        formatted[last].clone(),
    ]
}

/// Parses a string-encoded reading. Missing or broken values read as zero.
pub fn parse_reading(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
fn feed(created_at: &str, entry_id: u64, field1: Option<&str>, field2: Option<&str>) -> Feed {
    Feed {
        created_at: created_at.into(),
        entry_id,
        field1: field1.map(Into::into),
        field2: field2.map(Into::into),
    }
}

#[test]
fn test_format_timestamp() {
    assert_eq!(format_timestamp_in("2024-11-20T14:03:11Z", &chrono::Utc), "20/11, 14:03");

    let brasilia = chrono::FixedOffset::west_opt(3 * 3600).unwrap();
    assert_eq!(format_timestamp_in("2024-11-20T14:03:11Z", &brasilia), "20/11, 11:03");
    assert_eq!(format_timestamp_in("2024-01-01T01:30:00Z", &brasilia), "31/12, 22:30");
}

#[test]
fn test_format_unparsable_timestamp() {
    assert_eq!(format_timestamp_in("yesterday", &chrono::Utc), "yesterday");
    assert_eq!(format_timestamp(""), "");
}

#[test]
fn test_axis_labels_short() {
    for n in 0..=3 {
        let formatted: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        assert_eq!(axis_labels(&formatted), formatted);
    }
}

#[test]
fn test_axis_labels_long() {
    for n in 4..=31 {
        let formatted: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        let labels = axis_labels(&formatted);

        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], "t0");
        assert_eq!(labels[1], format!("t{}", n / 2));
        assert_eq!(labels[2], format!("t{}", n - 1));
    }
}

#[test]
fn test_parse_reading() {
    assert_eq!(parse_reading(Some("3.7")), 3.7);
    assert_eq!(parse_reading(Some(" 24.5 ")), 24.5);
    assert_eq!(parse_reading(Some("-1")), -1.0);
    assert_eq!(parse_reading(None), 0.0);
    assert_eq!(parse_reading(Some("")), 0.0);
    assert_eq!(parse_reading(Some("abc")), 0.0);
    assert_eq!(parse_reading(Some("NaN")), 0.0);
    assert_eq!(parse_reading(Some("inf")), 0.0);
}

#[test]
fn test_display_model_five_feeds() {
    let feeds = vec![
        feed("2024-11-20T14:00:00Z", 1, Some("3.3"), Some("20.0")),
        feed("2024-11-20T14:01:00Z", 2, Some("3.4"), None),
        feed("2024-11-20T14:02:00Z", 3, Some("3.5"), Some("21.5")),
        feed("2024-11-20T14:03:00Z", 4, Some("3.6"), Some("oops")),
        feed("2024-11-20T14:04:00Z", 5, Some("3.7"), Some("22.0")),
    ];

    let model = DisplayModel::from_feeds_in(&feeds, &chrono::Utc);

    assert_eq!(model.labels, vec!["20/11, 14:00", "20/11, 14:02", "20/11, 14:04"]);
    assert_eq!(model.voltage.values, vec![3.3, 3.4, 3.5, 3.6, 3.7]);
    assert_eq!(model.temperature.values, vec![20.0, 0.0, 21.5, 0.0, 22.0]);
    assert_eq!(model.voltage.unit_suffix, " V");
    assert_eq!(model.temperature.unit_suffix, " °C");
    assert_ne!(model.voltage.color, model.temperature.color);
}

#[test]
fn test_display_model_missing_fields() {
    let feeds = vec![feed("2024-11-20T14:00:00Z", 1, None, None)];

    let model = DisplayModel::from_feeds_in(&feeds, &chrono::Utc);

    assert_eq!(model.labels, vec!["20/11, 14:00"]);
    assert_eq!(model.voltage.values, vec![0.0]);
    assert_eq!(model.temperature.values, vec![0.0]);
}

#[test]
fn test_display_model_empty() {
    let model = DisplayModel::from_feeds(&[]);

    assert!(model.labels.is_empty());
    assert!(model.voltage.values.is_empty());
    assert!(model.temperature.values.is_empty());
}
