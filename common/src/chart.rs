// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Line chart geometry for the Slint `Path` element.
//!
//! Coordinates live in a `VIEWBOX` × `VIEWBOX` square with the origin in the top left corner;
//! the UI stretches that square over the chart area.

use std::fmt::Write;

/// Width and height of the coordinate space of a chart path.
pub const VIEWBOX: f64 = 100.0;

/// Number of horizontal bands the y-axis is split into.
pub const SEGMENTS: usize = 5;

/// A ready to draw line chart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartGeometry {
    /// SVG path commands of the line, empty if there is nothing to draw.
    pub path: String,

    /// `SEGMENTS + 1` y-axis labels, from the top (maximum) to the bottom (minimum).
    pub y_ticks: Vec<String>,
}

impl ChartGeometry {
    pub fn new(values: &[f64], unit_suffix: &str) -> Self {
        let (low, high) = value_range(values);

        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(index, value)| (x_position(index, values.len()), y_position(*value, low, high)))
            .collect();

        let y_ticks = (0..=SEGMENTS)
            .map(|step| {
                let value = high - (high - low) * step as f64 / SEGMENTS as f64;
                format!("{value:.2}{unit_suffix}")
            })
            .collect();

        Self {
            path: bezier_path(&points),
            y_ticks,
        }
    }
}

/// Smallest and largest value. A flat series is centered in a band of height one.
fn value_range(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }

    let (low, high) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(*value), high.max(*value))
        });

    if high - low < f64::EPSILON {
        (low - 0.5, high + 0.5)
    } else {
        (low, high)
    }
}

fn x_position(index: usize, count: usize) -> f64 {
    if count < 2 {
        return 0.0;
    }
    VIEWBOX * index as f64 / (count - 1) as f64
}

fn y_position(value: f64, low: f64, high: f64) -> f64 {
    VIEWBOX - (value - low) / (high - low) * VIEWBOX
}

/// Connects the points with cubic curves whose control points share the horizontal midpoint.
fn bezier_path(points: &[(f64, f64)]) -> String {
    let mut path = String::new();

    match points {
        [] => {}
        [(_, y)] => {
            let _ = write!(path, "M 0.00 {y:.2} L {:.2} {y:.2}", VIEWBOX);
        }
        [(x0, y0), rest @ ..] => {
            let _ = write!(path, "M {x0:.2} {y0:.2}");

            let mut previous = (*x0, *y0);
            for &(x, y) in rest {
                let middle = (previous.0 + x) / 2.0;
                let _ = write!(
                    path,
                    " C {middle:.2} {:.2} {middle:.2} {y:.2} {x:.2} {y:.2}",
                    previous.1
                );
                previous = (x, y);
            }
        }
    }

    path
}

#[test]
fn test_empty_chart() {
    let chart = ChartGeometry::new(&[], " V");

    assert!(chart.path.is_empty());
    assert_eq!(chart.y_ticks.len(), SEGMENTS + 1);
    assert_eq!(chart.y_ticks[0], "1.00 V");
    assert_eq!(chart.y_ticks[SEGMENTS], "0.00 V");
}

#[test]
fn test_single_point_is_flat_line() {
    let chart = ChartGeometry::new(&[3.7], " V");

    assert_eq!(chart.path, "M 0.00 50.00 L 100.00 50.00");
    assert_eq!(chart.y_ticks.first().unwrap(), "4.20 V");
    assert_eq!(chart.y_ticks.last().unwrap(), "3.20 V");
}

#[test]
fn test_y_ticks() {
    let chart = ChartGeometry::new(&[20.0, 25.0, 30.0], " °C");

    assert_eq!(
        chart.y_ticks,
        vec!["30.00 °C", "28.00 °C", "26.00 °C", "24.00 °C", "22.00 °C", "20.00 °C"]
    );
}

#[test]
fn test_bezier_path() {
    let chart = ChartGeometry::new(&[0.0, 1.0, 0.5], "");

    assert_eq!(
        chart.path,
        "M 0.00 100.00 C 25.00 100.00 25.00 0.00 50.00 0.00 C 75.00 0.00 75.00 50.00 100.00 50.00"
    );
}

#[test]
fn test_path_has_one_curve_per_step() {
    let values: Vec<f64> = (0..30).map(|i| 3.3 + (i % 4) as f64 * 0.1).collect();
    let chart = ChartGeometry::new(&values, " V");

    assert!(chart.path.starts_with("M 0.00 "));
    assert_eq!(chart.path.matches('C').count(), values.len() - 1);
}
