//! Plotters-powered chart widget for Ratatui.
//!
//! Draws any `ChartArtifact` into the Ratatui buffer using
//! `plotters-ratatui-backend`. All bounds and tick formatting are computed
//! up front by `frame_for`, so `render()` only draws.

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{ChartArtifact, ChartBody};
use crate::report::format::truncate;

/// High-contrast series colors for terminal rendering.
const PALETTE: [(u8, u8, u8); 8] = [
    (0, 255, 255),
    (255, 200, 0),
    (0, 255, 0),
    (255, 0, 255),
    (255, 90, 90),
    (120, 160, 255),
    (255, 255, 255),
    (255, 140, 0),
];

fn palette(i: usize) -> RGBColor {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    RGBColor(r, g, b)
}

/// Ratatui color matching the Plotters color of series `i` (for legends).
pub fn series_color(i: usize) -> Color {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// Blue (low) to red (high) ramp for the regional markers.
fn heat(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(0, 255), lerp(200, 60), lerp(255, 0))
}

fn day_number(d: NaiveDate) -> f64 {
    d.num_days_from_ce() as f64
}

fn fmt_day(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn fmt_value(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

/// Pad a data range so points do not sit on the frame.
fn padded(min: f64, max: f64) -> [f64; 2] {
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if max <= min {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Axis bounds and tick formatting for one artifact.
pub struct PlotFrame {
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    x_fmt: Box<dyn Fn(f64) -> String>,
    x_ticks: usize,
}

impl PlotFrame {
    fn numeric(x_bounds: [f64; 2], y_bounds: [f64; 2]) -> Self {
        Self {
            x_bounds,
            y_bounds,
            x_fmt: Box::new(fmt_value),
            x_ticks: 5,
        }
    }

    /// Categorical x axis: one slot per label, centered on its index.
    fn categorical(labels: Vec<String>, y_bounds: [f64; 2]) -> Self {
        let n = labels.len();
        let width = if n > 8 { 6 } else { 10 };
        Self {
            x_bounds: [-0.5, n as f64 - 0.5],
            y_bounds,
            x_fmt: Box::new(move |v| {
                let i = v.round();
                if (v - i).abs() > 0.01 || i < 0.0 {
                    return String::new();
                }
                labels
                    .get(i as usize)
                    .map(|l| truncate(l, width))
                    .unwrap_or_default()
            }),
            x_ticks: n.max(1),
        }
    }
}

/// Compute the frame for `artifact`, or `None` when there is nothing to draw.
pub fn frame_for(artifact: &ChartArtifact) -> Option<PlotFrame> {
    if artifact.is_empty() {
        return None;
    }

    let frame = match &artifact.body {
        ChartBody::Line { series } => {
            let points = || series.iter().flat_map(|s| s.points.iter());
            let (x0, x1) = extent(points().map(|(d, _)| day_number(*d)));
            let (y0, y1) = extent(points().map(|(_, v)| *v));
            PlotFrame {
                x_bounds: padded(x0, x1),
                y_bounds: padded(y0, y1),
                x_fmt: Box::new(fmt_day),
                x_ticks: 5,
            }
        }
        ChartBody::Box { groups } => {
            let (y0, y1) = extent(groups.iter().flat_map(|g| {
                let s = &g.stats;
                [s.lower_whisker, s.upper_whisker]
                    .into_iter()
                    .chain(s.outliers.iter().copied())
            }));
            PlotFrame::categorical(
                groups.iter().map(|g| g.label.clone()).collect(),
                padded(y0, y1),
            )
        }
        ChartBody::ScatterGeo { markers } => {
            let (x0, x1) = extent(markers.iter().map(|m| m.longitude));
            let (y0, y1) = extent(markers.iter().map(|m| m.latitude));
            PlotFrame::numeric(padded(x0, x1), padded(y0, y1))
        }
        ChartBody::Bar { bars } => {
            let (lo, hi) = extent(bars.iter().map(|b| b.value));
            // Bars grow from zero, so zero is always on screen.
            let [y0, y1] = padded(lo.min(0.0), hi.max(0.0));
            let y0 = if lo >= 0.0 { 0.0 } else { y0 };
            PlotFrame::categorical(bars.iter().map(|b| b.label.clone()).collect(), [y0, y1])
        }
        ChartBody::ScatterTrend { points, .. } => {
            let (x0, x1) = extent(points.iter().map(|p| p.x));
            let (y0, y1) = extent(points.iter().map(|p| p.y));
            PlotFrame::numeric(padded(x0, x1), padded(y0, y1))
        }
    };
    Some(frame)
}

/// Render-only chart widget.
pub struct ChartWidget<'a> {
    pub artifact: &'a ChartArtifact,
}

impl<'a> Widget for ChartWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let Some(frame) = frame_for(self.artifact) else {
            buf.set_string(
                area.x,
                area.y,
                "No data for the current selection.",
                Style::default().fg(Color::Yellow),
            );
            return;
        };

        let [x0, x1] = frame.x_bounds;
        let [y0, y1] = frame.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let artifact = self.artifact;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(artifact.x_label.as_str())
                .y_desc(artifact.y_label.as_str())
                .x_labels(frame.x_ticks)
                .y_labels(5)
                .x_label_formatter(&|v| (frame.x_fmt)(*v))
                .y_label_formatter(&|v| fmt_value(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // `Circle` markers are avoided throughout: the backend maps circle
            // radii incorrectly. Colored `Pixel`s render as clean dots.
            match &artifact.body {
                ChartBody::Line { series } => {
                    for (i, s) in series.iter().enumerate() {
                        let color = palette(i);
                        chart.draw_series(LineSeries::new(
                            s.points.iter().map(|(d, v)| (day_number(*d), *v)),
                            &color,
                        ))?;
                    }
                }
                ChartBody::Box { groups } => {
                    for (i, g) in groups.iter().enumerate() {
                        let color = palette(i);
                        let x = i as f64;
                        let s = &g.stats;
                        chart.draw_series(std::iter::once(Rectangle::new(
                            [(x - 0.3, s.q1), (x + 0.3, s.q3)],
                            color.stroke_width(1),
                        )))?;
                        chart.draw_series([
                            PathElement::new(vec![(x - 0.3, s.median), (x + 0.3, s.median)], WHITE),
                            PathElement::new(vec![(x, s.lower_whisker), (x, s.q1)], color),
                            PathElement::new(vec![(x, s.q3), (x, s.upper_whisker)], color),
                        ])?;
                        chart.draw_series(s.outliers.iter().map(|&y| Pixel::new((x, y), color)))?;
                    }
                }
                ChartBody::ScatterGeo { markers } => {
                    let (lo, hi) = extent(markers.iter().filter_map(|m| m.color));
                    let span = hi - lo;
                    chart.draw_series(markers.iter().map(|m| {
                        let t = match m.color {
                            Some(c) if span > 0.0 => (c - lo) / span,
                            _ => 0.5,
                        };
                        Pixel::new((m.longitude, m.latitude), heat(t))
                    }))?;
                }
                ChartBody::Bar { bars } => {
                    chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
                        let x = i as f64;
                        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, b.value)], palette(0).filled())
                    }))?;
                }
                ChartBody::ScatterTrend { points, trend } => {
                    chart.draw_series(points.iter().map(|p| Pixel::new((p.x, p.y), WHITE)))?;
                    if let Some(line) = trend {
                        let n = 50usize;
                        let trend_color = palette(1);
                        chart.draw_series(LineSeries::new(
                            (0..n).map(|i| {
                                let x = x0 + (x1 - x0) * i as f64 / (n as f64 - 1.0);
                                (x, line.predict(x))
                            }),
                            &trend_color,
                        ))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Bar, BoxGroup, LineSeries as Series};
    use crate::math::box_stats;

    fn artifact(body: ChartBody) -> ChartArtifact {
        ChartArtifact {
            title: "t".to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            body,
        }
    }

    #[test]
    fn empty_artifact_has_no_frame() {
        assert!(frame_for(&artifact(ChartBody::Bar { bars: Vec::new() })).is_none());
    }

    #[test]
    fn bar_frame_starts_at_zero_and_labels_slots() {
        let a = artifact(ChartBody::Bar {
            bars: vec![
                Bar {
                    label: "Rice".to_string(),
                    value: 10.0,
                },
                Bar {
                    label: "Beans".to_string(),
                    value: 30.0,
                },
            ],
        });
        let frame = frame_for(&a).unwrap();
        assert_eq!(frame.y_bounds[0], 0.0);
        assert!(frame.y_bounds[1] > 30.0);
        assert_eq!(frame.x_bounds, [-0.5, 1.5]);
        assert_eq!((frame.x_fmt)(1.0), "Beans");
        assert_eq!((frame.x_fmt)(0.5), "");
    }

    #[test]
    fn box_frame_covers_outliers() {
        let stats = box_stats(&[10.0, 11.0, 12.0, 13.0, 100.0]).unwrap();
        let a = artifact(ChartBody::Box {
            groups: vec![BoxGroup {
                label: "Rice".to_string(),
                stats,
            }],
        });
        let frame = frame_for(&a).unwrap();
        assert!(frame.y_bounds[0] < 10.0);
        assert!(frame.y_bounds[1] > 100.0);
    }

    #[test]
    fn single_date_line_gets_a_nonzero_span() {
        let d = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let a = artifact(ChartBody::Line {
            series: vec![Series {
                name: None,
                points: vec![(d, 42.0)],
            }],
        });
        let frame = frame_for(&a).unwrap();
        assert!(frame.x_bounds[1] > frame.x_bounds[0]);
        assert!(frame.y_bounds[1] > frame.y_bounds[0]);
        assert_eq!(fmt_day(day_number(d)), "2023-05");
    }

    #[test]
    fn heat_ramp_is_clamped() {
        assert_eq!(heat(-1.0), heat(0.0));
        assert_eq!(heat(2.0), RGBColor(255, 60, 0));
    }
}
